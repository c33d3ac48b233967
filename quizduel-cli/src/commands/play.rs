use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::{Confirm, Input, Select};
use quizduel_core::{
    BidLimits, MatchConfig, Participant, QuestionBank, QuizduelError, Role, TcpTransport,
    Transport,
};
use quizduel_game::{
    session, ClientController, Controller, GameError, GameState, HostController, Result,
    RoundSummary, ScoreBoard, Submission, UserAction, ViewEvent,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub struct HostOptions {
    pub display_name: String,
    pub listen_addr: String,
    pub match_config: MatchConfig,
}

pub async fn host_match(opts: HostOptions, bank: &QuestionBank) -> Result<()> {
    let tick = opts.match_config.tick_interval;
    let controller = HostController::new(&opts.display_name, opts.match_config, bank)?;

    let listener = TcpListener::bind(&opts.listen_addr)
        .await
        .map_err(QuizduelError::from)?;
    let local = listener.local_addr().map_err(QuizduelError::from)?;

    println!("Hosting a {}-round match.", controller.state().total_rounds().unwrap_or(0));
    println!("Waiting for an opponent on {} ...", local);
    println!();
    println!("Ask the other player to run:");
    println!("quizduel join <your-address>:{}", local.port());

    let transport = TcpTransport::accept(&listener).await?;
    let state = play(controller, transport, tick).await?;
    report(&state);
    Ok(())
}

pub async fn join_match(display_name: String, peer_addr: &str) -> Result<()> {
    let display_name = Participant::validate_name(&display_name)?;

    println!("Connecting to {} ...", peer_addr);
    let transport = TcpTransport::connect(peer_addr).await?;

    let controller = ClientController::new(display_name);
    let tick = MatchConfig::default().tick_interval;
    let state = play(controller, transport, tick).await?;
    report(&state);
    Ok(())
}

fn report(state: &GameState) {
    tracing::debug!(
        "Match {} ({}) ended in {:?}, link {:?}",
        state.match_id(),
        state.role(),
        state.phase(),
        state.link_status()
    );

    if let (Some(started), Some(finished)) = (state.started_at(), state.finished_at()) {
        println!("Match time: {}s", (finished - started).num_seconds());
    }
}

/// Run a session and drive it from the terminal until the match ends.
/// Prompt answers are forwarded only while their prompt is still current.
async fn play<C, T>(controller: C, transport: T, tick: Duration) -> Result<GameState>
where
    C: Controller + 'static,
    T: Transport,
{
    let role = controller.role();
    let limits = controller.state().bid_limits();
    let (actions, mut views, task) = session::spawn(controller, transport, tick).into_parts();
    let (prompter, mut answers) = Prompter::spawn()?;
    let mut screen = Screen::new(role, limits, prompter);

    loop {
        tokio::select! {
            view = views.recv() => match view {
                Some(view) => {
                    if screen.render(view) {
                        break;
                    }
                }
                None => break,
            },
            Some(answer) = answers.recv() => {
                if screen.prompter.is_current(answer.ticket) {
                    for action in answer.actions {
                        if actions.send(action).is_err() {
                            break;
                        }
                    }
                } else {
                    tracing::debug!("Dropping the answer to an expired prompt");
                }
            }
        }
    }

    // leaving the match closes the link. A prompt still waiting on stdin
    // lives on a detached thread and does not hold the session open.
    drop(screen);
    drop(actions);
    task.await
        .map_err(|e| GameError::Internal(format!("session task failed: {}", e)))
}

type Dialog = Box<dyn FnOnce() -> quizduel_core::Result<Vec<UserAction>> + Send>;

/// What a finished prompt produced, tagged with the ticket it was asked under
struct Answer {
    ticket: u64,
    actions: Vec<UserAction>,
}

/// Runs dialogs one at a time on a dedicated thread. Every new prompt or
/// `expire` moves the generation on; queued dialogs from an older generation
/// are skipped and their answers are discarded by `play`.
struct Prompter {
    jobs: mpsc::UnboundedSender<(u64, Dialog)>,
    generation: Arc<AtomicU64>,
    busy: Arc<AtomicBool>,
}

impl Prompter {
    fn spawn() -> quizduel_core::Result<(Self, mpsc::UnboundedReceiver<Answer>)> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<(u64, Dialog)>();
        let (answers, answer_rx) = mpsc::unbounded_channel();
        let generation = Arc::new(AtomicU64::new(0));
        let busy = Arc::new(AtomicBool::new(false));

        let current = Arc::clone(&generation);
        let working = Arc::clone(&busy);
        thread::Builder::new()
            .name("quizduel-prompt".to_string())
            .spawn(move || {
                while let Some((ticket, dialog)) = queue.blocking_recv() {
                    if current.load(Ordering::SeqCst) != ticket {
                        continue;
                    }

                    working.store(true, Ordering::SeqCst);
                    let result = dialog();
                    working.store(false, Ordering::SeqCst);

                    match result {
                        Ok(actions) => {
                            if answers.send(Answer { ticket, actions }).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("Prompt failed: {}", e),
                    }
                }
            })?;

        Ok((
            Self {
                jobs,
                generation,
                busy,
            },
            answer_rx,
        ))
    }

    /// Queue a dialog. It supersedes every prompt asked before it.
    fn ask<F>(&self, dialog: F) -> u64
    where
        F: FnOnce() -> quizduel_core::Result<Vec<UserAction>> + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if self.jobs.send((ticket, Box::new(dialog))).is_err() {
            tracing::warn!("Prompt thread is gone; input is no longer read");
        }
        ticket
    }

    /// Outdate whatever is pending without asking anything new
    fn expire(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// A dialog is on screen right now
    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Terminal rendering of view events plus the prompts they trigger
struct Screen {
    role: Role,
    limits: BidLimits,
    prompter: Prompter,
    opponent: String,
    answering: bool,
}

impl Screen {
    fn new(role: Role, limits: BidLimits, prompter: Prompter) -> Self {
        Self {
            role,
            limits,
            prompter,
            opponent: role.opponent().to_string(),
            answering: false,
        }
    }

    /// Returns true once the match is over for us
    fn render(&mut self, view: ViewEvent) -> bool {
        match view {
            ViewEvent::LinkOpened { peer } => {
                println!("Connected to {}.", peer);
            }

            ViewEvent::OpponentJoined(opponent) => {
                println!("{} joined the lobby.", opponent.display_name);
                self.opponent = opponent.display_name.clone();
                let prompt = format!("Start the match against {}?", opponent.display_name);
                self.prompter.ask(move || {
                    let start = Confirm::new()
                        .with_prompt(prompt)
                        .default(true)
                        .interact()?;
                    if !start {
                        println!("Not started. Press Ctrl-C to leave.");
                        return Ok(Vec::new());
                    }
                    Ok(vec![UserAction::StartGame])
                });
            }

            ViewEvent::JoinAcknowledged { host_name } => {
                self.opponent = host_name;
                println!("In {}'s lobby. Waiting for the match to start...", self.opponent);
            }

            ViewEvent::MatchConfigured(config) => {
                println!(
                    "Match settings: {} rounds, category '{}'",
                    config.total_rounds, config.category
                );
            }

            ViewEvent::BiddingOpened {
                round,
                total_rounds,
                scores,
            } => {
                self.answering = false;
                println!();
                println!("------ ROUND {}/{} ------", round, total_rounds);
                println!("{}", self.score_table(scores));

                let limits = self.limits;
                self.prompter.ask(move || {
                    let bid: u32 = Input::new()
                        .with_prompt(format!(
                            "Seconds you need to answer ({}-{}, lower bid answers)",
                            limits.min, limits.max
                        ))
                        .default(limits.default)
                        .validate_with(|bid: &u32| -> std::result::Result<(), String> {
                            if limits.contains(*bid) {
                                Ok(())
                            } else {
                                Err(format!("Pick a value between {} and {}", limits.min, limits.max))
                            }
                        })
                        .interact_text()?;
                    Ok(vec![UserAction::AdjustBid(bid), UserAction::LockBid])
                });
            }

            ViewEvent::BidLocked(bid) => {
                println!("You locked in {}s. Waiting for {}...", bid, self.opponent);
            }

            ViewEvent::OpponentBidLocked(bid) => {
                println!("{} locked in {}s.", self.opponent, bid);
            }

            ViewEvent::BidAdjusted(_) | ViewEvent::OpponentBidChanged(_) => {}

            ViewEvent::ExecutionStarted {
                active_player,
                my_turn,
                question,
                time,
            } => {
                println!();
                println!("[{}] {}", question.category, question.prompt);
                for (i, option) in question.answer_options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option);
                }

                if my_turn {
                    self.answering = true;
                    let options = question.answer_options.clone();
                    self.prompter.ask(move || {
                        let choice = Select::new()
                            .with_prompt(format!("Your answer ({}s)", time))
                            .items(&options)
                            .default(0)
                            .interact()?;
                        Ok(vec![UserAction::SubmitAnswer(Submission::Answer(choice))])
                    });
                } else {
                    let who = if active_player == self.role { "You" } else { self.opponent.as_str() };
                    println!("{} won the bid and has {}s to answer.", who, time);
                }
            }

            ViewEvent::TimerUpdated(time) => {
                if !self.answering && (time <= 3 || time % 5 == 0) {
                    println!("  {}s left", time);
                }
            }

            ViewEvent::RoundFinished(summary) => {
                if self.answering && self.prompter.is_busy() {
                    println!();
                    println!("Time is up. Press Enter to dismiss the answer prompt.");
                }
                self.answering = false;
                self.prompter.expire();
                self.print_round(&summary);

                if self.role == Role::Host {
                    self.prompter.ask(|| {
                        Input::<String>::new()
                            .with_prompt("Press Enter to continue")
                            .allow_empty(true)
                            .interact_text()?;
                        Ok(vec![UserAction::NextRound])
                    });
                } else {
                    println!("Waiting for {} to continue...", self.opponent);
                }
            }

            ViewEvent::MatchFinished { outcome, scores } => {
                self.prompter.expire();
                println!();
                println!("------ MATCH OVER ------");
                println!("{}", self.score_table(scores));
                match outcome.winner() {
                    Some(winner) if winner == self.role => println!("You win!"),
                    Some(_) => println!("{} wins.", self.opponent),
                    None => println!("It's a draw."),
                }
                return true;
            }

            ViewEvent::ActionRejected(reason) => {
                println!("Not allowed: {}", reason);
            }

            ViewEvent::Disconnected => {
                self.prompter.expire();
                println!();
                println!("{}", GameError::TransportClosed);
                return true;
            }
        }

        false
    }

    fn print_round(&self, summary: &RoundSummary) {
        let who = if summary.active_player == self.role {
            "You".to_string()
        } else {
            self.opponent.clone()
        };

        println!();
        if summary.correct {
            println!("{} answered correctly: +{} points.", who, summary.points);
        } else {
            let other = if summary.active_player == self.role {
                self.opponent.clone()
            } else {
                "you".to_string()
            };
            println!(
                "{} missed. The answer was '{}'. +{} points for {}.",
                who, summary.correct_text, summary.points, other
            );
        }
        println!("{}", self.score_table(summary.scores));
    }

    fn score_table(&self, scores: ScoreBoard) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Player", "Role", "Score"]);
        table.add_row(vec![
            "You".to_string(),
            self.role.to_string(),
            scores.get(self.role).to_string(),
        ]);
        table.add_row(vec![
            self.opponent.clone(),
            self.role.opponent().to_string(),
            scores.get(self.role.opponent()).to_string(),
        ]);
        table
    }
}
