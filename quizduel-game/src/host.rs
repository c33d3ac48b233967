use crate::arbitration::{self, Submission};
use crate::controller::{self, Controller, Effect, UserAction};
use crate::error::{GameError, Result};
use crate::message::{
    screen, AckJoin, BiddingScreen, GameOver, Message, RoundResult, StartExecution, StateUpdate,
    Welcome,
};
use crate::phase::{self, GamePhase};
use crate::state::GameState;
use crate::timer::{Countdown, TickOutcome};
use crate::view::ViewEvent;
use quizduel_core::{MatchConfig, Participant, Question, QuestionBank, Role};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Authoritative side: owns the configuration, the question sequence, the
/// scoreboard and the round clock.
pub struct HostController<R = StdRng> {
    state: GameState,
    questions: Vec<Question>,
    countdown: Countdown,
    rng: R,
}

impl HostController<StdRng> {
    pub fn new(display_name: &str, config: MatchConfig, bank: &QuestionBank) -> Result<Self> {
        let display_name = Participant::validate_name(display_name)?;
        let me = Participant::with_random_avatar(Role::Host, display_name);
        Self::with_rng(me, config, bank, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> HostController<R> {
    pub fn with_rng(
        me: Participant,
        config: MatchConfig,
        bank: &QuestionBank,
        mut rng: R,
    ) -> Result<Self> {
        if me.role != Role::Host {
            return Err(GameError::not_permitted("host controller needs the host role"));
        }
        config.validate()?;

        let game_config = config.game_config();
        let questions = arbitration::select_questions(bank, &game_config, &mut rng);
        if questions.len() < game_config.total_rounds as usize {
            tracing::warn!(
                "Only {} questions in category '{}' for {} rounds; the match will end early",
                questions.len(),
                game_config.category,
                game_config.total_rounds
            );
        }

        let mut state = GameState::new(me, config.bid_limits);
        state.config = Some(game_config);

        Ok(Self {
            state,
            questions,
            countdown: Countdown::new(),
            rng,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    fn total_rounds(&self) -> u32 {
        self.state.total_rounds().unwrap_or(1)
    }

    /// Send an update to the client and apply it locally through the same path
    fn broadcast(&mut self, update: StateUpdate) -> Vec<Effect> {
        let mut effects = vec![Effect::Send(Message::StateUpdate(update.clone()))];

        match phase::apply_broadcast(&mut self.state, &update) {
            Ok(views) => effects.extend(views.into_iter().map(Effect::View)),
            Err(e) => tracing::error!("Host could not apply its own {}: {}", update.name(), e),
        }

        effects
    }

    fn start_game(&mut self) -> Result<Vec<Effect>> {
        if self.state.phase != GamePhase::Lobby {
            return Err(GameError::WrongPhase(self.state.phase));
        }
        if self.state.opponent.is_none() {
            return Err(GameError::OpponentMissing);
        }

        let config = self
            .state
            .config
            .clone()
            .ok_or_else(|| GameError::Internal("host has no match configuration".to_string()))?;

        tracing::info!(
            "Match {}: starting {} rounds in category '{}'",
            self.state.match_id,
            config.total_rounds,
            config.category
        );

        let mut effects = vec![Effect::Send(Message::Welcome(Welcome {
            rounds: config.total_rounds,
            category: config.category,
            host_name: self.state.me.display_name.clone(),
            host_avatar: self.state.me.avatar_seed.clone(),
        }))];
        effects.extend(self.broadcast(StateUpdate::BiddingScreen(BiddingScreen::new(1, 0, 0))));
        Ok(effects)
    }

    /// Runs once both bids are locked
    fn try_resolve_bids(&mut self) -> Vec<Effect> {
        if self.state.phase != GamePhase::Bidding || !self.state.round.both_locked() {
            return Vec::new();
        }

        let host_bid = self.state.bid_of(Role::Host);
        let client_bid = self.state.bid_of(Role::Client);
        let resolution = arbitration::resolve_bids(host_bid, client_bid, &mut self.rng);
        let round = self.state.round.round_number;

        tracing::info!(
            "Round {}: host bid {}, client bid {} -> {} answers in {}{}",
            round,
            host_bid,
            client_bid,
            resolution.winner,
            resolution.winning_bid,
            if resolution.tie { " (tie broken at random)" } else { "" }
        );

        let question = match arbitration::question_for_round(&self.questions, round) {
            Some(question) => question.clone(),
            None => {
                tracing::warn!("No question for round {}; ending the match", round);
                return self.finish_game();
            }
        };

        let mut effects = self.broadcast(StateUpdate::StartExecution(StartExecution {
            active_player_role: resolution.winner,
            question,
            bid_time: resolution.winning_bid,
            screen: screen::EXECUTION.to_string(),
        }));

        let epoch = self.countdown.start(resolution.winning_bid);
        effects.push(Effect::StartTimer {
            epoch,
            seconds: resolution.winning_bid,
        });
        effects
    }

    /// Score the round. `role` is who submitted; the timer expiry submits for the active side.
    fn evaluate(&mut self, role: Role, submission: Submission) -> Result<Vec<Effect>> {
        phase::check_answer_allowed(&self.state, role)?;
        self.state.round.answer_submitted = true;

        let mut effects = Vec::new();
        if self.countdown.cancel() {
            effects.push(Effect::CancelTimer);
        }

        let question = self
            .state
            .round
            .question
            .clone()
            .ok_or_else(|| GameError::Internal("round has no question".to_string()))?;
        let time_remaining = self.countdown.remaining();

        let verdict = arbitration::score_answer(&question, submission, time_remaining, role);
        let mut scores = self.state.scores;
        scores.credit(verdict.credited, verdict.points);

        tracing::info!(
            "Round {}: {} answered {:?} with {}s left -> {} (+{} to {})",
            self.state.round.round_number,
            role,
            submission,
            time_remaining,
            if verdict.correct { "correct" } else { "wrong" },
            verdict.points,
            verdict.credited
        );

        effects.extend(self.broadcast(StateUpdate::RoundResult(RoundResult {
            correct: verdict.correct,
            points: verdict.points,
            correct_text: question.correct_text().to_string(),
            active_player_role: role,
            host_score: scores.host_score,
            client_score: scores.client_score,
            screen: screen::ROUND_RESULT.to_string(),
        })));
        Ok(effects)
    }

    fn next_round(&mut self) -> Result<Vec<Effect>> {
        if self.state.phase != GamePhase::RoundResult {
            return Err(GameError::WrongPhase(self.state.phase));
        }

        let round = self.state.round.round_number;
        let next = round + 1;
        if round >= self.total_rounds()
            || arbitration::question_for_round(&self.questions, next).is_none()
        {
            return Ok(self.finish_game());
        }

        let scores = self.state.scores;
        Ok(self.broadcast(StateUpdate::BiddingScreen(BiddingScreen::new(
            next,
            scores.host_score,
            scores.client_score,
        ))))
    }

    fn finish_game(&mut self) -> Vec<Effect> {
        if self.state.phase == GamePhase::GameOver {
            return Vec::new();
        }

        let scores = self.state.scores;
        let outcome = arbitration::decide_winner(&scores);
        tracing::info!(
            "Match {} over: {:?} ({} - {})",
            self.state.match_id,
            outcome,
            scores.host_score,
            scores.client_score
        );

        self.broadcast(StateUpdate::GameOver(GameOver {
            winner_role: outcome,
            host_score: scores.host_score,
            client_score: scores.client_score,
            screen: screen::FINAL_RESULTS.to_string(),
        }))
    }

    fn handle_message(&mut self, message: Message) -> Result<Vec<Effect>> {
        match message {
            Message::Hello(hello) => {
                if self.state.phase != GamePhase::Lobby || self.state.opponent.is_some() {
                    return Err(GameError::violation("client already introduced itself"));
                }

                let opponent = Participant::new(Role::Client, hello.name, hello.avatar);
                tracing::info!("{} joined as client", opponent.display_name);
                self.state.opponent = Some(opponent.clone());

                Ok(vec![
                    Effect::View(ViewEvent::OpponentJoined(opponent)),
                    Effect::Send(Message::AckJoin(AckJoin {
                        host_name: self.state.me.display_name.clone(),
                    })),
                ])
            }
            Message::StateUpdate(StateUpdate::LiveBidUpdate { bid_value }) => {
                let view = phase::record_opponent_bid(&mut self.state, bid_value, false)?;
                Ok(vec![Effect::View(view)])
            }
            Message::StateUpdate(StateUpdate::OpponentLockedBid { bid_value }) => {
                let view = phase::record_opponent_bid(&mut self.state, bid_value, true)?;
                let mut effects = vec![Effect::View(view)];
                effects.extend(self.try_resolve_bids());
                Ok(effects)
            }
            Message::StateUpdate(StateUpdate::ClientAnswer { answer_index }) => {
                self.evaluate(Role::Client, Submission::from_wire(answer_index))
            }
            Message::StateUpdate(update) => Err(GameError::violation(format!(
                "{} only flows from host to client",
                update.name()
            ))),
            Message::AckJoin(_) | Message::Welcome(_) => Err(GameError::violation(
                "handshake reply sent to the host",
            )),
            Message::Unrecognized { kind, reason } => Err(GameError::violation(format!(
                "unrecognized {} ({})",
                kind, reason
            ))),
        }
    }
}

impl<R: Rng + Send> Controller for HostController<R> {
    fn role(&self) -> Role {
        Role::Host
    }

    fn state(&self) -> &GameState {
        &self.state
    }

    fn on_open(&mut self, peer: &str) -> Vec<Effect> {
        controller::open_link(&mut self.state, peer)
    }

    fn on_message(&mut self, message: Message) -> Vec<Effect> {
        if self.state.is_disconnected() {
            return Vec::new();
        }

        let what = message.kind().to_string();
        match self.handle_message(message) {
            Ok(effects) => effects,
            Err(e) => controller::ignore(&self.state, &what, e),
        }
    }

    fn on_user_action(&mut self, action: UserAction) -> Result<Vec<Effect>> {
        controller::ensure_connected(&self.state)?;

        match action {
            UserAction::StartGame => self.start_game(),
            UserAction::AdjustBid(bid) => controller::adjust_bid(&mut self.state, bid),
            UserAction::LockBid => {
                let mut effects = controller::lock_bid(&mut self.state)?;
                effects.extend(self.try_resolve_bids());
                Ok(effects)
            }
            UserAction::SubmitAnswer(submission) => self.evaluate(Role::Host, submission),
            UserAction::NextRound => self.next_round(),
        }
    }

    fn on_timer_tick(&mut self, epoch: u64) -> Vec<Effect> {
        match self.countdown.tick(epoch) {
            TickOutcome::Stale => {
                tracing::debug!("Dropping stale tick for epoch {}", epoch);
                Vec::new()
            }
            TickOutcome::Running(remaining) => {
                self.broadcast(StateUpdate::TimerTick { time: remaining })
            }
            TickOutcome::Expired => {
                let mut effects = self.broadcast(StateUpdate::TimerTick { time: 0 });
                effects.push(Effect::CancelTimer);

                let active = self.state.round.active_player;
                match active.map(|role| self.evaluate(role, Submission::NoAnswer)) {
                    Some(Ok(more)) => effects.extend(more),
                    Some(Err(e)) => tracing::error!("Time ran out but the round could not be scored: {}", e),
                    None => tracing::error!("Time ran out with no active player"),
                }
                effects
            }
        }
    }

    fn on_disconnect(&mut self) -> Vec<Effect> {
        let Some(notice) = controller::close_link(&mut self.state) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if self.countdown.cancel() {
            effects.push(Effect::CancelTimer);
        }
        effects.push(notice);
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Hello;
    use crate::state::LinkStatus;
    use quizduel_core::Outcome;

    fn bank() -> QuestionBank {
        QuestionBank::bundled().unwrap()
    }

    fn host(rounds: u32) -> HostController {
        let me = Participant::new(Role::Host, "Ana", "seed1");
        HostController::with_rng(
            me,
            MatchConfig::new(rounds, "all"),
            &bank(),
            StdRng::seed_from_u64(42),
        )
        .unwrap()
    }

    fn sent(effects: &[Effect]) -> Vec<&Message> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn joined_host(rounds: u32) -> HostController {
        let mut host = host(rounds);
        host.on_open("test");
        host.on_message(Message::Hello(Hello {
            name: "Sam".to_string(),
            avatar: "seed9".to_string(),
        }));
        host
    }

    fn client_locks(host: &mut HostController, bid: u32) -> Vec<Effect> {
        host.on_message(StateUpdate::OpponentLockedBid { bid_value: bid }.into())
    }

    #[test]
    fn test_hello_is_acknowledged_once() {
        let mut host = host(3);
        host.on_open("test");
        let effects = host.on_message(Message::Hello(Hello {
            name: "Sam".to_string(),
            avatar: "seed9".to_string(),
        }));
        assert!(matches!(sent(&effects)[0], Message::AckJoin(ack) if ack.host_name == "Ana"));
        assert_eq!(host.state().opponent().unwrap().display_name, "Sam");

        let again = host.on_message(Message::Hello(Hello {
            name: "Mallory".to_string(),
            avatar: "seed0".to_string(),
        }));
        assert!(again.is_empty());
        assert_eq!(host.state().opponent().unwrap().display_name, "Sam");
    }

    #[test]
    fn test_blank_name_cannot_host() {
        let result = HostController::new("   ", MatchConfig::new(3, "all"), &bank());
        assert!(matches!(
            result,
            Err(GameError::Core(quizduel_core::QuizduelError::Config(_)))
        ));
        let host = HostController::new(" Ana ", MatchConfig::new(3, "all"), &bank()).unwrap();
        assert_eq!(host.state().me().display_name, "Ana");
    }

    #[test]
    fn test_actions_wait_for_the_link() {
        let mut host = host(3);
        assert_eq!(host.state().link_status(), LinkStatus::Connecting);
        assert!(matches!(
            host.on_user_action(UserAction::StartGame),
            Err(GameError::NotPermitted(_))
        ));

        host.on_open("test");
        assert_eq!(host.state().link_status(), LinkStatus::Open);

        host.on_disconnect();
        assert_eq!(host.state().link_status(), LinkStatus::Closed);
        assert!(matches!(
            host.on_user_action(UserAction::StartGame),
            Err(GameError::TransportClosed)
        ));
    }

    #[test]
    fn test_start_requires_opponent() {
        let mut host = host(3);
        host.on_open("test");
        assert!(matches!(
            host.on_user_action(UserAction::StartGame),
            Err(GameError::OpponentMissing)
        ));
    }

    #[test]
    fn test_start_sends_welcome_then_bidding() {
        let mut host = joined_host(3);
        let effects = host.on_user_action(UserAction::StartGame).unwrap();
        let messages = sent(&effects);

        assert!(matches!(messages[0], Message::Welcome(w) if w.rounds == 3 && w.host_name == "Ana"));
        assert!(matches!(
            messages[1],
            Message::StateUpdate(StateUpdate::BiddingScreen(b)) if b.round == 1 && b.host_score == 0
        ));
        assert_eq!(host.state().phase(), GamePhase::Bidding);
        assert!(host.on_user_action(UserAction::StartGame).is_err());
    }

    #[test]
    fn test_lower_bid_starts_execution_and_timer() {
        let mut host = joined_host(3);
        host.on_user_action(UserAction::StartGame).unwrap();

        host.on_user_action(UserAction::AdjustBid(10)).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        let effects = client_locks(&mut host, 15);

        assert_eq!(host.state().phase(), GamePhase::Execution);
        assert_eq!(host.state().round().active_player, Some(Role::Host));
        assert!(effects.contains(&Effect::StartTimer {
            epoch: 1,
            seconds: 10
        }));
        assert_eq!(host.countdown().remaining(), 10);
    }

    #[test]
    fn test_correct_answer_scores_time_bonus() {
        let mut host = joined_host(3);
        host.on_user_action(UserAction::StartGame).unwrap();
        host.on_user_action(UserAction::AdjustBid(10)).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        client_locks(&mut host, 15);

        for _ in 0..5 {
            host.on_timer_tick(1);
        }
        assert_eq!(host.state().round().time_remaining, 5);

        let correct = host.questions()[0].correct_option_index;
        let effects = host
            .on_user_action(UserAction::SubmitAnswer(Submission::Answer(correct)))
            .unwrap();

        assert!(effects.contains(&Effect::CancelTimer));
        assert_eq!(host.state().scores().host_score, 150);
        assert_eq!(host.state().phase(), GamePhase::RoundResult);

        // late tick and a second answer change nothing
        assert!(host.on_timer_tick(1).is_empty());
        assert!(host
            .on_user_action(UserAction::SubmitAnswer(Submission::Answer(correct)))
            .is_err());
        assert_eq!(host.state().scores().host_score, 150);
    }

    #[test]
    fn test_expiry_awards_consolation_to_other_side() {
        let mut host = joined_host(3);
        host.on_user_action(UserAction::StartGame).unwrap();
        host.on_user_action(UserAction::AdjustBid(20)).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        client_locks(&mut host, 2);
        assert_eq!(host.state().round().active_player, Some(Role::Client));

        host.on_timer_tick(1);
        let effects = host.on_timer_tick(1);

        let cancels = effects.iter().filter(|e| **e == Effect::CancelTimer).count();
        assert_eq!(cancels, 1);
        assert!(sent(&effects).iter().any(|m| matches!(
            m,
            Message::StateUpdate(StateUpdate::TimerTick { time: 0 })
        )));
        assert_eq!(host.state().scores().host_score, 25);
        assert_eq!(host.state().phase(), GamePhase::RoundResult);
    }

    #[test]
    fn test_client_answer_only_when_client_is_active() {
        let mut host = joined_host(3);
        host.on_user_action(UserAction::StartGame).unwrap();
        host.on_user_action(UserAction::AdjustBid(3)).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        client_locks(&mut host, 9);

        let effects = host.on_message(StateUpdate::ClientAnswer { answer_index: 0 }.into());
        assert!(effects.is_empty());
        assert_eq!(host.state().phase(), GamePhase::Execution);
    }

    #[test]
    fn test_next_round_then_game_over() {
        let mut host = joined_host(1);
        host.on_user_action(UserAction::StartGame).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        client_locks(&mut host, 5);
        host.on_message(StateUpdate::ClientAnswer { answer_index: -1 }.into());

        let effects = host.on_user_action(UserAction::NextRound).unwrap();
        assert!(sent(&effects).iter().any(|m| matches!(
            m,
            Message::StateUpdate(StateUpdate::GameOver(over)) if over.winner_role == Outcome::Host
        )));
        assert_eq!(host.state().phase(), GamePhase::GameOver);
        assert!(host.on_user_action(UserAction::NextRound).is_err());
    }

    #[test]
    fn test_missing_question_ends_match() {
        let me = Participant::new(Role::Host, "Ana", "seed1");
        let mut host = HostController::with_rng(
            me,
            MatchConfig::new(5, "history"),
            &bank(),
            StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(host.questions().len(), 4);

        host.on_open("test");
        host.on_message(Message::Hello(Hello {
            name: "Sam".to_string(),
            avatar: "seed9".to_string(),
        }));
        host.on_user_action(UserAction::StartGame).unwrap();

        for _ in 0..4 {
            host.on_user_action(UserAction::LockBid).unwrap();
            client_locks(&mut host, 30);
            host.on_user_action(UserAction::SubmitAnswer(Submission::NoAnswer))
                .unwrap();
            host.on_user_action(UserAction::NextRound).unwrap();
        }

        assert_eq!(host.state().phase(), GamePhase::GameOver);
        assert_eq!(host.state().round().round_number, 4);
        assert_eq!(host.state().outcome(), Some(Outcome::Client));
    }

    #[test]
    fn test_disconnect_cancels_timer_once() {
        let mut host = joined_host(3);
        host.on_user_action(UserAction::StartGame).unwrap();
        host.on_user_action(UserAction::LockBid).unwrap();
        client_locks(&mut host, 20);

        let effects = host.on_disconnect();
        assert_eq!(
            effects,
            vec![Effect::CancelTimer, Effect::View(ViewEvent::Disconnected)]
        );
        assert!(host.on_disconnect().is_empty());
        assert!(host.on_timer_tick(1).is_empty());
        assert!(matches!(
            host.on_user_action(UserAction::NextRound),
            Err(GameError::TransportClosed)
        ));
    }
}
