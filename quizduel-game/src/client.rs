use crate::controller::{self, Controller, Effect, UserAction};
use crate::error::{GameError, Result};
use crate::message::{Message, StateUpdate};
use crate::phase::{self, GamePhase};
use crate::state::GameState;
use crate::view::ViewEvent;
use quizduel_core::{BidLimits, GameConfig, Participant, Role};

/// Joining side. Holds no authority: it forwards its own bids and answer to
/// the host and mirrors whatever the host broadcasts.
pub struct ClientController {
    state: GameState,
}

impl ClientController {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self::with_participant(
            Participant::with_random_avatar(Role::Client, display_name),
            BidLimits::default(),
        )
    }

    pub fn with_participant(me: Participant, bid_limits: BidLimits) -> Self {
        Self {
            state: GameState::new(me, bid_limits),
        }
    }

    fn handle_message(&mut self, message: Message) -> Result<Vec<Effect>> {
        match message {
            Message::Hello(hello) => {
                if self.state.opponent.is_none() {
                    self.state.opponent = Some(Participant::new(Role::Host, hello.name, hello.avatar));
                }
                Ok(Vec::new())
            }
            Message::AckJoin(ack) => {
                if self.state.phase != GamePhase::Lobby || self.state.config.is_some() {
                    return Err(GameError::violation("ACK_JOIN after the match was configured"));
                }

                tracing::info!("Joined {}'s match", ack.host_name);
                Ok(vec![Effect::View(ViewEvent::JoinAcknowledged {
                    host_name: ack.host_name,
                })])
            }
            Message::Welcome(welcome) => {
                if self.state.phase != GamePhase::Lobby {
                    return Err(GameError::violation("WELCOME after the match started"));
                }

                let config = GameConfig::new(welcome.rounds, welcome.category);
                tracing::info!(
                    "Match configured: {} rounds, category '{}'",
                    config.total_rounds,
                    config.category
                );
                self.state.config = Some(config.clone());
                self.state.opponent = Some(Participant::new(
                    Role::Host,
                    welcome.host_name,
                    welcome.host_avatar,
                ));
                Ok(vec![Effect::View(ViewEvent::MatchConfigured(config))])
            }
            Message::StateUpdate(StateUpdate::LiveBidUpdate { bid_value }) => {
                let view = phase::record_opponent_bid(&mut self.state, bid_value, false)?;
                Ok(vec![Effect::View(view)])
            }
            Message::StateUpdate(StateUpdate::OpponentLockedBid { bid_value }) => {
                let view = phase::record_opponent_bid(&mut self.state, bid_value, true)?;
                Ok(vec![Effect::View(view)])
            }
            Message::StateUpdate(StateUpdate::ClientAnswer { .. }) => {
                Err(GameError::violation("CLIENT_ANSWER sent to the client"))
            }
            Message::StateUpdate(update) => Ok(phase::apply_broadcast(&mut self.state, &update)?
                .into_iter()
                .map(Effect::View)
                .collect()),
            Message::Unrecognized { kind, reason } => Err(GameError::violation(format!(
                "unrecognized {} ({})",
                kind, reason
            ))),
        }
    }
}

impl Controller for ClientController {
    fn role(&self) -> Role {
        Role::Client
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
            UserAction::AdjustBid(bid) => controller::adjust_bid(&mut self.state, bid),
            UserAction::LockBid => controller::lock_bid(&mut self.state),
            UserAction::SubmitAnswer(submission) => {
                phase::check_answer_allowed(&self.state, Role::Client)?;
                self.state.round.answer_submitted = true;
                Ok(vec![Effect::Send(
                    StateUpdate::ClientAnswer {
                        answer_index: submission.to_wire(),
                    }
                    .into(),
                )])
            }
            UserAction::StartGame | UserAction::NextRound => Err(GameError::not_permitted(
                "only the host moves the match forward",
            )),
        }
    }

    fn on_timer_tick(&mut self, epoch: u64) -> Vec<Effect> {
        tracing::debug!("Client ignores timer tick {}", epoch);
        Vec::new()
    }

    fn on_disconnect(&mut self) -> Vec<Effect> {
        controller::close_link(&mut self.state).into_iter().collect()
    }
}
