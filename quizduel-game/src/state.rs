use crate::phase::GamePhase;
use chrono::{DateTime, Utc};
use quizduel_core::{BidLimits, GameConfig, Outcome, Participant, Question, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Running totals. Only the host credits points; the client mirrors them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub host_score: u32,
    pub client_score: u32,
}

impl ScoreBoard {
    pub fn new(host_score: u32, client_score: u32) -> Self {
        Self {
            host_score,
            client_score,
        }
    }

    pub fn get(&self, role: Role) -> u32 {
        match role {
            Role::Host => self.host_score,
            Role::Client => self.client_score,
        }
    }

    /// Scores never go down
    pub fn credit(&mut self, role: Role, points: u32) {
        match role {
            Role::Host => self.host_score = self.host_score.saturating_add(points),
            Role::Client => self.client_score = self.client_score.saturating_add(points),
        }
    }

    /// Adopt host-reported totals. Lower values than what we hold are ignored,
    /// so replays and stale payloads cannot roll the board back.
    pub fn mirror(&mut self, host_score: u32, client_score: u32) -> bool {
        let before = *self;
        self.host_score = self.host_score.max(host_score);
        self.client_score = self.client_score.max(client_score);
        before != *self
    }
}

/// Per-round record, rebuilt every time bidding opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub round_number: u32,
    pub my_bid: u32,
    pub opponent_bid: u32,
    pub my_bid_locked: bool,
    pub opponent_bid_locked: bool,
    pub active_player: Option<Role>,
    pub question: Option<Question>,
    pub time_remaining: u32,
    pub answer_submitted: bool,
    pub resolved: bool,
}

impl RoundState {
    pub fn new(round_number: u32, default_bid: u32) -> Self {
        Self {
            round_number,
            my_bid: default_bid,
            opponent_bid: default_bid,
            my_bid_locked: false,
            opponent_bid_locked: false,
            active_player: None,
            question: None,
            time_remaining: 0,
            answer_submitted: false,
            resolved: false,
        }
    }

    pub fn both_locked(&self) -> bool {
        self.my_bid_locked && self.opponent_bid_locked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    Connecting,
    Open,
    Closed,
}

/// Everything one side knows about the match. Each peer owns its own copy;
/// the protocol keeps the two converging.
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) match_id: Uuid,
    pub(crate) me: Participant,
    pub(crate) opponent: Option<Participant>,
    pub(crate) config: Option<GameConfig>,
    pub(crate) bid_limits: BidLimits,
    pub(crate) phase: GamePhase,
    pub(crate) round: RoundState,
    pub(crate) scores: ScoreBoard,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) link: LinkStatus,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) finished_at: Option<DateTime<Utc>>,
}

impl GameState {
    pub fn new(me: Participant, bid_limits: BidLimits) -> Self {
        Self {
            match_id: Uuid::new_v4(),
            me,
            opponent: None,
            config: None,
            bid_limits,
            phase: GamePhase::Lobby,
            round: RoundState::new(0, bid_limits.default),
            scores: ScoreBoard::default(),
            outcome: None,
            link: LinkStatus::Connecting,
            started_at: None,
            finished_at: None,
        }
    }

    /// Local identifier, only used to correlate log lines
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    pub fn me(&self) -> &Participant {
        &self.me
    }

    pub fn role(&self) -> Role {
        self.me.role
    }

    pub fn opponent(&self) -> Option<&Participant> {
        self.opponent.as_ref()
    }

    pub fn config(&self) -> Option<&GameConfig> {
        self.config.as_ref()
    }

    pub fn total_rounds(&self) -> Option<u32> {
        self.config.as_ref().map(|c| c.total_rounds)
    }

    pub fn bid_limits(&self) -> BidLimits {
        self.bid_limits
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn scores(&self) -> ScoreBoard {
        self.scores
    }

    pub fn my_score(&self) -> u32 {
        self.scores.get(self.me.role)
    }

    pub fn opponent_score(&self) -> u32 {
        self.scores.get(self.me.role.opponent())
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    pub fn is_disconnected(&self) -> bool {
        self.link == LinkStatus::Closed
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_my_turn(&self) -> bool {
        self.round.active_player == Some(self.me.role)
    }

    /// Bid of either side, addressed by role rather than by perspective
    pub fn bid_of(&self, role: Role) -> u32 {
        if role == self.me.role {
            self.round.my_bid
        } else {
            self.round.opponent_bid
        }
    }

    pub fn is_locked(&self, role: Role) -> bool {
        if role == self.me.role {
            self.round.my_bid_locked
        } else {
            self.round.opponent_bid_locked
        }
    }
}
