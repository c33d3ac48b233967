use crate::state::ScoreBoard;
use quizduel_core::{GameConfig, Outcome, Participant, Question, Role};

/// What the rendering layer needs to know after each handled event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    LinkOpened { peer: String },
    OpponentJoined(Participant),
    JoinAcknowledged { host_name: String },
    MatchConfigured(GameConfig),
    BiddingOpened {
        round: u32,
        total_rounds: u32,
        scores: ScoreBoard,
    },
    BidAdjusted(u32),
    BidLocked(u32),
    OpponentBidChanged(u32),
    OpponentBidLocked(u32),
    ExecutionStarted {
        active_player: Role,
        my_turn: bool,
        question: Question,
        time: u32,
    },
    TimerUpdated(u32),
    RoundFinished(RoundSummary),
    MatchFinished {
        outcome: Outcome,
        scores: ScoreBoard,
    },
    /// A local action was refused; the match carries on
    ActionRejected(String),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub correct: bool,
    pub points: u32,
    pub correct_text: String,
    pub active_player: Role,
    pub scores: ScoreBoard,
}
