use crate::phase::GamePhase;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Core error: {0}")]
    Core(#[from] quizduel_core::QuizduelError),

    /// A peer message that does not fit the current phase. Dropped, never fatal.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Action not permitted: {0}")]
    NotPermitted(String),

    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: GamePhase, to: GamePhase },

    #[error("Not allowed during {0:?}")]
    WrongPhase(GamePhase),

    #[error("Opponent has not joined yet")]
    OpponentMissing,

    #[error("Connection to the other player was lost")]
    TransportClosed,

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn violation(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    pub fn not_permitted(msg: impl Into<String>) -> Self {
        Self::NotPermitted(msg.into())
    }
}
