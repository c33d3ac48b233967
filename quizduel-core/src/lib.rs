//! quizduel core - shared building blocks for the two-player bidding quiz
//!
//! Domain types both peers agree on, match configuration, the question bank
//! and the transport abstraction the game protocol runs over.

pub mod bank;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use bank::QuestionBank;
pub use config::{BidLimits, MatchConfig};
pub use error::{QuizduelError, Result};
pub use transport::{MemoryTransport, TcpTransport, Transport};
pub use types::{random_avatar_seed, GameConfig, Outcome, Participant, Question, Role};
