//! Two-player bidding quiz over a peer-to-peer link.
//!
//! The host is authoritative: it resolves bids, runs the countdown, scores
//! answers and broadcasts every transition. The client forwards its own
//! inputs and mirrors the broadcasts. Both sides are sans-IO
//! [`Controller`]s; a [`Session`] connects one to a
//! [`Transport`](quizduel_core::Transport).

pub mod arbitration;
pub mod client;
pub mod controller;
pub mod error;
pub mod host;
pub mod message;
pub mod phase;
pub mod session;
pub mod state;
pub mod timer;
pub mod view;

pub use arbitration::{BidResolution, Submission, Verdict};
pub use client::ClientController;
pub use controller::{Controller, Effect, UserAction};
pub use error::{GameError, Result};
pub use host::HostController;
pub use message::{Envelope, Message, StateUpdate};
pub use phase::GamePhase;
pub use session::{spawn, Session, SessionHandle};
pub use state::{GameState, LinkStatus, RoundState, ScoreBoard};
pub use timer::{Countdown, TickOutcome, Ticker};
pub use view::{RoundSummary, ViewEvent};
