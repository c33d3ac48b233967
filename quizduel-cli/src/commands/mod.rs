pub mod bank;
pub mod play;

pub use bank::{handle_bank_command, BankCommands};
pub use play::{host_match, join_match, HostOptions};

use quizduel_core::{QuestionBank, Result};
use std::path::Path;

/// Questions from `path`, or the bundled sample bank
pub async fn load_bank(path: Option<&Path>) -> Result<QuestionBank> {
    match path {
        Some(path) => QuestionBank::load(path).await,
        None => QuestionBank::bundled(),
    }
}
