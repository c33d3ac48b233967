use crate::error::{QuizduelError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the link a peer plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn opponent(self) -> Self {
        match self {
            Role::Host => Role::Client,
            Role::Client => Role::Host,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two players. Immutable once the handshake is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub role: Role,
    pub display_name: String,
    pub avatar_seed: String,
}

impl Participant {
    pub fn new(role: Role, display_name: impl Into<String>, avatar_seed: impl Into<String>) -> Self {
        Self {
            role,
            display_name: display_name.into(),
            avatar_seed: avatar_seed.into(),
        }
    }

    /// Participant with a freshly rolled avatar seed
    pub fn with_random_avatar(role: Role, display_name: impl Into<String>) -> Self {
        Self::new(role, display_name, random_avatar_seed())
    }

    /// Trimmed display name. Nobody can host or join without one.
    pub fn validate_name(display_name: &str) -> Result<String> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(QuizduelError::config("Display name cannot be empty"));
        }
        Ok(name.to_string())
    }
}

/// Avatar seeds are `seed0` .. `seed999`; only the renderer interprets them
pub fn random_avatar_seed() -> String {
    format!("seed{}", rand::thread_rng().gen_range(0..1000))
}

/// Match settings chosen by the host before the game starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub total_rounds: u32,
    pub category: String,
}

impl GameConfig {
    pub const ALL_CATEGORIES: &'static str = "all";

    pub fn new(total_rounds: u32, category: impl Into<String>) -> Self {
        Self {
            total_rounds,
            category: category.into(),
        }
    }

    pub fn accepts_category(&self, category: &str) -> bool {
        self.category == Self::ALL_CATEGORIES || self.category == category
    }
}

/// A multiple-choice question as stored in the bank and sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub category: String,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(rename = "answers")]
    pub answer_options: Vec<String>,
    #[serde(rename = "correct")]
    pub correct_option_index: usize,
}

impl Question {
    pub fn correct_text(&self) -> &str {
        self.answer_options
            .get(self.correct_option_index)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_well_formed(&self) -> bool {
        !self.prompt.trim().is_empty()
            && self.answer_options.len() >= 2
            && self.correct_option_index < self.answer_options.len()
    }
}

/// Final verdict of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Host,
    Client,
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Role> {
        match self {
            Outcome::Host => Some(Role::Host),
            Outcome::Client => Some(Role::Client),
            Outcome::Draw => None,
        }
    }
}

impl From<Role> for Outcome {
    fn from(role: Role) -> Self {
        match role {
            Role::Host => Outcome::Host,
            Role::Client => Outcome::Client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
        assert_eq!(Role::Client.opponent(), Role::Host);
        assert_eq!(
            serde_json::to_string(&Outcome::Draw).unwrap(),
            "\"draw\""
        );
    }

    #[test]
    fn test_question_uses_bank_field_names() {
        let json = r#"{"category":"science","question":"H2O is?","answers":["Water","Salt"],"correct":0}"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.prompt, "H2O is?");
        assert_eq!(question.correct_text(), "Water");
        assert!(question.is_well_formed());
    }

    #[test]
    fn test_avatar_seed_shape() {
        let p = Participant::with_random_avatar(Role::Client, "Sam");
        let n: u32 = p.avatar_seed.trim_start_matches("seed").parse().unwrap();
        assert!(n < 1000);
    }

    #[test]
    fn test_blank_display_name_rejected() {
        assert_eq!(Participant::validate_name("  Ana ").unwrap(), "Ana");
        assert!(matches!(
            Participant::validate_name(""),
            Err(QuizduelError::Config(_))
        ));
        assert!(Participant::validate_name(" \t ").is_err());
    }

    #[test]
    fn test_category_filter() {
        let all = GameConfig::new(3, "all");
        let science = GameConfig::new(3, "science");
        assert!(all.accepts_category("history"));
        assert!(science.accepts_category("science"));
        assert!(!science.accepts_category("history"));
    }
}
