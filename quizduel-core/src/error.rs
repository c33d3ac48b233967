use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuizduelError>;

#[derive(Error, Debug)]
pub enum QuizduelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Question bank error: {0}")]
    Bank(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl QuizduelError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn bank(msg: impl Into<String>) -> Self {
        Self::Bank(msg.into())
    }

    pub fn dialog(msg: impl Into<String>) -> Self {
        Self::Dialog(msg.into())
    }
}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for QuizduelError {
    fn from(err: dialoguer::Error) -> Self {
        QuizduelError::Dialog(err.to_string())
    }
}
