//! Wire format shared by both peers.
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": {...}}`. Decoding
//! an envelope never fails on content: anything we do not understand becomes
//! [`Message::Unrecognized`] and is dropped by the controllers.

use crate::error::Result;
use quizduel_core::{Outcome, Question, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope `type` values
pub mod kind {
    pub const HELLO: &str = "HELLO";
    pub const ACK_JOIN: &str = "ACK_JOIN";
    pub const WELCOME: &str = "WELCOME";
    pub const STATE_UPDATE: &str = "STATE_UPDATE";
}

/// View selector tokens carried in payloads. Opaque to the game logic apart
/// from equality checks.
pub mod screen {
    pub const LOBBY: &str = "lobby-screen";
    pub const BIDDING: &str = "bidding-screen";
    pub const EXECUTION: &str = "execution-screen";
    pub const ROUND_RESULT: &str = "round-result-screen";
    pub const FINAL_RESULTS: &str = "final-results-screen";
}

/// `answerIndex` value meaning "no answer" (timeout)
pub const NO_ANSWER: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl Envelope {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Fails only on malformed frames (bad JSON, missing `type`/`payload`)
    pub fn decode(frame: &str) -> Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckJoin {
    pub host_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    pub rounds: u32,
    pub category: String,
    pub host_name: String,
    pub host_avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiddingScreen {
    pub screen: String,
    pub round: u32,
    pub host_score: u32,
    pub client_score: u32,
}

impl BiddingScreen {
    pub fn new(round: u32, host_score: u32, client_score: u32) -> Self {
        Self {
            screen: screen::BIDDING.to_string(),
            round,
            host_score,
            client_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExecution {
    pub active_player_role: Role,
    pub question: Question,
    pub bid_time: u32,
    pub screen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub correct: bool,
    pub points: u32,
    pub correct_text: String,
    pub active_player_role: Role,
    pub host_score: u32,
    pub client_score: u32,
    pub screen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOver {
    pub winner_role: Outcome,
    pub host_score: u32,
    pub client_score: u32,
    pub screen: String,
}

/// Payloads of `STATE_UPDATE` frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    LiveBidUpdate { bid_value: u32 },
    OpponentLockedBid { bid_value: u32 },
    BiddingScreen(BiddingScreen),
    StartExecution(StartExecution),
    TimerTick { time: u32 },
    ClientAnswer { answer_index: i32 },
    RoundResult(RoundResult),
    GameOver(GameOver),
}

/// Event-tagged half of `STATE_UPDATE`; the bidding update carries no event
#[derive(Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
enum TaggedEvent {
    LiveBidUpdate {
        #[serde(rename = "bidValue")]
        bid_value: u32,
    },
    OpponentLockedBid {
        #[serde(rename = "bidValue")]
        bid_value: u32,
    },
    StartExecution(StartExecution),
    TimerTick {
        time: u32,
    },
    ClientAnswer {
        #[serde(rename = "answerIndex")]
        answer_index: i32,
    },
    RoundResult(RoundResult),
    GameOver(GameOver),
}

impl StateUpdate {
    /// Name used in logs: the event tag, or the screen for event-less updates
    pub fn name(&self) -> &'static str {
        match self {
            StateUpdate::LiveBidUpdate { .. } => "LIVE_BID_UPDATE",
            StateUpdate::OpponentLockedBid { .. } => "OPPONENT_LOCKED_BID",
            StateUpdate::BiddingScreen(_) => screen::BIDDING,
            StateUpdate::StartExecution(_) => "START_EXECUTION",
            StateUpdate::TimerTick { .. } => "TIMER_TICK",
            StateUpdate::ClientAnswer { .. } => "CLIENT_ANSWER",
            StateUpdate::RoundResult(_) => "ROUND_RESULT",
            StateUpdate::GameOver(_) => "GAME_OVER",
        }
    }

    fn to_payload(&self) -> Result<Value> {
        let tagged = match self.clone() {
            StateUpdate::BiddingScreen(bidding) => return Ok(serde_json::to_value(bidding)?),
            StateUpdate::LiveBidUpdate { bid_value } => TaggedEvent::LiveBidUpdate { bid_value },
            StateUpdate::OpponentLockedBid { bid_value } => {
                TaggedEvent::OpponentLockedBid { bid_value }
            }
            StateUpdate::StartExecution(start) => TaggedEvent::StartExecution(start),
            StateUpdate::TimerTick { time } => TaggedEvent::TimerTick { time },
            StateUpdate::ClientAnswer { answer_index } => TaggedEvent::ClientAnswer { answer_index },
            StateUpdate::RoundResult(result) => TaggedEvent::RoundResult(result),
            StateUpdate::GameOver(over) => TaggedEvent::GameOver(over),
        };
        Ok(serde_json::to_value(tagged)?)
    }

    fn from_payload(payload: Value) -> std::result::Result<Self, String> {
        if payload.get("event").is_some() {
            let tagged: TaggedEvent =
                serde_json::from_value(payload).map_err(|e| e.to_string())?;
            return Ok(match tagged {
                TaggedEvent::LiveBidUpdate { bid_value } => StateUpdate::LiveBidUpdate { bid_value },
                TaggedEvent::OpponentLockedBid { bid_value } => {
                    StateUpdate::OpponentLockedBid { bid_value }
                }
                TaggedEvent::StartExecution(start) => StateUpdate::StartExecution(start),
                TaggedEvent::TimerTick { time } => StateUpdate::TimerTick { time },
                TaggedEvent::ClientAnswer { answer_index } => {
                    StateUpdate::ClientAnswer { answer_index }
                }
                TaggedEvent::RoundResult(result) => StateUpdate::RoundResult(result),
                TaggedEvent::GameOver(over) => StateUpdate::GameOver(over),
            });
        }

        let screen_token = payload
            .get("screen")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match screen_token.as_deref() {
            Some(screen::BIDDING) => serde_json::from_value(payload)
                .map(StateUpdate::BiddingScreen)
                .map_err(|e| e.to_string()),
            Some(other) => Err(format!("no handler for screen {}", other)),
            None => Err("state update without event or screen".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Hello(Hello),
    AckJoin(AckJoin),
    Welcome(Welcome),
    StateUpdate(StateUpdate),
    /// Unknown type, unknown event or a payload of the wrong shape
    Unrecognized { kind: String, reason: String },
}

impl Message {
    pub fn kind(&self) -> &str {
        match self {
            Message::Hello(_) => kind::HELLO,
            Message::AckJoin(_) => kind::ACK_JOIN,
            Message::Welcome(_) => kind::WELCOME,
            Message::StateUpdate(_) => kind::STATE_UPDATE,
            Message::Unrecognized { kind, .. } => kind,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope> {
        let payload = match self {
            Message::Hello(hello) => serde_json::to_value(hello)?,
            Message::AckJoin(ack) => serde_json::to_value(ack)?,
            Message::Welcome(welcome) => serde_json::to_value(welcome)?,
            Message::StateUpdate(update) => update.to_payload()?,
            Message::Unrecognized { .. } => Value::Object(Default::default()),
        };

        Ok(Envelope {
            kind: self.kind().to_string(),
            payload,
        })
    }

    pub fn from_envelope(envelope: Envelope) -> Self {
        let Envelope { kind, payload } = envelope;

        let decoded = match kind.as_str() {
            kind::HELLO => serde_json::from_value(payload)
                .map(Message::Hello)
                .map_err(|e| e.to_string()),
            kind::ACK_JOIN => serde_json::from_value(payload)
                .map(Message::AckJoin)
                .map_err(|e| e.to_string()),
            kind::WELCOME => serde_json::from_value(payload)
                .map(Message::Welcome)
                .map_err(|e| e.to_string()),
            kind::STATE_UPDATE => StateUpdate::from_payload(payload).map(Message::StateUpdate),
            _ => Err("unknown message type".to_string()),
        };

        decoded.unwrap_or_else(|reason| Message::Unrecognized { kind, reason })
    }

    pub fn encode(&self) -> Result<String> {
        self.to_envelope()?.encode()
    }

    pub fn decode(frame: &str) -> Result<Self> {
        Ok(Self::from_envelope(Envelope::decode(frame)?))
    }
}

impl From<StateUpdate> for Message {
    fn from(update: StateUpdate) -> Self {
        Message::StateUpdate(update)
    }
}
