use crate::arbitration::Submission;
use crate::error::{GameError, Result};
use crate::message::{Hello, Message, StateUpdate};
use crate::phase;
use crate::state::{GameState, LinkStatus};
use crate::view::ViewEvent;
use quizduel_core::Role;

/// Something the runtime must do on behalf of a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(Message),
    StartTimer { epoch: u64, seconds: u32 },
    CancelTimer,
    View(ViewEvent),
}

/// Input coming from the local player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    StartGame,
    AdjustBid(u32),
    LockBid,
    SubmitAnswer(Submission),
    NextRound,
}

/// One side of the match. Implementations never perform I/O; they mutate
/// their own state and describe the consequences as [`Effect`]s.
pub trait Controller: Send {
    fn role(&self) -> Role;

    fn state(&self) -> &GameState;

    /// The link to the peer is up
    fn on_open(&mut self, peer: &str) -> Vec<Effect>;

    /// Peer messages are handled best-effort and never fail
    fn on_message(&mut self, message: Message) -> Vec<Effect>;

    fn on_user_action(&mut self, action: UserAction) -> Result<Vec<Effect>>;

    /// Countdown tick. Only the host keeps time.
    fn on_timer_tick(&mut self, epoch: u64) -> Vec<Effect>;

    /// The link is gone for good. Reported at most once.
    fn on_disconnect(&mut self) -> Vec<Effect>;
}

pub(crate) fn open_link(state: &mut GameState, peer: &str) -> Vec<Effect> {
    state.link = LinkStatus::Open;
    tracing::info!("Match {}: link to {} open", state.match_id, peer);

    vec![
        Effect::View(ViewEvent::LinkOpened {
            peer: peer.to_string(),
        }),
        Effect::Send(Message::Hello(Hello {
            name: state.me.display_name.clone(),
            avatar: state.me.avatar_seed.clone(),
        })),
    ]
}

/// Marks the link closed. `None` when it already was.
pub(crate) fn close_link(state: &mut GameState) -> Option<Effect> {
    if state.link == LinkStatus::Closed {
        return None;
    }

    state.link = LinkStatus::Closed;
    tracing::warn!(
        "Match {}: connection lost during {:?}",
        state.match_id,
        state.phase
    );
    Some(Effect::View(ViewEvent::Disconnected))
}

pub(crate) fn ensure_connected(state: &GameState) -> Result<()> {
    match state.link {
        LinkStatus::Open => Ok(()),
        LinkStatus::Connecting => Err(GameError::not_permitted("the link to the peer is not open yet")),
        LinkStatus::Closed => Err(GameError::TransportClosed),
    }
}

pub(crate) fn adjust_bid(state: &mut GameState, bid: u32) -> Result<Vec<Effect>> {
    let bid = phase::adjust_own_bid(state, bid)?;

    Ok(vec![
        Effect::Send(StateUpdate::LiveBidUpdate { bid_value: bid }.into()),
        Effect::View(ViewEvent::BidAdjusted(bid)),
    ])
}

pub(crate) fn lock_bid(state: &mut GameState) -> Result<Vec<Effect>> {
    let bid = phase::lock_own_bid(state)?;

    Ok(vec![
        Effect::Send(StateUpdate::OpponentLockedBid { bid_value: bid }.into()),
        Effect::View(ViewEvent::BidLocked(bid)),
    ])
}

/// Log and drop a peer message that could not be applied
pub(crate) fn ignore(state: &GameState, what: &str, err: GameError) -> Vec<Effect> {
    tracing::debug!(
        "Match {} ({}): ignoring {}: {}",
        state.match_id,
        state.me.role,
        what,
        err
    );
    Vec::new()
}
