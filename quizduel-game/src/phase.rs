//! Phase state machine and the reconciliation both peers run.
//!
//! The host applies its own broadcasts through [`apply_broadcast`] exactly
//! like the client does when they arrive, so both replicas are derived from
//! the same payloads. Every handler is idempotent: a repeated or late update
//! may refresh mirrored fields (scores, timer) but never re-runs a transition.

use crate::error::{GameError, Result};
use crate::message::{screen, BiddingScreen, GameOver, RoundResult, StartExecution, StateUpdate};
use crate::state::{GameState, RoundState, ScoreBoard};
use crate::view::{RoundSummary, ViewEvent};
use chrono::Utc;
use quizduel_core::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Lobby,
    Bidding,
    Execution,
    RoundResult,
    GameOver,
}

impl GamePhase {
    pub fn can_advance_to(self, next: GamePhase) -> bool {
        use GamePhase::*;

        matches!(
            (self, next),
            (Lobby, Bidding)
                | (Bidding, Bidding)
                | (Bidding, Execution)
                | (Bidding, GameOver)
                | (Execution, RoundResult)
                | (RoundResult, Bidding)
                | (RoundResult, GameOver)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == GamePhase::GameOver
    }

    pub fn screen(self) -> &'static str {
        match self {
            GamePhase::Lobby => screen::LOBBY,
            GamePhase::Bidding => screen::BIDDING,
            GamePhase::Execution => screen::EXECUTION,
            GamePhase::RoundResult => screen::ROUND_RESULT,
            GamePhase::GameOver => screen::FINAL_RESULTS,
        }
    }
}

fn advance(state: &mut GameState, next: GamePhase) -> Result<()> {
    let from = state.phase;
    if !from.can_advance_to(next) {
        return Err(GameError::IllegalTransition { from, to: next });
    }

    state.phase = next;
    tracing::info!(
        "Match {} ({}): {:?} -> {:?}",
        state.match_id,
        state.me.role,
        from,
        next
    );
    Ok(())
}

/// Apply a host-originated update (bidding, execution, tick, result, game over)
pub fn apply_broadcast(state: &mut GameState, update: &StateUpdate) -> Result<Vec<ViewEvent>> {
    match update {
        StateUpdate::BiddingScreen(bidding) => enter_bidding(state, bidding),
        StateUpdate::StartExecution(start) => enter_execution(state, start),
        StateUpdate::TimerTick { time } => mirror_tick(state, *time),
        StateUpdate::RoundResult(result) => enter_round_result(state, result),
        StateUpdate::GameOver(over) => enter_game_over(state, over),
        StateUpdate::LiveBidUpdate { .. }
        | StateUpdate::OpponentLockedBid { .. }
        | StateUpdate::ClientAnswer { .. } => Err(GameError::violation(format!(
            "{} is a player action, not a host broadcast",
            update.name()
        ))),
    }
}

fn enter_bidding(state: &mut GameState, update: &BiddingScreen) -> Result<Vec<ViewEvent>> {
    let current = state.round.round_number;

    match state.phase {
        GamePhase::Bidding if update.round == current => {
            // re-entry for the round already open: refresh mirrors only
            state.scores.mirror(update.host_score, update.client_score);
            return Ok(Vec::new());
        }
        GamePhase::Bidding => {
            return Err(GameError::violation(format!(
                "bidding for round {} while round {} is open",
                update.round, current
            )));
        }
        GamePhase::Lobby if update.round != 1 => {
            return Err(GameError::violation(format!(
                "first bidding round must be 1, got {}",
                update.round
            )));
        }
        GamePhase::RoundResult if update.round != current + 1 => {
            state.scores.mirror(update.host_score, update.client_score);
            return Err(GameError::violation(format!(
                "bidding for round {} after round {}",
                update.round, current
            )));
        }
        _ => {}
    }

    if let Some(total) = state.total_rounds() {
        if update.round > total {
            return Err(GameError::violation(format!(
                "round {} exceeds the {} configured rounds",
                update.round, total
            )));
        }
    }

    let from_lobby = state.phase == GamePhase::Lobby;
    advance(state, GamePhase::Bidding)?;

    if from_lobby {
        state.scores = ScoreBoard::default();
        state.started_at = Some(Utc::now());
    }
    state.round = RoundState::new(update.round, state.bid_limits.default);
    state.scores.mirror(update.host_score, update.client_score);

    Ok(vec![ViewEvent::BiddingOpened {
        round: update.round,
        total_rounds: state.total_rounds().unwrap_or(update.round),
        scores: state.scores,
    }])
}

fn enter_execution(state: &mut GameState, start: &StartExecution) -> Result<Vec<ViewEvent>> {
    if state.phase == GamePhase::Execution {
        return Err(GameError::violation("round is already being played"));
    }

    advance(state, GamePhase::Execution)?;

    state.round.active_player = Some(start.active_player_role);
    state.round.question = Some(start.question.clone());
    state.round.time_remaining = start.bid_time;

    Ok(vec![ViewEvent::ExecutionStarted {
        active_player: start.active_player_role,
        my_turn: state.is_my_turn(),
        question: start.question.clone(),
        time: start.bid_time,
    }])
}

fn mirror_tick(state: &mut GameState, time: u32) -> Result<Vec<ViewEvent>> {
    if state.phase != GamePhase::Execution || state.round.resolved {
        return Err(GameError::violation(format!(
            "timer tick {} outside of a running round",
            time
        )));
    }

    // the countdown only moves down; an equal or higher value is a replay
    if time >= state.round.time_remaining {
        return Ok(Vec::new());
    }

    state.round.time_remaining = time;
    Ok(vec![ViewEvent::TimerUpdated(time)])
}

fn enter_round_result(state: &mut GameState, result: &RoundResult) -> Result<Vec<ViewEvent>> {
    state.scores.mirror(result.host_score, result.client_score);

    if state.phase == GamePhase::RoundResult {
        return Ok(Vec::new());
    }

    advance(state, GamePhase::RoundResult)?;

    state.round.resolved = true;
    state.round.active_player = Some(result.active_player_role);

    Ok(vec![ViewEvent::RoundFinished(RoundSummary {
        round: state.round.round_number,
        correct: result.correct,
        points: result.points,
        correct_text: result.correct_text.clone(),
        active_player: result.active_player_role,
        scores: state.scores,
    })])
}

fn enter_game_over(state: &mut GameState, over: &GameOver) -> Result<Vec<ViewEvent>> {
    state.scores.mirror(over.host_score, over.client_score);

    if state.phase == GamePhase::GameOver {
        return Ok(Vec::new());
    }

    advance(state, GamePhase::GameOver)?;

    state.outcome = Some(over.winner_role);
    state.finished_at = Some(Utc::now());

    Ok(vec![ViewEvent::MatchFinished {
        outcome: over.winner_role,
        scores: state.scores,
    }])
}

/// Move the local player's bid slider. Returns the clamped value.
pub fn adjust_own_bid(state: &mut GameState, bid: u32) -> Result<u32> {
    if state.phase != GamePhase::Bidding {
        return Err(GameError::WrongPhase(state.phase));
    }
    if state.round.my_bid_locked {
        return Err(GameError::not_permitted("bid is already locked"));
    }

    state.round.my_bid = state.bid_limits.clamp(bid);
    Ok(state.round.my_bid)
}

/// Lock the local player's bid. Returns the locked value.
pub fn lock_own_bid(state: &mut GameState) -> Result<u32> {
    if state.phase != GamePhase::Bidding {
        return Err(GameError::WrongPhase(state.phase));
    }
    if state.round.my_bid_locked {
        return Err(GameError::not_permitted("bid is already locked"));
    }

    state.round.my_bid_locked = true;
    tracing::info!(
        "{} locked bid {} for round {}",
        state.me.role,
        state.round.my_bid,
        state.round.round_number
    );
    Ok(state.round.my_bid)
}

/// Record a bid reported by the peer, live (`locked == false`) or final
pub fn record_opponent_bid(state: &mut GameState, bid: u32, locked: bool) -> Result<ViewEvent> {
    if state.phase != GamePhase::Bidding {
        return Err(GameError::violation(format!(
            "opponent bid {} outside of bidding",
            bid
        )));
    }
    if state.round.opponent_bid_locked {
        return Err(GameError::violation("opponent bid is already locked"));
    }

    let bid = state.bid_limits.clamp(bid);
    state.round.opponent_bid = bid;

    if locked {
        state.round.opponent_bid_locked = true;
        Ok(ViewEvent::OpponentBidLocked(bid))
    } else {
        Ok(ViewEvent::OpponentBidChanged(bid))
    }
}

/// Gate for an answer from `role`: only the active side, once, while the
/// round is running
pub fn check_answer_allowed(state: &GameState, role: Role) -> Result<()> {
    if state.phase != GamePhase::Execution || state.round.resolved {
        return Err(GameError::WrongPhase(state.phase));
    }
    if state.round.active_player != Some(role) {
        return Err(GameError::not_permitted(format!(
            "{} is not answering this round",
            role
        )));
    }
    if state.round.answer_submitted {
        return Err(GameError::not_permitted("answer already submitted"));
    }
    Ok(())
}
