//! Async runtime around a [`Controller`].
//!
//! A session owns the transport, the ticker task and the controller. It
//! multiplexes peer frames, local actions and timer ticks into one event
//! loop, so the controller only ever sees one input at a time and never
//! needs a lock.

use crate::controller::{Controller, Effect, UserAction};
use crate::error::{GameError, Result};
use crate::message::Message;
use crate::state::GameState;
use crate::timer::Ticker;
use crate::view::ViewEvent;
use quizduel_core::Transport;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum Event {
    Frame(Option<quizduel_core::Result<String>>),
    Action(Option<UserAction>),
    Tick(u64),
}

pub struct Session<C, T> {
    controller: C,
    transport: T,
    tick_interval: Duration,
    ticker: Ticker,
}

impl<C: Controller, T: Transport> Session<C, T> {
    pub fn new(controller: C, transport: T, tick_interval: Duration) -> Self {
        Self {
            controller,
            transport,
            tick_interval,
            ticker: Ticker::new(),
        }
    }

    /// Drive the match until the link closes. Dropping the `actions` sender
    /// ends the session. Returns the final local state.
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<UserAction>,
        views: mpsc::UnboundedSender<ViewEvent>,
    ) -> GameState {
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();

        let peer = self.transport.peer_id().to_string();
        let effects = self.controller.on_open(&peer);
        self.apply(effects, &views, &tick_tx).await;

        while !self.controller.state().is_disconnected() {
            let event = tokio::select! {
                frame = self.transport.recv() => Event::Frame(frame),
                action = actions.recv() => Event::Action(action),
                Some(epoch) = tick_rx.recv() => Event::Tick(epoch),
            };

            let effects = match event {
                Event::Frame(Some(Ok(frame))) => match Message::decode(&frame) {
                    Ok(message) => self.controller.on_message(message),
                    Err(e) => {
                        tracing::warn!("Dropping malformed frame from {}: {}", peer, e);
                        Vec::new()
                    }
                },
                Event::Frame(Some(Err(e))) => {
                    tracing::warn!("Link to {} failed: {}", peer, e);
                    self.controller.on_disconnect()
                }
                Event::Frame(None) => {
                    tracing::info!("{} closed the link", peer);
                    self.controller.on_disconnect()
                }
                Event::Action(Some(action)) => match self.controller.on_user_action(action) {
                    Ok(effects) => effects,
                    Err(e) => {
                        tracing::debug!("Rejected {:?}: {}", action, e);
                        vec![Effect::View(ViewEvent::ActionRejected(e.to_string()))]
                    }
                },
                Event::Action(None) => {
                    tracing::info!("Local player left; closing link to {}", peer);
                    if let Err(e) = self.transport.close().await {
                        tracing::debug!("Error closing link: {}", e);
                    }
                    self.controller.on_disconnect()
                }
                Event::Tick(epoch) => self.controller.on_timer_tick(epoch),
            };

            self.apply(effects, &views, &tick_tx).await;
        }

        self.ticker.cancel();
        if let Err(e) = self.transport.close().await {
            tracing::debug!("Error closing link: {}", e);
        }
        self.controller.state().clone()
    }

    async fn apply(
        &mut self,
        effects: Vec<Effect>,
        views: &mpsc::UnboundedSender<ViewEvent>,
        tick_tx: &mpsc::UnboundedSender<u64>,
    ) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send(message) => {
                    if self.controller.state().is_disconnected() {
                        continue;
                    }

                    let frame = match message.encode() {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::error!("Failed to encode {}: {}", message.kind(), e);
                            continue;
                        }
                    };

                    tracing::trace!("-> {}", frame);
                    if let Err(e) = self.transport.send(frame).await {
                        tracing::warn!("Send failed: {}", e);
                        queue.extend(self.controller.on_disconnect());
                    }
                }
                Effect::StartTimer { epoch, seconds } => {
                    self.ticker
                        .start(epoch, seconds, self.tick_interval, tick_tx.clone());
                }
                Effect::CancelTimer => {
                    self.ticker.cancel();
                }
                Effect::View(view) => {
                    if views.send(view).is_err() {
                        tracing::debug!("View receiver dropped");
                    }
                }
            }
        }
    }
}

/// Handle to a session running on its own task
pub struct SessionHandle {
    actions: mpsc::UnboundedSender<UserAction>,
    views: mpsc::UnboundedReceiver<ViewEvent>,
    task: JoinHandle<GameState>,
}

impl SessionHandle {
    pub fn act(&self, action: UserAction) -> Result<()> {
        self.actions
            .send(action)
            .map_err(|_| GameError::TransportClosed)
    }

    pub async fn next_view(&mut self) -> Option<ViewEvent> {
        self.views.recv().await
    }

    /// Split into the action sender, the view stream and the task. Dropping
    /// the sender ends the session.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<UserAction>,
        mpsc::UnboundedReceiver<ViewEvent>,
        JoinHandle<GameState>,
    ) {
        (self.actions, self.views, self.task)
    }

    /// Leave the match and wait for the session to wind down
    pub async fn finish(self) -> Result<GameState> {
        let SessionHandle { actions, views, task } = self;
        drop(actions);
        drop(views);
        task.await
            .map_err(|e| GameError::Internal(format!("session task failed: {}", e)))
    }
}

pub fn spawn<C, T>(controller: C, transport: T, tick_interval: Duration) -> SessionHandle
where
    C: Controller + 'static,
    T: Transport,
{
    let (action_tx, action_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = mpsc::unbounded_channel();

    let session = Session::new(controller, transport, tick_interval);
    let task = tokio::spawn(session.run(action_rx, view_tx));

    SessionHandle {
        actions: action_tx,
        views: view_rx,
        task,
    }
}
