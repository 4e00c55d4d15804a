//! Session runner.
//!
//! One task owns the [`SessionController`] and serialises every command sent
//! to it over an mpsc channel. Teardown is signalled on a watch channel.
//! Timer ticks come from an interval and keep reaching the session clock
//! while a command waits on a store. A command whose store round-trip is
//! still pending when teardown arrives is dropped mid-flight, so its result
//! never reaches the controller.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::controller::SessionController;
use super::types::{SessionCommand, SessionError, SessionEvent, SessionSnapshot};
use crate::alerts::NotificationSink;
use crate::goals::ProposedGoal;
use crate::storage::{GoalStore, IdentityContext, LogStore};
use crate::timer::TimerKind;

/// Maximum queued commands before senders wait.
const COMMAND_CAPACITY: usize = 32;

/// Owns a controller and drives it from commands and the tick clock.
pub struct SessionRunner<G, L, I, N> {
    controller: SessionController<G, L, I, N>,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: watch::Receiver<bool>,
    tick_period: Duration,
}

/// Client side of a running session. Dropping it tears the session down.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    shutdown: watch::Sender<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl<G, L, I, N> SessionRunner<G, L, I, N>
where
    G: GoalStore,
    L: LogStore,
    I: IdentityContext,
    N: NotificationSink,
{
    /// Wrap `controller`, ticking its timers at the configured interval.
    pub fn from_settings(controller: SessionController<G, L, I, N>) -> (Self, SessionHandle) {
        let tick_period = controller.settings().tick_interval();
        Self::new(controller, tick_period)
    }

    /// Wrap `controller`, ticking its timers every `tick_period`.
    pub fn new(
        controller: SessionController<G, L, I, N>,
        tick_period: Duration,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = SessionHandle {
            commands: command_tx,
            shutdown: shutdown_tx,
            events: controller.event_sender(),
        };

        let runner = Self {
            controller,
            commands: command_rx,
            shutdown: shutdown_rx,
            tick_period: tick_period.max(Duration::from_millis(1)),
        };

        (runner, handle)
    }

    /// Process commands and ticks until shutdown or until every handle is
    /// gone. Returns the torn-down controller.
    pub async fn run(self) -> SessionController<G, L, I, N> {
        let SessionRunner {
            mut controller,
            mut commands,
            mut shutdown,
            tick_period,
        } = self;

        let clock = controller.clock();
        let mut ticker = time::interval_at(Instant::now() + tick_period, tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Session runner started (tick every {:?})", tick_period);

        'session: loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };

                    let in_flight = controller.handle(command);
                    tokio::pin!(in_flight);

                    loop {
                        tokio::select! {
                            biased;

                            _ = shutdown.changed() => {
                                tracing::info!("Discarding in-flight command on shutdown");
                                break 'session;
                            }
                            result = &mut in_flight => {
                                if let Err(e) = result {
                                    tracing::warn!("Session command failed: {}", e);
                                }
                                break;
                            }
                            _ = ticker.tick() => clock.tick(),
                        }
                    }
                }

                _ = ticker.tick() => controller.tick(),
            }
        }

        controller.teardown();
        tracing::info!("Session runner stopped");
        controller
    }
}

impl SessionHandle {
    /// Queue a command. Fails once the session is gone.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::TornDown)
    }

    /// Next-cycle proposals for the loaded cycle.
    pub async fn propose_next_cycle(&self) -> Result<Vec<ProposedGoal>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::ProposeNextCycle { reply }).await?;
        rx.await.map_err(|_| SessionError::TornDown)
    }

    pub async fn timer_remaining(&self, kind: TimerKind) -> Result<u32, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::TimerRemaining { kind, reply }).await?;
        rx.await.map_err(|_| SessionError::TornDown)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::TornDown)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Tear the session down. Any command still in flight is discarded.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
