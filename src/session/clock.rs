//! Session clock.
//!
//! The exercise and rest timers live behind a shared lock so the runner can
//! keep ticking them while the controller is waiting on a store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

use super::types::SessionEvent;
use crate::alerts::{Notification, NotificationSink};
use crate::timer::{CountdownTimer, TimerEvent, TimerKind, TimerState};

#[derive(Debug, Default)]
struct Timers {
    exercise: CountdownTimer,
    rest: CountdownTimer,
}

impl Timers {
    fn get_mut(&mut self, kind: TimerKind) -> &mut CountdownTimer {
        match kind {
            TimerKind::Exercise => &mut self.exercise,
            TimerKind::Rest => &mut self.rest,
        }
    }
}

/// Both session timers plus the channels their ticks are reported on.
pub struct SessionClock<N> {
    timers: Arc<Mutex<Timers>>,
    events: broadcast::Sender<SessionEvent>,
    notifier: Arc<N>,
}

impl<N> Clone for SessionClock<N> {
    fn clone(&self) -> Self {
        Self {
            timers: self.timers.clone(),
            events: self.events.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<N: NotificationSink> SessionClock<N> {
    pub(crate) fn new(events: broadcast::Sender<SessionEvent>, notifier: Arc<N>) -> Self {
        Self {
            timers: Arc::new(Mutex::new(Timers::default())),
            events,
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timers> {
        // Timer state stays consistent even if a holder panicked
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against one timer.
    pub(crate) fn with<R>(&self, kind: TimerKind, f: impl FnOnce(&mut CountdownTimer) -> R) -> R {
        f(self.lock().get_mut(kind))
    }

    pub fn remaining(&self, kind: TimerKind) -> u32 {
        self.with(kind, |timer| timer.get_remaining())
    }

    pub fn state(&self, kind: TimerKind) -> TimerState {
        self.with(kind, |timer| timer.state())
    }

    /// Advance both timers by one second, reporting ticks and completions.
    pub fn tick(&self) {
        let results = {
            let mut timers = self.lock();
            [
                (TimerKind::Exercise, timers.exercise.tick()),
                (TimerKind::Rest, timers.rest.tick()),
            ]
        };

        for (kind, event) in results {
            match event {
                Some(TimerEvent::Ticked { remaining }) => {
                    let _ = self.events.send(SessionEvent::TimerTicked { kind, remaining });
                }
                Some(TimerEvent::Completed) => {
                    tracing::debug!("{} timer completed", kind);
                    let _ = self.events.send(SessionEvent::TimerCompleted { kind });
                    self.notifier.notify(Notification::Tone { timer: kind });
                }
                None => {}
            }
        }
    }

    /// Stop both timers, keeping what is left on them.
    pub(crate) fn stop(&self) {
        let mut timers = self.lock();
        timers.exercise.stop();
        timers.rest.stop();
    }
}
