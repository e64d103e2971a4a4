//! Async driver for a session
//!
//! Owns the [`Session`] on a single task and multiplexes user controls,
//! adapter completions, the reveal ticker and the echo-delay timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{Error, Result};

use super::event::{EventReceiver, EventSender, SessionEvent};
use super::Session;

/// Cloneable handle to the user controls of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: EventSender,
}

impl SessionHandle {
    /// Handle sending into `events`
    #[must_use]
    pub const fn new(events: EventSender) -> Self {
        Self { events }
    }

    /// Press the activation control
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionGone`] if the runtime has stopped
    pub fn activate(&self) -> Result<()> {
        self.events
            .send(SessionEvent::Activate)
            .map_err(|_| Error::SessionGone)
    }

    /// Press the close control
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionGone`] if the runtime has stopped
    pub fn close(&self) -> Result<()> {
        self.events
            .send(SessionEvent::Close)
            .map_err(|_| Error::SessionGone)
    }
}

/// Runs one session until shutdown
pub struct SessionRuntime {
    session: Session,
    events: EventReceiver,
    echo_delay: Duration,
    reveal_interval: Duration,
}

impl SessionRuntime {
    /// Drive `session` with events from `events`
    #[must_use]
    pub const fn new(
        session: Session,
        events: EventReceiver,
        echo_delay: Duration,
        reveal_interval: Duration,
    ) -> Self {
        Self {
            session,
            events,
            echo_delay,
            reveal_interval,
        }
    }

    /// Run until `shutdown` fires or its sender is dropped
    ///
    /// The session is closed on the way out and handed back.
    pub async fn run(mut self, shutdown: &mut mpsc::Receiver<()>) -> Session {
        let mut reveal = tokio::time::interval(self.reveal_interval);
        reveal.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut route_at: Option<Instant> = None;
        let mut revealing = false;

        loop {
            route_at = if self.session.route_pending() {
                Some(route_at.unwrap_or_else(|| Instant::now() + self.echo_delay))
            } else {
                None
            };

            // Ticks missed while idle must not fire as soon as a reveal starts
            let was_revealing = revealing;
            revealing = self.session.reveal_pending();
            if revealing && !was_revealing {
                reveal.reset();
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("session runtime shutting down");
                    break;
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event);
                }
                _ = reveal.tick(), if revealing => {
                    self.dispatch(SessionEvent::RevealTick);
                }
                () = tokio::time::sleep_until(route_at.unwrap_or_else(Instant::now)), if route_at.is_some() => {
                    route_at = None;
                    self.dispatch(SessionEvent::RouteDue);
                }
            }
        }

        self.session.close();
        self.session
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let name = event.name();
        if let Err(e) = self.session.handle(event) {
            tracing::warn!(error = %e, event = name, "discarding session event");
        }
    }
}
