//! Dispatch of parsed UI events onto the throttle session.

use std::sync::Arc;

use client_core::{ControlTransport, SessionError, ThrottleSession, ThrottleView};
use tokio::task::JoinSet;
use tracing::debug;

use crate::controller::events::{UiEvent, HELP};

/// Runs the event on its own task so a slow response never blocks the next input.
pub fn dispatch_event<T, V>(
    session: &Arc<ThrottleSession<T, V>>,
    event: UiEvent,
    tasks: &mut JoinSet<()>,
) where
    T: ControlTransport + 'static,
    V: ThrottleView + 'static,
{
    let name = event.name();
    let session = Arc::clone(session);
    tasks.spawn(async move {
        match apply_event(&session, event).await {
            Ok(()) => debug!(event = name, "ui event handled"),
            Err(err) if err.is_rejection() => debug!(event = name, reason = %err, "ui event rejected"),
            Err(err) => debug!(event = name, error = %err, "ui event failed"),
        }
    });
    debug!(event = name, "dispatched ui event");
}

pub async fn apply_event<T, V>(
    session: &ThrottleSession<T, V>,
    event: UiEvent,
) -> Result<(), SessionError>
where
    T: ControlTransport,
    V: ThrottleView,
{
    match event {
        UiEvent::TogglePower => session.toggle_power().await.map(|_| ()),
        UiEvent::Select(address) => session.select_locomotive(&address).await,
        UiEvent::Speed(raw) => session.set_speed(raw).await,
        UiEvent::Stop => session.stop().await,
        UiEvent::Emergency => session.emergency_stop().await,
        UiEvent::Halt => session.system_halt().await,
        UiEvent::ToggleDirection => session.toggle_direction().await,
        UiEvent::ToggleFunction(function) => session.toggle_function(function).await,
        UiEvent::Refresh => {
            session.refresh_display().await;
            Ok(())
        }
        UiEvent::Status => {
            let snapshot = session.snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => session.report(json).await,
                Err(err) => session.report(format!("status unavailable: {err}")).await,
            }
            Ok(())
        }
        UiEvent::Help => {
            session.report(HELP).await;
            Ok(())
        }
        UiEvent::Quit => Ok(()),
    }
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
