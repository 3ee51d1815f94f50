use std::collections::HashMap;

use serde::Serialize;
use shared::{
    domain::{Direction, FunctionIndex, LocoAddress, Speed, FUNCTION_COUNT},
    protocol::{parse_power_state, ControlCommand},
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub mod error;
pub mod transport;
pub mod view;

pub use error::{SessionError, TransportError};
pub use transport::{ControlTransport, HttpControlTransport};
pub use view::ThrottleView;

const MSG_POWER_OFF: &str = "Power is off";
const MSG_SELECT_LOCO: &str = "Select a locomotive";

/// Cached state of one configured locomotive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocomotiveState {
    pub address: LocoAddress,
    pub speed: Speed,
    pub direction: Direction,
    pub functions: [bool; FUNCTION_COUNT],
}

impl LocomotiveState {
    fn new(address: LocoAddress) -> Self {
        Self {
            address,
            speed: Speed::ZERO,
            direction: Direction::default(),
            functions: [false; FUNCTION_COUNT],
        }
    }

    pub fn function(&self, function: FunctionIndex) -> bool {
        self.functions[function.get()]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub power_on: bool,
    pub selected: Option<LocoAddress>,
    pub last_message: Option<String>,
    pub locomotives: Vec<LocomotiveState>,
}

struct LocoEntry {
    state: LocomotiveState,
    /// Sequence of the newest speed-affecting request issued for this locomotive.
    issued_seq: u64,
    /// Sequence of the newest speed-affecting request the server acknowledged.
    acked_seq: u64,
}

impl LocoEntry {
    fn new(address: LocoAddress) -> Self {
        Self {
            state: LocomotiveState::new(address),
            issued_seq: 0,
            acked_seq: 0,
        }
    }
}

#[derive(Default)]
struct SessionState {
    power_on: bool,
    selected: Option<LocoAddress>,
    order: Vec<LocoAddress>,
    locos: HashMap<LocoAddress, LocoEntry>,
    last_message: Option<String>,
}

impl SessionState {
    fn is_selected(&self, address: &LocoAddress) -> bool {
        self.selected.as_ref() == Some(address)
    }

    fn entry_mut(&mut self, address: &LocoAddress) -> Result<&mut LocoEntry, SessionError> {
        self.locos
            .get_mut(address)
            .ok_or_else(|| SessionError::UnknownLocomotive(address.clone()))
    }

    fn claim_speed(&mut self, address: &LocoAddress) -> Result<u64, SessionError> {
        let entry = self.entry_mut(address)?;
        entry.issued_seq += 1;
        Ok(entry.issued_seq)
    }

    /// Commits an acknowledged speed unless a newer request was already acknowledged.
    fn commit_speed(&mut self, address: &LocoAddress, seq: u64, speed: Speed) -> bool {
        match self.locos.get_mut(address) {
            Some(entry) if seq > entry.acked_seq => {
                entry.acked_seq = seq;
                entry.state.speed = speed;
                true
            }
            _ => false,
        }
    }

    /// True when no speed-affecting request was issued after `seq`.
    fn is_latest_speed(&self, address: &LocoAddress, seq: u64) -> bool {
        self.locos
            .get(address)
            .is_some_and(|entry| entry.issued_seq == seq)
    }

    fn selected_state(&self) -> Option<&LocomotiveState> {
        self.selected
            .as_ref()
            .and_then(|address| self.locos.get(address))
            .map(|entry| &entry.state)
    }
}

/// Locomotive registry, selection and power mirror for one throttle session.
///
/// Every command is confirmation-gated: cached locomotive fields change only after the
/// control server acknowledged the request, and a failed request re-renders the cached
/// values. The internal lock is never held across a request, so operations may overlap;
/// a response always updates the locomotive it was issued for and only refreshes the view
/// when that locomotive is still selected.
pub struct ThrottleSession<T, V> {
    transport: T,
    view: V,
    inner: Mutex<SessionState>,
}

impl<T: ControlTransport, V: ThrottleView> ThrottleSession<T, V> {
    pub fn new(addresses: impl IntoIterator<Item = LocoAddress>, transport: T, view: V) -> Self {
        let mut state = SessionState::default();
        for address in addresses {
            if state.locos.contains_key(&address) {
                warn!(%address, "duplicate locomotive address in configuration ignored");
                continue;
            }
            state.order.push(address.clone());
            state
                .locos
                .insert(address.clone(), LocoEntry::new(address));
        }

        view.show_power(false);
        for address in &state.order {
            view.show_selection(address, false);
        }
        view.show_speed(Speed::ZERO);
        view.show_speed_percent(Speed::ZERO.percent());
        info!(locomotives = state.order.len(), "throttle session initialized");

        Self {
            transport,
            view,
            inner: Mutex::new(state),
        }
    }

    pub async fn is_power_on(&self) -> bool {
        self.inner.lock().await.power_on
    }

    pub async fn selected(&self) -> Option<LocoAddress> {
        self.inner.lock().await.selected.clone()
    }

    pub async fn last_message(&self) -> Option<String> {
        self.inner.lock().await.last_message.clone()
    }

    pub async fn locomotive(&self, address: &LocoAddress) -> Option<LocomotiveState> {
        let state = self.inner.lock().await;
        state.locos.get(address).map(|entry| entry.state.clone())
    }

    /// Locomotives in configuration order.
    pub async fn locomotives(&self) -> Vec<LocomotiveState> {
        let state = self.inner.lock().await;
        state
            .order
            .iter()
            .filter_map(|address| state.locos.get(address))
            .map(|entry| entry.state.clone())
            .collect()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock().await;
        SessionSnapshot {
            power_on: state.power_on,
            selected: state.selected.clone(),
            last_message: state.last_message.clone(),
            locomotives: state
                .order
                .iter()
                .filter_map(|address| state.locos.get(address))
                .map(|entry| entry.state.clone())
                .collect(),
        }
    }

    /// Renders the percentage readout for `speed`.
    pub fn update_speed_value(&self, speed: Speed) {
        self.view.show_speed_percent(speed.percent());
    }

    /// Re-renders slider, readout, direction and functions from the selected locomotive.
    pub async fn refresh_display(&self) {
        let state = self.inner.lock().await;
        if let Some(loco) = state.selected_state() {
            self.render_locomotive(loco);
        }
    }

    /// Shows a message on the view without touching any other state.
    pub async fn report(&self, message: impl Into<String>) {
        let mut state = self.inner.lock().await;
        self.notify(&mut state, message.into());
    }

    pub async fn toggle_power(&self) -> Result<bool, SessionError> {
        let result = self.transport.send(&ControlCommand::TogglePower).await;

        let mut state = self.inner.lock().await;
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "power toggle failed");
                self.notify(&mut state, format!("Power command failed: {err}"));
                return Err(err.into());
            }
        };

        match parse_power_state(&body) {
            Ok(on) => {
                state.power_on = on;
                self.view.show_power(on);
                info!(power_on = on, "track power changed");
                let message = if on { "Power ON" } else { "Power OFF" };
                self.notify(&mut state, message.to_string());
                Ok(on)
            }
            Err(_) => {
                let body = body.trim().to_string();
                error!(body = %body, "unrecognized power state from control server");
                self.notify(&mut state, format!("Error: unrecognized power state '{body}'"));
                Err(SessionError::UnrecognizedPowerState(body))
            }
        }
    }

    pub async fn select_locomotive(&self, address: &LocoAddress) -> Result<(), SessionError> {
        {
            let mut state = self.inner.lock().await;
            if !state.locos.contains_key(address) {
                warn!(%address, "selection of unconfigured locomotive");
                self.notify(&mut state, format!("Unknown locomotive {address}"));
                return Err(SessionError::UnknownLocomotive(address.clone()));
            }

            if let Some(previous) = state.selected.replace(address.clone()) {
                if &previous != address {
                    self.view.show_selection(&previous, false);
                }
            }
            self.view.show_selection(address, true);
            if let Some(loco) = state.selected_state() {
                self.render_locomotive(loco);
            }
            info!(%address, "locomotive selected");
            self.notify(&mut state, format!("Locomotive {address} selected"));
        }

        let command = ControlCommand::SelectAddress {
            address: address.clone(),
        };
        if let Err(err) = self.transport.send(&command).await {
            warn!(%address, error = %err, "selection not acknowledged by control server");
            let mut state = self.inner.lock().await;
            self.notify(
                &mut state,
                format!("Server did not acknowledge locomotive {address}: {err}"),
            );
            return Err(err.into());
        }
        Ok(())
    }

    pub async fn set_speed(&self, raw: i64) -> Result<(), SessionError> {
        let speed = Speed::clamped(raw);
        let (address, seq) = {
            let mut state = self.inner.lock().await;
            let address = self.guard_motion(&mut state)?;
            let seq = state.claim_speed(&address)?;
            self.view.show_speed(speed);
            (address, seq)
        };

        let command = ControlCommand::SetSpeed {
            address: address.clone(),
            speed,
        };
        let result = self.transport.send(&command).await;

        let mut state = self.inner.lock().await;
        match result {
            Ok(_) => {
                if !state.commit_speed(&address, seq, speed) {
                    debug!(%address, %speed, "superseded speed acknowledgement dropped");
                    return Ok(());
                }
                if state.is_selected(&address) {
                    self.view.show_speed(speed);
                    self.update_speed_value(speed);
                }
                info!(%address, %speed, "speed set");
                self.notify(&mut state, format!("Speed {address}: {}%", speed.percent()));
                Ok(())
            }
            Err(err) => {
                warn!(%address, %speed, error = %err, "speed command failed");
                if state.is_latest_speed(&address, seq) && state.is_selected(&address) {
                    if let Some(loco) = state.selected_state() {
                        self.render_speed(loco.speed);
                    }
                }
                self.notify(&mut state, format!("Speed command for {address} failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        let (address, seq) = {
            let mut state = self.inner.lock().await;
            let address = self.guard_selection(&mut state)?;
            let seq = state.claim_speed(&address)?;
            (address, seq)
        };

        let command = ControlCommand::Stop {
            address: address.clone(),
        };
        let result = self.transport.send(&command).await;

        let mut state = self.inner.lock().await;
        match result {
            Ok(_) => {
                if state.commit_speed(&address, seq, Speed::ZERO) && state.is_selected(&address) {
                    self.render_speed(Speed::ZERO);
                }
                info!(%address, "locomotive stopped");
                self.notify(&mut state, format!("Locomotive {address} stopped"));
                Ok(())
            }
            Err(err) => {
                warn!(%address, error = %err, "stop command failed");
                self.notify(&mut state, format!("Stop command for {address} failed: {err}"));
                Err(err.into())
            }
        }
    }

    /// Zeroes the slider and readout once the request settles, whether or not the server
    /// acknowledged it. The cached speed only changes on acknowledgement. A bridge without
    /// an emergency route (404) gets a regular stop for the selected locomotive instead.
    pub async fn emergency_stop(&self) -> Result<(), SessionError> {
        let claimed = {
            let mut state = self.inner.lock().await;
            match state.selected.clone() {
                Some(address) => {
                    let seq = state.claim_speed(&address)?;
                    Some((address, seq))
                }
                None => None,
            }
        };

        let command = ControlCommand::Emergency {
            address: claimed.as_ref().map(|(address, _)| address.clone()),
        };
        let mut result = self.transport.send(&command).await;
        let fallback = match (&result, &claimed) {
            (Err(err), Some((address, _))) if err.is_not_found() => Some(address.clone()),
            _ => None,
        };
        if let Some(address) = fallback {
            warn!(%address, "control server has no emergency route, sending stop");
            result = self.transport.send(&ControlCommand::Stop { address }).await;
        }

        let mut state = self.inner.lock().await;
        self.render_speed(Speed::ZERO);
        match result {
            Ok(_) => {
                if let Some((address, seq)) = &claimed {
                    state.commit_speed(address, *seq, Speed::ZERO);
                }
                warn!(address = ?command.address(), "emergency stop");
                self.notify(&mut state, "Emergency stop".to_string());
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "emergency stop failed");
                self.notify(&mut state, format!("Emergency stop failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn system_halt(&self) -> Result<(), SessionError> {
        let claimed: Vec<(LocoAddress, u64)> = {
            let mut state = self.inner.lock().await;
            state
                .locos
                .iter_mut()
                .map(|(address, entry)| {
                    entry.issued_seq += 1;
                    (address.clone(), entry.issued_seq)
                })
                .collect()
        };

        let result = self.transport.send(&ControlCommand::SystemHalt).await;

        let mut state = self.inner.lock().await;
        match result {
            Ok(_) => {
                for (address, seq) in &claimed {
                    state.commit_speed(address, *seq, Speed::ZERO);
                }
                self.render_current_speed(&state);
                warn!("system halt broadcast");
                self.notify(&mut state, "System halt".to_string());
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "system halt failed");
                self.notify(&mut state, format!("System halt failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn toggle_direction(&self) -> Result<(), SessionError> {
        let (address, seq) = {
            let mut state = self.inner.lock().await;
            let address = self.guard_motion(&mut state)?;
            let seq = state.claim_speed(&address)?;
            (address, seq)
        };

        let command = ControlCommand::ToggleDirection {
            address: address.clone(),
        };
        let result = self.transport.send(&command).await;

        let mut state = self.inner.lock().await;
        match result {
            Ok(_) => {
                let entry = state.entry_mut(&address)?;
                entry.state.direction = entry.state.direction.toggled();
                let direction = entry.state.direction;
                // The bridge toggles with a full stop.
                state.commit_speed(&address, seq, Speed::ZERO);
                if state.is_selected(&address) {
                    if let Some(loco) = state.selected_state() {
                        self.render_speed(loco.speed);
                    }
                    self.view.show_direction(direction);
                }
                info!(%address, %direction, "direction toggled");
                self.notify(&mut state, format!("Direction {address}: {direction}"));
                Ok(())
            }
            Err(err) => {
                warn!(%address, error = %err, "direction command failed");
                self.notify(&mut state, format!("Direction command for {address} failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn toggle_function(&self, function: FunctionIndex) -> Result<(), SessionError> {
        let (address, on) = {
            let mut state = self.inner.lock().await;
            let address = self.guard_selection(&mut state)?;
            let on = !state.entry_mut(&address)?.state.function(function);
            (address, on)
        };

        let command = ControlCommand::SetFunction {
            address: address.clone(),
            function,
            on,
        };
        let result = self.transport.send(&command).await;

        let mut state = self.inner.lock().await;
        match result {
            Ok(_) => {
                state.entry_mut(&address)?.state.functions[function.get()] = on;
                if state.is_selected(&address) {
                    self.view.show_function(function, on);
                }
                info!(%address, %function, on, "function switched");
                let verb = if on { "activated" } else { "deactivated" };
                self.notify(&mut state, format!("Function {function} {verb}"));
                Ok(())
            }
            Err(err) => {
                warn!(%address, %function, error = %err, "function command failed");
                if state.is_selected(&address) {
                    let cached = state.entry_mut(&address)?.state.function(function);
                    self.view.show_function(function, cached);
                }
                self.notify(&mut state, format!("Function {function} for {address} failed: {err}"));
                Err(err.into())
            }
        }
    }

    fn guard_selection(&self, state: &mut SessionState) -> Result<LocoAddress, SessionError> {
        match state.selected.clone() {
            Some(address) => Ok(address),
            None => {
                warn!("command rejected: no locomotive selected");
                self.notify(state, MSG_SELECT_LOCO.to_string());
                Err(SessionError::NoSelection)
            }
        }
    }

    /// Speed and direction require track power and a selection; rejections reset the slider.
    fn guard_motion(&self, state: &mut SessionState) -> Result<LocoAddress, SessionError> {
        if !state.power_on {
            warn!("motion command rejected: power is off");
            self.render_speed(Speed::ZERO);
            self.notify(state, MSG_POWER_OFF.to_string());
            return Err(SessionError::PowerOff);
        }
        if state.selected.is_none() {
            self.render_speed(Speed::ZERO);
        }
        self.guard_selection(state)
    }

    fn render_speed(&self, speed: Speed) {
        self.view.show_speed(speed);
        self.update_speed_value(speed);
    }

    fn render_current_speed(&self, state: &SessionState) {
        let speed = state
            .selected_state()
            .map(|loco| loco.speed)
            .unwrap_or(Speed::ZERO);
        self.render_speed(speed);
    }

    fn render_locomotive(&self, loco: &LocomotiveState) {
        self.render_speed(loco.speed);
        self.view.show_direction(loco.direction);
        for function in FunctionIndex::all() {
            self.view.show_function(function, loco.function(function));
        }
    }

    fn notify(&self, state: &mut SessionState, message: String) {
        self.view.show_message(&message);
        state.last_message = Some(message);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
