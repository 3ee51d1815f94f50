//! Line-oriented rendering of the throttle panel.

use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use client_core::ThrottleView;
use shared::domain::{Direction, FunctionIndex, LocoAddress, Speed, FUNCTION_COUNT};
use tracing::warn;

#[derive(Debug, Default)]
struct Panel {
    power: bool,
    selected: Option<LocoAddress>,
    speed: Speed,
    percent: u8,
    direction: Direction,
    functions: [bool; FUNCTION_COUNT],
}

impl Panel {
    fn line(&self, message: &str) -> String {
        let power = if self.power { "ON " } else { "OFF" };
        let loco = self
            .selected
            .as_ref()
            .map(LocoAddress::to_string)
            .unwrap_or_else(|| "-".to_string());
        let active: Vec<String> = FunctionIndex::all()
            .filter(|function| self.functions[function.get()])
            .map(|function| function.to_string())
            .collect();
        let functions = if active.is_empty() {
            "-".to_string()
        } else {
            active.join(" ")
        };
        format!(
            "[power {power}] loco {loco} | {} | {:>4} ({:>3}%) | {functions} | {message}",
            self.direction,
            self.speed.value(),
            self.percent
        )
    }
}

/// Keeps the panel state and prints one line whenever the message line changes.
pub struct TerminalView<W: Write + Send> {
    inner: Mutex<(Panel, W)>,
    write_failed: AtomicBool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: Mutex::new((Panel::default(), out)),
            write_failed: AtomicBool::new(false),
        }
    }

    /// A panic while rendering leaves the panel usable; its fields are plain values.
    fn lock(&self) -> MutexGuard<'_, (Panel, W)> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("terminal view lock poisoned, continuing with last panel state");
            self.inner.clear_poison();
            poisoned.into_inner()
        })
    }

    fn with_panel(&self, update: impl FnOnce(&mut Panel)) {
        update(&mut self.lock().0);
    }
}

impl<W: Write + Send> ThrottleView for TerminalView<W> {
    fn show_power(&self, on: bool) {
        self.with_panel(|panel| panel.power = on);
    }

    fn show_speed(&self, speed: Speed) {
        self.with_panel(|panel| panel.speed = speed);
    }

    fn show_speed_percent(&self, percent: u8) {
        self.with_panel(|panel| panel.percent = percent);
    }

    fn show_direction(&self, direction: Direction) {
        self.with_panel(|panel| panel.direction = direction);
    }

    fn show_selection(&self, address: &LocoAddress, selected: bool) {
        self.with_panel(|panel| {
            if selected {
                panel.selected = Some(address.clone());
            } else if panel.selected.as_ref() == Some(address) {
                panel.selected = None;
            }
        });
    }

    fn show_function(&self, function: FunctionIndex, active: bool) {
        self.with_panel(|panel| panel.functions[function.get()] = active);
    }

    fn show_message(&self, message: &str) {
        let mut guard = self.lock();
        let (panel, out) = &mut *guard;
        let line = panel.line(message);
        let written = writeln!(out, "{line}").and_then(|()| out.flush());
        match written {
            Ok(()) => self.write_failed.store(false, Ordering::Relaxed),
            Err(err) => {
                if !self.write_failed.swap(true, Ordering::Relaxed) {
                    warn!(error = %err, "failed to write throttle panel");
                }
            }
        }
    }
}
