//! Presentation seam: everything the session renders goes through [`ThrottleView`].

use std::sync::Arc;

use shared::domain::{Direction, FunctionIndex, LocoAddress, Speed};

pub trait ThrottleView: Send + Sync {
    fn show_power(&self, on: bool);
    /// Slider position in raw speed steps.
    fn show_speed(&self, speed: Speed);
    fn show_speed_percent(&self, percent: u8);
    fn show_direction(&self, direction: Direction);
    fn show_selection(&self, address: &LocoAddress, selected: bool);
    fn show_function(&self, function: FunctionIndex, active: bool);
    /// Replaces the single message line.
    fn show_message(&self, message: &str);
}

impl<V: ThrottleView + ?Sized> ThrottleView for Arc<V> {
    fn show_power(&self, on: bool) {
        (**self).show_power(on)
    }

    fn show_speed(&self, speed: Speed) {
        (**self).show_speed(speed)
    }

    fn show_speed_percent(&self, percent: u8) {
        (**self).show_speed_percent(percent)
    }

    fn show_direction(&self, direction: Direction) {
        (**self).show_direction(direction)
    }

    fn show_selection(&self, address: &LocoAddress, selected: bool) {
        (**self).show_selection(address, selected)
    }

    fn show_function(&self, function: FunctionIndex, active: bool) {
        (**self).show_function(function, active)
    }

    fn show_message(&self, message: &str) {
        (**self).show_message(message)
    }
}
