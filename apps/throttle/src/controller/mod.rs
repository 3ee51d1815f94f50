//! Controller layer: UI events and their dispatch onto the throttle session.

pub mod events;
pub mod orchestration;
