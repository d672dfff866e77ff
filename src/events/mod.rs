//! Trigger event handling
//!
//! Extracts the bucket/object pair from object-created notifications.

pub mod trigger;

pub use trigger::{parse_trigger, TriggerEvent};
