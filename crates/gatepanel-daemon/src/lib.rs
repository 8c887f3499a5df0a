//! Linux host bindings for gatepanel
//!
//! This crate wires `gatepanel_core` to a router running Linux: device-backed
//! implementations of the core capability traits, the shared application
//! state, and the periodic tasks that feed it.

pub mod app_state;
pub mod devices;
pub mod tasks;
pub mod telemetry;
