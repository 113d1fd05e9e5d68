//! # Coopr Library
//!
//! Internal library for the coopr binary: an automatic chicken coop door
//! controller that opens the door at sunrise and closes it after dusk.
//!
//! This library exists to enable testing of the control internals and to keep
//! CLI dispatch (main.rs) separate from the control logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Coop` struct wires the hardware, clock, scheduler and
//!   door together and drives the cooperative tick loop
//! - **Door Control**: `door` module owns the switch-driven state machine and
//!   motor actuation, including overrun compensation
//! - **Solar**: `solar` module computes sunrise/sunset times for a fixed
//!   observer location
//! - **Scheduling**: `scheduler` module re-derives the open/close trigger
//!   times once per day and fires door actions
//! - **Time**: `clock` keeps a monotonic UTC "now" synced from an external
//!   RTC; `timezone` converts UTC to local civil time with fixed DST rules
//! - **Infrastructure**: configuration, persistence, hardware seams, logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod clock;
pub mod config;
pub mod constants;
pub mod coop;
pub mod door;
pub mod hardware;
pub mod persist;
pub mod scheduler;
pub mod solar;
pub mod timezone;

// Re-export for binary
pub use coop::Coop;
