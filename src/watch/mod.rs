// src/watch/mod.rs

//! File-change latency measurement.
//!
//! This module is responsible for:
//! - Speaking the change-subscription protocol (`protocol`).
//! - Pairing source writes with the output writes they cause (`latency`).
//! - Running the subscription subprocess for the executor (`monitor`).
//!
//! It does **not** know about the plan; the executor starts the monitor as a
//! background process and collects its output.

pub mod latency;
pub mod monitor;
pub mod path_utils;
pub mod protocol;

pub use latency::{LatencyCorrelator, LatencyRecord, Observation, TreeKind};
pub use monitor::{spawn_monitor, LatencyMonitor, MonitorSettings};
pub use protocol::{
    generate_subscription_id, ChangeBatch, ProtocolError, ProtocolEvent, SubscriptionClient,
    SubscriptionState,
};
