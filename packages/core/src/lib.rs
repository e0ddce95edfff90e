//! Core library for Flow-Vision nodes
//!
//! Holds everything a vision node needs from its surroundings without knowing
//! which flow runtime hosts it:
//! - node lifecycle state and the host facing status signal
//! - the message object that travels between nodes
//! - the host interface (status, error and emit channels)
//! - the injected HTTP fetch capability used by model loaders

pub mod error;
pub mod flow;
pub mod logging;
pub mod utils;

pub use error::NodeError;
