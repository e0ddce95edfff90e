//! Shared re-exports for the flow-vision crates.
//!
//! Every crate in the workspace pulls its async runtime, serialization and
//! error handling through here so versions stay in lockstep.

pub use anyhow::{Error, Result, anyhow, bail};
pub use async_trait::async_trait;
pub use bytes::Bytes;
pub use futures;
pub use image;
pub use ndarray;
pub use reqwest;
pub use schemars::JsonSchema;
pub use serde_json::Value;
pub use tokio;

pub mod json {
    pub use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
    pub use serde_json::{Map, from_slice, from_str, from_value, json, to_string, to_value};
}

pub mod sync {
    pub use tokio::sync::{Mutex, Notify, OnceCell, OwnedMutexGuard, RwLock, mpsc, oneshot};
}

/// Fresh collision-resistant id, used for message and node ids.
pub fn create_id() -> String {
    cuid2::create_id()
}
