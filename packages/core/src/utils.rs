pub mod http;
pub mod serde_helpers;
