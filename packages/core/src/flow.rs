pub mod context;
pub mod host;
pub mod message;
pub mod node;
pub mod status;
