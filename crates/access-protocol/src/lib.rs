//! # access-protocol — Boundary Messages
//!
//! Shapes the policy toolkit produces and consumes at its edges. Transport
//! is the caller's business; this crate only builds, parses and signs the
//! JSON bodies, and persists policy lists through [`PolicyStore`].

pub mod command;
pub mod error;
pub mod frame;
pub mod request;
pub mod store;

pub use command::{command_name, Command, PolicyListEntry};
pub use error::ProtocolError;
pub use frame::extract_json_frame;
pub use request::{ClearPolicyListRequest, DelegatePolicyRequest};
pub use store::{InMemoryPolicyStore, JsonFilePolicyStore, PolicyStore};
