//! Provider adapters for hosted generation models.
//!
//! One adapter per registered model translates between the opaque
//! parameter payloads callers supply and the predictions-style REST
//! wire format, and decodes submit/poll responses into
//! [`RemoteJobState`](lumen_core::RemoteJobState). The engine drives
//! every adapter through the same submit -> poll -> terminal lifecycle.

pub mod adapter;
pub mod chat;
pub mod image;
pub mod wire;

pub use adapter::{adapter_for, AdapterError, ProviderAdapter};
