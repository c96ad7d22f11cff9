//! Request-scoped values shuttled between the storage backend and the HTTP layer.
//!
//! Nothing here is persisted by this service; the backend owns all durable
//! state and these types only live for the duration of one request.

pub mod bucket;
pub mod object;
