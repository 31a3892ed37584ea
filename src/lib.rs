//! Runtime layer of the Hime keyboard front-end.
//!
//! Wires the pure `hime-core` and `hime-session` logic to the Swift host:
//! UniFFI exports in `api`, background engine calls in `async_worker`, and
//! optional JSON tracing in `trace_init`.

uniffi::setup_scaffolding!();

pub mod api;
mod async_worker;
mod trace_init;

pub use hime_core;
pub use hime_session;
