//! Input-handling core of the Hamster soft-keyboard front-end.
//!
//! - `slide`: directional slide bindings on character keys and their resolver
//! - `config`: layered configuration model, overlay merge, and the owned store
//! - `schema`: the non-empty set of enabled input schemas
//! - `engine`: contract of the external conversion engine
//! - `import`: serialized archive import → merge → redeploy pipeline

pub mod config;
pub mod engine;
pub mod import;
pub mod schema;
pub mod slide;
