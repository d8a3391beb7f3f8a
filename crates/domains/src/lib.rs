//! The central domain logic and interface definitions for the adoption
//! workflow: entities, the error taxonomy, and the collaborator ports.

pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
