//! Domain models

pub mod assignment;
pub mod participant;
pub mod registry;

pub use assignment::Assignment;
pub use participant::Participant;
pub use registry::{Registry, RegistryError};
