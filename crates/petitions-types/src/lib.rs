pub mod api;
pub mod models;
pub mod roles;
pub mod status;

pub use roles::{Capability, Role};
pub use status::PetitionStatus;
