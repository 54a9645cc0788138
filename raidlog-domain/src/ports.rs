// Repository and Service Port Traits (Interfaces)
// Define what the domain needs from infrastructure and from the host world

pub mod repositories;
pub mod services;

pub use repositories::*;
pub use services::*;
