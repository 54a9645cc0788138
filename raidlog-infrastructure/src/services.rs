pub mod delivery_queue;
pub mod housekeeping;
pub mod payload;
pub mod webhook_transport;
pub mod world_mirror;

pub use delivery_queue::*;
pub use housekeeping::*;
pub use payload::*;
pub use webhook_transport::*;
pub use world_mirror::*;
