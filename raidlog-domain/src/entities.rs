// Domain entities

pub mod delivery;
pub mod host_signal;
pub mod item_catalog;
pub mod ownership;
pub mod query;
pub mod raid_event;
pub mod runtime_config;
pub mod weapon_policy;

pub use delivery::*;
pub use host_signal::*;
pub use item_catalog::*;
pub use ownership::*;
pub use query::*;
pub use raid_event::*;
pub use runtime_config::*;
pub use weapon_policy::*;
