// Domain services

pub mod attribution_context;
pub mod damage_attribution;
pub mod engine;
pub mod event_query;
pub mod event_store;
pub mod explosive_tracker;
pub mod ownership_filter;
pub mod weapon_registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use attribution_context::*;
pub use damage_attribution::*;
pub use engine::*;
pub use event_query::*;
pub use event_store::*;
pub use explosive_tracker::*;
pub use ownership_filter::*;
pub use weapon_registry::*;
