pub mod catalog_queries;
pub mod event_queries;
pub mod policy_queries;
