pub mod event_log_files;
pub mod policy_files;

pub use event_log_files::*;
pub use policy_files::*;
