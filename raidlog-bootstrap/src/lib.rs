// Raid Log Bootstrap

pub mod context;
pub mod lifecycle;
pub mod logging;

pub use lifecycle::run;
pub use logging::init_logging;
