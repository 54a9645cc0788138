// Domain value objects
pub mod building_tier;
pub mod category;
pub mod geometry;
pub mod identifiers;
pub mod outcome;

pub use building_tier::*;
pub use category::*;
pub use geometry::*;
pub use identifiers::*;
pub use outcome::*;
