pub mod prediction;
pub mod zone_source;

pub use prediction::*;
pub use zone_source::*;
