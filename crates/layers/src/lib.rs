pub mod export;
pub mod labels;
pub mod query;
pub mod render;
pub mod symbology;
pub mod zones;

pub use export::map_to_geojson;
pub use render::{RenderSummary, TimeContext, ZoneMap};
pub use zones::{IdFields, IndexError, Zone, ZoneIndex};
