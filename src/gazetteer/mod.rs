// src/gazetteer/mod.rs
pub mod ancestry;
pub mod handle;
pub mod index;
pub mod loader;
pub mod spatial;

pub use ancestry::{admin1_of, walk_ancestors, AncestryWalk};
pub use handle::GazetteerHandle;
pub use index::{GazetteerBuilder, GazetteerIndex, NameHit, PlaceIndex, SpatialHit};
pub use loader::{from_reader, load_gazetteer, PlaceRecord};
