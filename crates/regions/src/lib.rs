//! Administrative region hierarchy (county, constituency, ward) and the
//! dependent-selection state machine every location form runs on.

pub mod catalog;
pub mod selector;

pub use catalog::{CatalogError, Region, RegionCatalog, SubRegion};
pub use selector::{SelectMode, SelectionState};
