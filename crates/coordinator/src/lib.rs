pub mod axis_map;
pub mod bypass_solo;
pub mod catalog;
pub mod chain;
pub mod params;
pub mod spatial;
pub mod state;

pub use axis_map::{AxisEvent, AxisMapper};
pub use bypass_solo::BypassSoloController;
pub use catalog::{EffectCatalog, EffectSpec, ID_POOL_SIZE};
pub use chain::{compute_route, ChainManager};
pub use params::{ParameterStore, ParameterUpdate, UpdateSource};
pub use spatial::{SpatialInputRelay, StatusAddress};
pub use state::{CoordinatorState, EffectRemoval, StateSnapshot};
