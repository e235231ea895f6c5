mod service;

pub use service::{BuildingInput, BuildingService};
