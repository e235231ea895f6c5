mod service;

pub(crate) use service::missing_sensor;
pub use service::{ReadingInput, ReadingService};
