mod service;

pub use service::{IncidentInput, IncidentService};
