mod service;

pub use service::{AlertInput, AlertService};
