mod service;

pub(crate) use service::csv_timestamp;
pub use service::{
    BuildingLoad, DashboardSnapshot, ReportService, ALERTS_CSV_HEADER, INCIDENTS_CSV_HEADER,
};
