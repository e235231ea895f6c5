mod service;

pub use service::{
    readings_file_name, ImportSummary, PortabilityService, ReadingImport, READINGS_CSV_HEADER,
};
