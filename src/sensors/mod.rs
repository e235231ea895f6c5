mod service;

pub use service::{NewSensor, SensorService, SensorUpdate};
