//! Camera drivers
pub mod arducam;

pub use arducam::{ArduCamMega, CameraConfig, CameraError, JpegQuality, PixelFormat, Resolution, SensorModel};
