//! Core system components of the camera node
pub mod config;
pub mod fatal;
pub mod resources;
