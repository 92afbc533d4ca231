pub mod camera;
pub mod mqtt_transport;
pub mod net;
pub mod node;
pub mod wifi;
