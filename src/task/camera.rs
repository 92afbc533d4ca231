//! Camera bring-up
//!
//! The ArduCAM Mega hangs off SPI0. The bus is wrapped in a shared-bus mutex
//! so the camera gets a proper `SpiDevice` with its own chip select.

use defmt::info;
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{self, Async, Spi};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use fwe_node_core::camera::{ArduCamMega, CameraConfig};
use fwe_node_core::SetupError;
use static_cell::StaticCell;

use crate::system::config::CAMERA_SPI_FREQUENCY;
use crate::system::resources::CameraResources;

type CameraBus = Spi<'static, SPI0, Async>;

/// Camera as seen by the node loop
pub type Camera = ArduCamMega<SpiDevice<'static, NoopRawMutex, CameraBus, Output<'static>>, Delay>;

/// Sets up SPI0 and configures the camera for HD JPEG capture.
pub async fn init(r: CameraResources) -> Result<Camera, SetupError> {
    let mut config = spi::Config::default();
    config.frequency = CAMERA_SPI_FREQUENCY;
    let spi = Spi::new(r.spi, r.sck, r.mosi, r.miso, r.tx_dma, r.rx_dma, config);

    static SPI_BUS: StaticCell<Mutex<NoopRawMutex, CameraBus>> = StaticCell::new();
    let bus = SPI_BUS.init(Mutex::new(spi));
    let device = SpiDevice::new(bus, Output::new(r.cs, Level::High));

    let mut camera = ArduCamMega::new(device, Delay);
    let model = camera.init(CameraConfig::default()).await?;
    info!("Camera ready: {:?}, {:?}", model, camera.config());
    Ok(camera)
}
