//! ArduCAM Mega SPI camera
//!
//! The module captures and JPEG-compresses on its own and buffers the result
//! in an on-board FIFO. The host only triggers a capture, reads the FIFO
//! length and bursts the bytes out over SPI, which is what makes the camera
//! usable from a microcontroller without a parallel camera interface.
//!
//! # SPI register protocol
//! ```text
//! write: [addr | 0x80, value]
//! read:  [addr & 0x7f, dummy] -> value
//! burst: [0x3c, dummy] -> FIFO bytes...
//! ```
//!
//! # Frame lifecycle
//! - `acquire`: clear FIFO flag, start capture, poll for done, read length
//! - `read`: burst the FIFO into the caller's buffer
//! - `release`: clear the FIFO flag so the next capture can start
//!
//! A frame that is never read (oversized, wrong format) costs no SPI traffic
//! beyond the length registers.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::{Operation, SpiDevice};

use crate::capture::{Encoding, FrameInfo, FrameSource};
use crate::fmt::Loggable;

// Register map
const REG_FIFO_CONTROL: u8 = 0x04;
const REG_SENSOR_RESET: u8 = 0x07;
const REG_FORMAT: u8 = 0x20;
const REG_CAPTURE_RESOLUTION: u8 = 0x21;
const REG_IMAGE_QUALITY: u8 = 0x2a;
const REG_SENSOR_ID: u8 = 0x40;
const REG_STATUS: u8 = 0x44;
const REG_FIFO_SIZE1: u8 = 0x45;
const REG_FIFO_SIZE2: u8 = 0x46;
const REG_FIFO_SIZE3: u8 = 0x47;
const BURST_FIFO_READ: u8 = 0x3c;

// Register bits
const FIFO_CLEAR_FLAG: u8 = 0x01;
const FIFO_START_CAPTURE: u8 = 0x02;
const SENSOR_RESET_ENABLE: u8 = 1 << 6;
const STATUS_STATE_MASK: u8 = 0x03;
const STATUS_IDLE: u8 = 0x02;
const STATUS_CAPTURE_DONE: u8 = 0x04;
const CAPTURE_MODE_SET: u8 = 0x00;

/// Write flag on the register address
const WRITE_FLAG: u8 = 0x80;

/// Polls before giving up on the sensor becoming idle (1 ms apart)
const IDLE_POLL_LIMIT: u32 = 1000;

/// Polls before giving up on a capture (1 ms apart)
const CAPTURE_POLL_LIMIT: u32 = 3000;

/// Sensor behind the SPI bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorModel {
    ThreeMegapixel,
    FiveMegapixel,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PixelFormat {
    Jpeg = 0x01,
    Rgb565 = 0x02,
    Yuv = 0x03,
}

/// Capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    /// 320x240
    Qvga = 0x01,
    /// 640x480
    Vga = 0x02,
    /// 1280x720
    Hd = 0x04,
    /// 1920x1080
    FullHd = 0x07,
}

/// JPEG compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum JpegQuality {
    High = 0x00,
    Default = 0x01,
    Low = 0x02,
}

/// Capture settings applied during [`ArduCamMega::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraConfig {
    pub format: PixelFormat,
    pub resolution: Resolution,
    pub quality: JpegQuality,
}

impl Default for CameraConfig {
    /// HD JPEG at high quality
    fn default() -> Self {
        Self {
            format: PixelFormat::Jpeg,
            resolution: Resolution::Hd,
            quality: JpegQuality::High,
        }
    }
}

/// Camera errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraError<E> {
    /// SPI transfer failed
    Spi(E),
    /// Sensor id register holds an unknown value
    UnknownSensor(u8),
    /// Sensor did not become idle in time
    NotIdle,
    /// Capture did not complete in time
    CaptureTimeout,
    /// Capture completed with an empty FIFO
    EmptyFrame,
    /// `read` without a held frame, or with a buffer of the wrong size
    NoFrame,
}

/// ArduCAM Mega driver
pub struct ArduCamMega<SPI, D> {
    spi: SPI,
    delay: D,
    config: CameraConfig,
    held_len: Option<usize>,
}

impl<SPI, D> ArduCamMega<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    pub fn new(spi: SPI, delay: D) -> Self {
        Self {
            spi,
            delay,
            config: CameraConfig::default(),
            held_len: None,
        }
    }

    /// Resets the sensor, checks its id and applies `config`.
    pub async fn init(&mut self, config: CameraConfig) -> Result<SensorModel, CameraError<SPI::Error>> {
        self.write_reg(REG_SENSOR_RESET, SENSOR_RESET_ENABLE).await?;
        self.wait_idle().await?;

        let model = match self.read_reg(REG_SENSOR_ID).await? {
            0x81 | 0x83 => SensorModel::FiveMegapixel,
            0x82 | 0x84 => SensorModel::ThreeMegapixel,
            other => return Err(CameraError::UnknownSensor(other)),
        };

        self.write_reg(REG_FORMAT, config.format as u8).await?;
        self.wait_idle().await?;
        self.write_reg(REG_CAPTURE_RESOLUTION, CAPTURE_MODE_SET | config.resolution as u8)
            .await?;
        self.wait_idle().await?;
        self.write_reg(REG_IMAGE_QUALITY, config.quality as u8).await?;
        self.wait_idle().await?;

        self.config = config;
        self.held_len = None;
        Ok(model)
    }

    /// Active capture settings
    pub fn config(&self) -> CameraConfig {
        self.config
    }

    async fn capture(&mut self) -> Result<usize, CameraError<SPI::Error>> {
        self.write_reg(REG_FIFO_CONTROL, FIFO_CLEAR_FLAG).await?;
        self.write_reg(REG_FIFO_CONTROL, FIFO_START_CAPTURE).await?;

        let mut polls = 0;
        while self.read_reg(REG_STATUS).await? & STATUS_CAPTURE_DONE == 0 {
            polls += 1;
            if polls >= CAPTURE_POLL_LIMIT {
                return Err(CameraError::CaptureTimeout);
            }
            self.delay.delay_ms(1).await;
        }

        let low = self.read_reg(REG_FIFO_SIZE1).await? as usize;
        let mid = self.read_reg(REG_FIFO_SIZE2).await? as usize;
        let high = self.read_reg(REG_FIFO_SIZE3).await? as usize;
        Ok(low | (mid << 8) | (high << 16))
    }

    async fn wait_idle(&mut self) -> Result<(), CameraError<SPI::Error>> {
        for _ in 0..IDLE_POLL_LIMIT {
            if self.read_reg(REG_STATUS).await? & STATUS_STATE_MASK == STATUS_IDLE {
                return Ok(());
            }
            self.delay.delay_ms(1).await;
        }
        Err(CameraError::NotIdle)
    }

    async fn read_reg(&mut self, addr: u8) -> Result<u8, CameraError<SPI::Error>> {
        let mut value = [0u8];
        self.spi
            .transaction(&mut [Operation::Write(&[addr & !WRITE_FLAG, 0x00]), Operation::Read(&mut value)])
            .await
            .map_err(CameraError::Spi)?;
        Ok(value[0])
    }

    async fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), CameraError<SPI::Error>> {
        self.spi
            .write(&[addr | WRITE_FLAG, value])
            .await
            .map_err(CameraError::Spi)
    }
}

impl<SPI, D> FrameSource for ArduCamMega<SPI, D>
where
    SPI: SpiDevice,
    SPI::Error: Loggable,
    D: DelayNs,
{
    type Error = CameraError<SPI::Error>;

    async fn acquire(&mut self) -> Result<FrameInfo, Self::Error> {
        let len = self.capture().await?;
        if len == 0 {
            return Err(CameraError::EmptyFrame);
        }
        self.held_len = Some(len);
        let encoding = match self.config.format {
            PixelFormat::Jpeg => Encoding::Jpeg,
            PixelFormat::Rgb565 => Encoding::Rgb565,
            PixelFormat::Yuv => Encoding::Yuv422,
        };
        Ok(FrameInfo { len, encoding })
    }

    async fn read(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        if self.held_len != Some(dst.len()) {
            return Err(CameraError::NoFrame);
        }
        self.spi
            .transaction(&mut [Operation::Write(&[BURST_FIFO_READ, 0x00]), Operation::Read(dst)])
            .await
            .map_err(CameraError::Spi)
    }

    async fn release(&mut self) {
        self.held_len = None;
        if let Err(e) = self.write_reg(REG_FIFO_CONTROL, FIFO_CLEAR_FLAG).await {
            warn!("Camera FIFO release failed: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use std::vec::Vec;

    /// Register-level stand-in for the camera module
    struct FakeCamera {
        regs: [u8; 128],
        fifo: Vec<u8>,
        writes: Vec<(u8, u8)>,
        bursts: usize,
    }

    impl FakeCamera {
        fn new(sensor_id: u8, fifo: Vec<u8>) -> Self {
            let mut regs = [0u8; 128];
            regs[REG_SENSOR_ID as usize] = sensor_id;
            regs[REG_STATUS as usize] = STATUS_IDLE;
            Self {
                regs,
                fifo,
                writes: Vec::new(),
                bursts: 0,
            }
        }
    }

    impl embedded_hal_async::spi::ErrorType for FakeCamera {
        type Error = embedded_hal_async::spi::ErrorKind;
    }

    impl SpiDevice for FakeCamera {
        async fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            let mut command = None;
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) if bytes[0] & WRITE_FLAG != 0 => {
                        let (addr, value) = (bytes[0] & !WRITE_FLAG, bytes[1]);
                        self.writes.push((addr, value));
                        self.regs[addr as usize] = value;
                        if addr == REG_FIFO_CONTROL && value == FIFO_START_CAPTURE {
                            let len = self.fifo.len();
                            self.regs[REG_STATUS as usize] = STATUS_IDLE | STATUS_CAPTURE_DONE;
                            self.regs[REG_FIFO_SIZE1 as usize] = len as u8;
                            self.regs[REG_FIFO_SIZE2 as usize] = (len >> 8) as u8;
                            self.regs[REG_FIFO_SIZE3 as usize] = (len >> 16) as u8;
                        }
                    }
                    Operation::Write(bytes) => command = Some(bytes[0]),
                    Operation::Read(buf) => match command {
                        Some(BURST_FIFO_READ) => {
                            self.bursts += 1;
                            let n = buf.len();
                            buf.copy_from_slice(&self.fifo[..n]);
                        }
                        Some(addr) => buf[0] = self.regs[addr as usize],
                        None => return Err(embedded_hal_async::spi::ErrorKind::Other),
                    },
                    _ => return Err(embedded_hal_async::spi::ErrorKind::Other),
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn init_applies_hd_jpeg() {
        let mut cam = ArduCamMega::new(FakeCamera::new(0x82, Vec::new()), NoDelay);
        let model = block_on(cam.init(CameraConfig::default())).unwrap();
        assert_eq!(model, SensorModel::ThreeMegapixel);
        let writes = &cam.spi.writes;
        assert!(writes.contains(&(REG_FORMAT, PixelFormat::Jpeg as u8)));
        assert!(writes.contains(&(REG_CAPTURE_RESOLUTION, Resolution::Hd as u8)));
    }

    #[test]
    fn unknown_sensor_is_rejected() {
        let mut cam = ArduCamMega::new(FakeCamera::new(0x00, Vec::new()), NoDelay);
        assert_eq!(
            block_on(cam.init(CameraConfig::default())),
            Err(CameraError::UnknownSensor(0x00))
        );
    }

    #[test]
    fn acquire_read_release_cycle() {
        let jpeg: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
        let mut cam = ArduCamMega::new(FakeCamera::new(0x81, jpeg.clone()), NoDelay);
        block_on(cam.init(CameraConfig::default())).unwrap();

        let info = block_on(cam.acquire()).unwrap();
        assert_eq!(info, FrameInfo { len: 300, encoding: Encoding::Jpeg });

        let mut dst = std::vec![0u8; 300];
        block_on(cam.read(&mut dst)).unwrap();
        assert_eq!(dst, jpeg);

        block_on(cam.release());
        assert_eq!(cam.spi.writes.last(), Some(&(REG_FIFO_CONTROL, FIFO_CLEAR_FLAG)));
        // nothing held any more
        assert_eq!(block_on(cam.read(&mut dst)), Err(CameraError::NoFrame));
    }

    #[test]
    fn released_frame_is_never_burst_read() {
        let mut cam = ArduCamMega::new(FakeCamera::new(0x81, std::vec![0xff; 64]), NoDelay);
        block_on(cam.init(CameraConfig::default())).unwrap();
        block_on(cam.acquire()).unwrap();
        block_on(cam.release());
        assert_eq!(cam.spi.bursts, 0);
    }
}
