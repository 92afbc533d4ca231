//! Hardware Resource Management
//!
//! Assigns the Pico 2 W pins and peripherals to the parts of the firmware that
//! own them. Every group is moved into exactly one owner during set-up.
//!
//! # Resource Groups
//! - Wireless: CYW43439 power/chip-select, its PIO-driven SPI and DMA channel
//! - Camera: SPI0 bus to the ArduCAM Mega plus its chip select
//! - Flash LED: camera illumination output, held off
//!
//! # Pin Map
//! ```text
//! CYW43 (on-board)   PWR=GP23  CS=GP25  DIO=GP24  CLK=GP29  PIO0 SM0  DMA_CH0
//! ArduCAM Mega       SCK=GP18  MOSI=GP19  MISO=GP16  CS=GP17  DMA_CH1/DMA_CH2
//! Flash LED          GP15
//! ```

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;

assign_resources! {
    /// CYW43439 wireless chip, driven through PIO0
    wifi: WifiResources {
        pwr: PIN_23,
        cs: PIN_25,
        dio: PIN_24,
        clk: PIN_29,
        pio: PIO0,
        dma: DMA_CH0,
    },
    /// ArduCAM Mega on SPI0
    camera: CameraResources {
        spi: SPI0,
        sck: PIN_18,
        mosi: PIN_19,
        miso: PIN_16,
        cs: PIN_17,
        tx_dma: DMA_CH1,
        rx_dma: DMA_CH2,
    },
    /// Camera flash LED
    flash_led: FlashLedResources {
        pin: PIN_15,
    },
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});
