//! STM32F405 clock tree and the pin assignment of the boat controller.

use embassy_stm32::gpio::{AnyPin, Pin};
use embassy_stm32::peripherals::{
    DMA1_CH1, I2C1, PA11, PA12, PB11, PB8, PB9, PC13, USART3, USB_OTG_FS,
};
use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz;
use embassy_stm32::Config;

pub struct UsbPins {
    pub otg: USB_OTG_FS,
    pub dp: PA12,
    pub dm: PA11,
}

/// GPS receiver on USART3, receive only (RX=PB11, DMA1 stream 1).
pub struct GpsPort {
    pub uart: USART3,
    pub rx: PB11,
    pub rx_dma: DMA1_CH1,
}

/// HMC5883L on I2C1 (SCL=PB8, SDA=PB9).
pub struct CompassBus {
    pub i2c: I2C1,
    pub scl: PB8,
    pub sda: PB9,
}

pub struct Board {
    pub usb: UsbPins,
    pub gps: GpsPort,
    pub compass: CompassBus,
    /// MOTOR2 pad, rudder servo signal
    pub rudder: AnyPin,
    /// MOTOR1 pad, propulsion ESC
    pub esc: AnyPin,
    pub led: PC13,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz, DShot cycle counts assume this
            divq: Some(PllQDiv::DIV7), // 48 MHz for USB
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        Self {
            usb: UsbPins {
                otg: p.USB_OTG_FS,
                dp: p.PA12,
                dm: p.PA11,
            },
            gps: GpsPort {
                uart: p.USART3,
                rx: p.PB11,
                rx_dma: p.DMA1_CH1,
            },
            compass: CompassBus {
                i2c: p.I2C1,
                scl: p.PB8,
                sda: p.PB9,
            },
            rudder: p.PB1.degrade(),
            esc: p.PB0.degrade(),
            led: p.PC13,
        }
    }
}
