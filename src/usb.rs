//! USB CDC-ACM serial used for the status console.

use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use crate::board::UsbPins;

bind_interrupts!(pub struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, peripherals::USB_OTG_FS>;
pub type UsbSerial<'a> = CdcAcmClass<'a, UsbDriver>;

/// Descriptor and endpoint buffers; the builder borrows them for `'static`.
struct UsbBuffers {
    config_desc: [u8; 256],
    bos_desc: [u8; 256],
    control_buf: [u8; 64],
    ep_out_buffer: [u8; 256],
}

static BUFFERS: StaticCell<UsbBuffers> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// Bring up the OTG_FS device with one CDC-ACM port. Call once.
pub fn init(pins: UsbPins) -> (UsbDevice<'static, UsbDriver>, UsbSerial<'static>) {
    let bufs = BUFFERS.init(UsbBuffers {
        config_desc: [0; 256],
        bos_desc: [0; 256],
        control_buf: [0; 64],
        ep_out_buffer: [0; 256],
    });

    let mut usb_config = usb_otg::Config::default();
    usb_config.vbus_detection = false;
    let driver = Driver::new_fs(
        pins.otg,
        Irqs,
        pins.dp,
        pins.dm,
        &mut bufs.ep_out_buffer,
        usb_config,
    );

    let mut config = Config::new(0xc0de, 0xb0a7);
    config.manufacturer = Some("GPS Boat");
    config.product = Some("Boat Navigation Controller");
    config.serial_number = Some("00000001");

    let mut builder = Builder::new(
        driver,
        config,
        &mut bufs.config_desc,
        &mut bufs.bos_desc,
        &mut [], // msos_descs
        &mut bufs.control_buf,
    );

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), 64);
    (builder.build(), class)
}
