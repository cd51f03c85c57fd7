use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::{HwError, Result};

/// Bit-banged HX711 driver.
///
/// `gain_pulses` selects channel and gain for the next conversion:
/// 25 = channel A gain 128, 26 = channel B gain 32, 27 = channel A gain 64.
pub struct Hx711 {
    dt: rppal::gpio::InputPin,
    sck: rppal::gpio::OutputPin,
    gain_pulses: u8,
}

impl Hx711 {
    pub fn new(
        dt_pin: rppal::gpio::InputPin,
        mut sck_pin: rppal::gpio::OutputPin,
        gain_pulses: u8,
    ) -> Result<Self> {
        if !(25..=27).contains(&gain_pulses) {
            return Err(HwError::Gpio(format!(
                "invalid gain pulse count {gain_pulses}"
            )));
        }
        sck_pin.set_low(); // clock idle low
        Ok(Self {
            dt: dt_pin,
            sck: sck_pin,
            gain_pulses,
        })
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        let deadline = Instant::now() + timeout;

        // Conversion complete when DT goes low
        while self.dt.is_high() {
            if Instant::now() >= deadline {
                return Err(HwError::DataReadyTimeout);
            }
            std::thread::sleep(Duration::from_micros(200));
        }

        // Clock out 24 bits, MSB first
        let mut value: i32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay_100ns();
            value = (value << 1) | i32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Extra pulses program gain/channel for the next conversion
        for _ in 0..self.gain_pulses - 24 {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Sign extend 24-bit two's complement
        if (value & 0x80_0000) != 0 {
            value |= !0xFF_FFFF;
        }
        trace!(raw = value, "hx711 raw read");
        Ok(value)
    }
}

#[inline(always)]
fn spin_delay_100ns() {
    std::hint::spin_loop();
}
