//! Raspberry Pi pin backend
//!
//! Maps the hardware traits onto rppal: plain GPIO for the digital lines,
//! software PWM for the buzzer and LED channels, and the MCP3008 on SPI0
//! for the analog input.

use super::{AnalogInput, DigitalInput, DigitalOutput, PwmOutput, Rig};
use crate::config::HardwareConfig;
use crate::error::Result;
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

struct PiInput(InputPin);

impl DigitalInput for PiInput {
    fn is_high(&mut self) -> bool {
        self.0.is_high()
    }
}

struct PiOutput(OutputPin);

impl DigitalOutput for PiOutput {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }
}

/// Software PWM over a plain GPIO pin
///
/// Good to a few kHz, plenty for the buzzer tones and LED dimming here.
struct PiPwm(OutputPin);

impl PwmOutput for PiPwm {
    fn set(&mut self, frequency_hz: f64, duty: f64) -> Result<()> {
        self.0.set_pwm_frequency(frequency_hz, duty)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.0.clear_pwm()?;
        self.0.set_low();
        Ok(())
    }
}

/// One single-ended MCP3008 channel behind SPI0 CE0
struct Mcp3008 {
    spi: Spi,
    channel: u8,
}

impl AnalogInput for Mcp3008 {
    fn read_ratio(&mut self) -> Result<f64> {
        // Start bit, then single-ended mode + channel, then a clock-out byte
        let tx = [0x01, (0x08 | self.channel) << 4, 0x00];
        let mut rx = [0u8; 3];
        self.spi.transfer(&mut rx, &tx)?;
        let raw = u16::from(rx[1] & 0x03) << 8 | u16::from(rx[2]);
        Ok(f64::from(raw) / 1023.0)
    }
}

/// Claim every configured pin
///
/// Fails if the GPIO character device or SPI bus is unavailable. Startup
/// is the only place hardware errors surface; there is nothing to monitor
/// without pins.
pub fn open(config: &HardwareConfig) -> Result<Rig> {
    let gpio = Gpio::new()?;

    let button = gpio.get(config.button_pin)?.into_input_pullup();
    let trigger = gpio.get(config.trigger_pin)?.into_output_low();
    // The sensor drives the echo line, no pull wanted
    let echo = gpio.get(config.echo_pin)?.into_input();
    let buzzer = gpio.get(config.buzzer_pin)?.into_output_low();
    let red = gpio.get(config.red_pin)?.into_output_low();
    let green = gpio.get(config.green_pin)?.into_output_low();
    let blue = gpio.get(config.blue_pin)?.into_output_low();
    let status_led = gpio.get(config.status_led_pin)?.into_output_low();

    let spi = Spi::new(
        Bus::Spi0,
        SlaveSelect::Ss0,
        config.spi_clock_hz,
        Mode::Mode0,
    )?;

    Ok(Rig {
        button: Box::new(PiInput(button)),
        trigger: Box::new(PiOutput(trigger)),
        echo: Box::new(PiInput(echo)),
        buzzer: Box::new(PiPwm(buzzer)),
        red: Box::new(PiPwm(red)),
        green: Box::new(PiPwm(green)),
        blue: Box::new(PiPwm(blue)),
        status_led: Box::new(PiOutput(status_led)),
        adc: Box::new(Mcp3008 {
            spi,
            channel: config.adc_channel,
        }),
    })
}
