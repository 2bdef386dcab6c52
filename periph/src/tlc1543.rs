//! # TLC1543 ADC driver
//!
//! The TLC1543 is an 11 channel, 10-bit serial ADC. The AlphaBot2 bit-bangs
//! its serial interface over four GPIOs. Each transfer clocks the address of
//! the *next* channel to convert into the device while clocking out the result
//! of the *previous* conversion, so reads are pipelined by one channel.
//!
//! Every transfer is exactly [`NUM_CLOCKS`] clock cycles, which bounds the time
//! a read can take.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;
use std::fmt::Debug;

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    params::AdcPins,
    pins::{gpio_err, PinProvider},
    PeriphError, Peripheral, SensorArray, SensorReading,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of analog input channels.
pub const NUM_ANALOG_CHANNELS: u8 = 11;

/// Largest value a conversion can produce.
pub const MAX_VALUE: u16 = 1023;

/// Clock cycles per transfer (one per result bit).
pub const NUM_CLOCKS: usize = 10;

/// Number of address bits clocked in at the start of a transfer.
const NUM_ADDR_BITS: usize = 4;

/// Settling time between chip select falling and the first address bit.
const CS_SETUP_US: u32 = 1;

/// Conversion time after chip select rises.
const CONVERSION_US: u32 = 100;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Input channel of the ADC.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    A0 = 0,
    A1 = 1,
    A2 = 2,
    A3 = 3,
    A4 = 4,
    A5 = 5,
    A6 = 6,
    A7 = 7,
    A8 = 8,
    A9 = 9,
    A10 = 10,

    /// Self test, charges the capacitors to (Vref+ - Vref-)/2 and reads 512.
    SelfTest512 = 11,

    /// Self test, charges the capacitors to Vref- and reads 0.
    SelfTest0 = 12,

    /// Self test, charges the capacitors to Vref+ and reads 1023.
    SelfTest1023 = 13,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Bit-banged TLC1543.
pub struct Tlc1543<O, I, D> {
    addr: O,
    cs: O,
    clk: O,
    dout: I,
    delay: D,

    /// Channel addressed at the end of a read so the last requested channel's
    /// result can be clocked out.
    charge_channel: Channel,
}

/// The line sensor array, a set of ADC channels read in one go.
pub struct LineSensorArray<G: PinProvider> {
    provider: G,
    pins: AdcPins,
    channels: Vec<Channel>,
    adc: Option<Tlc1543<G::Output, G::Input, G::Delay>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TryFrom<u8> for Channel {
    type Error = PeriphError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use Channel::*;

        Ok(match value {
            0 => A0,
            1 => A1,
            2 => A2,
            3 => A3,
            4 => A4,
            5 => A5,
            6 => A6,
            7 => A7,
            8 => A8,
            9 => A9,
            10 => A10,
            11 => SelfTest512,
            12 => SelfTest0,
            13 => SelfTest1023,
            v => return Err(PeriphError::InitFailed(
                format!("{} is not a TLC1543 channel", v)
            ))
        })
    }
}

impl<O, I, D, E> Tlc1543<O, I, D>
where
    O: OutputPin<Error = E>,
    I: InputPin<Error = E>,
    D: DelayUs<u32>,
    E: Debug,
{
    /// Create a new driver from already opened pins.
    pub fn new(addr: O, cs: O, clk: O, dout: I, delay: D) -> Self {
        Self {
            addr,
            cs,
            clk,
            dout,
            delay,
            charge_channel: Channel::SelfTest512,
        }
    }

    /// Read a single channel.
    ///
    /// Takes two transfers: one to address the channel and one to clock its
    /// result out.
    pub fn read_channel(&mut self, channel: Channel) -> Result<u16, PeriphError> {
        let charge = self.charge_channel;

        self.transfer(channel)?;
        self.transfer(charge)
    }

    /// Read a list of channels, returning one value per channel in order.
    ///
    /// Takes `channels.len() + 1` transfers.
    pub fn read_channels(&mut self, channels: &[Channel]) -> Result<Vec<u16>, PeriphError> {
        let mut values = Vec::with_capacity(channels.len());

        let (first, rest) = match channels.split_first() {
            Some(s) => s,
            None => return Ok(values)
        };

        // The first transfer returns the result of whatever was converted
        // before, discard it.
        self.transfer(*first)?;

        for channel in rest {
            values.push(self.transfer(*channel)?);
        }

        let charge = self.charge_channel;
        values.push(self.transfer(charge)?);

        Ok(values)
    }

    /// Address `next` while clocking out the previous conversion result.
    fn transfer(&mut self, next: Channel) -> Result<u16, PeriphError> {
        let mut value: u16 = 0;

        self.cs.set_low().map_err(gpio_err)?;
        self.delay.delay_us(CS_SETUP_US);

        for i in 0..NUM_CLOCKS {
            // Address is sent MSB first on the first four clocks
            if i < NUM_ADDR_BITS {
                if ((next as u8) >> (NUM_ADDR_BITS - 1 - i)) & 0x01 != 0 {
                    self.addr.set_high().map_err(gpio_err)?;
                }
                else {
                    self.addr.set_low().map_err(gpio_err)?;
                }
            }

            // Result is clocked out MSB first
            value <<= 1;
            if self.dout.is_high().map_err(gpio_err)? {
                value |= 0x01;
            }

            self.clk.set_high().map_err(gpio_err)?;
            self.clk.set_low().map_err(gpio_err)?;
        }

        self.cs.set_high().map_err(gpio_err)?;
        self.delay.delay_us(CONVERSION_US);

        Ok(value)
    }
}

impl<G: PinProvider> LineSensorArray<G> {
    /// Create a new, unacquired, sensor array.
    ///
    /// `channels` are the ADC channels of the sensors ordered left to right.
    pub fn new(provider: G, pins: AdcPins, channels: &[u8]) -> Result<Self, PeriphError> {
        let channels = channels
            .iter()
            .map(|c| Channel::try_from(*c))
            .collect::<Result<Vec<_>, _>>()?;

        if channels.is_empty() {
            return Err(PeriphError::InitFailed(String::from(
                "A line sensor array needs at least one channel"
            )))
        }

        Ok(Self {
            provider,
            pins,
            channels,
            adc: None,
        })
    }
}

impl<G: PinProvider> Peripheral for LineSensorArray<G> {
    fn acquire(&mut self) -> Result<(), PeriphError> {
        if self.adc.is_some() {
            self.release();
        }

        let addr = self.provider.output(self.pins.addr)?;
        let cs = self.provider.output(self.pins.cs)?;
        let clk = self.provider.output(self.pins.clk)?;
        let dout = self.provider.input_pullup(self.pins.dout)?;
        let delay = self.provider.delay();

        self.adc = Some(Tlc1543::new(addr, cs, clk, dout, delay));

        debug!("Line sensor array acquired ({:?})", self.pins);

        Ok(())
    }

    fn release(&mut self) {
        if self.adc.take().is_some() {
            debug!("Line sensor array released");
        }
    }

    fn is_acquired(&self) -> bool {
        self.adc.is_some()
    }
}

impl<G: PinProvider> SensorArray for LineSensorArray<G> {
    fn num_channels(&self) -> usize {
        self.channels.len()
    }

    fn poll(&mut self) -> Result<SensorReading, PeriphError> {
        let adc = self.adc.as_mut().ok_or(PeriphError::NotAcquired)?;

        let values = adc.read_channels(&self.channels)?;

        trace!("Line sensors: {:?}", values);

        Ok(values)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{MockBus, MockPins};

    const PINS: AdcPins = AdcPins { addr: 24, cs: 5, dout: 23, clk: 25 };

    #[test]
    fn test_read_channels_pipeline() {
        let bus = MockBus::new();
        let mut sensors = LineSensorArray::new(
            MockPins::new(&bus), PINS, &[0, 1, 2, 3, 4]
        ).unwrap();

        // First result is stale and must be discarded
        for v in [777, 50, 1000, 1000, 1000, 1000].iter() {
            bus.push_dout_value(*v);
        }

        sensors.acquire().unwrap();
        assert_eq!(sensors.poll().unwrap(), vec![50, 1000, 1000, 1000, 1000]);
        assert_eq!(bus.level(PINS.cs), Some(true));
        assert_eq!(bus.num_rising_edges(PINS.clk), 6 * NUM_CLOCKS);
    }

    #[test]
    fn test_read_channel_addresses() {
        let bus = MockBus::new();
        let mut provider = MockPins::new(&bus);
        let mut adc = Tlc1543::new(
            provider.output(PINS.addr).unwrap(),
            provider.output(PINS.cs).unwrap(),
            provider.output(PINS.clk).unwrap(),
            provider.input_pullup(PINS.dout).unwrap(),
            provider.delay(),
        );

        bus.push_dout_value(0);
        bus.push_dout_value(MAX_VALUE);

        assert_eq!(adc.read_channel(Channel::A5).unwrap(), MAX_VALUE);

        // A5 = 0101 then the charge channel 11 = 1011
        assert_eq!(
            bus.writes(PINS.addr),
            vec![false, true, false, true, true, false, true, true]
        );
    }

    #[test]
    fn test_poll_requires_acquire() {
        let bus = MockBus::new();
        let mut sensors = LineSensorArray::new(MockPins::new(&bus), PINS, &[0, 1]).unwrap();

        assert!(matches!(sensors.poll(), Err(PeriphError::NotAcquired)));

        sensors.acquire().unwrap();
        assert!(sensors.is_acquired());

        // Reacquiring releases and opens the pins again
        sensors.acquire().unwrap();
        assert!(sensors.is_acquired());

        sensors.release();
        assert!(!sensors.is_acquired());
    }

    #[test]
    fn test_acquire_failure() {
        let bus = MockBus::new();
        bus.fail_pin(PINS.dout);
        let mut sensors = LineSensorArray::new(MockPins::new(&bus), PINS, &[0]).unwrap();

        assert!(matches!(
            sensors.acquire(),
            Err(PeriphError::PinUnavailable { pin: 23, .. })
        ));
        assert!(!sensors.is_acquired());
    }

    #[test]
    fn test_invalid_channels() {
        let bus = MockBus::new();
        assert!(LineSensorArray::new(MockPins::new(&bus), PINS, &[0, 14]).is_err());
        assert!(LineSensorArray::new(MockPins::new(&bus), PINS, &[]).is_err());
    }
}
