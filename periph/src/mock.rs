//! Test doubles for the pin provider.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
    PwmPin,
};

use crate::{pins::PinProvider, PeriphError};

#[derive(Default)]
struct BusState {
    writes: HashMap<u8, Vec<bool>>,
    dout_bits: VecDeque<bool>,
    duty: HashMap<u8, f64>,
    failing: HashSet<u8>,
}

/// Shared record of everything done to the mock pins.
#[derive(Clone, Default)]
pub struct MockBus(Rc<RefCell<BusState>>);

pub struct MockPins {
    bus: MockBus,
}

pub struct MockOutput {
    pin: u8,
    bus: MockBus,
}

pub struct MockInput {
    bus: MockBus,
}

pub struct MockPwm {
    pin: u8,
    bus: MockBus,
    duty: f64,
}

pub struct MockDelay;

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 10-bit value to be clocked out of the input pin MSB first.
    pub fn push_dout_value(&self, value: u16) {
        let mut state = self.0.borrow_mut();
        for i in (0..10).rev() {
            state.dout_bits.push_back((value >> i) & 0x01 != 0);
        }
    }

    /// Make opening `pin` fail.
    pub fn fail_pin(&self, pin: u8) {
        self.0.borrow_mut().failing.insert(pin);
    }

    pub fn writes(&self, pin: u8) -> Vec<bool> {
        self.0.borrow().writes.get(&pin).cloned().unwrap_or_default()
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        self.writes(pin).last().copied()
    }

    pub fn num_rising_edges(&self, pin: u8) -> usize {
        let writes = self.writes(pin);
        let mut last = false;
        let mut count = 0;
        for w in writes {
            if w && !last {
                count += 1;
            }
            last = w;
        }
        count
    }

    pub fn duty(&self, pin: u8) -> Option<f64> {
        self.0.borrow().duty.get(&pin).copied()
    }

    fn check(&self, pin: u8) -> Result<(), PeriphError> {
        if self.0.borrow().failing.contains(&pin) {
            Err(PeriphError::PinUnavailable {
                pin,
                msg: String::from("mock failure"),
            })
        }
        else {
            Ok(())
        }
    }
}

impl MockPins {
    pub fn new(bus: &MockBus) -> Self {
        Self { bus: bus.clone() }
    }
}

impl PinProvider for MockPins {
    type PinError = Infallible;
    type Output = MockOutput;
    type Input = MockInput;
    type Pwm = MockPwm;
    type Delay = MockDelay;

    fn output(&mut self, pin: u8) -> Result<Self::Output, PeriphError> {
        self.bus.check(pin)?;
        Ok(MockOutput { pin, bus: self.bus.clone() })
    }

    fn input_pullup(&mut self, pin: u8) -> Result<Self::Input, PeriphError> {
        self.bus.check(pin)?;
        Ok(MockInput { bus: self.bus.clone() })
    }

    fn pwm(&mut self, pin: u8, _frequency_hz: f64) -> Result<Self::Pwm, PeriphError> {
        self.bus.check(pin)?;
        Ok(MockPwm { pin, bus: self.bus.clone(), duty: 0.0 })
    }

    fn delay(&mut self) -> Self::Delay {
        MockDelay
    }
}

impl OutputPin for MockOutput {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.0.borrow_mut().writes.entry(self.pin).or_default().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.0.borrow_mut().writes.entry(self.pin).or_default().push(true);
        Ok(())
    }
}

impl InputPin for MockInput {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.bus.0.borrow_mut().dout_bits.pop_front().unwrap_or(false))
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl PwmPin for MockPwm {
    type Duty = f64;

    fn disable(&mut self) {}

    fn enable(&mut self) {}

    fn get_duty(&self) -> f64 {
        self.duty
    }

    fn get_max_duty(&self) -> f64 {
        1.0
    }

    fn set_duty(&mut self, duty: f64) {
        self.duty = duty;
        self.bus.0.borrow_mut().duty.insert(self.pin, duty);
    }
}

impl DelayUs<u32> for MockDelay {
    fn delay_us(&mut self, _us: u32) {}
}
