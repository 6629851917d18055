/// Narrow GPIO capability the programmer is written against.
///
/// Exactly the operations the bus protocol needs, nothing more: pin
/// direction, digital read/write and a serialize-and-clock primitive
/// for feeding the shift registers. Keeping the surface this small
/// lets the whole protocol run against a simulated board (see `sim`).

use std::fmt;

mod linux;
mod sim;

pub use self::linux::GpioMem;
pub use self::sim::SimGpio;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Pin(pub u8);

impl fmt::Display for Pin {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "GPIO{}", self.0)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

impl Level {
	pub fn is_high(self) -> bool {
		Level::High == self
	}
}

impl From<bool> for Level {
	fn from(v: bool) -> Self {
		match v {
			false => Level::Low,
			true => Level::High,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PinMode {
	Input,
	Output,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BitOrder {
	MsbFirst,
	LsbFirst,
}

pub trait Gpio {
	fn pin_mode(&mut self, pin: Pin, mode: PinMode);
	fn write(&mut self, pin: Pin, level: Level);
	fn read(&mut self, pin: Pin) -> Level;

	/// Serialize one byte, one bit per clock pulse: present the bit on
	/// `data_pin`, then cycle `clock_pin` high and low. The receiving
	/// shift register samples on the rising clock edge.
	fn shift_out(&mut self, data_pin: Pin, clock_pin: Pin, order: BitOrder, byte: u8) {
		for i in 0..8 {
			let bit = match order {
				BitOrder::MsbFirst => 0 != byte & (0x80 >> i),
				BitOrder::LsbFirst => 0 != byte & (1 << i),
			};
			self.write(data_pin, Level::from(bit));
			self.write(clock_pin, Level::High);
			self.write(clock_pin, Level::Low);
		}
	}
}

impl<'a, G: ?Sized + Gpio> Gpio for &'a mut G {
	fn pin_mode(&mut self, pin: Pin, mode: PinMode) {
		G::pin_mode(*self, pin, mode);
	}
	fn write(&mut self, pin: Pin, level: Level) {
		G::write(*self, pin, level);
	}
	fn read(&mut self, pin: Pin) -> Level {
		G::read(*self, pin)
	}
	fn shift_out(&mut self, data_pin: Pin, clock_pin: Pin, order: BitOrder, byte: u8) {
		G::shift_out(*self, data_pin, clock_pin, order, byte);
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::eeprom::PinAssignment;

	#[test]
	fn shift_out_msb_first() {
		let pins = PinAssignment::bcm_default();
		let mut gpio = SimGpio::new(pins.clone(), 2048);

		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0xc5);
		assert_eq!(0x00c5, gpio.shifted_word());
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x3a);
		assert_eq!(0xc53a, gpio.shifted_word());
	}

	#[test]
	fn shift_out_lsb_first() {
		let pins = PinAssignment::bcm_default();
		let mut gpio = SimGpio::new(pins.clone(), 2048);

		// 0xc5 = 0b1100_0101, reversed 0b1010_0011 = 0xa3
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::LsbFirst, 0xc5);
		assert_eq!(0x00a3, gpio.shifted_word());
	}
}
