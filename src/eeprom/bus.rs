use std::fmt;

use crate::gpio::{
	BitOrder,
	Gpio,
	Level,
	Pin,
};

const ADDRESS_MASK: u16 = 0x7fff;
// /OE is active low: bit clear = chip drives the data bus
const OUTPUT_DISABLE: u16 = 0x8000;

/// The 16-bit word serialized into the shift registers: 15 address
/// bits plus the inverted output-enable flag in the top bit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressWord(pub u16);

impl AddressWord {
	/// Addresses above 15 bits are truncated, same as address lines
	/// the board never wired; range checking is the caller's job.
	pub fn encode(address: usize, output_enable: bool) -> AddressWord {
		let mut word = (address as u16) & ADDRESS_MASK;
		if !output_enable {
			word |= OUTPUT_DISABLE;
		}
		AddressWord(word)
	}

	pub fn address(&self) -> usize {
		(self.0 & ADDRESS_MASK) as usize
	}

	pub fn output_enable(&self) -> bool {
		0 == self.0 & OUTPUT_DISABLE
	}

	// shift order: high byte first, MSB first
	pub fn high_byte(&self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub fn low_byte(&self) -> u8 {
		self.0 as u8
	}
}

impl fmt::Display for AddressWord {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x}", self.0)
	}
}

impl fmt::Debug for AddressWord {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x} (address: 0x{:04x}", self.0, self.address())?;
		if self.output_enable() { write!(f, " [OE]")?; }
		write!(f, ")")
	}
}

/// The serial side of the two cascaded shift registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AddressBus {
	data: Pin,
	clock: Pin,
	latch: Pin,
}

impl AddressBus {
	pub fn new(data: Pin, clock: Pin, latch: Pin) -> AddressBus {
		AddressBus { data, clock, latch }
	}

	/// Present `address` and the output-enable flag on the parallel
	/// outputs. Both bytes are shifted before the latch pulse, so the
	/// outputs change atomically.
	pub fn set_address<G: Gpio>(&self, gpio: &mut G, address: usize, output_enable: bool) {
		let word = AddressWord::encode(address, output_enable);
		gpio.shift_out(self.data, self.clock, BitOrder::MsbFirst, word.high_byte());
		gpio.shift_out(self.data, self.clock, BitOrder::MsbFirst, word.low_byte());
		self.pulse_latch(gpio);
	}

	fn pulse_latch<G: Gpio>(&self, gpio: &mut G) {
		gpio.write(self.latch, Level::High);
		gpio.write(self.latch, Level::Low);
	}
}
