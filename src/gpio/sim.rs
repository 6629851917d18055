/// Simulated board: the two cascaded shift registers plus a parallel
/// EEPROM behind them, modeled at pin level.
///
/// Faithful enough for the protocol: the shift chain samples the data
/// pin on rising clock edges, the latch copies the chain to the
/// parallel outputs on its rising edge, and the EEPROM captures a
/// write on the rising (trailing) edge of the active-low write
/// strobe. Output enable is the latched top bit, active low.

use crate::eeprom::PinAssignment;

use super::{
	Gpio,
	Level,
	Pin,
	PinMode,
};

const MAX_PINS: usize = 64;

pub struct SimGpio {
	pins: PinAssignment,
	modes: [PinMode; MAX_PINS],
	levels: [Level; MAX_PINS],
	chain: u16,
	latched: u16,
	memory: Vec<u8>,
}

impl SimGpio {
	/// `capacity` is the number of wired EEPROM cells; addresses wrap
	/// at it, like unwired address lines would make them.
	pub fn new(pins: PinAssignment, capacity: usize) -> SimGpio {
		assert!(capacity.is_power_of_two());
		SimGpio {
			pins,
			modes: [PinMode::Input; MAX_PINS],
			levels: [Level::Low; MAX_PINS],
			chain: 0,
			latched: 0,
			// erased parts read all ones
			memory: vec![0xff; capacity],
		}
	}

	/// Current contents of the shift chain (not yet latched).
	pub fn shifted_word(&self) -> u16 {
		self.chain
	}

	/// Word on the parallel outputs of the shift registers.
	pub fn latched_word(&self) -> u16 {
		self.latched
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8] {
		&mut self.memory
	}

	pub fn level(&self, pin: Pin) -> Level {
		self.levels[pin.0 as usize]
	}

	fn cell_index(&self) -> usize {
		(self.latched & 0x7fff) as usize % self.memory.len()
	}

	fn output_enabled(&self) -> bool {
		// active low on the latched top bit
		0 == self.latched & 0x8000
	}

	fn data_index(&self, pin: Pin) -> Option<usize> {
		self.pins.data.iter().position(|p| *p == pin)
	}

	fn capture_write(&mut self) {
		let index = self.cell_index();
		let mut data = 0u8;
		for (bit, pin) in self.pins.data.iter().enumerate() {
			// a pin nobody drives floats; keep things strict in the model
			assert_eq!(PinMode::Output, self.modes[pin.0 as usize], "write strobe with undriven data pin {}", pin);
			if self.levels[pin.0 as usize].is_high() {
				data |= 1 << bit;
			}
		}
		self.memory[index] = data;
	}
}

impl Gpio for SimGpio {
	fn pin_mode(&mut self, pin: Pin, mode: PinMode) {
		self.modes[pin.0 as usize] = mode;
	}

	fn write(&mut self, pin: Pin, level: Level) {
		let old = self.levels[pin.0 as usize];
		self.levels[pin.0 as usize] = level;
		let rising = Level::Low == old && Level::High == level;

		if pin == self.pins.shift_clock && rising {
			let bit = self.levels[self.pins.shift_data.0 as usize].is_high();
			self.chain = (self.chain << 1) | (bit as u16);
		} else if pin == self.pins.shift_latch && rising {
			self.latched = self.chain;
		} else if pin == self.pins.write_enable && rising && !self.output_enabled() {
			self.capture_write();
		}
	}

	fn read(&mut self, pin: Pin) -> Level {
		if let Some(bit) = self.data_index(pin) {
			if self.output_enabled() && PinMode::Input == self.modes[pin.0 as usize] {
				let cell = self.memory[self.cell_index()];
				return Level::from(0 != cell & (1 << bit));
			}
		}
		self.levels[pin.0 as usize]
	}
}

#[cfg(test)]
mod test {
	use crate::eeprom::PinAssignment;
	use crate::gpio::{
		BitOrder,
		Gpio,
		Level,
		PinMode,
	};

	use super::SimGpio;

	fn sim() -> (SimGpio, PinAssignment) {
		let pins = PinAssignment::bcm_default();
		(SimGpio::new(pins.clone(), 2048), pins)
	}

	fn latch(gpio: &mut SimGpio, pins: &PinAssignment) {
		gpio.write(pins.shift_latch, Level::High);
		gpio.write(pins.shift_latch, Level::Low);
	}

	#[test]
	fn latch_copies_chain() {
		let (mut gpio, pins) = sim();

		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x81);
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x42);
		assert_eq!(0, gpio.latched_word(), "latched outputs must not follow the chain");

		latch(&mut gpio, &pins);
		assert_eq!(0x8142, gpio.latched_word());
	}

	#[test]
	fn write_strobe_captures_on_trailing_edge() {
		let (mut gpio, pins) = sim();

		// address 3, output enable off (bit 15 high)
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x80);
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x03);
		latch(&mut gpio, &pins);

		for pin in pins.data.iter() {
			gpio.pin_mode(*pin, PinMode::Output);
			gpio.write(*pin, Level::High);
		}

		gpio.write(pins.write_enable, Level::Low);
		assert_eq!(0xff, gpio.memory()[3]); // erased, strobe not finished
		gpio.memory_mut()[3] = 0x00;
		gpio.write(pins.write_enable, Level::High);
		assert_eq!(0xff, gpio.memory()[3]);
	}

	#[test]
	fn no_capture_while_output_enabled() {
		let (mut gpio, pins) = sim();

		// address 3, output enable on (bit 15 low)
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x00);
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x03);
		latch(&mut gpio, &pins);

		gpio.memory_mut()[3] = 0x5a;
		gpio.write(pins.write_enable, Level::Low);
		gpio.write(pins.write_enable, Level::High);
		assert_eq!(0x5a, gpio.memory()[3]);
	}

	#[test]
	fn read_follows_latched_address() {
		let (mut gpio, pins) = sim();
		gpio.memory_mut()[5] = 0xa5;

		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x00);
		gpio.shift_out(pins.shift_data, pins.shift_clock, BitOrder::MsbFirst, 0x05);
		latch(&mut gpio, &pins);

		let mut data = 0u8;
		for (bit, pin) in pins.data.iter().enumerate() {
			gpio.pin_mode(*pin, PinMode::Input);
			if gpio.read(*pin).is_high() {
				data |= 1 << bit;
			}
		}
		assert_eq!(0xa5, data);
	}
}
