use crate::gpio::{
	Gpio,
	Level,
	PinMode,
};

use super::{
	AddressBus,
	PinAssignment,
	WRITE_CYCLE,
	WRITE_PULSE,
	reliable_sleep,
	spin_wait,
};

/// One EEPROM behind its shift-register address bus.
///
/// Owns the GPIO backend; every transaction takes `&mut self`, which
/// is all the serialization the single physical bus needs.
pub struct Eeprom<G: Gpio> {
	gpio: G,
	pins: PinAssignment,
	bus: AddressBus,
	capacity: usize,
}

impl<G: Gpio> Eeprom<G> {
	/// Takes over the control pins: shift pins low, /WE idle high,
	/// all four driven as outputs. Data pin direction is set per
	/// transaction, never tracked.
	pub fn new(mut gpio: G, pins: PinAssignment, capacity: usize) -> Eeprom<G> {
		// level first, so the pin doesn't glitch when it starts driving
		gpio.write(pins.write_enable, Level::High);
		gpio.pin_mode(pins.write_enable, PinMode::Output);

		for &pin in &[pins.shift_data, pins.shift_clock, pins.shift_latch] {
			gpio.write(pin, Level::Low);
			gpio.pin_mode(pin, PinMode::Output);
		}

		let bus = AddressBus::new(pins.shift_data, pins.shift_clock, pins.shift_latch);
		Eeprom { gpio, pins, bus, capacity }
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn gpio(&self) -> &G {
		&self.gpio
	}

	fn check_address(&self, address: usize) -> crate::AResult<()> {
		ensure!(address < self.capacity,
			"address 0x{:04x} out of range (device has 0x{:04x} cells)", address, self.capacity);
		Ok(())
	}

	fn check_range(&self, start: usize, count: usize) -> crate::AResult<()> {
		self.check_address(start)?;
		ensure!(count <= self.capacity - start,
			"range 0x{:04x}+{} runs past the end of the device (0x{:04x} cells)", start, count, self.capacity);
		Ok(())
	}

	pub fn read_byte(&mut self, address: usize) -> crate::AResult<u8> {
		self.check_address(address)?;

		// inputs *before* the chip starts driving the bus
		let data_pins = self.pins.data;
		for &pin in &data_pins {
			self.gpio.pin_mode(pin, PinMode::Input);
		}

		self.bus.set_address(&mut self.gpio, address, true);

		// access time is well below the per-pin call overhead, no
		// extra settle delay needed after the latch pulse
		let mut data = 0u8;
		for (bit, &pin) in data_pins.iter().enumerate() {
			if self.gpio.read(pin).is_high() {
				data |= 1 << bit;
			}
		}
		debug!("read 0x{:02x} at 0x{:04x}", data, address);
		Ok(data)
	}

	pub fn write_byte(&mut self, address: usize, data: u8) -> crate::AResult<()> {
		self.check_address(address)?;
		debug!("write 0x{:02x} at 0x{:04x}", data, address);

		let data_pins = self.pins.data;
		for &pin in &data_pins {
			self.gpio.pin_mode(pin, PinMode::Output);
		}

		self.bus.set_address(&mut self.gpio, address, false);

		for (bit, &pin) in data_pins.iter().enumerate() {
			self.gpio.write(pin, Level::from(0 != data & (1 << bit)));
		}

		self.gpio.write(self.pins.write_enable, Level::Low);
		spin_wait(WRITE_PULSE);
		self.gpio.write(self.pins.write_enable, Level::High);

		// chip runs its internal write cycle now; the bus is off
		// limits until it completes
		reliable_sleep(WRITE_CYCLE);
		Ok(())
	}

	/// Write consecutive cells starting at `start`, strictly
	/// ascending, one cell at a time. Not atomic: an interruption
	/// leaves the earlier cells written.
	pub fn write_bytes(&mut self, start: usize, data: &[u8]) -> crate::AResult<()> {
		self.check_range(start, data.len())?;
		for (offset, &byte) in data.iter().enumerate() {
			self.write_byte(start + offset, byte)?;
		}
		Ok(())
	}

	/// Fill `count` cells from `start` with 0xff.
	pub fn erase_bytes(&mut self, start: usize, count: usize) -> crate::AResult<()> {
		self.check_range(start, count)?;
		for address in start..start + count {
			self.write_byte(address, 0xff)?;
		}
		Ok(())
	}

	pub fn read_bytes(&mut self, start: usize, target: &mut [u8]) -> crate::AResult<()> {
		self.check_range(start, target.len())?;
		for (offset, t) in target.iter_mut().enumerate() {
			*t = self.read_byte(start + offset)?;
		}
		Ok(())
	}

	/// Hex report of `count` cells from `start`, sixteen per row,
	/// each row prefixed with its base address. Read-only.
	pub fn dump_range(&mut self, start: usize, count: usize) -> crate::AResult<String> {
		use std::fmt::Write;

		self.check_range(start, count)?;
		let mut out = String::new();
		let mut address = start;
		let end = start + count;
		while address < end {
			write!(out, "{:04x}:", address)?;
			for _ in 0..16 {
				if address >= end {
					break;
				}
				write!(out, " {:02x}", self.read_byte(address)?)?;
				address += 1;
			}
			out.push('\n');
		}
		Ok(out)
	}

	pub fn dump_all(&mut self) -> crate::AResult<String> {
		self.dump_range(0, self.capacity)
	}
}

#[cfg(test)]
mod test {
	use crate::eeprom::{
		AT28C16_CAPACITY,
		PinAssignment,
	};
	use crate::gpio::SimGpio;

	use super::Eeprom;

	fn test_eeprom() -> Eeprom<SimGpio> {
		let pins = PinAssignment::bcm_default();
		let gpio = SimGpio::new(pins.clone(), AT28C16_CAPACITY);
		Eeprom::new(gpio, pins, AT28C16_CAPACITY)
	}

	fn check_write_then_read(ee: &mut Eeprom<SimGpio>, address: usize, data: u8) {
		ee.write_byte(address, data).unwrap();
		assert_eq!(data, ee.read_byte(address).unwrap(), "cell 0x{:04x}", address);
	}

	#[test]
	fn write_then_read_identity() {
		let mut ee = test_eeprom();
		for &address in &[0x000, 0x001, 0x02a, 0x400, 0x7ff] {
			for &data in &[0x00, 0x01, 0x55, 0x80, 0xaa, 0xff] {
				check_write_then_read(&mut ee, address, data);
			}
		}
	}

	#[test]
	fn write_then_read_all_byte_values() {
		let mut ee = test_eeprom();
		for data in 0..=0xff {
			check_write_then_read(&mut ee, 0x010, data);
		}
	}

	#[test]
	fn fresh_device_reads_erased() {
		let mut ee = test_eeprom();
		assert_eq!(0xff, ee.read_byte(0).unwrap());
		assert_eq!(0xff, ee.read_byte(ee.capacity() - 1).unwrap());
	}

	#[test]
	fn erase_fills_with_ff() {
		let mut ee = test_eeprom();
		ee.write_bytes(0, &[0x12, 0x34, 0x56, 0x78]).unwrap();
		ee.erase_bytes(0, 4).unwrap();
		for address in 0..4 {
			assert_eq!(0xff, ee.read_byte(address).unwrap(), "cell 0x{:04x}", address);
		}
	}

	#[test]
	fn bulk_write_keeps_order() {
		let mut ee = test_eeprom();
		ee.write_bytes(0, &[0xca, 0xfe, 0xba, 0xbe]).unwrap();
		let mut read_back = [0u8; 4];
		ee.read_bytes(0, &mut read_back).unwrap();
		assert_eq!([0xca, 0xfe, 0xba, 0xbe], read_back);
	}

	#[test]
	fn out_of_range_is_rejected() {
		let mut ee = test_eeprom();
		assert!(ee.write_byte(AT28C16_CAPACITY, 0).is_err());
		assert!(ee.write_byte(0x10000, 0).is_err());
		assert!(ee.read_byte(AT28C16_CAPACITY).is_err());
		assert!(ee.dump_range(AT28C16_CAPACITY - 8, 16).is_err());

		// rejected ranges must not be partially written
		assert!(ee.write_bytes(AT28C16_CAPACITY - 2, &[1, 2, 3]).is_err());
		assert_eq!(0xff, ee.read_byte(AT28C16_CAPACITY - 2).unwrap());
		assert_eq!(0xff, ee.read_byte(AT28C16_CAPACITY - 1).unwrap());
	}

	#[test]
	fn data_lines_are_lsb_first() {
		let mut ee = test_eeprom();
		let pins = PinAssignment::bcm_default();
		ee.write_byte(0, 0b1000_0001).unwrap();

		// the data pins still hold the driven levels after the strobe
		assert!(ee.gpio().level(pins.data[0]).is_high());
		for bit in 1..7 {
			assert!(!ee.gpio().level(pins.data[bit]).is_high(), "line {}", bit);
		}
		assert!(ee.gpio().level(pins.data[7]).is_high());
	}

	#[test]
	fn dump_groups_sixteen_per_row() {
		let mut ee = test_eeprom();
		ee.write_bytes(0x10, &[0xca, 0xfe]).unwrap();
		let dump = ee.dump_range(0, 36).unwrap();
		let lines: Vec<&str> = dump.lines().collect();
		assert_eq!(3, lines.len());
		assert_eq!("0000: ff ff ff ff ff ff ff ff ff ff ff ff ff ff ff ff", lines[0]);
		assert_eq!("0010: ca fe ff ff ff ff ff ff ff ff ff ff ff ff ff ff", lines[1]);
		assert_eq!("0020: ff ff ff ff", lines[2]);
	}
}
