/// Protocol for a parallel EEPROM (AT28C16 and friends) wired behind
/// two daisy-chained 74HC595 shift registers.
///
/// The shift registers present a 16-bit word on their parallel
/// outputs: the low 15 bits drive the address lines (only as many as
/// are wired matter, 11 on an AT28C16), the top bit drives the
/// chip's /OE pin. /OE is active low, so bit 15 is the *inverted*
/// output-enable flag; piggybacking it there saves a dedicated
/// control line.
///
/// Transactions:
/// - READ: data pins to input *before* enabling the chip's output
///   drivers (bus contention otherwise), latch address with output
///   enable on, sample the eight data pins.
/// - WRITE: data pins to output, latch address with output enable
///   off, drive the data pins, then strobe /WE low for >= 100 ns and
///   wait out the chip's internal write cycle (10 ms) before touching
///   the bus again.
///
/// Everything is strictly serialized: the bus is one physical
/// resource, `&mut self` on every transaction is the whole locking
/// story.

use std::thread;
use std::time::{
	Duration,
	Instant,
};

use crate::gpio::Pin;

mod bus;
mod operations;

pub use self::bus::{
	AddressBus,
	AddressWord,
};

pub use self::operations::Eeprom;

/// AT28C16: 2048 cells of one byte.
pub const AT28C16_CAPACITY: usize = 2048;

/// Minimum /WE low time (t_WP). The datasheet asks for 100 ns; we
/// busy-wait since no general-purpose sleep resolves that fine.
pub const WRITE_PULSE: Duration = Duration::from_nanos(100);

/// Internal write cycle time (t_WC) to wait out after the strobe.
pub const WRITE_CYCLE: Duration = Duration::from_millis(10);

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Busy-wait for sub-microsecond delays. Still only a lower bound:
/// portable code cannot promise an upper bound on the pulse width
/// without platform timer support.
pub fn spin_wait(duration: Duration) {
	let start = Instant::now();
	while start.elapsed() < duration {}
}

/// Which physical pin carries which bus signal. Passed in at
/// construction; the protocol code has no wiring baked in.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PinAssignment {
	pub shift_data: Pin,
	pub shift_clock: Pin,
	pub shift_latch: Pin,
	/// Active-low write strobe to the EEPROM.
	pub write_enable: Pin,
	/// Bidirectional data bus, index 0 = least significant bit.
	pub data: [Pin; 8],
}

impl PinAssignment {
	/// The reference board's wiring, in Broadcom pin numbering.
	pub fn bcm_default() -> PinAssignment {
		PinAssignment {
			shift_data: Pin(17),
			shift_clock: Pin(27),
			shift_latch: Pin(18),
			write_enable: Pin(16),
			data: [
				Pin(22), Pin(23), Pin(24), Pin(25),
				Pin(13), Pin(19), Pin(12), Pin(26),
			],
		}
	}
}
