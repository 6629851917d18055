/// BCM283x GPIO register block, memory-mapped from `/dev/gpiomem`.
///
/// Linux only for now; needs the calling user to be in the `gpio`
/// group (or root).

use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::FromRawFd;
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	c_void,
	mmap,
	munmap,
	open,
};

use super::{
	Gpio,
	Level,
	Pin,
	PinMode,
};

const GPIO_MEM_PATH: &str = "/dev/gpiomem";
// char device, no useful metadata length; the register block fits one page
const GPIO_MEM_LEN: usize = 0x1000;

// register offsets (bank 0 only, GPIO 0..=31)
const GPFSEL_BASE: usize = 0x00; // 3 bits of function select per pin, 10 pins per register
const GPSET0: usize = 0x1c;
const GPCLR0: usize = 0x28;
const GPLEV0: usize = 0x34;

const FSEL_INPUT: u32 = 0b000;
const FSEL_OUTPUT: u32 = 0b001;

#[derive(Debug)]
pub struct GpioMem {
	ptr: ptr::NonNull<u8>, // u8 instead of void for easier offset operations
}

impl Drop for GpioMem {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				GPIO_MEM_LEN,
			);
			if 0 != res {
				panic!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl GpioMem {
	pub fn open() -> crate::AResult<GpioMem> {
		with_context!(("open {}", GPIO_MEM_PATH), {
			Ok(inner_open()?)
		})
	}

	// registers must be accessed with volatile reads/writes, the
	// compiler knows nothing about the hardware behind them
	fn read_register(&self, offset: usize) -> u32 {
		assert!(offset + 3 < GPIO_MEM_LEN);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset) as *const u32) }
	}

	fn write_register(&mut self, offset: usize, data: u32) {
		assert!(offset + 3 < GPIO_MEM_LEN);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset) as *mut u32, data) }
	}
}

impl Gpio for GpioMem {
	fn pin_mode(&mut self, pin: Pin, mode: PinMode) {
		assert!(pin.0 < 32);
		let offset = GPFSEL_BASE + 4 * (pin.0 as usize / 10);
		let shift = 3 * (pin.0 as usize % 10);
		let fsel = match mode {
			PinMode::Input => FSEL_INPUT,
			PinMode::Output => FSEL_OUTPUT,
		};
		let reg = self.read_register(offset);
		self.write_register(offset, (reg & !(0b111 << shift)) | (fsel << shift));
	}

	fn write(&mut self, pin: Pin, level: Level) {
		assert!(pin.0 < 32);
		let offset = match level {
			Level::High => GPSET0,
			Level::Low => GPCLR0,
		};
		self.write_register(offset, 1 << pin.0);
	}

	fn read(&mut self, pin: Pin) -> Level {
		assert!(pin.0 < 32);
		Level::from(0 != self.read_register(GPLEV0) & (1 << pin.0))
	}
}

fn inner_open() -> io::Result<GpioMem> {
	let path = CString::new(GPIO_MEM_PATH)?;

	let fd = unsafe { open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak
	let _f = unsafe { fs::File::from_raw_fd(fd) };

	let area = unsafe {
		mmap(
			ptr::null_mut(),
			GPIO_MEM_LEN,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			0,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u8) {
		None => panic!("mmap shouldn't return NULL ever"),
		Some(area) => Ok(GpioMem { ptr: area }),
	}
}
