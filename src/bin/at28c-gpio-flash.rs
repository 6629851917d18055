#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

extern crate at28c_gpio_flash;
use at28c_gpio_flash::*;

use std::process::exit;

use at28c_gpio_flash::eeprom::{
	AT28C16_CAPACITY,
	Eeprom,
	PinAssignment,
};
use at28c_gpio_flash::gpio::{
	Gpio,
	GpioMem,
	SimGpio,
};

const DEMO_BYTES: [u8; 8] = [0xca, 0xfe, 0xba, 0xbe, 0xde, 0xad, 0xbe, 0xef];
const DEMO_DUMP_LEN: usize = 256;

fn run_demo<G: Gpio>(ee: &mut Eeprom<G>) -> AResult<()> {
	info!("writing {} demo bytes at 0x0000", DEMO_BYTES.len());
	ee.write_bytes(0, &DEMO_BYTES)?;
	print!("{}", ee.dump_range(0, DEMO_DUMP_LEN)?);
	println!();

	info!("erasing first {} bytes", DEMO_DUMP_LEN);
	ee.erase_bytes(0, DEMO_DUMP_LEN)?;
	print!("{}", ee.dump_range(0, DEMO_DUMP_LEN)?);

	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg dry_run: --("dry-run") "Drive a simulated board instead of /dev/gpiomem")
	).get_matches();

	let pins = PinAssignment::bcm_default();
	if matches.is_present("dry_run") {
		warn!("dry run: no hardware will be touched");
		let gpio = SimGpio::new(pins.clone(), AT28C16_CAPACITY);
		run_demo(&mut Eeprom::new(gpio, pins, AT28C16_CAPACITY))
	} else {
		let gpio = GpioMem::open()?;
		run_demo(&mut Eeprom::new(gpio, pins, AT28C16_CAPACITY))
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
