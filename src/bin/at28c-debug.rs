#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
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

// addresses and byte values, decimal or 0x-prefixed hex
fn get_num(matches: &clap::ArgMatches, name: &str) -> AResult<usize> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	let (digits, radix) = if param.starts_with("0x") {
		(&param[2..], 16)
	} else {
		(param, 10)
	};
	match usize::from_str_radix(digits, radix) {
		Ok(v) => Ok(v),
		Err(e) => bail!("invalid parameter {} ({:?}): {}", name, param, e),
	}
}

fn get_count<G: Gpio>(ee: &Eeprom<G>, sub_m: &clap::ArgMatches, start: usize) -> AResult<usize> {
	if sub_m.is_present("COUNT") {
		get_num(sub_m, "COUNT")
	} else {
		Ok(ee.capacity().saturating_sub(start))
	}
}

fn run<G: Gpio>(ee: &mut Eeprom<G>, matches: &clap::ArgMatches) -> AResult<()> {
	match matches.subcommand() {
		("read", Some(sub_m)) => {
			let address = get_num(sub_m, "ADDRESS")?;
			println!("0x{:02x}", ee.read_byte(address)?);
			Ok(())
		},
		("write", Some(sub_m)) => {
			let address = get_num(sub_m, "ADDRESS")?;
			let data = get_num(sub_m, "DATA")?;
			ensure!(data <= 0xff, "data 0x{:x} doesn't fit one byte", data);
			ee.write_byte(address, data as u8)?;
			info!("wrote 0x{:02x} at 0x{:04x}", data, address);
			Ok(())
		},
		("dump", Some(sub_m)) => {
			let start = get_num(sub_m, "START")?;
			let count = get_count(ee, sub_m, start)?;
			print!("{}", ee.dump_range(start, count)?);
			Ok(())
		},
		("erase", Some(sub_m)) => {
			let start = get_num(sub_m, "START")?;
			let count = get_count(ee, sub_m, start)?;
			ee.erase_bytes(start, count)?;
			info!("erased {} cells from 0x{:04x}", count, start);
			Ok(())
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg dry_run: --("dry-run") "Drive a simulated board instead of /dev/gpiomem")
		(@subcommand read =>
			(about: "read one byte")
			(@arg ADDRESS: +required "cell address (decimal or 0x hex)")
		)
		(@subcommand write =>
			(about: "write one byte")
			(@arg ADDRESS: +required "cell address (decimal or 0x hex)")
			(@arg DATA: +required "byte value (decimal or 0x hex)")
		)
		(@subcommand dump =>
			(about: "hex dump a range of cells")
			(@arg START: +required "first address")
			(@arg COUNT: "number of bytes (default: up to the end of the device)")
		)
		(@subcommand erase =>
			(about: "fill a range of cells with 0xff")
			(@arg START: +required "first address")
			(@arg COUNT: "number of bytes (default: up to the end of the device)")
		)
	).get_matches();

	let pins = PinAssignment::bcm_default();
	if matches.is_present("dry_run") {
		warn!("dry run: no hardware will be touched");
		let gpio = SimGpio::new(pins.clone(), AT28C16_CAPACITY);
		run(&mut Eeprom::new(gpio, pins, AT28C16_CAPACITY), &matches)
	} else {
		let gpio = GpioMem::open()?;
		run(&mut Eeprom::new(gpio, pins, AT28C16_CAPACITY), &matches)
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
