#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate hx711_gpio;
use hx711_gpio::*;

use std::process::exit;
use std::time::Duration;

use hx711_gpio::error::{
	ErrorKind,
	display_chain,
	error_kind,
};
use hx711_gpio::gpio::GpioAccess;
use hx711_gpio::hx711::{
	Sampler,
	StdDelay,
};

fn with_sampler<F, R>(options: &cli::Options, f: F) -> AResult<R>
where
	F: FnOnce(&mut Sampler<&mut dyn GpioAccess>) -> AResult<R>,
{
	let config = options.config()?;
	with_gpio(options.backend, options.base, |gpio| {
		let mut sampler = Sampler::with_config(gpio, StdDelay, config)?;
		f(&mut sampler)
	})
}

fn ready(options: &cli::Options) -> AResult<()> {
	let ready = with_sampler(options, |sampler| sampler.is_ready())?;
	println!("{}", if ready { "ready" } else { "busy" });
	Ok(())
}

fn read(options: &cli::Options, sub_m: &clap::ArgMatches) -> AResult<()> {
	let timeout = if sub_m.is_present("timeout") {
		Some(Duration::from_millis(cli::get_param(sub_m, "timeout")?))
	} else {
		None
	};
	// waiting can take forever; Ctrl-C must still release the lines
	let interrupted = interrupt::install()?;
	match with_sampler(options, |sampler| sampler.read_until(timeout, interrupted)) {
		Ok(value) => println!("{}", value),
		Err(ref e) if error_kind(e) == Some(ErrorKind::Cancelled) => info!("Interrupted, no sample read"),
		Err(e) => return Err(e),
	}
	Ok(())
}

// releasing the lines lets PD_SCK float, so stay around while powered down
fn power_down(options: &cli::Options) -> AResult<()> {
	let interrupted = interrupt::install()?;
	with_sampler(options, |sampler| {
		sampler.power_down()?;
		info!("Powered down, press Ctrl-C to power up again");
		while interrupt::sleep(Duration::from_secs(1), interrupted) {}
		sampler.power_up()
	})
}

fn pins() {
	for (physical, function) in gpio::header_pins() {
		println!("{:2}: {}", physical, function);
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg backend: -b --backend +takes_value "GPIO access: sysfs (default) or gpiomem")
		(@arg numbering: -n --numbering +takes_value "pin numbers are: board (physical header pin, default) or bcm")
		(@arg base: --base +takes_value "sysfs number of BCM GPIO line 0 (default: 0)")
		(@arg data: -d --data +takes_value "data (DOUT) pin (default: 38)")
		(@arg clock: -c --clock +takes_value "clock (PD_SCK) pin (default: 40)")
		(@arg gain: -g --gain +takes_value "128 (channel A, default), 64 (channel A) or 32 (channel B)")
		(@subcommand ready =>
			(about: "show whether a conversion is ready (DOUT low)")
		)
		(@subcommand read =>
			(about: "wait for and print one sample")
			(@arg timeout: -t --timeout +takes_value "give up after this many milliseconds")
		)
		(@subcommand power_down =>
			(about: "power down the chip and keep it down until interrupted (Ctrl-C)")
		)
		(@subcommand power_up =>
			(about: "power up the chip (resets to channel A, gain 128)")
		)
		(@subcommand reset =>
			(about: "power cycle the chip")
		)
		(@subcommand pins =>
			(about: "list the Raspberry Pi header pins")
		)
	).get_matches();
	let options = cli::Options::from_matches(&matches)?;

	match matches.subcommand() {
		("ready", _) => {
			ready(&options)
		}
		("read", Some(sub_m)) => {
			read(&options, sub_m)
		}
		("power_down", _) => {
			power_down(&options)
		}
		("power_up", _) => {
			with_sampler(&options, |sampler| sampler.power_up())
		}
		("reset", _) => {
			with_sampler(&options, |sampler| sampler.reset())
		}
		("pins", _) => {
			pins();
			Ok(())
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", display_chain(&e));
		exit(1);
	}
}
