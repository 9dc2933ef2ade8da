#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

extern crate hx711_gpio;
use hx711_gpio::*;

use std::process::exit;
use std::sync::atomic::Ordering;
use std::time::Duration;

use hx711_gpio::error::{
	ErrorKind,
	display_chain,
	error_kind,
};
use hx711_gpio::hx711::{
	Sampler,
	StdDelay,
};

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@arg backend: -b --backend +takes_value "GPIO access: sysfs (default) or gpiomem")
		(@arg numbering: -n --numbering +takes_value "pin numbers are: board (physical header pin, default) or bcm")
		(@arg base: --base +takes_value "sysfs number of BCM GPIO line 0 (default: 0)")
		(@arg data: -d --data +takes_value "data (DOUT) pin (default: 38)")
		(@arg clock: -c --clock +takes_value "clock (PD_SCK) pin (default: 40)")
		(@arg gain: -g --gain +takes_value "128 (channel A, default), 64 (channel A) or 32 (channel B)")
		(@arg interval: -i --interval +takes_value "milliseconds between samples (default: 1000)")
	).get_matches();
	let options = cli::Options::from_matches(&matches)?;
	let interval = Duration::from_millis(cli::get_param_or(&matches, "interval", 1000u64)?);
	let config = options.config()?;

	let interrupted = interrupt::install()?;

	with_gpio(options.backend, options.base, |gpio| {
		let mut sampler = Sampler::with_config(gpio, StdDelay, config)?;
		info!("Reading HX711 on DOUT {} / PD_SCK {} ({}) via {}", config.data, config.clock, config.gain, options.backend);

		while !interrupted.load(Ordering::SeqCst) {
			match sampler.read_cancellable(interrupted) {
				Ok(value) => println!("{}", value),
				Err(ref e) if error_kind(e) == Some(ErrorKind::Cancelled) => break,
				Err(e) => return Err(e),
			}
			interrupt::sleep(interval, interrupted);
		}

		info!("Interrupted, releasing GPIO lines");
		Ok(())
	})
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", display_chain(&e));
		exit(1);
	}
}
