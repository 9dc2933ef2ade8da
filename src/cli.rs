use crate::gpio::{
	Backend,
	Pin,
	PinNumbering,
};
use crate::hx711::{
	Config,
	Gain,
};

pub const DEFAULT_DATA_PIN: u32 = 38;
pub const DEFAULT_CLOCK_PIN: u32 = 40;

pub fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> crate::AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

pub fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: T) -> crate::AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	if matches.is_present(name) {
		get_param(matches, name)
	} else {
		Ok(default)
	}
}

/// Wiring options shared by the command line tools
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Options {
	pub backend: Backend,
	pub numbering: PinNumbering,
	pub base: u32,
	pub data: u32,
	pub clock: u32,
	pub gain: Gain,
}

impl Options {
	/// from the `backend`, `numbering`, `base`, `data`, `clock` and `gain`
	/// arguments; missing ones default to board pins 38 (DOUT) and 40 (PD_SCK)
	/// through sysfs
	pub fn from_matches(matches: &clap::ArgMatches) -> crate::AResult<Self> {
		Ok(Options {
			backend: get_param_or(matches, "backend", Backend::Sysfs)?,
			numbering: get_param_or(matches, "numbering", PinNumbering::Board)?,
			base: get_param_or(matches, "base", 0u32)?,
			data: get_param_or(matches, "data", DEFAULT_DATA_PIN)?,
			clock: get_param_or(matches, "clock", DEFAULT_CLOCK_PIN)?,
			gain: get_param_or(matches, "gain", Gain::A128)?,
		})
	}

	pub fn data_pin(&self) -> crate::AResult<Pin> {
		with_context!(("invalid data pin"), self.numbering.resolve(self.data))
	}

	pub fn clock_pin(&self) -> crate::AResult<Pin> {
		with_context!(("invalid clock pin"), self.numbering.resolve(self.clock))
	}

	pub fn config(&self) -> crate::AResult<Config> {
		let data = self.data_pin()?;
		let clock = self.clock_pin()?;
		ensure!(data != clock, "data and clock need different pins (both {})", data);
		Ok(Config::new(data, clock).gain(self.gain))
	}
}
