use std::fmt;
use std::str;

mod header;
mod linux;

pub use self::header::{
	HeaderPin,
	PinNumbering,
	board_to_bcm,
	header_pins,
};

// OS-specific. for now linux only.
pub use self::linux::{
	MappedGpio,
	SysfsGpio,
	open_gpiomem,
	open_sysfs,
};

/// GPIO line as numbered by the GPIO Access implementation (BCM line numbers
/// for the linux backends).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Pin(pub u32);

impl fmt::Display for Pin {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "GPIO{}", self.0)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Input,
	Output,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

impl Level {
	pub fn is_high(self) -> bool {
		self == Level::High
	}
}

impl From<bool> for Level {
	fn from(v: bool) -> Self {
		match v {
			false => Level::Low,
			true => Level::High,
		}
	}
}

/// Access to GPIO lines.
///
/// `write_level` must take effect before it returns; the bit-banged
/// protocols on top of this rely on that for their timing.
pub trait GpioAccess {
	fn configure(&mut self, pin: Pin, direction: Direction) -> crate::AResult<()>;
	fn read_level(&mut self, pin: Pin) -> crate::AResult<Level>;
	fn write_level(&mut self, pin: Pin, level: Level) -> crate::AResult<()>;
}

impl<'a, G: ?Sized + GpioAccess> GpioAccess for &'a mut G {
	fn configure(&mut self, pin: Pin, direction: Direction) -> crate::AResult<()> {
		G::configure(*self, pin, direction)
	}
	fn read_level(&mut self, pin: Pin) -> crate::AResult<Level> {
		G::read_level(*self, pin)
	}
	fn write_level(&mut self, pin: Pin, level: Level) -> crate::AResult<()> {
		G::write_level(*self, pin, level)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Backend {
	/// `/sys/class/gpio`
	Sysfs,
	/// memory mapped BCM283x registers through `/dev/gpiomem`
	GpioMem,
}

impl fmt::Display for Backend {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Backend::Sysfs => write!(f, "sysfs"),
			Backend::GpioMem => write!(f, "gpiomem"),
		}
	}
}

impl str::FromStr for Backend {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"sysfs" => Ok(Backend::Sysfs),
			"gpiomem" => Ok(Backend::GpioMem),
			_ => bail!("Unknown GPIO backend {:?} (expected sysfs or gpiomem)", s),
		}
	}
}
