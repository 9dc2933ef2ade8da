use std::fmt;
use std::str;

/// Channel and gain for the next conversion, selected by the number of clock
/// pulses following the 24 data bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Gain {
	/// channel A, gain 128 (chip default after power up)
	A128,
	/// channel B, gain 32
	B32,
	/// channel A, gain 64
	A64,
}

impl Default for Gain {
	fn default() -> Self {
		Gain::A128
	}
}

impl Gain {
	pub fn pulses(self) -> u8 {
		match self {
			Gain::A128 => 1,
			Gain::B32 => 2,
			Gain::A64 => 3,
		}
	}

	pub fn from_pulses(pulses: u8) -> Option<Self> {
		match pulses {
			1 => Some(Gain::A128),
			2 => Some(Gain::B32),
			3 => Some(Gain::A64),
			_ => None,
		}
	}

	pub fn factor(self) -> u8 {
		match self {
			Gain::A128 => 128,
			Gain::B32 => 32,
			Gain::A64 => 64,
		}
	}
}

impl fmt::Display for Gain {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Gain::A128 => write!(f, "channel A, gain 128"),
			Gain::B32 => write!(f, "channel B, gain 32"),
			Gain::A64 => write!(f, "channel A, gain 64"),
		}
	}
}

impl str::FromStr for Gain {
	type Err = ::failure::Error;

	// "128", "a128", "64", "a64", "32", "b32"
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"128" | "a128" => Ok(Gain::A128),
			"64" | "a64" => Ok(Gain::A64),
			"32" | "b32" => Ok(Gain::B32),
			_ => bail!("Invalid gain {:?} (expected 128, 64 or 32)", s),
		}
	}
}
