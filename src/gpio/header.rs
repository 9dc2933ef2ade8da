/* Raspberry Pi 40-pin header (all models since B+) */

use std::fmt;
use std::str;

use super::Pin;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum HeaderPin {
	Power3V3,
	Power5V,
	Ground,
	/// BCM line number
	Gpio(u8),
}

impl fmt::Display for HeaderPin {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			HeaderPin::Power3V3 => write!(f, "3V3"),
			HeaderPin::Power5V => write!(f, "5V"),
			HeaderPin::Ground => write!(f, "GND"),
			HeaderPin::Gpio(n) => write!(f, "GPIO{}", n),
		}
	}
}

use self::HeaderPin::*;

// index: physical pin - 1
const HEADER: [HeaderPin; 40] = [
	Power3V3, Power5V,
	Gpio(2),  Power5V,
	Gpio(3),  Ground,
	Gpio(4),  Gpio(14),
	Ground,   Gpio(15),
	Gpio(17), Gpio(18),
	Gpio(27), Ground,
	Gpio(22), Gpio(23),
	Power3V3, Gpio(24),
	Gpio(10), Ground,
	Gpio(9),  Gpio(25),
	Gpio(11), Gpio(8),
	Ground,   Gpio(7),
	Gpio(0),  Gpio(1),
	Gpio(5),  Ground,
	Gpio(6),  Gpio(12),
	Gpio(13), Ground,
	Gpio(19), Gpio(16),
	Gpio(26), Gpio(20),
	Ground,   Gpio(21),
];

/// All header pins as (physical pin number, function)
pub fn header_pins() -> impl Iterator<Item = (u32, HeaderPin)> {
	HEADER.iter().enumerate().map(|(i, p)| (i as u32 + 1, *p))
}

/// BCM line for physical header pin; `None` for power/ground and unknown pins
pub fn board_to_bcm(physical: u32) -> Option<u32> {
	if physical == 0 || physical as usize > HEADER.len() {
		return None;
	}
	match HEADER[physical as usize - 1] {
		Gpio(n) => Some(n as u32),
		_ => None,
	}
}

/// How pin numbers given by the user are interpreted
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PinNumbering {
	/// physical pin on the 40-pin header
	Board,
	/// BCM line number
	Bcm,
}

impl PinNumbering {
	pub fn resolve(self, number: u32) -> crate::AResult<Pin> {
		match self {
			PinNumbering::Bcm => Ok(Pin(number)),
			PinNumbering::Board => match board_to_bcm(number) {
				Some(bcm) => Ok(Pin(bcm)),
				None if number == 0 || number > 40 => bail!("Header pin {} doesn't exist (1..40)", number),
				None => bail!("Header pin {} is {}, not a GPIO", number, HEADER[number as usize - 1]),
			},
		}
	}
}

impl fmt::Display for PinNumbering {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PinNumbering::Board => write!(f, "board"),
			PinNumbering::Bcm => write!(f, "bcm"),
		}
	}
}

impl str::FromStr for PinNumbering {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"board" => Ok(PinNumbering::Board),
			"bcm" => Ok(PinNumbering::Bcm),
			_ => bail!("Unknown pin numbering {:?} (expected board or bcm)", s),
		}
	}
}
