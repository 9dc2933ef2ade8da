use std::fmt;

const SIGN_BIT: u8 = 0x80;
const FILL_NEGATIVE: u8 = 0xff;
const FILL_POSITIVE: u8 = 0x00;

/// Pack 8 bits, first bit most significant
pub fn bits_to_int(bits: &[bool; 8]) -> u8 {
	bits.iter().fold(0u8, |acc, bit| (acc << 1) | (*bit as u8))
}

/// Inverse of `bits_to_int`
pub fn int_to_bits(byte: u8) -> [bool; 8] {
	let mut bits = [false; 8];
	for (i, bit) in bits.iter_mut().enumerate() {
		*bit = 0 != byte & (0x80 >> i);
	}
	bits
}

/// One conversion: 24-bit two's complement, `bytes[2]` is the most
/// significant byte (the first one on the wire).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSample {
	bytes: [u8; 3],
}

impl RawSample {
	pub fn new(bytes: [u8; 3]) -> Self {
		RawSample { bytes }
	}

	/// from the lowest 24 bits of `pattern`
	pub fn from_pattern(pattern: u32) -> Self {
		RawSample {
			bytes: [pattern as u8, (pattern >> 8) as u8, (pattern >> 16) as u8],
		}
	}

	pub fn bytes(&self) -> [u8; 3] {
		self.bytes
	}

	pub fn pattern(&self) -> u32 {
		(self.bytes[2] as u32) << 16
		| (self.bytes[1] as u32) << 8
		| (self.bytes[0] as u32)
	}

	pub fn is_negative(&self) -> bool {
		0 != self.bytes[2] & SIGN_BIT
	}

	/// byte in front of the 24 bits to get a 32-bit two's complement value
	pub fn fill(&self) -> u8 {
		if self.is_negative() {
			FILL_NEGATIVE
		} else {
			FILL_POSITIVE
		}
	}

	pub fn value(&self) -> i32 {
		((self.fill() as u32) << 24 | self.pattern()) as i32
	}
}

impl fmt::Display for RawSample {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.value())
	}
}

impl fmt::Debug for RawSample {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f,
			"0x{:02x}{:02x}{:02x} (fill: 0x{:02x}, value: {})",
			self.bytes[2],
			self.bytes[1],
			self.bytes[0],
			self.fill(),
			self.value(),
		)
	}
}
