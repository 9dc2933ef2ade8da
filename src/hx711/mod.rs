/// Protocol for the HX711, a 24-bit ADC for weigh scales (load cells).
///
/// Two wires: DOUT (chip to host) and PD_SCK (host to chip). There is no
/// chip select and no addressing.
///
/// - DOUT HIGH: conversion in progress. DOUT LOW: data ready.
/// - Each positive PD_SCK edge shifts out the next bit on DOUT, MSB first;
///   read it while PD_SCK is HIGH.
/// - 24 data bits (two's complement), then 1-3 more pulses select channel and
///   gain for the *next* conversion:
///   - 25 pulses: channel A, gain 128
///   - 26 pulses: channel B, gain 32
///   - 27 pulses: channel A, gain 64
/// - PD_SCK HIGH for more than 60µs powers the chip down; bringing it LOW
///   again powers it up (and resets to channel A, gain 128).
///
/// PD_SCK HIGH must stay well below 50µs while reading, so there is no
/// sleeping between the edges of a data bit.

mod delay;
mod gain;
mod sample;
mod sampler;

pub use self::delay::{
	Delay,
	StdDelay,
	reliable_sleep,
};

pub use self::gain::Gain;

pub use self::sample::{
	RawSample,
	bits_to_int,
	int_to_bits,
};

pub use self::sampler::{
	Config,
	POWER_DOWN_HOLD,
	POWER_UP_HOLD,
	Sampler,
	WaitStrategy,
};
