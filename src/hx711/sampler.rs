use std::sync::atomic::{
	AtomicBool,
	Ordering,
};
use std::thread;
use std::time::{
	Duration,
	Instant,
};

use crate::error::{
	ErrorKind,
	ResultExt,
};
use crate::gpio::{
	Direction,
	GpioAccess,
	Level,
	Pin,
};

use super::{
	Delay,
	Gain,
	RawSample,
	StdDelay,
	bits_to_int,
};

/// PD_SCK HIGH for more than 60µs powers the chip down
pub const POWER_DOWN_HOLD: Duration = Duration::from_micros(100);
/// PD_SCK LOW after power down until the chip is awake
pub const POWER_UP_HOLD: Duration = Duration::from_micros(100);

const DATA_BYTES: usize = 3;

/// What to do between two polls of DOUT while waiting for a conversion.
///
/// Either way the calling thread is blocked until the chip is ready.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WaitStrategy {
	/// poll again immediately
	Spin,
	/// `std::thread::yield_now()` between polls
	Yield,
}

impl Default for WaitStrategy {
	fn default() -> Self {
		WaitStrategy::Spin
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Config {
	pub data: Pin,
	pub clock: Pin,
	pub gain: Gain,
	pub wait: WaitStrategy,
}

impl Config {
	pub fn new(data: Pin, clock: Pin) -> Self {
		Config {
			data,
			clock,
			gain: Gain::default(),
			wait: WaitStrategy::default(),
		}
	}

	pub fn gain(mut self, gain: Gain) -> Self {
		self.gain = gain;
		self
	}

	pub fn wait(mut self, wait: WaitStrategy) -> Self {
		self.wait = wait;
		self
	}
}

/// HX711 driver on two GPIO lines.
///
/// The driver doesn't track the chip state: calling `read` after
/// `power_down` waits forever (use `read_timeout` or `read_cancellable` if
/// that can happen).
pub struct Sampler<G: GpioAccess, D: Delay = StdDelay> {
	gpio: G,
	delay: D,
	data: Pin,
	clock: Pin,
	gain: Gain,
	wait: WaitStrategy,
}

impl<G: GpioAccess> Sampler<G> {
	/// Channel A with gain 128, spinning while waiting
	pub fn new(gpio: G, data: Pin, clock: Pin) -> crate::AResult<Self> {
		Self::with_config(gpio, StdDelay, Config::new(data, clock))
	}
}

impl<G: GpioAccess, D: Delay> Sampler<G, D> {
	pub fn with_config(mut gpio: G, delay: D, config: Config) -> crate::AResult<Self> {
		gpio.configure(config.data, Direction::Input).kind(ErrorKind::HardwareConfig)?;
		gpio.configure(config.clock, Direction::Output).kind(ErrorKind::HardwareConfig)?;
		debug!("HX711 on DOUT {} / PD_SCK {}, {}", config.data, config.clock, config.gain);

		Ok(Sampler {
			gpio,
			delay,
			data: config.data,
			clock: config.clock,
			gain: config.gain,
			wait: config.wait,
		})
	}

	pub fn data_pin(&self) -> Pin {
		self.data
	}

	pub fn clock_pin(&self) -> Pin {
		self.clock
	}

	pub fn gain(&self) -> Gain {
		self.gain
	}

	pub fn gpio(&self) -> &G {
		&self.gpio
	}

	/// Give back the GPIO access (the lines stay configured)
	pub fn into_inner(self) -> G {
		self.gpio
	}

	/// Conversion finished (DOUT LOW); only reads DOUT
	pub fn is_ready(&mut self) -> crate::AResult<bool> {
		let level = self.gpio.read_level(self.data).kind(ErrorKind::Io)?;
		Ok(level == Level::Low)
	}

	/// Wait (without limit) for the next conversion and read it
	pub fn read(&mut self) -> crate::AResult<i32> {
		self.wait_ready(None, None)?;
		self.read_conversion()
	}

	/// Like `read`, but fails with `ErrorKind::Timeout` if the chip isn't
	/// ready within `timeout`. DOUT is polled at least once.
	pub fn read_timeout(&mut self, timeout: Duration) -> crate::AResult<i32> {
		self.wait_ready(Some(Instant::now() + timeout), None)?;
		self.read_conversion()
	}

	/// Like `read`, but fails with `ErrorKind::Cancelled` once `cancel` is set
	/// while waiting. A conversion already being clocked out is finished.
	pub fn read_cancellable(&mut self, cancel: &AtomicBool) -> crate::AResult<i32> {
		self.wait_ready(None, Some(cancel))?;
		self.read_conversion()
	}

	/// `read_cancellable` with an optional `read_timeout` limit on top
	pub fn read_until(&mut self, timeout: Option<Duration>, cancel: &AtomicBool) -> crate::AResult<i32> {
		self.wait_ready(timeout.map(|t| Instant::now() + t), Some(cancel))?;
		self.read_conversion()
	}

	fn wait_ready(&mut self, deadline: Option<Instant>, cancel: Option<&AtomicBool>) -> crate::AResult<()> {
		while !self.is_ready()? {
			if let Some(cancel) = cancel {
				if cancel.load(Ordering::Relaxed) {
					return Err(ErrorKind::Cancelled.into());
				}
			}
			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Err(ErrorKind::Timeout.into());
				}
			}
			if self.wait == WaitStrategy::Yield {
				thread::yield_now();
			}
		}
		Ok(())
	}

	fn set_clock(&mut self, level: Level) -> crate::AResult<()> {
		self.gpio.write_level(self.clock, level).kind(ErrorKind::Io)
	}

	fn pulse(&mut self) -> crate::AResult<()> {
		self.set_clock(Level::High)?;
		self.set_clock(Level::Low)
	}

	// one PD_SCK pulse, sampling DOUT while HIGH
	fn clock_bit(&mut self) -> crate::AResult<bool> {
		self.set_clock(Level::High)?;
		let level = self.gpio.read_level(self.data).kind(ErrorKind::Io);
		// drop PD_SCK even if reading failed; staying HIGH powers the chip down
		self.set_clock(Level::Low)?;
		Ok(level?.is_high())
	}

	fn read_conversion(&mut self) -> crate::AResult<i32> {
		let mut bits = [[false; 8]; DATA_BYTES];
		let mut bytes = [0u8; DATA_BYTES];

		// most significant byte first
		for byte in (0..DATA_BYTES).rev() {
			for bit in 0..8 {
				bits[byte][bit] = self.clock_bit()?;
			}
			bytes[byte] = bits_to_int(&bits[byte]);
		}

		// select channel/gain for the next conversion
		for _ in 0..self.gain.pulses() {
			self.pulse()?;
		}

		let sample = RawSample::new(bytes);
		trace!("HX711 sample {:?}", sample);
		Ok(sample.value())
	}

	/// PD_SCK LOW -> HIGH, then hold HIGH until the chip is powered down
	pub fn power_down(&mut self) -> crate::AResult<()> {
		self.set_clock(Level::Low)?;
		self.set_clock(Level::High)?;
		self.delay.delay(POWER_DOWN_HOLD);
		debug!("HX711 on PD_SCK {} powered down", self.clock);
		Ok(())
	}

	/// PD_SCK LOW and hold; the chip comes up with channel A, gain 128
	pub fn power_up(&mut self) -> crate::AResult<()> {
		self.set_clock(Level::Low)?;
		self.delay.delay(POWER_UP_HOLD);
		debug!("HX711 on PD_SCK {} powered up", self.clock);
		Ok(())
	}

	/// Full power cycle, e.g. to recover from an interrupted readout
	pub fn reset(&mut self) -> crate::AResult<()> {
		self.power_down()?;
		self.power_up()
	}
}

#[cfg(test)]
mod test {
	use std::collections::VecDeque;
	use std::sync::atomic::AtomicBool;
	use std::time::Duration;

	use super::*;
	use crate::error::error_kind;

	const DOUT: Pin = Pin(20);
	const PD_SCK: Pin = Pin(21);

	// simulated HX711: shifts out queued samples on rising PD_SCK edges
	struct FakeChip {
		configured: Vec<(Pin, Direction)>,
		samples: VecDeque<u32>,
		current: u32,
		busy_polls: usize,
		clock: Level,
		pulses: usize, // rising edges since the current conversion became ready
		clock_log: Vec<Level>,
		data_reads: usize,
		fail_configure: bool,
		fail_read: bool,
	}

	impl FakeChip {
		fn new() -> Self {
			FakeChip {
				configured: Vec::new(),
				samples: VecDeque::new(),
				current: 0,
				busy_polls: 0,
				clock: Level::Low,
				pulses: 0,
				clock_log: Vec::new(),
				data_reads: 0,
				fail_configure: false,
				fail_read: false,
			}
		}

		// bytes as on the wire, most significant first
		fn with_sample(bytes: [u8; 3]) -> Self {
			let mut chip = FakeChip::new();
			chip.push(bytes);
			chip
		}

		fn push(&mut self, bytes: [u8; 3]) {
			self.samples.push_back((bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32);
		}

		fn rising_edges(&self) -> usize {
			self.clock_log.iter().filter(|l| **l == Level::High).count()
		}
	}

	impl GpioAccess for FakeChip {
		fn configure(&mut self, pin: Pin, direction: Direction) -> crate::AResult<()> {
			ensure!(!self.fail_configure, "export {}: Permission denied", pin);
			self.configured.push((pin, direction));
			Ok(())
		}

		fn read_level(&mut self, pin: Pin) -> crate::AResult<Level> {
			assert_eq!(pin, DOUT, "only DOUT is read");
			ensure!(!self.fail_read, "read {}: Input/output error", pin);
			self.data_reads += 1;
			match self.clock {
				Level::Low => {
					if self.pulses >= 25 {
						// previous conversion clocked out completely
						self.pulses = 0;
					}
					if self.pulses > 0 {
						// between two data bits DOUT keeps the last bit
						return Ok(Level::from(0 != self.current & (1 << (24 - self.pulses))));
					}
					if self.busy_polls > 0 {
						self.busy_polls -= 1;
						return Ok(Level::High);
					}
					Ok(if self.samples.is_empty() { Level::High } else { Level::Low })
				},
				Level::High => {
					assert!(self.pulses >= 1 && self.pulses <= 24, "DOUT sampled on gain pulse {}", self.pulses);
					Ok(Level::from(0 != self.current & (1 << (24 - self.pulses))))
				},
			}
		}

		fn write_level(&mut self, pin: Pin, level: Level) -> crate::AResult<()> {
			assert_eq!(pin, PD_SCK, "only PD_SCK is written");
			if level == Level::High && self.clock == Level::Low {
				if self.pulses == 0 {
					if let Some(sample) = self.samples.pop_front() {
						self.current = sample;
					}
				}
				self.pulses += 1;
			}
			self.clock = level;
			self.clock_log.push(level);
			Ok(())
		}
	}

	#[derive(Default)]
	struct RecordingDelay(Vec<Duration>);

	impl Delay for RecordingDelay {
		fn delay(&mut self, duration: Duration) {
			self.0.push(duration);
		}
	}

	fn sampler<'a>(chip: &'a mut FakeChip, delay: &'a mut RecordingDelay, gain: Gain) -> Sampler<&'a mut FakeChip, &'a mut RecordingDelay> {
		Sampler::with_config(chip, delay, Config::new(DOUT, PD_SCK).gain(gain)).unwrap()
	}

	#[test]
	fn configures_pins() {
		let mut chip = FakeChip::new();
		{
			let s = Sampler::new(&mut chip, DOUT, PD_SCK).unwrap();
			assert_eq!(s.data_pin(), DOUT);
			assert_eq!(s.clock_pin(), PD_SCK);
			assert_eq!(s.gain(), Gain::A128);
		}
		assert_eq!(chip.configured, vec![(DOUT, Direction::Input), (PD_SCK, Direction::Output)]);
		assert!(chip.clock_log.is_empty());
	}

	#[test]
	fn configure_failure() {
		let mut chip = FakeChip::new();
		chip.fail_configure = true;
		let e = Sampler::new(&mut chip, DOUT, PD_SCK).err().unwrap();
		assert_eq!(error_kind(&e), Some(ErrorKind::HardwareConfig));
	}

	#[test]
	fn positive_sample() {
		let mut chip = FakeChip::with_sample([0x02, 0x00, 0x00]);
		let mut delay = RecordingDelay::default();
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		assert_eq!(s.read().unwrap(), 131072);
	}

	#[test]
	fn negative_sample() {
		let mut chip = FakeChip::with_sample([0x82, 0x00, 0x00]);
		let mut delay = RecordingDelay::default();
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		let value = s.read().unwrap();
		assert_eq!(value as u32, 0xff82_0000);
		assert_eq!(value, -8257536);
		assert_eq!(s.read_timeout(Duration::from_millis(0)).err().map(|e| error_kind(&e)), Some(Some(ErrorKind::Timeout)));
	}

	#[test]
	fn mixed_bytes() {
		let mut chip = FakeChip::with_sample([0x12, 0x34, 0x56]);
		chip.push([0xff, 0xff, 0xff]);
		chip.push([0x7f, 0xff, 0xff]);
		chip.push([0x80, 0x00, 0x01]);
		let mut delay = RecordingDelay::default();
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		assert_eq!(s.read().unwrap(), 0x12_3456);
		assert_eq!(s.read().unwrap(), -1);
		assert_eq!(s.read().unwrap(), 0x7f_ffff);
		assert_eq!(s.read().unwrap(), -0x7f_ffff);
	}

	#[test]
	fn gain_pulses() {
		for &gain in &[Gain::A128, Gain::B32, Gain::A64] {
			let mut chip = FakeChip::with_sample([0x00, 0x00, 0x01]);
			let mut delay = RecordingDelay::default();
			assert_eq!(sampler(&mut chip, &mut delay, gain).read().unwrap(), 1);

			assert_eq!(chip.rising_edges(), 24 + gain.pulses() as usize, "{}", gain);
			// strictly alternating HIGH/LOW, ending LOW
			for (i, level) in chip.clock_log.iter().enumerate() {
				assert_eq!(*level, Level::from(i % 2 == 0));
			}
			assert_eq!(chip.clock_log.last(), Some(&Level::Low));
			// one poll for readiness, then one read per data bit only
			assert_eq!(chip.data_reads, 1 + 24);
		}
	}

	#[test]
	fn waits_for_ready() {
		for &wait in &[WaitStrategy::Spin, WaitStrategy::Yield] {
			let mut chip = FakeChip::with_sample([0x00, 0x10, 0x00]);
			chip.busy_polls = 50;
			let mut delay = RecordingDelay::default();
			{
				let config = Config::new(DOUT, PD_SCK).wait(wait);
				let mut s = Sampler::with_config(&mut chip, &mut delay, config).unwrap();
				assert_eq!(s.read().unwrap(), 0x1000);
			}
			assert_eq!(chip.data_reads, 51 + 24);
			assert_eq!(chip.rising_edges(), 25);
		}
	}

	#[test]
	fn is_ready_only_reads_dout() {
		let mut chip = FakeChip::with_sample([0x00, 0x00, 0x00]);
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			for _ in 0..5 {
				assert!(s.is_ready().unwrap());
			}
		}
		assert!(chip.clock_log.is_empty());
		assert_eq!(chip.samples.len(), 1);

		let mut chip = FakeChip::new();
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		for _ in 0..5 {
			assert!(!s.is_ready().unwrap());
		}
	}

	#[test]
	fn timeout() {
		let mut chip = FakeChip::new();
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			let e = s.read_timeout(Duration::from_millis(5)).unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Timeout));
		}
		assert!(chip.clock_log.is_empty());
	}

	#[test]
	fn timeout_still_reads_ready_chip() {
		let mut chip = FakeChip::with_sample([0x00, 0x00, 0x2a]);
		let mut delay = RecordingDelay::default();
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		assert_eq!(s.read_timeout(Duration::from_millis(0)).unwrap(), 42);
	}

	#[test]
	fn cancel() {
		let cancel = AtomicBool::new(true);
		let mut chip = FakeChip::new();
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			let e = s.read_cancellable(&cancel).unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Cancelled));
		}
		assert!(chip.clock_log.is_empty());

		// not cancelled: normal read
		let cancel = AtomicBool::new(false);
		let mut chip = FakeChip::with_sample([0xff, 0xff, 0xfe]);
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		assert_eq!(s.read_cancellable(&cancel).unwrap(), -2);
	}

	#[test]
	fn cancel_unbounded_wait() {
		let cancel = AtomicBool::new(true);
		let mut chip = FakeChip::new();
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			let e = s.read_until(None, &cancel).unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Cancelled));
			// cancellation wins over an expired limit
			let e = s.read_until(Some(Duration::from_millis(0)), &cancel).unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Cancelled));

			cancel.store(false, Ordering::SeqCst);
			let e = s.read_until(Some(Duration::from_millis(5)), &cancel).unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Timeout));
		}
		assert!(chip.clock_log.is_empty());

		let mut chip = FakeChip::with_sample([0x00, 0x00, 0x02]);
		let mut s = sampler(&mut chip, &mut delay, Gain::A128);
		assert_eq!(s.read_until(None, &cancel).unwrap(), 131072);
	}

	#[test]
	fn read_failure_drops_clock() {
		let mut chip = FakeChip::with_sample([0x01, 0x02, 0x03]);
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			assert!(s.is_ready().unwrap());
			s.gpio.fail_read = true;
			let e = s.read_conversion().unwrap_err();
			assert_eq!(error_kind(&e), Some(ErrorKind::Io));
		}
		assert_eq!(chip.clock_log, vec![Level::High, Level::Low]);
	}

	#[test]
	fn power_cycle() {
		let mut chip = FakeChip::new();
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			s.power_down().unwrap();
		}
		assert_eq!(chip.clock_log, vec![Level::Low, Level::High]);
		assert_eq!(chip.clock, Level::High);
		assert_eq!(delay.0, vec![POWER_DOWN_HOLD]);

		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A128);
			s.power_up().unwrap();
		}
		assert_eq!(chip.clock, Level::Low);
		assert_eq!(delay.0, vec![POWER_DOWN_HOLD, POWER_UP_HOLD]);
	}

	#[test]
	fn reset_leaves_clock_low() {
		let mut chip = FakeChip::new();
		let mut delay = RecordingDelay::default();
		{
			let mut s = sampler(&mut chip, &mut delay, Gain::A64);
			s.reset().unwrap();
		}
		assert_eq!(chip.clock_log, vec![Level::Low, Level::High, Level::Low]);
		assert_eq!(chip.clock_log.last(), Some(&Level::Low));
		assert!(delay.0.iter().all(|d| *d >= Duration::from_micros(100)));
		assert_eq!(delay.0.len(), 2);
	}
}
