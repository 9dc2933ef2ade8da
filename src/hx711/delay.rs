use std::thread;
use std::time::{
	Duration,
	Instant,
};

/// Sleep for at least `duration`, even if woken early
pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Blocking wait used for power state changes
pub trait Delay {
	// must not return before `duration` passed
	fn delay(&mut self, duration: Duration);
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, D: ?Sized + Delay> Delay for &'a mut D {
	fn delay(&mut self, duration: Duration) {
		D::delay(*self, duration)
	}
}
