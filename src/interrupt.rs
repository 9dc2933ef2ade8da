use std::cmp;
use std::io;
use std::sync::atomic::{
	AtomicBool,
	Ordering,
};
use std::thread;
use std::time::{
	Duration,
	Instant,
};

use libc::{
	SIGINT,
	SIGTERM,
	SIG_ERR,
	c_int,
	sighandler_t,
	signal,
};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

const SLEEP_SLICE: Duration = Duration::from_millis(50);

extern "C" fn on_signal(_signum: c_int) {
	// only async-signal-safe operations in here
	INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Catch SIGINT and SIGTERM; the returned flag is set once one arrives.
///
/// Loops need to check the flag themselves (e.g. pass it to
/// `Sampler::read_cancellable`) and return normally, so that GPIO lines get
/// released on the way out.
pub fn install() -> crate::AResult<&'static AtomicBool> {
	for &signum in &[SIGINT, SIGTERM] {
		let handler = on_signal as extern "C" fn(c_int) as sighandler_t;
		let previous = unsafe { signal(signum, handler) };
		if previous == SIG_ERR {
			bail!("couldn't install handler for signal {}: {}", signum, io::Error::last_os_error());
		}
	}
	Ok(&INTERRUPTED)
}

/// Sleep for `duration` unless `flag` gets set; returns whether the full
/// duration passed.
pub fn sleep(duration: Duration, flag: &AtomicBool) -> bool {
	let deadline = Instant::now() + duration;
	loop {
		if flag.load(Ordering::SeqCst) {
			return false;
		}
		let now = Instant::now();
		if now >= deadline {
			return true;
		}
		thread::sleep(cmp::min(deadline - now, SLEEP_SLICE));
	}
}
