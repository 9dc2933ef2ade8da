#[cfg(test)]
#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod cli;
pub mod error;
pub mod gpio;
pub mod hx711;
pub mod interrupt;

/// Open the selected GPIO backend, run `f` on it and release all lines
/// afterwards (also when `f` fails).
pub fn with_gpio<F, R>(backend: gpio::Backend, base: u32, f: F) -> AResult<R>
where
	F: FnOnce(&mut dyn gpio::GpioAccess) -> AResult<R>,
{
	match backend {
		gpio::Backend::Sysfs => {
			let mut gpio = gpio::open_sysfs(base)?;
			let res = f(&mut gpio);
			finish(res, gpio.close())
		},
		gpio::Backend::GpioMem => {
			if base != 0 {
				warn!("GPIO chip base {} ignored by the gpiomem backend", base);
			}
			let mut gpio = gpio::open_gpiomem()?;
			let res = f(&mut gpio);
			finish(res, gpio.close())
		},
	}
}

fn finish<R>(res: AResult<R>, closed: AResult<()>) -> AResult<R> {
	match (res, closed) {
		(Ok(r), Ok(())) => Ok(r),
		(Ok(_), Err(e)) => Err(e),
		(Err(e), Ok(())) => Err(e),
		(Err(e), Err(close_err)) => {
			error!("Failed releasing GPIO lines: {}", error::display_chain(&close_err));
			Err(e)
		},
	}
}
