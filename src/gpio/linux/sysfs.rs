use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{
	Path,
	PathBuf,
};
use std::time::Duration;

use crate::gpio::{
	Direction,
	GpioAccess,
	Level,
	Pin,
};
use crate::hx711::reliable_sleep;

// udev needs a moment to fix permissions of freshly exported lines
const EXPORT_RETRIES: usize = 20;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(10);

struct Line {
	number: u32,
	direction: Direction,
	value: fs::File,
	exported: bool, // whether we exported it (and need to unexport it)
}

pub struct SysfsGpio {
	root: PathBuf,
	base: u32,
	lines: BTreeMap<Pin, Line>,
}

fn write_attribute(path: &Path, data: &str) -> io::Result<()> {
	fs::write(path, data)
}

fn direction_attribute(direction: Direction) -> &'static str {
	match direction {
		Direction::Input => "in",
		// "low" switches to output driving LOW without a glitch
		Direction::Output => "low",
	}
}

impl SysfsGpio {
	fn line_dir(&self, number: u32) -> PathBuf {
		self.root.join(format!("gpio{}", number))
	}

	fn export(&self, number: u32) -> crate::AResult<()> {
		with_context!(("export GPIO line {}", number), {
			write_attribute(&self.root.join("export"), &number.to_string())?;
			Ok(())
		})
	}

	fn unexport(&self, number: u32) -> crate::AResult<()> {
		with_context!(("unexport GPIO line {}", number), {
			write_attribute(&self.root.join("unexport"), &number.to_string())?;
			Ok(())
		})
	}

	fn set_direction(&self, number: u32, direction: Direction, retry: bool) -> crate::AResult<()> {
		let path = self.line_dir(number).join("direction");
		let data = direction_attribute(direction);
		let mut attempts = if retry { EXPORT_RETRIES } else { 1 };
		loop {
			attempts -= 1;
			match write_attribute(&path, data) {
				Ok(()) => return Ok(()),
				Err(ref e) if attempts > 0 && (e.kind() == io::ErrorKind::PermissionDenied || e.kind() == io::ErrorKind::NotFound) => {
					reliable_sleep(EXPORT_RETRY_DELAY);
				},
				Err(e) => bail!("couldn't set direction {:?} on {}: {}", data, path.display(), e),
			}
		}
	}

	fn open_line(&mut self, pin: Pin, direction: Direction) -> crate::AResult<Line> {
		let number = self.base + pin.0;
		let exported = !self.line_dir(number).exists();
		if exported {
			debug!("{}: exporting sysfs GPIO line {}", pin, number);
			self.export(number)?;
		}

		let value = self.set_direction(number, direction, exported).and_then(|()| {
			let path = self.line_dir(number).join("value");
			with_context!(("couldn't open {}", path.display()), {
				Ok(fs::OpenOptions::new()
					.read(true)
					.write(direction == Direction::Output)
					.open(&path)?)
			})
		});

		match value {
			Ok(value) => Ok(Line { number, direction, value, exported }),
			Err(e) => {
				if exported {
					if let Err(e) = self.unexport(number) {
						error!("{}: {}", pin, e);
					}
				}
				Err(e)
			},
		}
	}

	fn line(&mut self, pin: Pin) -> crate::AResult<&mut Line> {
		match self.lines.get_mut(&pin) {
			Some(line) => Ok(line),
			None => bail!("{} not configured", pin),
		}
	}

	/// Switch outputs back to input and unexport what we exported; returns
	/// the first error but handles all lines.
	fn release(&mut self) -> crate::AResult<()> {
		let mut result = Ok(());
		let lines = std::mem::replace(&mut self.lines, BTreeMap::new());
		for (pin, line) in lines {
			drop(line.value);
			let mut res = Ok(());
			if line.direction == Direction::Output {
				res = self.set_direction(line.number, Direction::Input, false);
			}
			if line.exported {
				debug!("{}: unexporting sysfs GPIO line {}", pin, line.number);
				res = res.and(self.unexport(line.number));
			}
			if let Err(e) = res {
				if result.is_ok() {
					result = Err(e);
				} else {
					error!("{}: {}", pin, e);
				}
			}
		}
		result
	}

	/// Release all configured lines, reporting failures
	pub fn close(mut self) -> crate::AResult<()> {
		self.release()
	}
}

impl Drop for SysfsGpio {
	fn drop(&mut self) {
		if let Err(e) = self.release() {
			error!("Failed to release sysfs GPIO lines: {}", crate::error::display_chain(&e));
		}
	}
}

impl GpioAccess for SysfsGpio {
	fn configure(&mut self, pin: Pin, direction: Direction) -> crate::AResult<()> {
		// reconfiguring keeps ownership of a line we exported ourselves
		let previously_exported = self.lines.remove(&pin).map_or(false, |line| line.exported);
		match self.open_line(pin, direction) {
			Ok(mut line) => {
				line.exported |= previously_exported;
				self.lines.insert(pin, line);
				Ok(())
			},
			Err(e) => {
				if previously_exported {
					if let Err(e) = self.unexport(self.base + pin.0) {
						error!("{}: {}", pin, e);
					}
				}
				Err(e)
			},
		}
	}

	fn read_level(&mut self, pin: Pin) -> crate::AResult<Level> {
		let line = self.line(pin)?;
		let mut buf = [0u8];
		// value attributes support pread at offset 0 for repeated polling
		let l = with_context!(("read GPIO line {}", line.number),
			Ok(line.value.read_at(&mut buf, 0)?)
		)?;
		ensure!(l == 1, "read GPIO line {}: empty value", line.number);
		match buf[0] {
			b'0' => Ok(Level::Low),
			b'1' => Ok(Level::High),
			b => bail!("read GPIO line {}: unexpected value {:?}", line.number, b as char),
		}
	}

	fn write_level(&mut self, pin: Pin, level: Level) -> crate::AResult<()> {
		let line = self.line(pin)?;
		let data: &[u8] = if level.is_high() { b"1" } else { b"0" };
		let l = with_context!(("write GPIO line {}", line.number),
			Ok(line.value.write_at(data, 0)?)
		)?;
		ensure!(l == data.len(), "write GPIO line {}: short write", line.number);
		Ok(())
	}
}

pub fn inner_open<P: AsRef<Path>>(root: P, base: u32) -> crate::AResult<SysfsGpio> {
	let root = root.as_ref();
	ensure!(root.is_dir(), "GPIO sysfs interface not available at {}", root.display());

	Ok(SysfsGpio {
		root: root.to_path_buf(),
		base,
		lines: BTreeMap::new(),
	})
}
