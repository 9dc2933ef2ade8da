/* BCM2835/BCM2836/BCM2837/BCM2711 GPIO register block, see "BCM2835 ARM
 * Peripherals", chapter 6 */

use std::collections::BTreeMap;
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::{
	FromRawFd,
};
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	c_void,
	mmap,
	munmap,
	open,
};

use crate::gpio::{
	Direction,
	GpioAccess,
	Level,
	Pin,
};

const BLOCK_SIZE: usize = 4096;

const GPFSEL0: usize = 0x00;
const GPSET0: usize = 0x1c;
const GPCLR0: usize = 0x28;
const GPLEV0: usize = 0x34;

const FSEL_MASK: u32 = 0b111;
const FSEL_INPUT: u32 = 0b000;
const FSEL_OUTPUT: u32 = 0b001;

pub const BCM_LINE_COUNT: u32 = 54;

/// GPFSELn register offset and bit shift of the 3-bit function select field
fn fsel_location(line: u32) -> (usize, u32) {
	(GPFSEL0 + 4 * (line / 10) as usize, 3 * (line % 10))
}

/// offset of the line's bank relative to GPSET0/GPCLR0/GPLEV0 and its bit
fn bank_location(line: u32) -> (usize, u32) {
	(4 * (line / 32) as usize, 1u32 << (line % 32))
}

#[derive(Debug)]
struct Mapped {
	ptr: ptr::NonNull<u8>, // u8 instead of void for easier offset operations
	len: usize,
}

impl Drop for Mapped {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				self.len,
			);
			if 0 != res {
				panic!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl Mapped {
	// registers must be accessed as whole words, and never cached
	fn read_dword(&self, offset: usize) -> u32 {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset) as *const u32) }
	}

	fn write_dword(&mut self, offset: usize, data: u32) {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset) as *mut u32, data) }
	}
}

fn map_fd(fd: libc::c_int, len: usize) -> io::Result<Mapped> {
	let area = unsafe {
		mmap(
			ptr::null_mut(),
			len,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			0,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u8) {
		None => panic!("mmap shouldn't return NULL ever"),
		Some(area) => Ok(Mapped {
			ptr: area,
			len,
		}),
	}
}

pub struct MappedGpio {
	regs: Mapped,
	// function select of configured lines before we touched them
	saved: BTreeMap<u32, u32>,
}

impl MappedGpio {
	fn check_line(pin: Pin) -> crate::AResult<u32> {
		ensure!(pin.0 < BCM_LINE_COUNT, "{} is not a BCM283x GPIO line (0..{})", pin, BCM_LINE_COUNT);
		Ok(pin.0)
	}

	fn function_select(&self, line: u32) -> u32 {
		let (offset, shift) = fsel_location(line);
		(self.regs.read_dword(offset) >> shift) & FSEL_MASK
	}

	fn set_function_select(&mut self, line: u32, mode: u32) {
		let (offset, shift) = fsel_location(line);
		let current = self.regs.read_dword(offset);
		self.regs.write_dword(offset, (current & !(FSEL_MASK << shift)) | (mode << shift));
	}

	/// Restore function select of all configured lines
	fn release(&mut self) {
		let saved = std::mem::replace(&mut self.saved, BTreeMap::new());
		for (line, mode) in saved {
			debug!("GPIO{}: restoring function select {:03b}", line, mode);
			self.set_function_select(line, mode);
		}
	}

	pub fn close(mut self) -> crate::AResult<()> {
		self.release();
		Ok(())
	}
}

impl Drop for MappedGpio {
	fn drop(&mut self) {
		self.release();
	}
}

impl GpioAccess for MappedGpio {
	fn configure(&mut self, pin: Pin, direction: Direction) -> crate::AResult<()> {
		let line = Self::check_line(pin)?;
		let mode = self.function_select(line);
		self.saved.entry(line).or_insert(mode);

		let mode = match direction {
			Direction::Input => FSEL_INPUT,
			Direction::Output => {
				// start driving LOW
				let (bank, mask) = bank_location(line);
				self.regs.write_dword(GPCLR0 + bank, mask);
				FSEL_OUTPUT
			},
		};
		self.set_function_select(line, mode);
		Ok(())
	}

	fn read_level(&mut self, pin: Pin) -> crate::AResult<Level> {
		let (bank, mask) = bank_location(Self::check_line(pin)?);
		Ok(Level::from(0 != self.regs.read_dword(GPLEV0 + bank) & mask))
	}

	fn write_level(&mut self, pin: Pin, level: Level) -> crate::AResult<()> {
		let (bank, mask) = bank_location(Self::check_line(pin)?);
		let register = if level.is_high() { GPSET0 } else { GPCLR0 };
		self.regs.write_dword(register + bank, mask);
		Ok(())
	}
}

// TODO: exclusive open / file locking?
pub fn inner_open(path: &str) -> io::Result<MappedGpio> {
	let path = CString::new(path)?;

	let fd = unsafe { open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak; the mapping stays valid
	// after closing it
	let _f = unsafe { fs::File::from_raw_fd(fd) };

	// character device: size from metadata is 0, the block is one page
	let regs = map_fd(fd, BLOCK_SIZE)?;

	Ok(MappedGpio {
		regs,
		saved: BTreeMap::new(),
	})
}
