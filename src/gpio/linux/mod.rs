mod mapped;
mod sysfs;

pub use self::mapped::MappedGpio;
pub use self::sysfs::SysfsGpio;

const SYSFS_GPIO: &str = "/sys/class/gpio";
const GPIOMEM: &str = "/dev/gpiomem";

/// GPIO lines through `/sys/class/gpio`; line `n` is exported as `base + n`
pub fn open_sysfs(base: u32) -> crate::AResult<SysfsGpio> {
	sysfs::inner_open(SYSFS_GPIO, base)
}

/// BCM283x GPIO registers mapped from `/dev/gpiomem` (no root needed, but
/// membership in the `gpio` group usually is)
pub fn open_gpiomem() -> crate::AResult<MappedGpio> {
	with_context!(("couldn't map GPIO registers from {}", GPIOMEM),
		Ok(mapped::inner_open(GPIOMEM)?)
	)
}
