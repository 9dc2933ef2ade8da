use failure::{
	Context,
	Fail,
};

/// What went wrong while talking to the chip.
///
/// Driver operations attach the kind as `failure::Context<ErrorKind>` to the
/// underlying GPIO error; use [`error_kind`] to get it back.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Fail)]
pub enum ErrorKind {
	/// pin setup (direction, export, mapping) failed
	#[fail(display = "GPIO configuration failed")]
	HardwareConfig,
	/// reading or writing a pin failed
	#[fail(display = "GPIO access failed")]
	Io,
	/// the chip didn't signal a finished conversion in time
	#[fail(display = "timed out waiting for conversion")]
	Timeout,
	/// cancellation flag was set while waiting for a conversion
	#[fail(display = "cancelled while waiting for conversion")]
	Cancelled,
}

pub trait ResultExt<T> {
	fn kind(self, kind: ErrorKind) -> crate::AResult<T>;
}

impl<T> ResultExt<T> for crate::AResult<T> {
	fn kind(self, kind: ErrorKind) -> crate::AResult<T> {
		self.map_err(|e| e.context(kind).into())
	}
}

/// First `ErrorKind` found in the cause chain
pub fn error_kind(e: &failure::Error) -> Option<ErrorKind> {
	for cause in e.iter_chain() {
		if let Some(kind) = cause.downcast_ref::<ErrorKind>() {
			return Some(*kind);
		}
		if let Some(context) = cause.downcast_ref::<Context<ErrorKind>>() {
			return Some(*context.get_context());
		}
	}
	None
}

/// All messages in the cause chain, joined with ": "
///
/// `with_context!` already appends the cause to its message; a cause that
/// ends the text so far is not repeated.
pub fn display_chain(e: &failure::Error) -> String {
	let mut msg = String::new();
	for cause in e.iter_chain() {
		let text = cause.to_string();
		if msg.is_empty() {
			msg = text;
		} else if !msg.ends_with(&text) {
			msg.push_str(": ");
			msg.push_str(&text);
		}
	}
	msg
}
