use crate::*;

use std::cell::Cell;
use std::sync::{ PoisonError, RwLock };



// NOTE (rs) The sink is shared by the whole process, but the message size limit (like
//  the depth counter) is tracked per thread, so threads can't resize each other's
//  messages halfway through a firing.

pub const DEFAULT_MESSAGE_SIZE : usize = 1024;

lazy_static::lazy_static!
{
	static ref OSTREAM : RwLock<Sink> = RwLock::new(Sink::Stdout);
}

thread_local!
{
	static MESSAGE_SIZE : Cell<usize> = const { Cell::new(DEFAULT_MESSAGE_SIZE) };
}



/// Get the sink diagnostics are currently written to. Defaults to standard output.

pub fn get_ostream() -> Sink
{
	OSTREAM
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.clone()
}

/// Replace the sink for all subsequent diagnostics, on every thread.
///
/// ```rust
/// use std::sync::{ Arc, Mutex };
///
/// let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
/// abort::set_ostream(buffer.clone());
///
/// assert!(abort::get_ostream().same_as(&abort::Sink::from(buffer)));
/// # abort::set_ostream(abort::Sink::Stdout);
/// ```

pub fn set_ostream(sink : impl Into<Sink>)
{
	let sink = sink.into();

	*OSTREAM.write().unwrap_or_else(PoisonError::into_inner) = sink;
}

/// Character budget for custom messages on this thread. Longer messages are
/// truncated to exactly this many characters.

pub fn message_size() -> usize
{
	MESSAGE_SIZE.with(|size| size.get())
}

pub fn set_message_size(size : usize)
{
	MESSAGE_SIZE.with(|current| current.set(size));
}



// Tests

#[test]
fn test_default_ostream()
{
	let _capture = test_support::Capture::new();

	set_ostream(Sink::Stdout);

	assert!(get_ostream().same_as(&Sink::Stdout));
	assert!(!get_ostream().same_as(&Sink::Stderr));
}

#[test]
fn test_message_size_is_per_thread()
{
	assert_eq!(message_size(), DEFAULT_MESSAGE_SIZE);

	set_message_size(7);
	assert_eq!(message_size(), 7);

	let other = std::thread::spawn(message_size)
		.join()
		.unwrap();

	assert_eq!(other, DEFAULT_MESSAGE_SIZE);
	assert_eq!(message_size(), 7);

	set_message_size(DEFAULT_MESSAGE_SIZE);
}

#[test]
fn test_repeated_configuration()
{
	fn guarded() -> i32
	{
		ABORT!(1, "configured {}", "twice");
	}

	let capture = test_support::Capture::new();

	capture.install();
	set_message_size(8);
	guarded();

	let once = capture.take_lines();

	capture.install();
	capture.install();
	set_message_size(8);
	set_message_size(8);
	guarded();

	let twice = capture.take_lines();

	assert_eq!(once.len(), 1);
	assert_eq!(once, twice);
	assert!(once[0].ends_with("guarded': configur"));

	set_message_size(DEFAULT_MESSAGE_SIZE);
}
