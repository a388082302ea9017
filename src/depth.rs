use std::cell::Cell;
use std::marker::PhantomData;



// Number of guard evaluations currently in progress on this thread

thread_local!
{
	static FRAME_COUNT : Cell<usize> = const { Cell::new(0) };
}

/// One entered guard evaluation. Exiting consumes the frame, and dropping it (eg.
/// while unwinding out of a condition) exits as well, so every enter is paired with
/// exactly one exit.

#[must_use]
pub struct Frame
{
	depth 	: usize,
	_thread	: PhantomData<*const ()>,
}

impl Frame
{
	/// Depth at the time this frame was entered, ie. how many evaluations were
	/// already active below it.

	pub fn depth(&self) -> usize
	{
		self.depth
	}
}

impl Drop for Frame
{
	fn drop(&mut self)
	{
		let _ = FRAME_COUNT.try_with(|count| count.set(count.get().saturating_sub(1)));
	}
}

pub fn enter() -> Frame
{
	let depth = FRAME_COUNT.with(|count|
	{
		let depth = count.get();
		count.set(depth + 1);

		depth
	});

	Frame
	{
		depth,
		_thread : PhantomData,
	}
}

pub fn exit(frame : Frame)
{
	drop(frame);
}

pub fn current() -> usize
{
	FRAME_COUNT.with(|count| count.get())
}



// Tests

#[test]
fn test_enter_exit()
{
	assert_eq!(current(), 0);

	let outer = enter();
	assert_eq!(outer.depth(), 0);
	assert_eq!(current(), 1);

	let inner = enter();
	assert_eq!(inner.depth(), 1);
	assert_eq!(current(), 2);

	exit(inner);
	assert_eq!(current(), 1);

	exit(outer);
	assert_eq!(current(), 0);
}

#[test]
fn test_unwind_exits()
{
	let result = std::panic::catch_unwind(||
	{
		let _frame = enter();
		assert_eq!(current(), 1);

		panic!("condition blew up");
	});

	assert!(result.is_err());
	assert_eq!(current(), 0);
}

#[test]
fn test_per_thread()
{
	let frame = enter();

	let other = std::thread::spawn(||
	{
		let frame = enter();
		let depth = frame.depth();
		exit(frame);

		depth
	});

	assert_eq!(other.join().unwrap(), 0);
	assert_eq!(current(), 1);

	exit(frame);
}
