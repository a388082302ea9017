use crate::*;

use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };



// The sink is process-wide and tests run on parallel threads, so anything that
//  swaps it holds this lock for the duration of the test.

lazy_static::lazy_static!
{
	static ref SINK_LOCK : Mutex<()> = Mutex::new(());
}

pub struct Capture
{
	buffer 		: Arc<Mutex<Vec<u8>>>,
	previous 	: Sink,
	_lock 		: MutexGuard<'static, ()>,
}

impl Capture
{
	pub fn new() -> Self
	{
		let lock = SINK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

		let capture = Self
		{
			buffer 		: Arc::new(Mutex::new(Vec::new())),
			previous 	: get_ostream(),
			_lock 		: lock,
		};

		capture.install();
		capture
	}

	pub fn install(&self)
	{
		set_ostream(self.buffer.clone());
	}

	pub fn text(&self) -> String
	{
		let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
		String::from_utf8_lossy(&buffer).into_owned()
	}

	pub fn lines(&self) -> Vec<String>
	{
		self.text().lines().map(String::from).collect()
	}

	pub fn take_lines(&self) -> Vec<String>
	{
		let lines = self.lines();
		self.buffer.lock().unwrap_or_else(PoisonError::into_inner).clear();

		lines
	}
}

impl Drop for Capture
{
	fn drop(&mut self)
	{
		set_ostream(self.previous.clone());
	}
}
