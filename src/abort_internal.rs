use crate::*;

use std::fmt;
use std::io;

pub use crate::depth::{ enter, exit, Frame };
pub use crate::format::{ Body, Kind, Record, Site, routine_name, type_name_of };



pub fn last_os_error() -> io::Error
{
	io::Error::last_os_error()
}

/// Render a firing guard and write it to the current sink. The depth comes from the
/// frame the guard entered.

pub fn fire(frame : &Frame, kind : Kind, condition : &str, ret : &str, site : Site, body : Body)
{
	let record = Record
	{
		kind,
		condition,
		ret,
		site,
		depth : frame.depth(),
	};

	// NOTE (rs) Render before touching the sink, so a message argument that fires a
	//  guard of its own while being formatted can't deadlock on the sink's lock.

	let diagnostic = format::render(&record, body);

	config::get_ostream().write_line(&diagnostic);
}



/// Result of evaluating a `Guard`. A fired guard has already written its line; the
/// caller is expected to return the carried value.

#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T>
{
	Fired(T),
	NotFired,
}

impl<T> Outcome<T>
{
	pub fn is_fired(&self) -> bool
	{
		matches!(self, Outcome::Fired(_))
	}

	pub fn fired(self) -> Option<T>
	{
		match self
		{
			Outcome::Fired(value) 	=> Some(value),
			Outcome::NotFired 		=> None,
		}
	}
}



/// Function form of the `ABORT*` macros, for call sites that can't use them (or
/// would rather propagate the outcome themselves).
///
/// ```rust
/// use abort::{ abort_site, Guard, Outcome };
/// use abort::format::Kind;
///
/// fn parse(text : &str) -> Option<u32>
/// {
///     let guard = Guard::new(Kind::If, abort_site!())
///         .condition("text.is_empty()")
///         .returns("None");
///
///     if let Outcome::Fired(value) = guard.evaluate(|| text.is_empty(), || None, None)
///     {
///         return value;
///     }
///
///     text.parse().ok()
/// }
///
/// assert_eq!(parse("12"), Some(12));
/// ```

#[derive(Clone, Copy, Debug)]
pub struct Guard<'a>
{
	pub kind 		: Kind,
	pub condition 	: &'a str,
	pub ret 		: &'a str,
	pub site 		: Site,
}

impl<'a> Guard<'a>
{
	pub fn new(kind : Kind, site : Site) -> Self
	{
		Self
		{
			kind,
			condition 	: "",
			ret 		: "",
			site,
		}
	}

	pub fn condition(mut self, text : &'a str) -> Self
	{
		self.condition = text;
		self
	}

	pub fn returns(mut self, text : &'a str) -> Self
	{
		self.ret = text;
		self
	}

	/// Run `check` inside a frame and fire according to the guard's kind. `value` is
	/// only produced once the frame has exited. `Kind::OnErrno` guards go through
	/// `evaluate_errno` instead.

	pub fn evaluate<T, FCheck, FValue>(
		&self,
		f_check : FCheck,
		f_value : FValue,
		message : Option<fmt::Arguments<'_>>) -> Outcome<T>
		where
			FCheck : FnOnce() -> bool,
			FValue : FnOnce() -> T
	{
		debug_assert!(self.kind != Kind::OnErrno, "ABORT_ON_ERRNO guards use evaluate_errno");

		let frame = enter();

		if !self.kind.fires(f_check())
		{
			exit(frame);
			return Outcome::NotFired;
		}

		let body = match message
		{
			Some(args) 	=> Body::Message(args),
			None 		=> Body::Default,
		};

		fire(&frame, self.kind, self.condition, self.ret, self.site, body);
		exit(frame);

		Outcome::Fired(f_value())
	}

	/// Run a system-call-like operation and fire if it returns -1, describing the
	/// last OS error. Only valid for `Kind::OnErrno` guards.

	pub fn evaluate_errno<R, T, FCall, FValue>(&self, f_call : FCall, f_value : FValue) -> Outcome<T>
		where
			R : PartialEq + From<i8>,
			FCall : FnOnce() -> R,
			FValue : FnOnce() -> T
	{
		debug_assert_eq!(self.kind, Kind::OnErrno, "only ABORT_ON_ERRNO guards check for -1");

		let frame = enter();

		if f_call() != R::from(-1)
		{
			exit(frame);
			return Outcome::NotFired;
		}

		let error = last_os_error();

		fire(&frame, self.kind, self.condition, self.ret, self.site, Body::Errno(error));
		exit(frame);

		Outcome::Fired(f_value())
	}
}



// Tests

#[cfg(test)]
fn preface(line : &str) -> usize
{
	let digits = line
		.strip_prefix("abort[")
		.and_then(|rest| rest.split_once("]: "))
		.map(|(digits, _)| digits)
		.unwrap_or_else(|| panic!("malformed line '{}'", line));

	digits.parse().unwrap()
}

#[cfg(test)]
fn message(line : &str) -> &str
{
	line.split_once("': ").unwrap().1
}

#[cfg(test)]
fn abort_if_not(depth : i32) -> i32
{
	ABORT_IF_NOT!(depth < 5, -1, "depth = {}", depth);
	ABORT_IF_NOT!(abort_if_not(depth + 1) == 0, -1);

	0
}

#[cfg(test)]
fn abort_if(depth : i32) -> i32
{
	ABORT_IF!(depth >= 5, -1, "depth = {}", depth);
	ABORT_IF!(abort_if(depth + 1) == -1, -1);

	0
}

// NOTE (rs) The return expression runs after the frame exits, so every level of this
//  one reports depth 0, and each line is written before recursing.

#[cfg(test)]
fn abort_always(depth : i32) -> i32
{
	if depth >= 5
	{
		ABORT!(-1, "depth = {}", depth);
	}

	ABORT!(abort_always(depth + 1));
}

#[test]
fn test_abort_if_not()
{
	let capture = test_support::Capture::new();

	assert_eq!(abort_if_not(0), -1);
	assert_eq!(depth::current(), 0);

	let lines = capture.lines();
	assert_eq!(lines.len(), 6);

	for (i, line) in lines.iter().enumerate()
	{
		assert_eq!(preface(line), lines.len() - i - 1, "lines[{}] = '{}'", i, line);

		if i == 0
		{
			assert_eq!(message(line), "depth = 5", "lines[{}] = '{}'", i, line);
		}
		else
		{
			assert_eq!(
				message(line),
				"ABORT_IF_NOT(abort_if_not(depth + 1) == 0, -1);",
				"lines[{}] = '{}'", i, line);
		}
	}
}

#[test]
fn test_abort_if()
{
	let capture = test_support::Capture::new();

	assert_eq!(abort_if(0), -1);
	assert_eq!(depth::current(), 0);

	let lines = capture.lines();
	assert_eq!(lines.len(), 6);

	let depths : Vec<usize> = lines.iter().map(|line| preface(line)).collect();
	assert_eq!(depths, vec![5, 4, 3, 2, 1, 0]);

	assert!(lines[0].ends_with("depth = 5"));

	for line in &lines[1..]
	{
		assert!(line.contains("ABORT_IF(abort_if(depth + 1) == -1, -1);"), "{}", line);
	}
}

#[test]
fn test_abort()
{
	let capture = test_support::Capture::new();

	assert_eq!(abort_always(0), -1);
	assert_eq!(depth::current(), 0);

	let lines = capture.lines();
	assert_eq!(lines.len(), 6);

	for (i, line) in lines.iter().enumerate()
	{
		assert_eq!(preface(line), 0, "lines[{}] = '{}'", i, line);

		if i == 5
		{
			assert_eq!(message(line), "depth = 5");
		}
		else
		{
			assert_eq!(message(line), "ABORT(abort_always(depth + 1));");
		}
	}
}

#[test]
fn test_line_layout()
{
	use std::sync::atomic::{ AtomicU32, Ordering };

	static GUARD_LINE : AtomicU32 = AtomicU32::new(0);

	fn guarded(value : i32) -> i32
	{
		GUARD_LINE.store(line!(), Ordering::Relaxed); ABORT_IF!(value > 10, 10);

		value
	}

	let capture = test_support::Capture::new();

	assert_eq!(guarded(3), 3);
	assert!(capture.lines().is_empty());

	assert_eq!(guarded(11), 10);

	let lines = capture.lines();
	assert_eq!(lines.len(), 1);

	let expected_prefix = format!("abort[0]: {}:{}: In '", file!(), GUARD_LINE.load(Ordering::Relaxed));
	assert!(lines[0].starts_with(&expected_prefix), "{}", lines[0]);
	assert!(lines[0].ends_with("guarded': ABORT_IF(value > 10, 10);"), "{}", lines[0]);
}

#[test]
fn test_not_fired_is_silent()
{
	fn guarded() -> Option<u8>
	{
		ABORT_IF!(false, None, "never {}", "written");
		ABORT_IF_NOT!(true, None);
		ABORT_ON_ERRNO!(0, None);

		Some(1)
	}

	let capture = test_support::Capture::new();

	let before = depth::current();
	assert_eq!(guarded(), Some(1));
	assert_eq!(depth::current(), before);

	assert!(capture.text().is_empty());
}

#[test]
fn test_message_size()
{
	fn hello() -> i32
	{
		ABORT!(0, "hello");
	}

	let capture = test_support::Capture::new();

	for size in 0..=10
	{
		config::set_message_size(size);

		assert_eq!(hello(), 0);

		let lines = capture.take_lines();
		assert_eq!(lines.len(), 1);
		assert!(lines[0].starts_with("abort[0]: "));
		assert_eq!(message(&lines[0]), &"hello"[..size.min(5)], "size = {}", size);
	}

	config::set_message_size(config::DEFAULT_MESSAGE_SIZE);
}

#[cfg(test)]
fn open_missing(seen : &mut Option<i32>) -> i32
{
	match std::fs::File::open("/nonexistent/abort/errno-test")
	{
		Ok(_) => 0,
		Err(error) =>
		{
			*seen = error.raw_os_error();
			-1
		}
	}
}

#[test]
fn test_abort_on_errno()
{
	let capture = test_support::Capture::new();

	let mut seen = None;
	let mut guarded = || -> i32
	{
		ABORT_ON_ERRNO!(open_missing(&mut seen), 7);

		0
	};

	assert_eq!(guarded(), 7);

	let code = seen.expect("open should have failed with an OS error");
	let description = io::Error::from_raw_os_error(code).to_string();

	let lines = capture.lines();
	assert_eq!(lines.len(), 1);
	assert_eq!(preface(&lines[0]), 0);
	assert!(lines[0].contains("test_abort_on_errno': "), "{}", lines[0]);
	assert!(lines[0].ends_with(&format!("ABORT_ON_ERRNO(open_missing(&mut seen), 7); {}", description)), "{}", lines[0]);
}

#[test]
fn test_nested_firing_in_message()
{
	struct Noisy;

	impl fmt::Display for Noisy
	{
		fn fmt(&self, formatter : &mut fmt::Formatter<'_>) -> fmt::Result
		{
			fn inner() -> &'static str
			{
				ABORT!("inner", "from display");
			}

			formatter.write_str(inner())
		}
	}

	fn outer() -> i32
	{
		ABORT!(1, "outer {}", Noisy);
	}

	let capture = test_support::Capture::new();

	assert_eq!(outer(), 1);

	let lines = capture.lines();
	assert_eq!(lines.len(), 2);
	assert_eq!(preface(&lines[0]), 1);
	assert_eq!(message(&lines[0]), "from display");
	assert_eq!(preface(&lines[1]), 0);
	assert_eq!(message(&lines[1]), "outer inner");
}

#[test]
fn test_guard_evaluate()
{
	let capture = test_support::Capture::new();

	let guard = Guard::new(Kind::IfNot, crate::abort_site!())
		.condition("ready")
		.returns("\"busy\"");

	assert_eq!(guard.evaluate(|| true, || "busy", None), Outcome::NotFired);
	assert!(capture.lines().is_empty());

	let outcome = guard.evaluate(|| false, || "busy", None);
	assert!(outcome.is_fired());
	assert_eq!(outcome.fired(), Some("busy"));

	let outcome = guard.evaluate(|| false, || 2, Some(format_args!("not ready after {} tries", 2)));
	assert_eq!(outcome, Outcome::Fired(2));

	let lines = capture.lines();
	assert_eq!(lines.len(), 2);
	assert!(lines[0].ends_with("test_guard_evaluate': ABORT_IF_NOT(ready, \"busy\");"), "{}", lines[0]);
	assert_eq!(message(&lines[1]), "not ready after 2 tries");
	assert_eq!(depth::current(), 0);
}

#[test]
fn test_guard_evaluate_errno()
{
	let capture = test_support::Capture::new();

	let guard = Guard::new(Kind::OnErrno, crate::abort_site!())
		.condition("open_missing(&mut seen)")
		.returns("false");

	assert_eq!(guard.evaluate_errno(|| 3i64, || false), Outcome::NotFired);
	assert!(capture.lines().is_empty());

	let mut seen = None;
	assert_eq!(guard.evaluate_errno(|| open_missing(&mut seen), || false), Outcome::Fired(false));

	let description = io::Error::from_raw_os_error(seen.unwrap()).to_string();

	let lines = capture.lines();
	assert_eq!(lines.len(), 1);
	assert!(lines[0].ends_with(&format!("ABORT_ON_ERRNO(open_missing(&mut seen), false); {}", description)), "{}", lines[0]);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "evaluate_errno")]
fn test_guard_evaluate_rejects_errno_kind()
{
	let guard = Guard::new(Kind::OnErrno, crate::abort_site!());

	let _ = guard.evaluate(|| true, || 0, None);
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "only ABORT_ON_ERRNO")]
fn test_guard_evaluate_errno_rejects_other_kinds()
{
	let guard = Guard::new(Kind::If, crate::abort_site!());

	let _ = guard.evaluate_errno(|| -1i32, || 0);
}

#[test]
fn test_multiline_message_is_one_line()
{
	fn guarded() -> i32
	{
		ABORT!(2, "first\nsecond {}", "third\r\n");
	}

	let capture = test_support::Capture::new();

	assert_eq!(guarded(), 2);

	let lines = capture.lines();
	assert_eq!(lines.len(), 1);
	assert_eq!(message(&lines[0]), "first second third  ");
}
