use crate::*;

use std::io::{ self, IsTerminal, Write };
use std::sync::{ Arc, Mutex, PoisonError };



pub type SharedSink = Arc<Mutex<dyn Write + Send>>;

/// Destination for rendered diagnostics. Custom streams are locked for the whole
/// line, so lines from different threads never interleave.

#[derive(Clone)]
pub enum Sink
{
	Stdout,
	Stderr,
	Stream(SharedSink),
}

impl Sink
{
	/// Write one diagnostic line and flush it before returning. Failures are the
	/// sink's problem; output here is best effort.

	pub fn write_line(&self, diagnostic : &format::Diagnostic)
	{
		match self
		{
			Sink::Stdout =>
			{
				let stdout = io::stdout();
				let is_terminal = stdout.is_terminal();

				write_terminal(&mut stdout.lock(), diagnostic, is_terminal);
			}
			Sink::Stderr =>
			{
				let stderr = io::stderr();
				let is_terminal = stderr.is_terminal();

				write_terminal(&mut stderr.lock(), diagnostic, is_terminal);
			}
			Sink::Stream(stream) =>
			{
				let mut stream = stream.lock().unwrap_or_else(PoisonError::into_inner);

				let _ = writeln!(stream, "{}", diagnostic);
				let _ = stream.flush();
			}
		}
	}

	pub fn same_as(&self, other : &Sink) -> bool
	{
		match (self, other)
		{
			(Sink::Stdout, Sink::Stdout) 		=> true,
			(Sink::Stderr, Sink::Stderr) 		=> true,
			(Sink::Stream(a), Sink::Stream(b)) 	=> Arc::ptr_eq(a, b),
			_ 									=> false,
		}
	}
}

impl<W> From<Arc<Mutex<W>>> for Sink
	where W : Write + Send + 'static
{
	fn from(stream : Arc<Mutex<W>>) -> Self
	{
		Sink::Stream(stream)
	}
}

impl std::fmt::Debug for Sink
{
	fn fmt(&self, formatter : &mut std::fmt::Formatter<'_>) -> std::fmt::Result
	{
		match self
		{
			Sink::Stdout 		=> write!(formatter, "Sink::Stdout"),
			Sink::Stderr 		=> write!(formatter, "Sink::Stderr"),
			Sink::Stream(stream) => write!(formatter, "Sink::Stream({:p})", Arc::as_ptr(stream)),
		}
	}
}



// NOTE (rs) colored only ever looks at stdout when deciding whether it's talking to a
//  terminal, so the stream actually being written has to be a terminal as well. A
//  redirected stream always gets the plain line.

#[allow(unused_variables)]
fn write_terminal(out : &mut impl Write, diagnostic : &format::Diagnostic, is_terminal : bool)
{
	#[cfg(feature="color")]
	{
		use colored::*;

		if is_terminal && colored::control::SHOULD_COLORIZE.should_colorize()
		{
			let _ = writeln!(
				out,
				"{} {} {}",
				diagnostic.prefix().red().bold(),
				diagnostic.location().dimmed(),
				diagnostic.body().red());
			let _ = out.flush();

			return;
		}
	}

	let _ = writeln!(out, "{}", diagnostic);
	let _ = out.flush();
}



// Tests

#[test]
fn test_stream_receives_whole_line()
{
	let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
	let sink = Sink::from(buffer.clone());

	let record = format::Record
	{
		kind 		: format::Kind::If,
		condition 	: "x > 1",
		ret 		: "false",
		site 		: format::Site::new("src/main.rs", 12, "app::run"),
		depth 		: 2,
	};

	sink.write_line(&format::render(&record, format::Body::Default));
	sink.write_line(&format::render(&record, format::Body::Message(format_args!("x = {}", 3))));

	let text = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();

	assert_eq!(
		text,
		"abort[2]: src/main.rs:12: In 'app::run': ABORT_IF(x > 1, false);\n\
		 abort[2]: src/main.rs:12: In 'app::run': x = 3\n");
}

#[test]
fn test_same_as()
{
	let a = Arc::new(Mutex::new(Vec::<u8>::new()));
	let b = Arc::new(Mutex::new(Vec::<u8>::new()));

	assert!(Sink::from(a.clone()).same_as(&Sink::from(a.clone())));
	assert!(!Sink::from(a).same_as(&Sink::from(b)));
	assert!(!Sink::Stdout.same_as(&Sink::Stderr));
	assert!(Sink::Stderr.same_as(&Sink::Stderr));
}

#[cfg(feature="color")]
#[test]
fn test_terminal_color_follows_stream()
{
	let record = format::Record
	{
		kind 		: format::Kind::Unconditional,
		condition 	: "",
		ret 		: "1",
		site 		: format::Site::new("src/main.rs", 7, "app::guarded"),
		depth 		: 0,
	};

	let diagnostic = format::render(&record, format::Body::Default);
	let plain = "abort[0]: src/main.rs:7: In 'app::guarded': ABORT(1);\n";

	let write = |is_terminal : bool| -> String
	{
		let mut out = Vec::new();
		write_terminal(&mut out, &diagnostic, is_terminal);

		String::from_utf8(out).unwrap()
	};

	// Colors forced on (as when stdout is a terminal), but this stream isn't one

	colored::control::set_override(true);
	let redirected = write(false);
	let terminal = write(true);

	colored::control::set_override(false);
	let disabled = write(true);

	colored::control::unset_override();

	assert_eq!(redirected, plain);
	assert_eq!(disabled, plain);
	assert!(terminal.contains('\x1b'), "{:?}", terminal);
	assert!(terminal.contains("abort[0]:"));
}
