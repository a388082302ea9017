use crate::*;

use std::fmt::{ self, Write };
use std::io;



#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind
{
	If,
	IfNot,
	Unconditional,
	OnErrno,
}

impl Kind
{
	pub fn tag(self) -> &'static str
	{
		match self
		{
			Kind::If 			=> "ABORT_IF",
			Kind::IfNot 		=> "ABORT_IF_NOT",
			Kind::Unconditional => "ABORT",
			Kind::OnErrno 		=> "ABORT_ON_ERRNO",
		}
	}

	/// Whether a guard of this kind fires, given the value of its condition. For
	/// `OnErrno` the condition is "the call returned -1".

	pub fn fires(self, check : bool) -> bool
	{
		match self
		{
			Kind::If | Kind::OnErrno 	=> check,
			Kind::IfNot 				=> !check,
			Kind::Unconditional 		=> true,
		}
	}
}

impl fmt::Display for Kind
{
	fn fmt(&self, formatter : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		formatter.write_str(self.tag())
	}
}



#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Site
{
	pub file 	: &'static str,
	pub line 	: u32,
	pub routine : &'static str,
}

impl Site
{
	pub const fn new(file : &'static str, line : u32, routine : &'static str) -> Self
	{
		Self
		{
			file,
			line,
			routine,
		}
	}
}

pub fn type_name_of<T>(_ : T) -> &'static str
{
	std::any::type_name::<T>()
}

// BB (rs) There's no stable way to ask for the current function's name, so the macros
//  declare a marker fn and read its path back out of type_name. Closures show up as
//  extra `{{closure}}` segments, which we drop so the enclosing fn is reported.

pub fn routine_name(path : &'static str) -> &'static str
{
	let mut name = match path.strip_suffix("::__abort_here")
	{
		Some(enclosing) => enclosing,
		None 			=> path,
	};

	while let Some(outer) = name.strip_suffix("::{{closure}}")
	{
		name = outer;
	}

	name
}



/// Everything known about a firing guard. Lives only as long as it takes to render.

pub struct Record<'a>
{
	pub kind 		: Kind,
	pub condition 	: &'a str,
	pub ret 		: &'a str,
	pub site 		: Site,
	pub depth 		: usize,
}

impl Record<'_>
{
	fn default_body(&self) -> String
	{
		if self.condition.is_empty()
		{
			format!("{}({});", self.kind, self.ret)
		}
		else
		{
			format!("{}({}, {});", self.kind, self.condition, self.ret)
		}
	}
}

pub enum Body<'a>
{
	Default,
	Message(fmt::Arguments<'a>),
	Errno(io::Error),
}

/// A rendered diagnostic line, without its trailing newline.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic
{
	depth 		: usize,
	prefix 		: String,
	location 	: String,
	body 		: String,
}

impl Diagnostic
{
	pub fn depth(&self) -> usize
	{
		self.depth
	}

	/// `abort[<depth>]:`

	pub fn prefix(&self) -> &str
	{
		&self.prefix
	}

	/// `<file>:<line>: In '<routine>':`

	pub fn location(&self) -> &str
	{
		&self.location
	}

	pub fn body(&self) -> &str
	{
		&self.body
	}
}

impl fmt::Display for Diagnostic
{
	fn fmt(&self, formatter : &mut fmt::Formatter<'_>) -> fmt::Result
	{
		write!(formatter, "{} {} {}", self.prefix, self.location, self.body)
	}
}

pub fn render(record : &Record, body : Body) -> Diagnostic
{
	let body = match body
	{
		Body::Default 			=> record.default_body(),
		Body::Message(args) 	=> truncated(args, config::message_size()),
		Body::Errno(error) 		=> format!("{} {}", record.default_body(), error),
	};

	Diagnostic
	{
		depth 		: record.depth,
		prefix 		: format!("abort[{}]:", record.depth),
		location 	: format!("{}:{}: In '{}':", record.site.file, record.site.line, record.site.routine),
		body,
	}
}

/// Format `args`, keeping exactly the first `min(limit, length)` characters. Line
/// breaks in the message are written as spaces.

pub fn truncated(args : fmt::Arguments, limit : usize) -> String
{
	let mut writer = TruncatingWriter
	{
		text 		: String::with_capacity(limit.min(config::DEFAULT_MESSAGE_SIZE)),
		remaining 	: limit,
	};

	// TruncatingWriter never fails, so an error here came from a Display impl and
	//  we keep whatever was written before it.

	let _ = writer.write_fmt(args);

	writer.text
}

struct TruncatingWriter
{
	text 		: String,
	remaining 	: usize,
}

// Line breaks become spaces one for one, so a firing is still a single sink line and
//  the character count is unchanged.

impl Write for TruncatingWriter
{
	fn write_str(&mut self, s : &str) -> fmt::Result
	{
		for ch in s.chars()
		{
			if self.remaining == 0
			{
				break;
			}

			match ch
			{
				'\n' | '\r' 	=> self.text.push(' '),
				_ 			=> self.text.push(ch),
			}

			self.remaining -= 1;
		}

		Ok(())
	}
}



// Tests

#[cfg(test)]
fn test_record(kind : Kind, condition : &'static str) -> Record<'static>
{
	Record
	{
		kind,
		condition,
		ret 	: "-1",
		site 	: Site::new("src/io.rs", 40, "io::read_header"),
		depth 	: 3,
	}
}

#[test]
fn test_default_body()
{
	let line = render(&test_record(Kind::IfNot, "len >= 4"), Body::Default);

	assert_eq!(line.to_string(), "abort[3]: src/io.rs:40: In 'io::read_header': ABORT_IF_NOT(len >= 4, -1);");
	assert_eq!(line.depth(), 3);
	assert_eq!(line.prefix(), "abort[3]:");
	assert_eq!(line.location(), "src/io.rs:40: In 'io::read_header':");
}

#[test]
fn test_unconditional_body_drops_condition()
{
	let line = render(&test_record(Kind::Unconditional, ""), Body::Default);

	assert_eq!(line.body(), "ABORT(-1);");
}

#[test]
fn test_message_replaces_body()
{
	let line = render(&test_record(Kind::If, "len < 4"), Body::Message(format_args!("short header: {} bytes", 2)));

	assert_eq!(line.to_string(), "abort[3]: src/io.rs:40: In 'io::read_header': short header: 2 bytes");
}

#[test]
fn test_errno_body()
{
	let error = io::Error::from_raw_os_error(2);
	let expected = format!("ABORT_ON_ERRNO(open(path), -1); {}", error);

	let line = render(&test_record(Kind::OnErrno, "open(path)"), Body::Errno(error));

	assert_eq!(line.body(), expected);
}

#[test]
fn test_truncation_is_exact()
{
	let message = "depth = 12345";
	let length = message.chars().count();

	for limit in 0..=length + 5
	{
		let text = truncated(format_args!("depth = {}", 12345), limit);

		assert_eq!(text.chars().count(), limit.min(length), "limit = {}", limit);
		assert_eq!(text, &message[..limit.min(length)]);
	}
}

#[test]
fn test_truncation_keeps_whole_chars()
{
	assert_eq!(truncated(format_args!("{}", "héllo"), 2), "hé");
	assert_eq!(truncated(format_args!("{}{}", "ab", "cd"), 3), "abc");
	assert_eq!(truncated(format_args!("anything"), 0), "");
}

#[test]
fn test_routine_name()
{
	assert_eq!(routine_name("app::run::__abort_here"), "app::run");
	assert_eq!(routine_name("app::run::{{closure}}::{{closure}}::__abort_here"), "app::run");
	assert_eq!(routine_name("app::run"), "app::run");

	fn marker() {}
	assert!(type_name_of(marker).ends_with("test_routine_name::marker"));
}

#[test]
fn test_line_breaks_flattened()
{
	assert_eq!(truncated(format_args!("two\nlines\r\n"), 100), "two lines  ");
	assert_eq!(truncated(format_args!("a\nb{}", "\nc"), 4), "a b ");

	let line = render(&test_record(Kind::If, "bad"), Body::Message(format_args!("first\nsecond")));
	assert_eq!(line.to_string().lines().count(), 1);
	assert!(line.to_string().ends_with("first second"));
}
