// NOTE (rs) Call-site half of the abort facility. The macros expand in the caller's
//  crate and reach the runtime through `::abort::abort_internal`, so anything that
//  uses them needs the `abort` crate available under that name (the abort crate
//  itself does this with `extern crate self as abort`).



/// Name of the routine the macro was expanded in, without closure segments.

#[doc(hidden)]
#[macro_export]
macro_rules! abort_routine
{
	() =>
	{{
		fn __abort_here() {}

		::abort::abort_internal::routine_name(
			::abort::abort_internal::type_name_of(__abort_here))
	}};
}

/// Source location of the expansion point, for building a `Guard` by hand.

#[macro_export]
macro_rules! abort_site
{
	() =>
	{
		::abort::abort_internal::Site::new(file!(), line!(), $crate::abort_routine!())
	};
}



// Shared body for the conditional forms. The return expression is only evaluated
//  after the frame has been exited.

#[doc(hidden)]
#[macro_export]
macro_rules! abort_select
{
	{ $kind:ident, $cond:expr, $ret:expr, $f_fires:expr, $body:expr } =>
	{{
		let frame = ::abort::abort_internal::enter();

		if $f_fires
		{
			::abort::abort_internal::fire(
				&frame,
				::abort::abort_internal::Kind::$kind,
				$cond,
				stringify!($ret),
				$crate::abort_site!(),
				$body);

			::abort::abort_internal::exit(frame);

			return $ret;
		}

		::abort::abort_internal::exit(frame);
	}};
}

// The unconditional form diverges, so it can also sit in tail position

#[doc(hidden)]
#[macro_export]
macro_rules! abort_always
{
	{ $ret:expr, $body:expr } =>
	{{
		let frame = ::abort::abort_internal::enter();

		::abort::abort_internal::fire(
			&frame,
			::abort::abort_internal::Kind::Unconditional,
			"",
			stringify!($ret),
			$crate::abort_site!(),
			$body);

		::abort::abort_internal::exit(frame);

		return $ret;
	}};
}



/// Returns `ret` from the enclosing function if `cond` holds, after writing a
/// diagnostic line to the configured sink. Extra arguments replace the default
/// message body and follow `format!` syntax.
///
/// ```rust
/// use abort::*;
///
/// fn checked_div(a : i32, b : i32) -> i32
/// {
///     ABORT_IF!(b == 0, 0, "division of {} by zero", a);
///     a / b
/// }
///
/// assert_eq!(checked_div(4, 2), 2);
/// ```

#[macro_export]
macro_rules! ABORT_IF
{
	{ $cond:expr, $ret:expr $(,)? } =>
	{
		$crate::abort_select!
		{
			If,
			stringify!($cond),
			$ret,
			$cond,
			::abort::abort_internal::Body::Default
		}
	};
	{ $cond:expr, $ret:expr, $( $arg:tt )+ } =>
	{
		$crate::abort_select!
		{
			If,
			stringify!($cond),
			$ret,
			$cond,
			::abort::abort_internal::Body::Message(format_args!($($arg)+))
		}
	};
}

/// Returns `ret` from the enclosing function if `cond` does not hold.

#[macro_export]
macro_rules! ABORT_IF_NOT
{
	{ $cond:expr, $ret:expr $(,)? } =>
	{
		$crate::abort_select!
		{
			IfNot,
			stringify!($cond),
			$ret,
			!($cond),
			::abort::abort_internal::Body::Default
		}
	};
	{ $cond:expr, $ret:expr, $( $arg:tt )+ } =>
	{
		$crate::abort_select!
		{
			IfNot,
			stringify!($cond),
			$ret,
			!($cond),
			::abort::abort_internal::Body::Message(format_args!($($arg)+))
		}
	};
}

/// Unconditionally returns `ret` from the enclosing function.

#[macro_export]
macro_rules! ABORT
{
	{ $ret:expr $(,)? } =>
	{
		$crate::abort_always!
		{
			$ret,
			::abort::abort_internal::Body::Default
		}
	};
	{ $ret:expr, $( $arg:tt )+ } =>
	{
		$crate::abort_always!
		{
			$ret,
			::abort::abort_internal::Body::Message(format_args!($($arg)+))
		}
	};
}

/// Returns `ret` from the enclosing function if `expr` (usually a system call)
/// evaluates to -1. The message is built from the last OS error, so there is no
/// form taking a custom message.

#[macro_export]
macro_rules! ABORT_ON_ERRNO
{
	{ $expr:expr, $ret:expr $(,)? } =>
	{{
		let frame = ::abort::abort_internal::enter();

		if ($expr) == -1
		{
			// Grab the error before anything else gets a chance to overwrite it

			let error = ::abort::abort_internal::last_os_error();

			::abort::abort_internal::fire(
				&frame,
				::abort::abort_internal::Kind::OnErrno,
				stringify!($expr),
				stringify!($ret),
				$crate::abort_site!(),
				::abort::abort_internal::Body::Errno(error));

			::abort::abort_internal::exit(frame);

			return $ret;
		}

		::abort::abort_internal::exit(frame);
	}};
}
