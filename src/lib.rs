// Lets the call-site macros name the runtime as `::abort` from inside this crate too

extern crate self as abort;



// General library config

pub mod config;
pub use config::{ get_ostream, set_ostream, message_size, set_message_size };

// Output

pub mod sink;
pub use sink::{ Sink, SharedSink };

// Message construction and call depth

pub mod depth;
pub mod format;

// Guards

pub mod abort_internal;
pub use abort_internal::{ Guard, Outcome };
pub use abort_macro::*;



#[cfg(test)]
pub(crate) mod test_support;
