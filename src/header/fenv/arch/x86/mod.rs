//! x86 and x86_64 floating-point environment control.
//!
//! The rounding mode and the exception masks live in two registers at once:
//! the x87 control word and the SSE unit's MXCSR. Both use the same 2-bit
//! rounding encoding and the same six exception bits, at different offsets.
//! Every control operation writes the two registers back to back so that
//! x87-only and SSE-only code observe the same environment.

mod registers;

// The MSVC environment layout is a pure word-level transposition of MXCSR;
// keeping it buildable on every host lets the bit math be tested anywhere.
#[cfg(any(target_os = "windows", test))]
mod win;

pub mod native;
