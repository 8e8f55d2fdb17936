//! Control of the x86 floating-point environment through the `fenv.h`
//! contract: exception masks, exception flags, rounding mode and full
//! environment snapshots, covering both the x87 unit and the SSE unit's
//! MXCSR register.

#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("posix-fenv drives the x87 and MXCSR control registers and only supports x86 and x86_64");

pub mod header;
pub mod platform;
