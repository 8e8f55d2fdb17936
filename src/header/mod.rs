//! POSIX header implementations.

pub mod fenv;
