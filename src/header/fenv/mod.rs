//! ----------------------------------------------------------------------
//! Copyright © 2005-2020 Rich Felker, et al.
//!
//! Permission is hereby granted, free of charge, to any person obtaining
//! a copy of this software and associated documentation files (the
//! "Software"), to deal in the Software without restriction, including
//! without limitation the rights to use, copy, modify, merge, publish,
//! distribute, sublicense, and/or sell copies of the Software, and to
//! permit persons to whom the Software is furnished to do so, subject to
//! the following conditions:
//!
//! The above copyright notice and this permission notice shall be
//! included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
//! EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
//! MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
//! IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
//! CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
//! TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE
//! SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
//! ----------------------------------------------------------------------

use crate::platform::types::c_int;

mod arch;

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
pub use arch::x86::native::*;

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fegetexceptflag.html>.
#[no_mangle]
pub unsafe extern "C" fn fegetexceptflag(flagp: *mut fexcept_t, excepts: c_int) -> c_int {
    *flagp = fetestexcept(excepts) as fexcept_t;
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/feholdexcept.html>.
///
/// The `fnstenv` issued by the capture leaves the x87 unit with every
/// exception masked, so this also installs non-stop mode on that unit.
#[no_mangle]
pub unsafe extern "C" fn feholdexcept(envp: *mut fenv_t) -> c_int {
    fegetenv(envp);
    feclearexcept(FE_ALL_EXCEPT);
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fesetexceptflag.html>.
///
/// Restores previously saved flag bits without running any trap handler.
#[no_mangle]
pub unsafe extern "C" fn fesetexceptflag(flagp: *const fexcept_t, excepts: c_int) -> c_int {
    feclearexcept(!(*flagp as c_int) & excepts);
    fesetexcept(*flagp as c_int & excepts);
    0
}

/// Tests saved flag bits without reading the hardware state (C23).
#[no_mangle]
pub unsafe extern "C" fn fetestexceptflag(flagp: *const fexcept_t, excepts: c_int) -> c_int {
    *flagp as c_int & excepts & FE_ALL_EXCEPT
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/feupdateenv.html>.
#[no_mangle]
pub unsafe extern "C" fn feupdateenv(envp: *const fenv_t) -> c_int {
    let excepts = fetestexcept(FE_ALL_EXCEPT);
    fesetenv(envp);
    feraiseexcept(excepts);
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fesetround.html>.
#[no_mangle]
pub unsafe extern "C" fn fesetround(round: c_int) -> c_int {
    if round != FE_TONEAREST && round != FE_DOWNWARD && round != FE_UPWARD && round != FE_TOWARDZERO
    {
        return -1;
    }

    __fesetround(round)
}

#[cfg(test)]
mod tests;
