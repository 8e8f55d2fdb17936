//! The `fe*` operation set for x86, over the register accessors.
//!
//! Exception masks use inverted polarity in both registers: a set bit
//! suppresses the exception, a clear bit lets it trap. Flag bits record an
//! exception condition whether or not it was masked.

use core::mem;

use bitflags::bitflags;

use super::registers;
pub use super::registers::X87Env;
use crate::platform::types::*;

pub const FE_INVALID: c_int = 1;
#[cfg(feature = "fe_denorm")]
pub const __FE_DENORM: c_int = 2;
pub const FE_DIVBYZERO: c_int = 4;
pub const FE_OVERFLOW: c_int = 8;
pub const FE_UNDERFLOW: c_int = 0x10;
pub const FE_INEXACT: c_int = 0x20;

#[cfg(not(feature = "fe_denorm"))]
pub const FE_ALL_EXCEPT: c_int = 0x3d;
#[cfg(feature = "fe_denorm")]
pub const FE_ALL_EXCEPT: c_int = 0x3f;

pub const FE_TONEAREST: c_int = 0;
pub const FE_DOWNWARD: c_int = 0x400;
pub const FE_UPWARD: c_int = 0x800;
pub const FE_TOWARDZERO: c_int = 0xc00;

bitflags! {
    /// Exception bits as laid out in the x87 status and control words and in
    /// the low bits of MXCSR.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct ExceptBits: u16 {
        const INVALID = 1 << 0;
        const DENORMAL = 1 << 1;
        const DIVBYZERO = 1 << 2;
        const OVERFLOW = 1 << 3;
        const UNDERFLOW = 1 << 4;
        const INEXACT = 1 << 5;
    }
}

// The 2-bit rounding encoding is shared by both registers; only the field
// offset differs.
const RC_TONEAREST: u32 = 0;
const RC_DOWNWARD: u32 = 1;
const RC_UPWARD: u32 = 2;
const RC_TOWARDZERO: u32 = 3;

const X87_ROUNDING_SHIFT: u32 = 10;
const X87_ROUNDING_MASK: u16 = 0x3 << X87_ROUNDING_SHIFT;

// x87 precision control, bits 8..=9; 0b11 selects double extended.
const X87_PRECISION_EXTENDED: u16 = 0x3 << 8;

pub(crate) const MXCSR_ROUNDING_SHIFT: u32 = 13;
pub(crate) const MXCSR_ROUNDING_MASK: u32 = 0x3 << MXCSR_ROUNDING_SHIFT;

// Exception masks sit at bits 0..=5 of the x87 control word and 7..=12 of
// MXCSR.
pub(crate) const MXCSR_MASK_SHIFT: u32 = 7;

// MXCSR control bits with no x87 counterpart.
pub(crate) const MXCSR_DAZ: u32 = 1 << 6;
pub(crate) const MXCSR_FTZ: u32 = 1 << 15;

/// Translates a caller-supplied `FE_*` set into the hardware bit layout,
/// dropping undefined bits.
fn except_bits(excepts: c_int) -> ExceptBits {
    let mut bits = ExceptBits::empty();
    if excepts & FE_INVALID != 0 {
        bits |= ExceptBits::INVALID;
    }
    #[cfg(feature = "fe_denorm")]
    if excepts & __FE_DENORM != 0 {
        bits |= ExceptBits::DENORMAL;
    }
    if excepts & FE_DIVBYZERO != 0 {
        bits |= ExceptBits::DIVBYZERO;
    }
    if excepts & FE_OVERFLOW != 0 {
        bits |= ExceptBits::OVERFLOW;
    }
    if excepts & FE_UNDERFLOW != 0 {
        bits |= ExceptBits::UNDERFLOW;
    }
    if excepts & FE_INEXACT != 0 {
        bits |= ExceptBits::INEXACT;
    }
    bits
}

/// Inverse of [`except_bits`]; only defined kinds ever appear in the result.
fn excepts_from_bits(bits: ExceptBits) -> c_int {
    let mut excepts = 0;
    if bits.contains(ExceptBits::INVALID) {
        excepts |= FE_INVALID;
    }
    #[cfg(feature = "fe_denorm")]
    if bits.contains(ExceptBits::DENORMAL) {
        excepts |= __FE_DENORM;
    }
    if bits.contains(ExceptBits::DIVBYZERO) {
        excepts |= FE_DIVBYZERO;
    }
    if bits.contains(ExceptBits::OVERFLOW) {
        excepts |= FE_OVERFLOW;
    }
    if bits.contains(ExceptBits::UNDERFLOW) {
        excepts |= FE_UNDERFLOW;
    }
    if bits.contains(ExceptBits::INEXACT) {
        excepts |= FE_INEXACT;
    }
    excepts
}

/// Unmasks the requested exceptions in both registers and returns the set
/// that was enabled beforehand.
#[no_mangle]
pub unsafe extern "C" fn feenableexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts).bits();

    let control_word = registers::x87_control_word();
    let enabled = ExceptBits::from_bits_truncate(!control_word);
    registers::set_x87_control_word(control_word & !bits);

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr(mxcsr & !(u32::from(bits) << MXCSR_MASK_SHIFT));

    excepts_from_bits(enabled)
}

/// Masks the requested exceptions in both registers and returns the set that
/// was enabled beforehand.
#[no_mangle]
pub unsafe extern "C" fn fedisableexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts).bits();

    let control_word = registers::x87_control_word();
    let enabled = ExceptBits::from_bits_truncate(!control_word);
    registers::set_x87_control_word(control_word | bits);

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr(mxcsr | (u32::from(bits) << MXCSR_MASK_SHIFT));

    excepts_from_bits(enabled)
}

/// Returns the currently enabled (unmasked) exceptions, taking MXCSR as the
/// authoritative copy of the mask state.
#[no_mangle]
pub unsafe extern "C" fn fegetexcept() -> c_int {
    let mxcsr = registers::mxcsr();
    excepts_from_bits(ExceptBits::from_bits_truncate(
        !(mxcsr >> MXCSR_MASK_SHIFT) as u16,
    ))
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fetestexcept.html>.
#[no_mangle]
pub unsafe extern "C" fn fetestexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts);

    // An exception may have been recorded by either unit.
    let status_word = registers::x87_status_word();
    let mxcsr = registers::mxcsr();
    let set = ExceptBits::from_bits_truncate(status_word | mxcsr as u16);

    excepts_from_bits(set & bits)
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/feclearexcept.html>.
#[no_mangle]
pub unsafe extern "C" fn feclearexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts).bits();

    // The x87 status word has no direct write path; it only moves through
    // the full environment block.
    let mut env = registers::x87_env();
    env.status_word &= !bits;
    registers::set_x87_env(&env);

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr(mxcsr & !u32::from(bits));

    0
}

/// Sets the requested flag bits in both registers without invoking any trap
/// handler (C23 `fesetexcept`).
#[no_mangle]
pub unsafe extern "C" fn fesetexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts).bits();

    let mut env = registers::x87_env();
    env.status_word |= bits;
    registers::set_x87_env(&env);

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr(mxcsr | u32::from(bits));

    0
}

fn raise_one(requested: ExceptBits, kind: ExceptBits) {
    if !requested.contains(kind) {
        return;
    }

    let mut env = registers::x87_env();
    env.status_word |= kind.bits();
    registers::set_x87_env(&env);

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr(mxcsr | u32::from(kind.bits()));

    registers::fwait();
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/feraiseexcept.html>.
///
/// Exceptions are delivered one kind at a time, in hardware priority order,
/// per the x87 exception-synchronization protocol: set the flag, then
/// execute a waiting instruction so the processor enters the handler before
/// the next flag goes in. The environment block is re-read for every kind
/// because the handler for an earlier one may have modified it.
#[no_mangle]
pub unsafe extern "C" fn feraiseexcept(excepts: c_int) -> c_int {
    let bits = except_bits(excepts);

    raise_one(bits, ExceptBits::INVALID);
    raise_one(bits, ExceptBits::DIVBYZERO);
    raise_one(bits, ExceptBits::OVERFLOW);
    raise_one(bits, ExceptBits::UNDERFLOW);
    raise_one(bits, ExceptBits::INEXACT);
    #[cfg(feature = "fe_denorm")]
    raise_one(bits, ExceptBits::DENORMAL);

    // There is no wait equivalent for the SSE unit: writing MXCSR flag bits
    // alone does not guarantee a handler runs. That path stays flag-only.
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fegetround.html>.
#[no_mangle]
pub unsafe extern "C" fn fegetround() -> c_int {
    match (registers::mxcsr() >> MXCSR_ROUNDING_SHIFT) & 0x3 {
        RC_TONEAREST => FE_TONEAREST,
        RC_DOWNWARD => FE_DOWNWARD,
        RC_UPWARD => FE_UPWARD,
        RC_TOWARDZERO => FE_TOWARDZERO,
        _ => -1,
    }
}

/// Rounding-mode store shared by `fesetround`; the portable wrapper has
/// already rejected unknown modes, but an unknown value still fails here
/// rather than touching the registers.
#[no_mangle]
pub unsafe extern "C" fn __fesetround(round: c_int) -> c_int {
    let code = match round {
        FE_TONEAREST => RC_TONEAREST,
        FE_DOWNWARD => RC_DOWNWARD,
        FE_UPWARD => RC_UPWARD,
        FE_TOWARDZERO => RC_TOWARDZERO,
        _ => return -1,
    };

    let control_word = registers::x87_control_word();
    registers::set_x87_control_word(
        (control_word & !X87_ROUNDING_MASK) | ((code as u16) << X87_ROUNDING_SHIFT),
    );

    let mxcsr = registers::mxcsr();
    registers::set_mxcsr((mxcsr & !MXCSR_ROUNDING_MASK) | (code << MXCSR_ROUNDING_SHIFT));

    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/fenv.h.html>.
#[cfg(not(target_os = "windows"))]
pub type fexcept_t = c_ushort;
/// See <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/fenv.h.html>.
#[cfg(target_os = "windows")]
pub type fexcept_t = c_uint;

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/fenv.h.html>.
///
/// The layout matches the platform's public environment type byte for byte,
/// so captured environments can be handed to or received from foreign code.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct fenv_t {
    pub x87: X87Env,
    pub mxcsr: u32,
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/fenv.h.html>.
#[cfg(target_os = "macos")]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct fenv_t {
    pub control_word: u16,
    pub status_word: u16,
    pub mxcsr: u32,
    pub reserved: [u8; 8],
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/basedefs/fenv.h.html>.
///
/// MSVC keeps only a 32-bit control word and a 32-bit status word; all
/// fields are transposed from MXCSR on capture and back on restore.
#[cfg(target_os = "windows")]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct fenv_t {
    pub control_word: u32,
    pub status_word: u32,
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const _: () = assert!(mem::size_of::<fenv_t>() == 32);
#[cfg(target_os = "macos")]
const _: () = assert!(mem::size_of::<fenv_t>() == 16);
#[cfg(target_os = "windows")]
const _: () = assert!(mem::size_of::<fenv_t>() == 8);

/// The default floating-point environment, accepted by `fesetenv` and
/// `feupdateenv` in place of a real snapshot.
pub const FE_DFL_ENV: *const fenv_t = -1isize as *const fenv_t;

/// Restores the x87 unit from a snapshot's control word and flag bits.
///
/// The environment block also carries the stack top, tag word and last
/// instruction/operand pointers; those describe whatever the unit is doing
/// right now, so they are kept from the live state, never from the snapshot.
#[cfg(not(target_os = "windows"))]
fn load_x87_snapshot(control_word: u16, flags: u16) {
    let mut env = registers::x87_env();
    env.control_word = control_word;
    env.status_word = (env.status_word & !0x3f) | (flags & 0x3f);
    registers::set_x87_env(&env);
}

/// Resets both units to the startup environment: every exception masked,
/// round to nearest, x87 precision at double extended, all flags clear.
fn load_default_env() {
    let mut env = registers::x87_env();
    env.status_word &= !0x3f;
    env.opaque = [0; 5];
    env.control_word |= 0x3f;
    env.control_word &= !X87_ROUNDING_MASK;
    env.control_word |= X87_PRECISION_EXTENDED;
    registers::set_x87_env(&env);

    let mut mxcsr = registers::mxcsr();
    mxcsr &= !0x3f;
    mxcsr &= !MXCSR_DAZ;
    mxcsr |= 0x3f << MXCSR_MASK_SHIFT;
    mxcsr &= !MXCSR_ROUNDING_MASK;
    mxcsr &= !MXCSR_FTZ;
    registers::set_mxcsr(mxcsr);
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fegetenv.html>.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
#[no_mangle]
pub unsafe extern "C" fn fegetenv(envp: *mut fenv_t) -> c_int {
    let env = &mut *envp;
    env.x87 = registers::x87_env();
    env.mxcsr = registers::mxcsr();
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fesetenv.html>.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
#[no_mangle]
pub unsafe extern "C" fn fesetenv(envp: *const fenv_t) -> c_int {
    if envp == FE_DFL_ENV {
        load_default_env();
        return 0;
    }

    let env = &*envp;
    load_x87_snapshot(env.x87.control_word, env.x87.status_word);
    // MXCSR has no hardware-private bits and can be written through.
    registers::set_mxcsr(env.mxcsr);
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fegetenv.html>.
#[cfg(target_os = "macos")]
#[no_mangle]
pub unsafe extern "C" fn fegetenv(envp: *mut fenv_t) -> c_int {
    let x87 = registers::x87_env();
    let env = &mut *envp;
    env.control_word = x87.control_word;
    env.status_word = x87.status_word;
    env.mxcsr = registers::mxcsr();
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fesetenv.html>.
#[cfg(target_os = "macos")]
#[no_mangle]
pub unsafe extern "C" fn fesetenv(envp: *const fenv_t) -> c_int {
    if envp == FE_DFL_ENV {
        load_default_env();
        return 0;
    }

    let env = &*envp;
    load_x87_snapshot(env.control_word, env.status_word);
    registers::set_mxcsr(env.mxcsr);
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fegetenv.html>.
#[cfg(target_os = "windows")]
#[no_mangle]
pub unsafe extern "C" fn fegetenv(envp: *mut fenv_t) -> c_int {
    let mxcsr = registers::mxcsr();
    let env = &mut *envp;
    env.control_word = super::win::control_word_from_mxcsr(mxcsr);
    env.status_word = super::win::status_word_from_mxcsr(mxcsr);
    0
}

/// See <https://pubs.opengroup.org/onlinepubs/9799919799/functions/fesetenv.html>.
///
/// The MSVC environment does not carry the x87 block, so only MXCSR is
/// restored here.
#[cfg(target_os = "windows")]
#[no_mangle]
pub unsafe extern "C" fn fesetenv(envp: *const fenv_t) -> c_int {
    if envp == FE_DFL_ENV {
        load_default_env();
        return 0;
    }

    let env = &*envp;
    registers::set_mxcsr(super::win::mxcsr_from_env(env.control_word, env.status_word));
    0
}
