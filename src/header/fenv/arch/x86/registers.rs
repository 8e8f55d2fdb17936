//! Raw access to the x87 control/status registers and MXCSR.
//!
//! Nothing here is more than a mechanical register transfer; all policy
//! lives one layer up.

use core::arch::asm;

/// Memory image transferred by `fnstenv`/`fldenv` (28 bytes outside of
/// real mode).
///
/// Only the control and status words are ever interpreted. The remaining
/// 20 bytes hold the tag word and the last instruction/operand pointers;
/// they are carried around verbatim.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct X87Env {
    pub control_word: u16,
    reserved0: u16,
    pub status_word: u16,
    reserved1: u16,
    pub opaque: [u32; 5],
}

const _: () = assert!(core::mem::size_of::<X87Env>() == 28);

pub fn x87_control_word() -> u16 {
    let mut word: u16 = 0;
    unsafe {
        asm!("fnstcw [{}]", in(reg) &mut word, options(nostack));
    }
    word
}

pub fn set_x87_control_word(word: u16) {
    unsafe {
        asm!("fldcw [{}]", in(reg) &word, options(nostack, readonly));
    }
}

pub fn x87_status_word() -> u16 {
    let mut word: u16 = 0;
    unsafe {
        asm!("fnstsw [{}]", in(reg) &mut word, options(nostack));
    }
    word
}

pub fn x87_env() -> X87Env {
    let mut env = X87Env::default();
    unsafe {
        asm!("fnstenv [{}]", in(reg) &mut env, options(nostack));
    }
    env
}

pub fn set_x87_env(env: &X87Env) {
    unsafe {
        asm!("fldenv [{}]", in(reg) env, options(nostack, readonly));
    }
}

pub fn mxcsr() -> u32 {
    let mut csr: u32 = 0;
    unsafe {
        asm!("stmxcsr [{}]", in(reg) &mut csr, options(nostack));
    }
    csr
}

pub fn set_mxcsr(csr: u32) {
    unsafe {
        asm!("ldmxcsr [{}]", in(reg) &csr, options(nostack, readonly));
    }
}

/// Force completion of pending x87 operations, delivering any pending
/// unmasked exception to its handler before execution continues.
pub fn fwait() {
    unsafe {
        asm!("fwait", options(nostack));
    }
}
