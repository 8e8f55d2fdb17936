use core::mem;

use super::*;

// Hardware floating-point state is per thread, and every test below starts
// by installing the default environment, so the tests cannot interfere with
// one another whether the harness runs them in parallel or back to back.

#[test]
fn rounding_mode_round_trips() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        for mode in [FE_TONEAREST, FE_DOWNWARD, FE_UPWARD, FE_TOWARDZERO] {
            assert_eq!(fesetround(mode), 0);
            assert_eq!(fegetround(), mode);
        }
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn unknown_rounding_mode_is_rejected_without_effect() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        assert_eq!(fesetround(FE_UPWARD), 0);
        assert_eq!(fesetround(0x123), -1);
        assert_eq!(fesetround(-1), -1);
        assert_eq!(fegetround(), FE_UPWARD);
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn enable_then_disable_restores_masks() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        assert_eq!(fegetexcept(), 0);

        let previous = feenableexcept(FE_INVALID | FE_UNDERFLOW);
        assert_eq!(previous, 0);
        assert_eq!(fegetexcept(), FE_INVALID | FE_UNDERFLOW);

        let previous = fedisableexcept(FE_INVALID | FE_UNDERFLOW);
        assert_eq!(previous, FE_INVALID | FE_UNDERFLOW);
        assert_eq!(fegetexcept(), 0);
    }
}

#[test]
fn undefined_bits_are_ignored() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        feenableexcept(!0);
        assert_eq!(fegetexcept(), FE_ALL_EXCEPT);
        fedisableexcept(!0);
        assert_eq!(fegetexcept(), 0);

        fesetexcept(!0);
        assert_eq!(fetestexcept(!0), FE_ALL_EXCEPT);
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn clearing_everything_leaves_no_flags() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetexcept(FE_ALL_EXCEPT);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_ALL_EXCEPT);

        feclearexcept(FE_ALL_EXCEPT);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), 0);
    }
}

#[test]
fn set_and_clear_are_selective() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetexcept(FE_DIVBYZERO | FE_INEXACT);
        assert_eq!(
            fetestexcept(FE_ALL_EXCEPT),
            FE_DIVBYZERO | FE_INEXACT
        );
        assert_eq!(fetestexcept(FE_DIVBYZERO), FE_DIVBYZERO);

        feclearexcept(FE_DIVBYZERO);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_INEXACT);
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn raising_masked_exceptions_sets_their_flags() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        feraiseexcept(FE_OVERFLOW | FE_INEXACT);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_OVERFLOW | FE_INEXACT);
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn environment_round_trips_through_a_snapshot() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetround(FE_DOWNWARD);
        feenableexcept(FE_OVERFLOW);
        fesetexcept(FE_UNDERFLOW);

        let mut env = fenv_t::default();
        fegetenv(&mut env);

        fesetround(FE_TOWARDZERO);
        fedisableexcept(FE_ALL_EXCEPT);
        feclearexcept(FE_ALL_EXCEPT);
        fesetexcept(FE_INEXACT);

        fesetenv(&env);
        assert_eq!(fegetround(), FE_DOWNWARD);
        assert_eq!(fegetexcept(), FE_OVERFLOW);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_UNDERFLOW);

        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn default_environment_is_a_fixed_baseline() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetround(FE_TOWARDZERO);
        feclearexcept(FE_ALL_EXCEPT);
        feenableexcept(FE_INEXACT);
        fesetexcept(FE_OVERFLOW);

        fesetenv(FE_DFL_ENV);
        assert_eq!(fegetround(), FE_TONEAREST);
        assert_eq!(fegetexcept(), 0);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), 0);
    }
}

#[test]
fn saved_flags_round_trip_without_raising() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetexcept(FE_INVALID | FE_INEXACT);

        let mut saved: fexcept_t = 0;
        fegetexceptflag(&mut saved, FE_ALL_EXCEPT);

        feclearexcept(FE_ALL_EXCEPT);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), 0);

        fesetexceptflag(&saved, FE_ALL_EXCEPT);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_INVALID | FE_INEXACT);

        assert_eq!(fetestexceptflag(&saved, FE_INVALID), FE_INVALID);
        assert_eq!(fetestexceptflag(&saved, FE_DIVBYZERO), 0);
        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn holdexcept_clears_and_updateenv_merges() {
    unsafe {
        fesetenv(FE_DFL_ENV);
        fesetexcept(FE_DIVBYZERO);

        let mut env = fenv_t::default();
        feholdexcept(&mut env);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), 0);

        fesetexcept(FE_OVERFLOW);
        feupdateenv(&env);
        assert_eq!(fetestexcept(FE_ALL_EXCEPT), FE_DIVBYZERO | FE_OVERFLOW);

        fesetenv(FE_DFL_ENV);
    }
}

#[test]
fn snapshot_layout_matches_the_platform_type() {
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        assert_eq!(mem::size_of::<fenv_t>(), 32);
        assert_eq!(mem::size_of::<fexcept_t>(), 2);
    }
    #[cfg(target_os = "macos")]
    {
        assert_eq!(mem::size_of::<fenv_t>(), 16);
        assert_eq!(mem::size_of::<fexcept_t>(), 2);
    }
    #[cfg(target_os = "windows")]
    {
        assert_eq!(mem::size_of::<fenv_t>(), 8);
        assert_eq!(mem::size_of::<fexcept_t>(), 4);
    }
}

// Delivery order and handler accounting can only be observed with a real
// SIGFPE handler, which needs the libc signal interface.
#[cfg(target_os = "linux")]
#[test]
fn raising_traps_in_priority_order() {
    use core::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    static ENTRIES: AtomicUsize = AtomicUsize::new(0);
    static CODES: [AtomicI32; 4] = [
        AtomicI32::new(0),
        AtomicI32::new(0),
        AtomicI32::new(0),
        AtomicI32::new(0),
    ];

    unsafe extern "C" fn on_sigfpe(
        _signal: c_int,
        info: *mut libc::siginfo_t,
        _context: *mut libc::c_void,
    ) {
        let entry = ENTRIES.fetch_add(1, Ordering::SeqCst);
        if entry < CODES.len() {
            CODES[entry].store((*info).si_code, Ordering::SeqCst);
        }
        // A real handler must retire the exception or the faulting wait
        // re-triggers on return.
        feclearexcept(FE_ALL_EXCEPT);
    }

    unsafe {
        fesetenv(FE_DFL_ENV);

        let handler: unsafe extern "C" fn(c_int, *mut libc::siginfo_t, *mut libc::c_void) =
            on_sigfpe;
        let mut action: libc::sigaction = mem::zeroed();
        action.sa_sigaction = handler as usize;
        action.sa_flags = libc::SA_SIGINFO;
        let mut previous: libc::sigaction = mem::zeroed();
        assert_eq!(libc::sigaction(libc::SIGFPE, &action, &mut previous), 0);

        // Flag-only stores are observable but never enter the handler.
        fesetexcept(FE_OVERFLOW | FE_INVALID);
        assert_eq!(
            fetestexcept(FE_OVERFLOW | FE_INVALID),
            FE_OVERFLOW | FE_INVALID
        );
        assert_eq!(ENTRIES.load(Ordering::SeqCst), 0);
        feclearexcept(FE_ALL_EXCEPT);

        feenableexcept(FE_OVERFLOW | FE_INVALID);
        feraiseexcept(FE_OVERFLOW | FE_INVALID);

        fedisableexcept(FE_ALL_EXCEPT);
        assert_eq!(
            libc::sigaction(libc::SIGFPE, &previous, core::ptr::null_mut()),
            0
        );
        fesetenv(FE_DFL_ENV);

        assert_eq!(ENTRIES.load(Ordering::SeqCst), 2);
        assert_eq!(CODES[0].load(Ordering::SeqCst), libc::FPE_FLTINV);
        assert_eq!(CODES[1].load(Ordering::SeqCst), libc::FPE_FLTOVF);
    }
}
