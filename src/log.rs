//! Thin logging shim, switched the same way the teacher crate swaps hardware
//! variants: `cfg_if!` picks `defmt`'s RTT-backed macros on a real target, and a
//! no-op on host test builds, where no global logger is ever linked in.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(test)] {
        macro_rules! trace {
            ($($arg:tt)*) => {};
        }
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
    } else {
        macro_rules! trace {
            ($($arg:tt)*) => {
                defmt::trace!($($arg)*)
            };
        }
        macro_rules! debug {
            ($($arg:tt)*) => {
                defmt::debug!($($arg)*)
            };
        }
    }
}

pub(crate) use debug;
pub(crate) use trace;
