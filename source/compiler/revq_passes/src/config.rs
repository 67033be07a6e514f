// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Graph passes run after translation.
    pub struct PassFlags: u32 {
        /// Split producers read through more than one slot of the same instruction.
        const NORMALIZE              = 0b_0001;
        /// Never read two paths of the same register version in one instruction.
        const NO_SELF_PAIRING        = 0b_0010;
        /// Keep in-place writes from destroying values that are still read later.
        const NO_PREMATURE_OVERWRITE = 0b_0100;
        /// Check write-in-place on the final program.
        const VERIFY                 = 0b_1000;
    }
}

impl Default for PassFlags {
    fn default() -> Self {
        PassFlags::all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub passes: PassFlags,
    /// Upper bound on enforcement rounds before giving up.
    pub max_iterations: usize,
    /// Report every write-in-place violation instead of stopping at the first.
    pub collect_all_violations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passes: PassFlags::default(),
            max_iterations: 64,
            collect_all_violations: false,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_passes(self, passes: PassFlags) -> Self {
        Self { passes, ..self }
    }

    #[must_use]
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}
