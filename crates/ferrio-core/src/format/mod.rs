//! Format interpretation and data editing.
//!
//! `cursor` walks the format specification; `output` and `input` render
//! and parse individual fields under the data edit the cursor yields.

pub mod cursor;
pub mod edit;
pub mod input;
pub mod output;

pub use cursor::{ControlSink, DEFAULT_MAX_NESTING, FormatCursor, nesting_bound};
pub use edit::{ControlEdit, DataEdit, IntBase, RealForm};

use crate::options::{BlankMode, DecimalMode, OptionSet, RoundMode, SignMode};

/// Transient editing modes.
///
/// Seeded from the control list when the first transfer freezes the
/// options, then mutated by SP/SS/S, BN/BZ, DC/DP, RU/.../RP and kP
/// control edits as the format advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditModes {
    pub scale: i32,
    pub sign: SignMode,
    pub blank: BlankMode,
    pub decimal: DecimalMode,
    pub round: RoundMode,
}

impl EditModes {
    pub fn from_options(options: &OptionSet) -> Self {
        Self {
            scale: 0,
            sign: options.sign,
            blank: options.blank,
            decimal: options.decimal,
            round: options.round,
        }
    }
}
