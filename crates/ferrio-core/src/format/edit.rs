//! Edit descriptor types.
//!
//! A format specification reduces to a stream of data edits (each
//! consumes one transferred value) and control edits (consume none).
//! The interpreter in `format::cursor` yields `DataEdit`s on demand and
//! applies control edits as side effects.

use crate::options::{BlankMode, DecimalMode, RoundMode, SignMode};

/// Radix of an integer data edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntBase {
    Decimal,
    Binary,
    Octal,
    Hex,
}

impl IntBase {
    pub fn radix(self) -> u32 {
        match self {
            IntBase::Decimal => 10,
            IntBase::Binary => 2,
            IntBase::Octal => 8,
            IntBase::Hex => 16,
        }
    }
}

/// Form of a real data edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealForm {
    /// Fw.d: fixed point.
    F,
    /// Ew.d[Ee]: exponential with 0.x mantissa.
    E,
    /// Dw.d: exponential, D exponent letter.
    D,
    /// Gw.d: generalized, F-like in range and E-like outside.
    G,
    /// ENw.d: engineering (exponent a multiple of 3).
    En,
    /// ESw.d: scientific (one digit before the point).
    Es,
}

/// A data edit descriptor: consumes exactly one value per visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEdit {
    /// Iw[.m], Bw, Ow, Zw. `min_digits` is the `.m` zero-fill floor.
    Integer {
        width: u32,
        min_digits: u32,
        base: IntBase,
    },
    /// Fw.d, Ew.d[Ee], Dw.d, Gw.d, ENw.d, ESw.d.
    Real {
        width: u32,
        frac: u32,
        exponent: Option<u32>,
        form: RealForm,
    },
    /// Lw.
    Logical { width: u32 },
    /// A or Aw. Width None means "the item's own length".
    Character { width: Option<u32> },
}

/// A control edit descriptor: consumes no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEdit {
    /// nX: move right n columns.
    Relative(i32),
    /// Tn: move to absolute column n (1-based).
    Column(u32),
    /// n/: terminate the current record n times.
    Slash(u32),
    /// Colon: stops format processing when the item list is exhausted.
    Colon,
    /// Quoted text or nHtext, emitted literally on output.
    Literal(Vec<u8>),
    /// kP: set the scale factor.
    Scale(i32),
    /// SP / SS / S.
    Sign(SignMode),
    /// BN / BZ.
    Blank(BlankMode),
    /// DC / DP.
    Decimal(DecimalMode),
    /// RU / RD / RZ / RN / RC / RP.
    Round(RoundMode),
}
