//! Crate-wide error taxonomy.
//!
//! The source tool treats every one of these as fatal, routed through a
//! non-returning `error` callback. A library doesn't get to call
//! `exit()` on its caller, so each condition below becomes a `Result`
//! instead; the CLI driver is the layer that prints the message and
//! terminates the process, the way the original `error` callback did.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("no polynomial specified")]
    NoPolynomial,

    #[error("must specify positive width before -s")]
    NoWidth,

    #[error("not a Williams model compliant algorithm")]
    NotWilliams,

    #[error("cannot search for non-Williams compliant models")]
    CannotSearchNonWilliams,

    #[error("cannot search for crossed-endian models")]
    CrossedEndian,

    #[error("preset model not found")]
    PresetNotFound,

    #[error("no preset models available")]
    NoPresets,

    #[error("poly must have +1 term")]
    PolyMissingUnitTerm,

    /// Retained for interface fidelity with the allocation-failure path;
    /// `Vec` aborts the process on allocation failure before this could
    /// ever be constructed, so nothing in this crate actually raises it.
    #[error("cannot allocate memory for {0}")]
    Alloc(String),

    #[error("invalid hex digit at position {0}")]
    InvalidHex(usize),

    #[error("odd number of hex digits in input")]
    OddHexLength,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = core::result::Result<T, Error>;
