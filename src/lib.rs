//! Arbitrary-precision CRC calculation and reverse engineering.
//!
//! Four layers, bottom to top:
//! - [`poly`]: arbitrary-width GF(2) binary polynomial arithmetic.
//! - [`crc`]: the Williams parametric CRC engine built on top of it.
//! - [`model`]: a named bundle of CRC parameters (a "Williams model").
//! - [`reveng`]: given samples of `(message, CRC)` pairs and a partial
//!   model, searches for every model consistent with them.
//!
//! [`presets`] is a small catalog of well-known models; [`error`] is the
//! shared error taxonomy.

pub mod error;
pub mod poly;
pub mod crc;
pub mod model;
pub mod reveng;
pub mod presets;

pub use error::{Error, Result};
pub use model::Model;
pub use poly::Poly;
