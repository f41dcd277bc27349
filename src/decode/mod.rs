//! Byte-layout decoders for the individual block types.
//!
//! Each decoder takes a raw sub-block slice plus its declared length and
//! reports malformed or truncated input instead of reading past it. They hold
//! no state; everything aggregate lives in the [`crate::session`] layer.

pub mod base;
pub mod cta;
pub mod displayid;
pub mod dtd;
pub mod formulas;
