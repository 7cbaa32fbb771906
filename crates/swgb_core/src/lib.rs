//! Save codec and edit API for Star Wars Galactic Battlegrounds `.ga2` files.
//!
//! The codec works purely on in-memory byte buffers: [`framing`] recovers the
//! compression framing of the file, [`document`] locates player records in
//! the decompressed stream and rewrites resource values in place, and
//! [`core_api`] is the narrow surface consumed by front ends.

pub mod core_api;
pub mod document;
pub mod error;
pub mod framing;
