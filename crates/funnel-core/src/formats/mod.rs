//! # Formats
//!
//! Text encodings used at the edges of the core:
//! - `csv`: bulk import and export rows
//! - `persistence`: versioned JSON documents for storage backends

pub mod csv;
pub mod persistence;

pub use persistence::{DocumentHeader, decode_document, decode_state, encode_document, encode_state};
