//! Error types for color parsing and palette operations

use thiserror::Error;

/// Errors from parsing or normalizing a color
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
	/// The input did not have a recognized color shape
	#[error("Unexpected format for color: {0}")]
	UnexpectedFormat(String),
	/// A component of an otherwise well-shaped color could not be parsed
	#[error("Invalid color component: {0}")]
	InvalidComponent(String),
}

/// Errors from palette swatch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwatchError {
	/// A paint with the same hex color is already in the palette
	#[error("Selected color already in palette: {0}")]
	Duplicate(String),
	/// The palette index does not refer to a paint
	#[error("Palette index {index} is out of range for a palette of {len} paints")]
	IndexOutOfRange {
		/// The offending index
		index: usize,
		/// The number of paints in the palette
		len: usize,
	},
	/// The color of a new paint could not be parsed
	#[error(transparent)]
	Color(#[from] ColorError),
}
