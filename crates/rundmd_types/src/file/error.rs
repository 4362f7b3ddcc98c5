//! Error types for RunDMD image parsing and manipulation.

use thiserror::Error;

/// Errors that can occur when parsing or building RunDMD image files.
#[derive(Debug, Error)]
pub enum DmdError {
	/// The file does not start with the expected image marker
	#[error("Invalid image marker: expected `{expected}`, got `{found}`")]
	MarkerMismatch {
		/// Marker the format requires
		expected: &'static str,
		/// Marker actually found in the file
		found: String,
	},

	/// Not enough data to parse a declared field or region
	#[error("Insufficient data: expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// A raw value outside an enumeration's closed set was decoded
	#[error("Unknown value {value} for enum field `{field}`")]
	UnknownEnumValue {
		/// Field being decoded
		field: &'static str,
		/// Raw value found in the data
		value: u64,
	},

	/// A name outside an enumeration's closed set was encoded
	#[error("Unknown name `{name}` for enum field `{field}`")]
	UnknownEnumName {
		/// Field being encoded
		field: &'static str,
		/// Name that failed the lookup
		name: String,
	},

	/// A flag name outside the declared bit set was encoded
	#[error("Unknown flag `{name}` for field `{field}`")]
	UnknownFlagName {
		/// Field being encoded
		field: &'static str,
		/// Flag name that failed the lookup
		name: String,
	},

	/// A declared bitmap is never referenced by the frame table
	#[error("Bitmap {bitmap} is declared but never referenced in animation `{animation}`")]
	UnreferencedBitmap {
		/// Name of the affected animation
		animation: String,
		/// 1-based bitmap number that was never referenced
		bitmap: u8,
	},

	/// A bitmap row in the document representation is malformed
	#[error("Malformed bitmap row {row}: {message}")]
	MalformedFrameRow {
		/// 0-based row index within the frame
		row: usize,
		/// What is wrong with the row
		message: String,
	},

	/// A string cannot be stored in its declared fixed-width ASCII field
	#[error("Field `{field}` cannot be stored in {width} ASCII bytes: {message}")]
	BadString {
		/// Field being encoded
		field: &'static str,
		/// Declared field width in bytes
		width: usize,
		/// What is wrong with the string
		message: String,
	},

	/// A value does not fit the declared field width
	#[error("Value {value} does not fit field `{field}` of {width} bytes")]
	ValueOutOfRange {
		/// Field being encoded
		field: &'static str,
		/// Value that overflows the field
		value: u64,
		/// Declared field width in bytes
		width: usize,
	},

	/// A record is missing a field required by the descriptor table
	#[error("Field `{field}` is missing from the record")]
	MissingField {
		/// Name of the missing field
		field: &'static str,
	},

	/// A record holds a value of the wrong kind for a field
	#[error("Field `{field}` has an unexpected value type")]
	FieldType {
		/// Name of the mistyped field
		field: &'static str,
	},

	/// A self-verification pass did not reproduce its input
	#[error("Round-trip mismatch in {context}")]
	RoundTripMismatch {
		/// Which verification detected the mismatch
		context: &'static str,
	},

	/// IO error
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Document (de)serialization error
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
