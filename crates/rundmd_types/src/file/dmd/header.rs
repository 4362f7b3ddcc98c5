//! Main image header.
//!
//! The first 512 bytes of an image hold the marker, animation counts, and
//! version tag, followed immediately by the startup picture blob. Several
//! regions of the header are of undetermined purpose; they are carried as
//! opaque bytes and written back verbatim.

use crate::file::DmdError;

use super::constants::{IMAGE_MARKER, MAIN_HEADER_SIZE, STARTUP_PIC_SIZE, VERSION_TAG};
use super::fields::{self, FieldSpec, Record};

/// Main header block layout, in byte order, including the startup picture
/// that trails the 512-byte header proper.
const MAIN_HEADER_FIELDS: &[FieldSpec] = &[
	FieldSpec::ascii("marker", 3),
	FieldSpec::uint("total_animations", 2),
	FieldSpec::bytes("unknown_field1", 16),
	FieldSpec::uint("enabled_animations", 2),
	FieldSpec::bytes("unknown_field2", 472),
	FieldSpec::ascii("version", 4),
	FieldSpec::bytes("unknown_field3", 13),
	FieldSpec::bytes("startup_picture", STARTUP_PIC_SIZE),
];

/// Decoded main header plus startup picture.
///
/// Invariants maintained by [`super::File::finalize`]: `total_animations`
/// matches the number of animations present, and `enabled_animations` is
/// 1 + the number of enabled animations — the base offset of 1 is firmware
/// behavior observed on hardware, not an off-by-one to correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
	/// Number of animations in the image
	pub total_animations: u16,
	/// Header bytes 5..21; purpose undetermined
	pub unknown_field1: Vec<u8>,
	/// 1 + number of enabled animations
	pub enabled_animations: u16,
	/// Header bytes 23..495; purpose undetermined
	pub unknown_field2: Vec<u8>,
	/// 4-character version tag (e.g. `B134`, `J001`)
	pub version: String,
	/// Header bytes 499..512; purpose undetermined
	pub unknown_field3: Vec<u8>,
	/// Raw startup picture blob shown at boot
	pub startup_picture: Vec<u8>,
}

impl ImageHeader {
	/// Total byte size of the header segment including the startup picture.
	pub const SEGMENT_SIZE: usize = MAIN_HEADER_SIZE + STARTUP_PIC_SIZE;

	/// Creates a zeroed header with the current version tag.
	pub fn new() -> Self {
		Self {
			total_animations: 0,
			unknown_field1: vec![0; 16],
			enabled_animations: 0,
			unknown_field2: vec![0; 472],
			version: VERSION_TAG.to_string(),
			unknown_field3: vec![0; 13],
			startup_picture: vec![0; STARTUP_PIC_SIZE],
		}
	}

	/// Parses the header segment from the start of `data`.
	///
	/// # Errors
	///
	/// Returns [`DmdError::MarkerMismatch`] if the file does not start with
	/// the image marker, or [`DmdError::InsufficientData`] if the segment is
	/// truncated.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DmdError> {
		let record = fields::extract(MAIN_HEADER_FIELDS, data)?;
		let marker = record.text("marker")?;
		if marker != IMAGE_MARKER {
			return Err(DmdError::MarkerMismatch {
				expected: IMAGE_MARKER,
				found: marker.to_string(),
			});
		}

		Ok(Self {
			total_animations: record.uint("total_animations")? as u16,
			unknown_field1: record.bytes("unknown_field1")?.to_vec(),
			enabled_animations: record.uint("enabled_animations")? as u16,
			unknown_field2: record.bytes("unknown_field2")?.to_vec(),
			version: record.text("version")?.to_string(),
			unknown_field3: record.bytes("unknown_field3")?.to_vec(),
			startup_picture: record.bytes("startup_picture")?.to_vec(),
		})
	}

	/// Serializes the header segment, marker included.
	///
	/// # Errors
	///
	/// Returns an error if a field does not fit its declared width, for
	/// example an opaque block of the wrong length.
	pub fn to_bytes(&self) -> Result<Vec<u8>, DmdError> {
		let mut record = Record::new();
		record.set_text("marker", IMAGE_MARKER);
		record.set_uint("total_animations", u64::from(self.total_animations));
		record.set_bytes("unknown_field1", self.unknown_field1.clone());
		record.set_uint("enabled_animations", u64::from(self.enabled_animations));
		record.set_bytes("unknown_field2", self.unknown_field2.clone());
		record.set_text("version", self.version.as_str());
		record.set_bytes("unknown_field3", self.unknown_field3.clone());
		record.set_bytes("startup_picture", self.startup_picture.clone());
		fields::pack(MAIN_HEADER_FIELDS, &record)
	}
}

impl Default for ImageHeader {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for ImageHeader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"RunDMD header (version {}, {} animations, {} enabled)",
			self.version, self.total_animations, self.enabled_animations
		)
	}
}
