//! Declarative field codec for fixed-layout binary records.
//!
//! Every record in the RunDMD format (main header, animation header, frame
//! table entry) is described by a constant, ordered table of [`FieldSpec`]
//! entries. The same table drives both [`extract`] and [`pack`], so width and
//! offset bookkeeping exists in exactly one place and a record is guaranteed
//! to serialize to the byte layout it was parsed from.
//!
//! All integers are big-endian. Fixed-width ASCII strings are zero-padded on
//! the right; flag sets render as their active names joined by `" | "`;
//! enumerations map raw values to a closed set of names; granular values are
//! scaled by a fixed unit (used for block-aligned addresses); durations go
//! through the quantizer in [`super::duration`].

use std::collections::HashMap;

use crate::file::DmdError;

use super::duration;

/// Semantic type of a single field, including any lookup tables it needs.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
	/// Big-endian unsigned integer (width 1 to 8 bytes)
	Uint,
	/// Fixed-width ASCII string, right-padded with zero bytes
	Ascii,
	/// Opaque byte block, preserved verbatim
	Bytes,
	/// One byte of named bit flags, given as `(name, bit_position)` pairs
	Flags(&'static [(&'static str, u8)]),
	/// Integer mapped to a closed set of names, given as `(name, value)` pairs
	Enum(&'static [(&'static str, u64)]),
	/// Integer stored divided by a fixed unit (multiplied back on extract)
	Granular(u64),
	/// One byte holding a quantized millisecond duration
	Duration,
}

/// A single field in a binary record: name, width in bytes, and semantics.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
	/// Field name used as the record key
	pub name: &'static str,
	/// Field width in bytes
	pub width: usize,
	/// How the raw bytes are interpreted
	pub kind: FieldKind,
}

impl FieldSpec {
	/// Declares a big-endian unsigned integer field.
	pub const fn uint(name: &'static str, width: usize) -> Self {
		Self {
			name,
			width,
			kind: FieldKind::Uint,
		}
	}

	/// Declares a fixed-width ASCII string field.
	pub const fn ascii(name: &'static str, width: usize) -> Self {
		Self {
			name,
			width,
			kind: FieldKind::Ascii,
		}
	}

	/// Declares an opaque byte block field.
	pub const fn bytes(name: &'static str, width: usize) -> Self {
		Self {
			name,
			width,
			kind: FieldKind::Bytes,
		}
	}

	/// Declares a one-byte flag set field.
	pub const fn flags(name: &'static str, bits: &'static [(&'static str, u8)]) -> Self {
		Self {
			name,
			width: 1,
			kind: FieldKind::Flags(bits),
		}
	}

	/// Declares an enumeration field over a closed set of named values.
	pub const fn enumeration(
		name: &'static str,
		width: usize,
		values: &'static [(&'static str, u64)],
	) -> Self {
		Self {
			name,
			width,
			kind: FieldKind::Enum(values),
		}
	}

	/// Declares an integer field stored in units of `unit` bytes.
	pub const fn granular(name: &'static str, width: usize, unit: u64) -> Self {
		Self {
			name,
			width,
			kind: FieldKind::Granular(unit),
		}
	}

	/// Declares a one-byte quantized duration field.
	pub const fn duration(name: &'static str) -> Self {
		Self {
			name,
			width: 1,
			kind: FieldKind::Duration,
		}
	}
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
	/// Integer-valued field (uint, granular, duration)
	Uint(u64),
	/// Text-valued field (ASCII string, flag set, enumeration name)
	Text(String),
	/// Opaque byte block
	Bytes(Vec<u8>),
}

/// Name-to-value mapping produced by [`extract`] and consumed by [`pack`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
	values: HashMap<&'static str, FieldValue>,
}

impl Record {
	/// Creates an empty record.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets an integer field.
	pub fn set_uint(&mut self, name: &'static str, value: u64) {
		self.values.insert(name, FieldValue::Uint(value));
	}

	/// Sets a text field.
	pub fn set_text(&mut self, name: &'static str, value: impl Into<String>) {
		self.values.insert(name, FieldValue::Text(value.into()));
	}

	/// Sets an opaque byte block field.
	pub fn set_bytes(&mut self, name: &'static str, value: Vec<u8>) {
		self.values.insert(name, FieldValue::Bytes(value));
	}

	/// Returns an integer field.
	///
	/// # Errors
	///
	/// Returns an error if the field is missing or not integer-valued.
	pub fn uint(&self, name: &'static str) -> Result<u64, DmdError> {
		match self.get(name)? {
			FieldValue::Uint(value) => Ok(*value),
			_ => Err(DmdError::FieldType {
				field: name,
			}),
		}
	}

	/// Returns a text field.
	///
	/// # Errors
	///
	/// Returns an error if the field is missing or not text-valued.
	pub fn text(&self, name: &'static str) -> Result<&str, DmdError> {
		match self.get(name)? {
			FieldValue::Text(value) => Ok(value),
			_ => Err(DmdError::FieldType {
				field: name,
			}),
		}
	}

	/// Returns an opaque byte block field.
	///
	/// # Errors
	///
	/// Returns an error if the field is missing or not byte-valued.
	pub fn bytes(&self, name: &'static str) -> Result<&[u8], DmdError> {
		match self.get(name)? {
			FieldValue::Bytes(value) => Ok(value),
			_ => Err(DmdError::FieldType {
				field: name,
			}),
		}
	}

	fn get(&self, name: &'static str) -> Result<&FieldValue, DmdError> {
		self.values.get(name).ok_or(DmdError::MissingField {
			field: name,
		})
	}
}

/// Sum of declared field widths: the exact byte size of the packed record.
pub fn total_width(specs: &[FieldSpec]) -> usize {
	specs.iter().map(|spec| spec.width).sum()
}

/// Extracts a [`Record`] from the front of `data` according to `specs`.
///
/// Exactly [`total_width`] bytes are consumed, in declared field order.
///
/// # Errors
///
/// Returns an error if `data` is shorter than the summed field widths, if an
/// ASCII field holds non-ASCII bytes, or if an enumeration field holds a
/// value outside its closed set.
pub fn extract(specs: &[FieldSpec], data: &[u8]) -> Result<Record, DmdError> {
	let needed = total_width(specs);
	if data.len() < needed {
		return Err(DmdError::InsufficientData {
			expected: needed,
			actual: data.len(),
		});
	}

	let mut record = Record::new();
	let mut offset = 0;
	for spec in specs {
		let raw = &data[offset..offset + spec.width];
		match spec.kind {
			FieldKind::Uint => {
				record.set_uint(spec.name, be_uint(raw));
			}
			FieldKind::Ascii => {
				let trimmed = strip_trailing_zeros(raw);
				if !trimmed.is_ascii() {
					return Err(DmdError::BadString {
						field: spec.name,
						width: spec.width,
						message: "field holds non-ASCII bytes".to_string(),
					});
				}
				// Safe after the ASCII check above
				let text = String::from_utf8_lossy(trimmed).into_owned();
				record.set_text(spec.name, text);
			}
			FieldKind::Bytes => {
				record.set_bytes(spec.name, raw.to_vec());
			}
			FieldKind::Flags(bits) => {
				let value = raw[0];
				let names: Vec<&str> = bits
					.iter()
					.filter(|&&(_, bit)| value & (1 << bit) != 0)
					.map(|&(name, _)| name)
					.collect();
				record.set_text(spec.name, names.join(" | "));
			}
			FieldKind::Enum(values) => {
				let value = be_uint(raw);
				let name = values
					.iter()
					.find(|&&(_, v)| v == value)
					.map(|&(name, _)| name)
					.ok_or(DmdError::UnknownEnumValue {
						field: spec.name,
						value,
					})?;
				record.set_text(spec.name, name);
			}
			FieldKind::Granular(unit) => {
				record.set_uint(spec.name, be_uint(raw) * unit);
			}
			FieldKind::Duration => {
				record.set_uint(spec.name, u64::from(duration::decode(raw[0])));
			}
		}
		offset += spec.width;
	}

	Ok(record)
}

/// Packs a [`Record`] into a buffer of exactly [`total_width`] bytes.
///
/// # Errors
///
/// Returns an error if a field is missing from the record, a value does not
/// fit its declared width, or a name falls outside a flag or enumeration
/// table.
pub fn pack(specs: &[FieldSpec], record: &Record) -> Result<Vec<u8>, DmdError> {
	let mut out = Vec::with_capacity(total_width(specs));
	for spec in specs {
		match spec.kind {
			FieldKind::Uint => {
				push_be_uint(&mut out, spec, record.uint(spec.name)?)?;
			}
			FieldKind::Ascii => {
				let text = record.text(spec.name)?;
				if !text.is_ascii() {
					return Err(DmdError::BadString {
						field: spec.name,
						width: spec.width,
						message: "string is not ASCII".to_string(),
					});
				}
				if text.len() > spec.width {
					return Err(DmdError::BadString {
						field: spec.name,
						width: spec.width,
						message: format!("string is {} bytes long", text.len()),
					});
				}
				out.extend_from_slice(text.as_bytes());
				out.resize(out.len() + spec.width - text.len(), 0);
			}
			FieldKind::Bytes => {
				let bytes = record.bytes(spec.name)?;
				if bytes.len() != spec.width {
					return Err(DmdError::InsufficientData {
						expected: spec.width,
						actual: bytes.len(),
					});
				}
				out.extend_from_slice(bytes);
			}
			FieldKind::Flags(bits) => {
				let text = record.text(spec.name)?;
				let mut value = 0u8;
				for name in text.split('|').map(str::trim).filter(|name| !name.is_empty()) {
					let bit = bits
						.iter()
						.find(|&&(n, _)| n == name)
						.map(|&(_, bit)| bit)
						.ok_or_else(|| DmdError::UnknownFlagName {
							field: spec.name,
							name: name.to_string(),
						})?;
					value |= 1 << bit;
				}
				out.push(value);
			}
			FieldKind::Enum(values) => {
				let name = record.text(spec.name)?;
				let value = values
					.iter()
					.find(|&&(n, _)| n == name)
					.map(|&(_, v)| v)
					.ok_or_else(|| DmdError::UnknownEnumName {
						field: spec.name,
						name: name.to_string(),
					})?;
				push_be_uint(&mut out, spec, value)?;
			}
			FieldKind::Granular(unit) => {
				push_be_uint(&mut out, spec, record.uint(spec.name)? / unit)?;
			}
			FieldKind::Duration => {
				let ms = record.uint(spec.name)?;
				let ms = u32::try_from(ms).unwrap_or(u32::MAX);
				out.push(duration::encode(ms));
			}
		}
	}

	Ok(out)
}

fn be_uint(raw: &[u8]) -> u64 {
	debug_assert!(raw.len() <= 8, "integer fields are at most 8 bytes wide");
	raw.iter().fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte))
}

fn push_be_uint(out: &mut Vec<u8>, spec: &FieldSpec, value: u64) -> Result<(), DmdError> {
	if spec.width < 8 && value >> (spec.width * 8) != 0 {
		return Err(DmdError::ValueOutOfRange {
			field: spec.name,
			value,
			width: spec.width,
		});
	}
	out.extend_from_slice(&value.to_be_bytes()[8 - spec.width..]);
	Ok(())
}

fn strip_trailing_zeros(raw: &[u8]) -> &[u8] {
	let end = raw.iter().rposition(|&byte| byte != 0).map_or(0, |pos| pos + 1);
	&raw[..end]
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_FLAGS: &[(&str, u8)] = &[("Alpha", 0), ("Beta", 3)];
	const TEST_ENUM: &[(&str, u64)] = &[("Off", 0), ("On", 1)];
	const TEST_SPECS: &[FieldSpec] = &[
		FieldSpec::uint("count", 2),
		FieldSpec::ascii("tag", 4),
		FieldSpec::flags("mode", TEST_FLAGS),
		FieldSpec::enumeration("state", 1, TEST_ENUM),
		FieldSpec::granular("addr", 2, 512),
		FieldSpec::bytes("blob", 3),
	];

	#[test]
	fn test_extract_consumes_declared_widths() {
		let data = [
			0x01, 0x02, // count
			b'A', b'B', 0, 0, // tag
			0b0000_1001, // mode: Alpha | Beta
			0x01, // state: On
			0x00, 0x03, // addr: 3 blocks
			0xDE, 0xAD, 0xBE, // blob
			0xFF, // trailing byte must be ignored
		];
		let record = extract(TEST_SPECS, &data).unwrap();
		assert_eq!(record.uint("count").unwrap(), 0x0102);
		assert_eq!(record.text("tag").unwrap(), "AB");
		assert_eq!(record.text("mode").unwrap(), "Alpha | Beta");
		assert_eq!(record.text("state").unwrap(), "On");
		assert_eq!(record.uint("addr").unwrap(), 3 * 512);
		assert_eq!(record.bytes("blob").unwrap(), &[0xDE, 0xAD, 0xBE]);
	}

	#[test]
	fn test_pack_reverses_extract() {
		let data = [
			0x01, 0x02, b'A', b'B', 0, 0, 0b0000_1001, 0x01, 0x00, 0x03, 0xDE, 0xAD, 0xBE,
		];
		let record = extract(TEST_SPECS, &data).unwrap();
		let packed = pack(TEST_SPECS, &record).unwrap();
		assert_eq!(packed, data);
	}

	#[test]
	fn test_empty_flag_set_renders_empty() {
		let specs = [FieldSpec::flags("mode", TEST_FLAGS)];
		let record = extract(&specs, &[0]).unwrap();
		assert_eq!(record.text("mode").unwrap(), "");
		assert_eq!(pack(&specs, &record).unwrap(), vec![0]);
	}

	#[test]
	fn test_unknown_enum_value_fails() {
		let specs = [FieldSpec::enumeration("state", 1, TEST_ENUM)];
		let err = extract(&specs, &[7]).unwrap_err();
		assert!(matches!(err, DmdError::UnknownEnumValue { field: "state", value: 7 }));
	}

	#[test]
	fn test_unknown_flag_name_fails() {
		let specs = [FieldSpec::flags("mode", TEST_FLAGS)];
		let mut record = Record::new();
		record.set_text("mode", "Alpha | Gamma");
		let err = pack(&specs, &record).unwrap_err();
		assert!(matches!(err, DmdError::UnknownFlagName { field: "mode", .. }));
	}

	#[test]
	fn test_truncated_input_fails() {
		let err = extract(TEST_SPECS, &[0x01]).unwrap_err();
		assert!(matches!(
			err,
			DmdError::InsufficientData {
				expected: 13,
				actual: 1
			}
		));
	}

	#[test]
	fn test_uint_overflow_fails() {
		let specs = [FieldSpec::uint("count", 1)];
		let mut record = Record::new();
		record.set_uint("count", 256);
		let err = pack(&specs, &record).unwrap_err();
		assert!(matches!(err, DmdError::ValueOutOfRange { field: "count", .. }));
	}

	#[test]
	fn test_ascii_too_long_fails() {
		let specs = [FieldSpec::ascii("tag", 2)];
		let mut record = Record::new();
		record.set_text("tag", "ABC");
		let err = pack(&specs, &record).unwrap_err();
		assert!(matches!(err, DmdError::BadString { field: "tag", width: 2, .. }));
	}

	#[test]
	fn test_granular_division_truncates() {
		let specs = [FieldSpec::granular("addr", 2, 512)];
		let mut record = Record::new();
		record.set_uint("addr", 1000);
		// 1000 / 512 truncates to 1 block
		assert_eq!(pack(&specs, &record).unwrap(), vec![0x00, 0x01]);
	}
}
