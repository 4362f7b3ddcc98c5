//! Fixed-size pixel grids for animation frames.
//!
//! A bitmap is a 128×32 grid of 4-bit grayscale values, packed two pixels
//! per byte with the left pixel in the high nibble. Bitmaps compare and hash
//! by content so that frames with identical pixels can share one stored copy.

use std::fmt::Write as _;

use crate::file::DmdError;

use super::constants::{BITMAP_HEIGHT, BITMAP_SIZE, BITMAP_WIDTH, TRANSPARENT_NIBBLE};

/// A 128×32 grid of 4-bit grayscale pixels, packed two per byte.
///
/// The document representation is 32 rows of 128 lowercase hex characters,
/// each wrapped in `|` delimiters:
///
/// ```text
/// |00000000...f|
/// ```
///
/// # Examples
///
/// ```
/// use rundmd_types::file::dmd::Bitmap;
///
/// let bitmap = Bitmap::from_packed(&[0x5A; 2048]).unwrap();
/// assert_eq!(bitmap.pixel(0, 0), 0x5);
/// assert_eq!(bitmap.pixel(1, 0), 0xA);
///
/// let rows = bitmap.to_rows();
/// assert_eq!(rows.len(), 32);
/// assert_eq!(Bitmap::from_rows(&rows).unwrap(), bitmap);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap(Box<[u8; BITMAP_SIZE]>);

impl Bitmap {
	/// Creates a bitmap from packed nibble bytes.
	///
	/// # Errors
	///
	/// Returns an error if `data` is not exactly [`BITMAP_SIZE`] bytes.
	pub fn from_packed(data: &[u8]) -> Result<Self, DmdError> {
		let packed: [u8; BITMAP_SIZE] =
			data.try_into().map_err(|_| DmdError::InsufficientData {
				expected: BITMAP_SIZE,
				actual: data.len(),
			})?;
		Ok(Self(Box::new(packed)))
	}

	/// Creates the synthetic fully-transparent bitmap.
	///
	/// Frame table entries with bitmap number 0 do not reference stored pixel
	/// data; they resolve to this grid, every nibble set to the transparency
	/// marker.
	pub fn transparent() -> Self {
		let byte = (TRANSPARENT_NIBBLE << 4) | TRANSPARENT_NIBBLE;
		Self(Box::new([byte; BITMAP_SIZE]))
	}

	/// Returns the packed nibble bytes.
	pub fn packed(&self) -> &[u8; BITMAP_SIZE] {
		&self.0
	}

	/// Returns the 4-bit value of the pixel at `(x, y)`.
	///
	/// # Panics
	///
	/// Panics if `x` or `y` is outside the 128×32 grid.
	pub fn pixel(&self, x: usize, y: usize) -> u8 {
		assert!(x < BITMAP_WIDTH && y < BITMAP_HEIGHT, "pixel out of bounds");
		let byte = self.0[(y * BITMAP_WIDTH + x) / 2];
		if x % 2 == 0 { byte >> 4 } else { byte & 0x0F }
	}

	/// Renders the bitmap as 32 pipe-delimited rows of 128 hex characters.
	pub fn to_rows(&self) -> Vec<String> {
		let row_bytes = BITMAP_WIDTH / 2;
		self.0
			.chunks_exact(row_bytes)
			.map(|row| {
				let mut text = String::with_capacity(BITMAP_WIDTH + 2);
				text.push('|');
				for &byte in row {
					// Writing to a String cannot fail
					let _ = write!(text, "{byte:02x}");
				}
				text.push('|');
				text
			})
			.collect()
	}

	/// Parses a bitmap from its pipe-delimited hex row representation.
	///
	/// # Errors
	///
	/// Returns [`DmdError::MalformedFrameRow`] if the row count is wrong, a
	/// row is missing its `|` delimiters, has the wrong length, or contains a
	/// non-hex character.
	pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, DmdError> {
		if rows.len() != BITMAP_HEIGHT {
			return Err(DmdError::MalformedFrameRow {
				row: rows.len(),
				message: format!("expected {BITMAP_HEIGHT} rows, got {}", rows.len()),
			});
		}

		let mut packed = [0u8; BITMAP_SIZE];
		for (y, row) in rows.iter().enumerate() {
			let row = row.as_ref();
			if !row.starts_with('|') || !row.ends_with('|') || row.len() < 2 {
				return Err(DmdError::MalformedFrameRow {
					row: y,
					message: "row is missing `|` delimiters".to_string(),
				});
			}
			let nibbles = &row[1..row.len() - 1];
			if nibbles.len() != BITMAP_WIDTH {
				return Err(DmdError::MalformedFrameRow {
					row: y,
					message: format!("expected {BITMAP_WIDTH} nibbles, got {}", nibbles.len()),
				});
			}
			for (x, ch) in nibbles.chars().enumerate() {
				let nibble = ch.to_digit(16).ok_or_else(|| DmdError::MalformedFrameRow {
					row: y,
					message: format!("`{ch}` is not a hex digit"),
				})? as u8;
				let index = (y * BITMAP_WIDTH + x) / 2;
				if x % 2 == 0 {
					packed[index] = nibble << 4;
				} else {
					packed[index] |= nibble;
				}
			}
		}

		Ok(Self(Box::new(packed)))
	}
}
