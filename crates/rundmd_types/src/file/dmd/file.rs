//! RunDMD image file structure and I/O operations.
//!
//! This module defines the main `File` struct representing a complete image:
//! the main header, the startup picture, and every animation grouped by
//! title. See the module docs of [`super`] for the on-disk layout.

use std::collections::BTreeMap;
use std::io::Read;

use log::{debug, info};

use crate::file::DmdError;

use super::animation::Animation;
use super::constants::{BLOCK_SIZE, HEADER_TO_FRAME_DATA_PADDING, VERSION_TAG};
use super::doc::{AnimationDoc, HeaderDoc};
use super::header::ImageHeader;
use super::known_issues::KnownIssues;

/// A complete RunDMD image: main header plus animations grouped by title.
///
/// Groups are keyed by the animation title (the name with its `_NNN` suffix
/// stripped) and serialized in lexicographic title order; animations within
/// a group keep their insertion order.
///
/// # Examples
///
/// ## Loading an image
///
/// ```no_run
/// use rundmd_types::file::dmd::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let image = File::open("B134.img")?;
/// println!("{}", image.header());
/// for (title, group) in image.animations() {
///     println!("{title}: {} animations", group.len());
/// }
/// # Ok(())
/// # }
/// ```
///
/// ## Building an image
///
/// ```
/// use rundmd_types::file::dmd::{Animation, Bitmap, File, Frame};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut image = File::new();
///
/// let mut animation = Animation::new("TEST_GAME_001");
/// animation.frames.push(Frame {
///     duration_ms: 100,
///     bitmap: Bitmap::transparent(),
/// });
/// image.add_animation(animation);
///
/// image.finalize(true)?;
/// let bytes = image.to_bytes()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
	/// Main header and startup picture
	header: ImageHeader,

	/// Animations grouped by title, in title order
	animations: BTreeMap<String, Vec<Animation>>,
}

impl File {
	/// Creates a new empty image.
	pub fn new() -> Self {
		Self {
			header: ImageHeader::new(),
			animations: BTreeMap::new(),
		}
	}

	/// Opens an image from the given path using the builtin known-issues
	/// registry.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or is not a valid image.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, DmdError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Opens an image with a caller-provided known-issues registry.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or is not a valid image.
	pub fn open_with_registry(
		path: impl AsRef<std::path::Path>,
		registry: &KnownIssues,
	) -> Result<Self, DmdError> {
		let data = std::fs::read(path)?;
		Self::from_bytes_with_registry(&data, registry)
	}

	/// Parses an image from bytes using the builtin known-issues registry.
	///
	/// # Errors
	///
	/// Returns an error if the data is not a valid image.
	pub fn from_bytes(data: &[u8]) -> Result<Self, DmdError> {
		Self::from_bytes_with_registry(data, &KnownIssues::builtin())
	}

	/// Parses an image from bytes.
	///
	/// The main header is read first and its marker validated; each declared
	/// animation header block is then read in order and its frame region
	/// resolved through the stored frame-table address. Animations are
	/// grouped by derived title as they load.
	///
	/// # Errors
	///
	/// Returns an error if the marker is wrong, the data is truncated, or
	/// any animation fails to load.
	pub fn from_bytes_with_registry(
		data: &[u8],
		registry: &KnownIssues,
	) -> Result<Self, DmdError> {
		let header = ImageHeader::from_bytes(data)?;
		debug!("loading image: {header}");

		let mut animations: BTreeMap<String, Vec<Animation>> = BTreeMap::new();
		let mut offset = ImageHeader::SEGMENT_SIZE;
		for _ in 0..header.total_animations {
			let end = offset + BLOCK_SIZE;
			if data.len() < end {
				return Err(DmdError::InsufficientData {
					expected: end,
					actual: data.len(),
				});
			}
			let animation =
				Animation::from_binary(&data[offset..end], data, &header.version, registry)?;
			offset = end;
			animations.entry(animation.title().to_string()).or_default().push(animation);
		}

		Ok(Self {
			header,
			animations,
		})
	}

	/// Parses an image from a reader.
	///
	/// # Errors
	///
	/// Returns an error if reading fails or the data is not a valid image.
	pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, DmdError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	/// Returns the main header.
	pub fn header(&self) -> &ImageHeader {
		&self.header
	}

	/// Returns a mutable reference to the main header.
	pub fn header_mut(&mut self) -> &mut ImageHeader {
		&mut self.header
	}

	/// Returns the animations grouped by title, in title order.
	pub fn animations(&self) -> &BTreeMap<String, Vec<Animation>> {
		&self.animations
	}

	/// Total number of animations across all groups.
	pub fn animation_count(&self) -> usize {
		self.animations.values().map(Vec::len).sum()
	}

	/// Adds an animation to the group its title derives.
	pub fn add_animation(&mut self, animation: Animation) {
		self.animations.entry(animation.title().to_string()).or_default().push(animation);
	}

	/// Applies a header document: fields present in the document replace the
	/// current header values, everything else is left alone.
	///
	/// # Errors
	///
	/// Returns an error if the document is not valid JSON.
	pub fn load_header_document(&mut self, json: &str) -> Result<(), DmdError> {
		let doc: HeaderDoc = serde_json::from_str(json)?;
		self.header.apply_document(&doc);
		Ok(())
	}

	/// Parses an animation document and adds the animation to its group.
	///
	/// `name` overrides the document's animation name when given.
	///
	/// # Errors
	///
	/// Returns an error if the document is not valid JSON or a bitmap row is
	/// malformed.
	pub fn load_animation_document(
		&mut self,
		json: &str,
		name: Option<&str>,
	) -> Result<(), DmdError> {
		let doc: AnimationDoc = serde_json::from_str(json)?;
		let animation = Animation::from_document(doc, name)?;
		self.add_animation(animation);
		Ok(())
	}

	/// Returns the main header as a document.
	pub fn header_document(&self) -> HeaderDoc {
		self.header.document()
	}

	/// Iterates all animations as `(title, document)` pairs, sorted by
	/// title, then insertion order.
	pub fn animation_documents(&self) -> impl Iterator<Item = (&str, AnimationDoc)> + '_ {
		self.animations
			.iter()
			.flat_map(|(title, group)| {
				group.iter().map(move |animation| (title.as_str(), animation.to_document()))
			})
	}

	/// Computes the final on-disk layout before writing.
	///
	/// In title-sorted, then insertion order, every animation gets its
	/// global sequence id (from 1), its frame-table address, and its bitmap
	/// and frame counts; the main header gets the animation counts and the
	/// current version tag. The enabled count is seeded at 1, matching the
	/// firmware's observed base offset. With `enable_all` every animation's
	/// enable flag is set.
	///
	/// # Errors
	///
	/// Returns an error if an animation cannot be serialized or a count
	/// overflows its header field.
	pub fn finalize(&mut self, enable_all: bool) -> Result<(), DmdError> {
		let total = self.animation_count();
		let total = u16::try_from(total).map_err(|_| DmdError::ValueOutOfRange {
			field: "total_animations",
			value: total as u64,
			width: 2,
		})?;

		let mut offset = ImageHeader::SEGMENT_SIZE
			+ usize::from(total) * BLOCK_SIZE
			+ HEADER_TO_FRAME_DATA_PADDING;
		let mut enabled_count: u16 = 1;
		let mut global_id: u16 = 1;

		for group in self.animations.values_mut() {
			for animation in group {
				let blob = animation.build_frames()?;
				animation.header.global_id = global_id;
				animation.header.total_frames = animation.frames.len() as u8;
				animation.header.frames_addr = offset as u32;
				animation.header.num_bitmaps = blob.num_bitmaps();
				if enable_all {
					animation.header.enabled = true;
				}
				if animation.header.enabled {
					enabled_count += 1;
				}

				debug!(
					"finalized {} at 0x{:08x} ({} bytes)",
					animation.header.name,
					offset,
					blob.len()
				);
				offset += blob.len();
				global_id += 1;
			}
		}

		self.header.total_animations = total;
		self.header.enabled_animations = enabled_count;
		self.header.version = VERSION_TAG.to_string();
		Ok(())
	}

	/// Serializes the image.
	///
	/// Layout: main header and startup picture, all animation header blocks
	/// in title-sorted order, the fixed padding region, then every
	/// animation's frame region in the same order. [`File::finalize`] must
	/// have run for the stored addresses to be consistent.
	///
	/// # Errors
	///
	/// Returns an error if any record fails to serialize.
	pub fn to_bytes(&self) -> Result<Vec<u8>, DmdError> {
		self.to_bytes_with_min_size(0)
	}

	/// Serializes the image, zero-padding the result to at least `min_size`
	/// bytes.
	///
	/// # Errors
	///
	/// Returns an error if any record fails to serialize.
	pub fn to_bytes_with_min_size(&self, min_size: usize) -> Result<Vec<u8>, DmdError> {
		let mut header_blocks = Vec::with_capacity(self.animation_count());
		let mut blobs = Vec::with_capacity(self.animation_count());
		for group in self.animations.values() {
			for animation in group {
				let blob = animation.build_frames()?;
				header_blocks.push(animation.build_header_block(&blob)?);
				blobs.push(blob);
			}
		}

		let mut out = self.header.to_bytes()?;
		for block in &header_blocks {
			out.extend_from_slice(block);
		}
		out.resize(out.len() + HEADER_TO_FRAME_DATA_PADDING, 0);
		for blob in &blobs {
			out.extend_from_slice(blob.bytes());
		}
		if out.len() < min_size {
			out.resize(min_size, 0);
		}

		info!("serialized image: {} bytes, {} animations", out.len(), self.animation_count());
		Ok(out)
	}

	/// Saves the image to the given path.
	///
	/// # Errors
	///
	/// Returns an error if serialization or writing fails.
	pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), DmdError> {
		std::fs::write(path, self.to_bytes()?)?;
		Ok(())
	}

	/// Saves the image, zero-padding the file to at least `min_size` bytes.
	///
	/// # Errors
	///
	/// Returns an error if serialization or writing fails.
	pub fn save_with_min_size(
		&self,
		path: impl AsRef<std::path::Path>,
		min_size: usize,
	) -> Result<(), DmdError> {
		std::fs::write(path, self.to_bytes_with_min_size(min_size)?)?;
		Ok(())
	}
}

impl std::fmt::Display for File {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"RunDMD image ({} groups, {} animations)",
			self.animations.len(),
			self.animation_count()
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::dmd::constants::BITMAP_SIZE;
	use crate::file::dmd::{Bitmap, Frame};

	fn animation_with_frames(name: &str, fills: &[u8]) -> Animation {
		let mut animation = Animation::new(name);
		animation.frames = fills
			.iter()
			.map(|&fill| Frame {
				duration_ms: 100,
				bitmap: Bitmap::from_packed(&[fill; BITMAP_SIZE]).unwrap(),
			})
			.collect();
		animation
	}

	#[test]
	fn test_finalize_assigns_monotonic_addresses() {
		let mut image = File::new();
		// Insertion order deliberately differs from title order
		image.add_animation(animation_with_frames("ZEBRA_001", &[1, 2]));
		image.add_animation(animation_with_frames("APPLE_001", &[1, 2, 3]));
		image.add_animation(animation_with_frames("APPLE_002", &[1]));
		image.finalize(false).unwrap();

		let apple = &image.animations()["APPLE"];
		let zebra = &image.animations()["ZEBRA"];

		let base = ImageHeader::SEGMENT_SIZE + 3 * BLOCK_SIZE + HEADER_TO_FRAME_DATA_PADDING;
		assert_eq!(apple[0].header.frames_addr as usize, base);
		assert_eq!(
			apple[1].header.frames_addr as usize,
			base + BLOCK_SIZE + 3 * BITMAP_SIZE
		);
		assert_eq!(
			zebra[0].header.frames_addr as usize,
			base + 2 * BLOCK_SIZE + 4 * BITMAP_SIZE
		);

		// Every address stays block-aligned
		for group in image.animations().values() {
			for animation in group {
				assert_eq!(animation.header.frames_addr as usize % BLOCK_SIZE, 0);
			}
		}

		// Global ids follow title-sorted order, starting at 1
		assert_eq!(apple[0].header.global_id, 1);
		assert_eq!(apple[1].header.global_id, 2);
		assert_eq!(zebra[0].header.global_id, 3);
	}

	#[test]
	fn test_finalize_counts_carry_firmware_base_offset() {
		let mut image = File::new();
		let mut enabled = animation_with_frames("GAME_001", &[1]);
		enabled.header.enabled = true;
		image.add_animation(enabled);
		image.add_animation(animation_with_frames("GAME_002", &[1]));
		image.finalize(false).unwrap();

		assert_eq!(image.header().total_animations, 2);
		// One enabled animation, plus the firmware's base offset of 1
		assert_eq!(image.header().enabled_animations, 2);
		assert_eq!(image.header().version, VERSION_TAG);

		image.finalize(true).unwrap();
		assert_eq!(image.header().enabled_animations, 3);
	}

	#[test]
	fn test_image_roundtrip() {
		let mut image = File::new();
		let mut first = animation_with_frames("PINBOT_001", &[1, 2, 3]);
		first.header.clock_type = crate::file::dmd::ClockType::ClockOnTop;
		first.header.clock_start_frame = 1;
		first.header.clock_end_frame = 2;
		image.add_animation(first);
		image.add_animation(animation_with_frames("PINBOT_002", &[4, 4, 5]));
		image.add_animation(animation_with_frames("TAXI_001", &[6]));
		image.finalize(true).unwrap();

		let bytes = image.to_bytes().unwrap();
		let reloaded = File::from_bytes(&bytes).unwrap();

		assert_eq!(reloaded, image);
	}

	#[test]
	fn test_serialized_layout_positions() {
		let mut image = File::new();
		image.add_animation(animation_with_frames("SOLO_001", &[9]));
		image.finalize(false).unwrap();

		let bytes = image.to_bytes().unwrap();
		let header_end = ImageHeader::SEGMENT_SIZE;
		// One animation header block follows the main segment
		let name_offset = header_end + 20;
		assert_eq!(&bytes[name_offset..name_offset + 8], b"SOLO_001");

		// The frame region sits past the padding, at the stored address
		let frames_addr = image.animations()["SOLO"][0].header.frames_addr as usize;
		assert_eq!(frames_addr, header_end + BLOCK_SIZE + HEADER_TO_FRAME_DATA_PADDING);
		assert_eq!(bytes[frames_addr], 1); // first table entry references bitmap 1
		assert_eq!(bytes.len(), frames_addr + BLOCK_SIZE + BITMAP_SIZE);
	}

	#[test]
	fn test_min_size_padding() {
		let mut image = File::new();
		image.add_animation(animation_with_frames("PAD_001", &[1]));
		image.finalize(false).unwrap();

		let natural = image.to_bytes().unwrap().len();
		let padded = image.to_bytes_with_min_size(natural + 4096).unwrap();
		assert_eq!(padded.len(), natural + 4096);
		assert!(padded[natural..].iter().all(|&b| b == 0));
	}

	#[test]
	fn test_from_bytes_rejects_wrong_marker() {
		let mut bytes = vec![0u8; ImageHeader::SEGMENT_SIZE];
		bytes[..3].copy_from_slice(b"ABC");
		let err = File::from_bytes(&bytes).unwrap_err();
		assert!(matches!(err, DmdError::MarkerMismatch { .. }));
	}

	#[test]
	fn test_truncated_animation_header_fails() {
		let mut image = File::new();
		image.add_animation(animation_with_frames("CUT_001", &[1]));
		image.finalize(false).unwrap();
		let bytes = image.to_bytes().unwrap();

		// Chop the file off inside the animation header block
		let err = File::from_bytes(&bytes[..ImageHeader::SEGMENT_SIZE + 10]).unwrap_err();
		assert!(matches!(err, DmdError::InsufficientData { .. }));
	}
}
