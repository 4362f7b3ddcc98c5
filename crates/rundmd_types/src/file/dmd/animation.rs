//! Animation records: header, frame indirection table, and bitmap store.
//!
//! Each animation occupies one 512-byte header block plus a frame region at
//! the address the header points to. The frame region starts with a 512-byte
//! block whose first `total_frames × 2` bytes form the indirection table —
//! one `(bitmap_number, encoded_duration)` pair per displayed frame — and
//! continues with the deduplicated bitmaps in first-seen order.
//!
//! Bitmap numbers are 1-based. Number 0 is reserved for the synthetic
//! fully-transparent bitmap and is never address-resolved. The clock start
//! and end bytes in the header are stored as bitmap references (assigned
//! bitmap number + 1, with 0 meaning first/last frame) but are exposed in
//! memory as 0-based frame indices.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::file::DmdError;

use super::bitmap::Bitmap;
use super::constants::{BITMAP_SIZE, BLOCK_SIZE};
use super::fields::{self, FieldSpec, Record};
use super::known_issues::KnownIssues;

/// Placement of the clock overlay relative to the animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockType {
	/// No clock is shown during the animation
	#[default]
	NoClock,
	/// The clock is drawn behind the animation
	ClockBehind,
	/// The clock is drawn on top of the animation
	ClockOnTop,
}

/// Whether a screen transition is played around the animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
	/// No transition
	#[default]
	Disable,
	/// Transition enabled
	Enable,
}

/// Size of the clock overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockSize {
	/// Full-height clock
	#[default]
	ClockLarge,
	/// Small clock
	ClockSmall,
}

pub(crate) const CLOCK_TYPE_VALUES: &[(&str, u64)] =
	&[("NoClock", 0), ("ClockBehind", 1), ("ClockOnTop", 2)];
pub(crate) const TRANSITION_VALUES: &[(&str, u64)] = &[("Disable", 0), ("Enable", 1)];
pub(crate) const CLOCK_SIZE_VALUES: &[(&str, u64)] = &[("ClockLarge", 0), ("ClockSmall", 1)];

/// Bit positions of the animation flag byte; only one bit is known.
const ANIMATION_FLAG_BITS: &[(&str, u8)] = &[("Enable", 0)];

/// Animation header block layout, in byte order. The packed fields cover
/// 52 bytes; the rest of the 512-byte block is zero padding.
const ANIMATION_HEADER_FIELDS: &[FieldSpec] = &[
	FieldSpec::uint("global_id", 2),
	FieldSpec::flags("flags", ANIMATION_FLAG_BITS),
	FieldSpec::uint("num_bitmaps", 1),
	FieldSpec::granular("frames_addr", 4, BLOCK_SIZE as u64),
	FieldSpec::uint("total_frames", 1),
	FieldSpec::uint("display_width", 1),
	FieldSpec::uint("display_height", 1),
	FieldSpec::enumeration("clock_type", 1, CLOCK_TYPE_VALUES),
	FieldSpec::enumeration("intro_transition", 1, TRANSITION_VALUES),
	FieldSpec::enumeration("outro_transition", 1, TRANSITION_VALUES),
	FieldSpec::enumeration("clock_size", 1, CLOCK_SIZE_VALUES),
	FieldSpec::uint("clock_position_x", 1),
	FieldSpec::uint("clock_position_y", 1),
	FieldSpec::uint("clock_start", 1),
	FieldSpec::uint("clock_end", 1),
	FieldSpec::bytes("unknown_byte19", 1),
	FieldSpec::ascii("name", 32),
];

/// Frame indirection table entry layout: 2 bytes per displayed frame.
const FRAME_ENTRY_FIELDS: &[FieldSpec] =
	&[FieldSpec::uint("bitmap_num", 1), FieldSpec::duration("duration")];

impl ClockType {
	fn from_name(name: &str) -> Option<Self> {
		match name {
			"NoClock" => Some(Self::NoClock),
			"ClockBehind" => Some(Self::ClockBehind),
			"ClockOnTop" => Some(Self::ClockOnTop),
			_ => None,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Self::NoClock => "NoClock",
			Self::ClockBehind => "ClockBehind",
			Self::ClockOnTop => "ClockOnTop",
		}
	}
}

impl Transition {
	fn from_name(name: &str) -> Option<Self> {
		match name {
			"Disable" => Some(Self::Disable),
			"Enable" => Some(Self::Enable),
			_ => None,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Self::Disable => "Disable",
			Self::Enable => "Enable",
		}
	}
}

impl ClockSize {
	fn from_name(name: &str) -> Option<Self> {
		match name {
			"ClockLarge" => Some(Self::ClockLarge),
			"ClockSmall" => Some(Self::ClockSmall),
			_ => None,
		}
	}

	fn name(self) -> &'static str {
		match self {
			Self::ClockLarge => "ClockLarge",
			Self::ClockSmall => "ClockSmall",
		}
	}
}

/// One displayed frame: a duration and the pixel grid to show.
///
/// Durations are quantized on write (see [`super::duration`]); a duration
/// read back from an image is always an exact bucket multiple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	/// Display duration in milliseconds
	pub duration_ms: u32,
	/// Pixel grid shown for this frame
	pub bitmap: Bitmap,
}

/// Decoded animation header.
///
/// `frames_addr` is an absolute byte offset (the on-disk form is divided by
/// the 512-byte block size). `clock_start_frame` / `clock_end_frame` are
/// 0-based frame indices; the on-disk bitmap references are translated on
/// load and recomputed from the deduplication pass on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationHeader {
	/// Global sequence id, assigned from 1 during finalize
	pub global_id: u16,
	/// Whether the animation is enabled for playback
	pub enabled: bool,
	/// Number of distinct bitmaps stored in the frame region
	pub num_bitmaps: u8,
	/// Absolute byte offset of the frame region (a multiple of 512)
	pub frames_addr: u32,
	/// Number of displayed frames
	pub total_frames: u8,
	/// Display width in pixels
	pub display_width: u8,
	/// Display height in pixels
	pub display_height: u8,
	/// Clock overlay placement
	pub clock_type: ClockType,
	/// Transition into the animation
	pub intro_transition: Transition,
	/// Transition out of the animation
	pub outro_transition: Transition,
	/// Clock overlay size
	pub clock_size: ClockSize,
	/// Clock overlay X position
	pub clock_position_x: u8,
	/// Clock overlay Y position
	pub clock_position_y: u8,
	/// First frame (0-based) on which the clock is shown
	pub clock_start_frame: usize,
	/// Last frame (0-based) on which the clock is shown
	pub clock_end_frame: usize,
	/// Header byte 19; purpose undetermined, round-tripped verbatim
	pub unknown_byte: u8,
	/// Animation name (at most 32 ASCII characters, `TITLE_NNN` convention)
	pub name: String,
}

impl AnimationHeader {
	/// Creates a header with default values for a 128×32 animation.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			global_id: 0,
			enabled: false,
			num_bitmaps: 0,
			frames_addr: 0,
			total_frames: 0,
			display_width: 128,
			display_height: 32,
			clock_type: ClockType::NoClock,
			intro_transition: Transition::Disable,
			outro_transition: Transition::Disable,
			clock_size: ClockSize::ClockLarge,
			clock_position_x: 0,
			clock_position_y: 0,
			clock_start_frame: 0,
			clock_end_frame: 0,
			unknown_byte: 0,
			name: name.into(),
		}
	}
}

/// Serialized frame region of one animation, produced by
/// [`Animation::build_frames`].
///
/// The bitmap store behind it is transient: numbering is assigned in
/// first-seen order on every build and is only stable across builds if the
/// frame order and content are unchanged.
#[derive(Debug, Clone)]
pub struct FrameBlob {
	bytes: Vec<u8>,
	num_bitmaps: u8,
	frame_to_bitmap: Vec<u8>,
}

impl FrameBlob {
	/// The serialized frame region: one 512-byte indirection block followed
	/// by the deduplicated bitmaps.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Total size of the region in bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Returns `true` if the region is empty (it never is).
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Number of distinct bitmaps stored in the region.
	pub fn num_bitmaps(&self) -> u8 {
		self.num_bitmaps
	}

	/// The 1-based bitmap number assigned to a displayed frame.
	pub fn bitmap_for_frame(&self, frame: usize) -> Option<u8> {
		self.frame_to_bitmap.get(frame).copied()
	}
}

/// One animation: a decoded header plus its displayed frames.
///
/// # Examples
///
/// ```
/// use rundmd_types::file::dmd::{Animation, Bitmap, Frame};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut animation = Animation::new("TEST_GAME_001");
/// animation.frames.push(Frame {
///     duration_ms: 100,
///     bitmap: Bitmap::transparent(),
/// });
///
/// assert_eq!(animation.title(), "TEST_GAME");
/// let blob = animation.build_frames()?;
/// assert_eq!(blob.num_bitmaps(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
	/// Animation header
	pub header: AnimationHeader,
	/// Displayed frames, in order
	pub frames: Vec<Frame>,
}

impl Animation {
	/// Creates an empty animation with the given name.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			header: AnimationHeader::new(name),
			frames: Vec::new(),
		}
	}

	/// The animation's group title: the name with its trailing `_NNN`
	/// sequence suffix removed.
	pub fn title(&self) -> &str {
		self.header
			.name
			.rsplit_once('_')
			.map_or(self.header.name.as_str(), |(title, _)| title)
	}

	/// Parses an animation from its 512-byte header block and the image it
	/// lives in.
	///
	/// The frame region is located through the header's frame-table address,
	/// so `image` must be the whole file (or any buffer the stored address
	/// is valid in). Unreferenced bitmaps are logged; they abort the load
	/// unless the animation is allow-listed in `registry` for `version`.
	///
	/// # Errors
	///
	/// Returns an error if the header or frame region is truncated, holds
	/// values outside their closed sets, or declares bitmaps that are never
	/// referenced (for animations not in the registry).
	pub fn from_binary(
		header_block: &[u8],
		image: &[u8],
		version: &str,
		registry: &KnownIssues,
	) -> Result<Self, DmdError> {
		let record = fields::extract(ANIMATION_HEADER_FIELDS, header_block)?;
		let name = record.text("name")?.to_string();
		let num_bitmaps = record.uint("num_bitmaps")? as u8;
		let total_frames = record.uint("total_frames")? as usize;
		let frames_addr = record.uint("frames_addr")? as usize;

		let region_len = usize::from(num_bitmaps) * BITMAP_SIZE + BLOCK_SIZE;
		let region_end =
			frames_addr.checked_add(region_len).ok_or(DmdError::InsufficientData {
				expected: usize::MAX,
				actual: image.len(),
			})?;
		if image.len() < region_end {
			return Err(DmdError::InsufficientData {
				expected: region_end,
				actual: image.len(),
			});
		}
		let region = &image[frames_addr..region_end];

		let (frames, bitmap_to_frames) =
			load_frames(region, total_frames, num_bitmaps, &name, version, registry)?;

		let mut clock_type = ClockType::from_name(record.text("clock_type")?)
			.ok_or_else(|| DmdError::UnknownEnumName {
				field: "clock_type",
				name: record.text("clock_type").unwrap_or_default().to_string(),
			})?;
		let clock_start_frame = resolve_clock_start(
			record.uint("clock_start")? as u8,
			&name,
			&bitmap_to_frames,
			&mut clock_type,
		);
		let clock_end_frame = resolve_clock_end(
			record.uint("clock_end")? as u8,
			&name,
			frames.len(),
			&bitmap_to_frames,
		);

		let header = AnimationHeader {
			global_id: record.uint("global_id")? as u16,
			enabled: record.text("flags")?.contains("Enable"),
			num_bitmaps,
			frames_addr: frames_addr as u32,
			total_frames: total_frames as u8,
			display_width: record.uint("display_width")? as u8,
			display_height: record.uint("display_height")? as u8,
			clock_type,
			intro_transition: parse_transition(&record, "intro_transition")?,
			outro_transition: parse_transition(&record, "outro_transition")?,
			clock_size: ClockSize::from_name(record.text("clock_size")?).ok_or_else(|| {
				DmdError::UnknownEnumName {
					field: "clock_size",
					name: record.text("clock_size").unwrap_or_default().to_string(),
				}
			})?,
			clock_position_x: record.uint("clock_position_x")? as u8,
			clock_position_y: record.uint("clock_position_y")? as u8,
			clock_start_frame,
			clock_end_frame,
			unknown_byte: record.bytes("unknown_byte19")?[0],
			name,
		};

		Ok(Self {
			header,
			frames,
		})
	}

	/// Serializes the frame region: deduplicates bitmaps by content into a
	/// 1-based store and writes the indirection table.
	///
	/// # Errors
	///
	/// Returns an error if the animation has more than 255 frames or more
	/// than 255 distinct bitmaps.
	pub fn build_frames(&self) -> Result<FrameBlob, DmdError> {
		if self.frames.len() > u8::MAX as usize {
			return Err(DmdError::ValueOutOfRange {
				field: "total_frames",
				value: self.frames.len() as u64,
				width: 1,
			});
		}

		let mut bytes = vec![0u8; BLOCK_SIZE];
		let mut seen: HashMap<&Bitmap, u8> = HashMap::new();
		let mut frame_to_bitmap = Vec::with_capacity(self.frames.len());

		for (index, frame) in self.frames.iter().enumerate() {
			let number = match seen.get(&frame.bitmap) {
				Some(&number) => number,
				None => {
					if seen.len() >= u8::MAX as usize {
						return Err(DmdError::ValueOutOfRange {
							field: "num_bitmaps",
							value: seen.len() as u64 + 1,
							width: 1,
						});
					}
					let number = seen.len() as u8 + 1;
					seen.insert(&frame.bitmap, number);
					bytes.extend_from_slice(frame.bitmap.packed());
					number
				}
			};

			let mut entry = Record::new();
			entry.set_uint("bitmap_num", u64::from(number));
			entry.set_uint("duration", u64::from(frame.duration_ms));
			let packed = fields::pack(FRAME_ENTRY_FIELDS, &entry)?;
			bytes[index * 2..index * 2 + 2].copy_from_slice(&packed);

			frame_to_bitmap.push(number);
		}

		Ok(FrameBlob {
			bytes,
			num_bitmaps: seen.len() as u8,
			frame_to_bitmap,
		})
	}

	/// Serializes the 512-byte header block.
	///
	/// The clock start/end frame indices are translated back to stored
	/// bitmap references through the numbering `blob` assigned, so the blob
	/// must come from the same frame list being written.
	///
	/// # Errors
	///
	/// Returns an error if a header value does not fit its declared field.
	pub fn build_header_block(&self, blob: &FrameBlob) -> Result<Vec<u8>, DmdError> {
		let header = &self.header;
		let mut record = Record::new();
		record.set_uint("global_id", u64::from(header.global_id));
		record.set_text("flags", if header.enabled { "Enable" } else { "" });
		record.set_uint("num_bitmaps", u64::from(blob.num_bitmaps));
		record.set_uint("frames_addr", u64::from(header.frames_addr));
		record.set_uint("total_frames", self.frames.len() as u64);
		record.set_uint("display_width", u64::from(header.display_width));
		record.set_uint("display_height", u64::from(header.display_height));
		record.set_text("clock_type", header.clock_type.name());
		record.set_text("intro_transition", header.intro_transition.name());
		record.set_text("outro_transition", header.outro_transition.name());
		record.set_text("clock_size", header.clock_size.name());
		record.set_uint("clock_position_x", u64::from(header.clock_position_x));
		record.set_uint("clock_position_y", u64::from(header.clock_position_y));
		record.set_uint("clock_start", stored_clock_ref(blob, header.clock_start_frame));
		record.set_uint("clock_end", stored_clock_ref(blob, header.clock_end_frame));
		record.set_bytes("unknown_byte19", vec![header.unknown_byte]);
		record.set_text("name", header.name.as_str());

		let mut block = fields::pack(ANIMATION_HEADER_FIELDS, &record)?;
		block.resize(BLOCK_SIZE, 0);
		Ok(block)
	}

	/// Self-verification: parses an animation and checks that rebuilding it
	/// reproduces the original bytes.
	///
	/// This is a diagnostic for images produced by this codec, where bitmap
	/// numbering is first-seen order by construction. Hardware-ripped images
	/// may renumber legitimately and still load fine.
	///
	/// # Errors
	///
	/// Returns [`DmdError::RoundTripMismatch`] if the rebuilt header block
	/// or frame region differs, or any parse error from
	/// [`Animation::from_binary`].
	pub fn verify_roundtrip(
		header_block: &[u8],
		image: &[u8],
		version: &str,
		registry: &KnownIssues,
	) -> Result<(), DmdError> {
		let animation = Self::from_binary(header_block, image, version, registry)?;
		let blob = animation.build_frames()?;

		let rebuilt_header = animation.build_header_block(&blob)?;
		if rebuilt_header != header_block {
			return Err(DmdError::RoundTripMismatch {
				context: "animation header block",
			});
		}

		let frames_addr = animation.header.frames_addr as usize;
		let region_len = usize::from(animation.header.num_bitmaps) * BITMAP_SIZE + BLOCK_SIZE;
		let original_region = &image[frames_addr..frames_addr + region_len];
		if blob.bytes() != original_region {
			return Err(DmdError::RoundTripMismatch {
				context: "animation frame region",
			});
		}

		Ok(())
	}
}

impl std::fmt::Display for Animation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{} ({} frames, {} bitmaps)",
			self.header.name,
			self.frames.len(),
			self.header.num_bitmaps
		)
	}
}

fn parse_transition(record: &Record, field: &'static str) -> Result<Transition, DmdError> {
	Transition::from_name(record.text(field)?).ok_or_else(|| DmdError::UnknownEnumName {
		field,
		name: record.text(field).unwrap_or_default().to_string(),
	})
}

/// Reads the indirection table and referenced bitmaps from a frame region.
///
/// Returns the frames plus a map from 0-based stored bitmap number to the
/// frames that reference it, used for clock translation.
#[allow(clippy::type_complexity)]
fn load_frames(
	region: &[u8],
	total_frames: usize,
	num_bitmaps: u8,
	name: &str,
	version: &str,
	registry: &KnownIssues,
) -> Result<(Vec<Frame>, BTreeMap<u8, Vec<usize>>), DmdError> {
	let table_len = total_frames * 2;
	if table_len > BLOCK_SIZE {
		return Err(DmdError::InsufficientData {
			expected: table_len,
			actual: BLOCK_SIZE,
		});
	}

	let mut frames = Vec::with_capacity(total_frames);
	let mut bitmap_to_frames: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
	let mut referenced = [false; 256];

	for frame_index in 0..total_frames {
		let entry = fields::extract(FRAME_ENTRY_FIELDS, &region[frame_index * 2..])?;
		let bitmap_num = entry.uint("bitmap_num")? as u8;
		let duration_ms = entry.uint("duration")? as u32;

		referenced[usize::from(bitmap_num)] = true;
		// Sentinel 0 maps to the transparent grid and stays out of the
		// address space; everything else is keyed by its 1-based number.
		let bitmap = if bitmap_num == 0 {
			Bitmap::transparent()
		} else {
			let start = usize::from(bitmap_num - 1) * BITMAP_SIZE + BLOCK_SIZE;
			let end = start + BITMAP_SIZE;
			if region.len() < end {
				return Err(DmdError::InsufficientData {
					expected: end,
					actual: region.len(),
				});
			}
			bitmap_to_frames.entry(bitmap_num).or_default().push(frame_index);
			Bitmap::from_packed(&region[start..end])?
		};

		frames.push(Frame {
			duration_ms,
			bitmap,
		});
	}

	let unreferenced: Vec<u8> =
		(1..=num_bitmaps).filter(|&n| !referenced[usize::from(n)]).collect();
	for &bitmap in &unreferenced {
		warn!("bitmap {bitmap} is unreferenced in animation `{name}`");
	}
	if let Some(&bitmap) = unreferenced.first() {
		if registry.is_known(version, name) {
			debug!("animation `{name}` is a known issue for version {version}; continuing");
		} else {
			return Err(DmdError::UnreferencedBitmap {
				animation: name.to_string(),
				bitmap,
			});
		}
	}

	Ok((frames, bitmap_to_frames))
}

/// Translates the stored clock-start byte to a 0-based frame index.
///
/// A stored 0 means "from the first frame". A reference to a bitmap that no
/// frame uses disables the clock entirely.
fn resolve_clock_start(
	stored: u8,
	name: &str,
	bitmap_to_frames: &BTreeMap<u8, Vec<usize>>,
	clock_type: &mut ClockType,
) -> usize {
	if stored == 0 {
		return 0;
	}
	let bitmap = stored - 1;
	match bitmap_to_frames.get(&bitmap) {
		Some(frame_indices) => frame_indices[0],
		None => {
			warn!(
				"animation `{name}` requests clock start on unused bitmap {bitmap}; forcing no clock"
			);
			*clock_type = ClockType::NoClock;
			0
		}
	}
}

/// Translates the stored clock-end byte to a 0-based frame index.
///
/// A stored 0 or an unused bitmap reference both mean "until the last frame".
fn resolve_clock_end(
	stored: u8,
	name: &str,
	total_frames: usize,
	bitmap_to_frames: &BTreeMap<u8, Vec<usize>>,
) -> usize {
	let last = total_frames.saturating_sub(1);
	if stored == 0 {
		return last;
	}
	let bitmap = stored - 1;
	match bitmap_to_frames.get(&bitmap) {
		Some(frame_indices) => frame_indices[0],
		None => {
			warn!(
				"animation `{name}` requests clock end on unused bitmap {bitmap}; displaying until the end"
			);
			last
		}
	}
}

/// Inverse clock translation for serialization: frame index to stored byte.
fn stored_clock_ref(blob: &FrameBlob, frame_index: usize) -> u64 {
	if blob.frame_to_bitmap.is_empty() {
		return 0;
	}
	let index = frame_index.min(blob.frame_to_bitmap.len() - 1);
	u64::from(blob.frame_to_bitmap[index]) + 1
}
