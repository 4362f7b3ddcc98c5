//! Editable JSON document forms of headers and animations.
//!
//! Documents are the human-facing interchange representation: header fields
//! by name, clock references as 0-based frame indices, and bitmaps as rows
//! of hex nibbles in `|...|` delimiters. Binary-only bookkeeping (global id,
//! frame-table address, bitmap count) is absent; it is recomputed by
//! [`super::File::finalize`] on the way back to binary.

use serde::{Deserialize, Serialize};

use crate::file::DmdError;

use super::animation::{Animation, AnimationHeader, ClockSize, ClockType, Frame, Transition};
use super::bitmap::Bitmap;
use super::header::ImageHeader;

/// Main header document. Every field is optional; absent fields leave the
/// current header value untouched when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDoc {
	/// Number of animations in the image
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_animations: Option<u16>,
	/// 1 + number of enabled animations
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled_animations: Option<u16>,
	/// 4-character version tag
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
}

/// Animation header fields exposed for editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationHeaderDoc {
	/// Animation name; may be overridden at load time
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Whether the animation is enabled for playback
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	/// Clock overlay placement
	#[serde(default)]
	pub clock_type: ClockType,
	/// Transition into the animation
	#[serde(default)]
	pub intro_transition: Transition,
	/// Transition out of the animation
	#[serde(default)]
	pub outro_transition: Transition,
	/// Clock overlay size
	#[serde(default)]
	pub clock_size: ClockSize,
	/// Clock overlay X position
	#[serde(default)]
	pub clock_position_x: u8,
	/// Clock overlay Y position
	#[serde(default)]
	pub clock_position_y: u8,
	/// First frame (0-based) on which the clock is shown
	#[serde(default)]
	pub clock_start_frame: usize,
	/// Last frame (0-based) on which the clock is shown; clamped to the
	/// final frame on ingest
	#[serde(default)]
	pub clock_end_frame: usize,
}

fn default_enabled() -> bool {
	true
}

/// One frame in document form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDoc {
	/// Display duration in milliseconds (quantized on write)
	pub duration_ms: u32,
	/// 32 rows of 128 hex nibbles, each wrapped in `|` delimiters
	pub bitmap: Vec<String>,
}

/// A whole animation in document form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDoc {
	/// Editable header fields
	pub header: AnimationHeaderDoc,
	/// Displayed frames, in order
	pub frames: Vec<FrameDoc>,
}

impl ImageHeader {
	/// Returns the editable header fields as a document.
	pub fn document(&self) -> HeaderDoc {
		HeaderDoc {
			total_animations: Some(self.total_animations),
			enabled_animations: Some(self.enabled_animations),
			version: Some(self.version.clone()),
		}
	}

	/// Applies a document: present fields replace current values.
	pub fn apply_document(&mut self, doc: &HeaderDoc) {
		if let Some(total) = doc.total_animations {
			self.total_animations = total;
		}
		if let Some(enabled) = doc.enabled_animations {
			self.enabled_animations = enabled;
		}
		if let Some(version) = &doc.version {
			self.version = version.clone();
		}
	}
}

impl Animation {
	/// Returns the animation as an editable document.
	pub fn to_document(&self) -> AnimationDoc {
		AnimationDoc {
			header: AnimationHeaderDoc {
				name: Some(self.header.name.clone()),
				enabled: self.header.enabled,
				clock_type: self.header.clock_type,
				intro_transition: self.header.intro_transition,
				outro_transition: self.header.outro_transition,
				clock_size: self.header.clock_size,
				clock_position_x: self.header.clock_position_x,
				clock_position_y: self.header.clock_position_y,
				clock_start_frame: self.header.clock_start_frame,
				clock_end_frame: self.header.clock_end_frame,
			},
			frames: self
				.frames
				.iter()
				.map(|frame| FrameDoc {
					duration_ms: frame.duration_ms,
					bitmap: frame.bitmap.to_rows(),
				})
				.collect(),
		}
	}

	/// Builds an animation from a document.
	///
	/// `name` overrides the document's name when given; with neither, the
	/// animation is unnamed. Binary bookkeeping fields start at zero and are
	/// filled in by [`super::File::finalize`]. A clock end reference past
	/// the final frame is clamped to it.
	///
	/// # Errors
	///
	/// Returns an error if a bitmap does not have exactly 32 well-formed
	/// rows.
	pub fn from_document(doc: AnimationDoc, name: Option<&str>) -> Result<Self, DmdError> {
		let frames = doc
			.frames
			.iter()
			.map(|frame| {
				Ok(Frame {
					duration_ms: frame.duration_ms,
					bitmap: Bitmap::from_rows(&frame.bitmap)?,
				})
			})
			.collect::<Result<Vec<_>, DmdError>>()?;

		let name = name
			.map(str::to_string)
			.or(doc.header.name)
			.unwrap_or_default();

		let mut header = AnimationHeader::new(name);
		header.enabled = doc.header.enabled;
		header.total_frames = frames.len() as u8;
		header.clock_type = doc.header.clock_type;
		header.intro_transition = doc.header.intro_transition;
		header.outro_transition = doc.header.outro_transition;
		header.clock_size = doc.header.clock_size;
		header.clock_position_x = doc.header.clock_position_x;
		header.clock_position_y = doc.header.clock_position_y;
		header.clock_start_frame = doc.header.clock_start_frame;
		header.clock_end_frame =
			doc.header.clock_end_frame.min(frames.len().saturating_sub(1));

		Ok(Self {
			header,
			frames,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::dmd::constants::BITMAP_SIZE;

	fn sample_animation() -> Animation {
		let mut animation = Animation::new("FUNHOUSE_003");
		animation.header.enabled = true;
		animation.header.total_frames = 2;
		animation.header.clock_type = ClockType::ClockBehind;
		animation.header.clock_end_frame = 1;
		animation.frames = vec![
			Frame {
				duration_ms: 200,
				bitmap: Bitmap::from_packed(&[0x11; BITMAP_SIZE]).unwrap(),
			},
			Frame {
				duration_ms: 630,
				bitmap: Bitmap::transparent(),
			},
		];
		animation
	}

	#[test]
	fn test_document_roundtrip() {
		let animation = sample_animation();
		let doc = animation.to_document();
		let rebuilt = Animation::from_document(doc, None).unwrap();
		assert_eq!(rebuilt, animation);
	}

	#[test]
	fn test_name_override_wins() {
		let doc = sample_animation().to_document();
		let rebuilt = Animation::from_document(doc, Some("RENAMED_001")).unwrap();
		assert_eq!(rebuilt.header.name, "RENAMED_001");
		assert_eq!(rebuilt.title(), "RENAMED");
	}

	#[test]
	fn test_ingest_defaults() {
		// A minimal document: only frames, everything else defaulted
		let json = format!(
			r#"{{"header": {{}}, "frames": [{{"duration_ms": 50, "bitmap": {}}}]}}"#,
			serde_json::to_string(&Bitmap::transparent().to_rows()).unwrap()
		);
		let doc: AnimationDoc = serde_json::from_str(&json).unwrap();
		let animation = Animation::from_document(doc, Some("NEW_001")).unwrap();

		assert!(animation.header.enabled);
		assert_eq!(animation.header.display_width, 128);
		assert_eq!(animation.header.display_height, 32);
		assert_eq!(animation.header.clock_type, ClockType::NoClock);
		assert_eq!(animation.header.total_frames, 1);
	}

	#[test]
	fn test_clock_end_clamped_to_last_frame() {
		let mut doc = sample_animation().to_document();
		doc.header.clock_end_frame = 99;
		let rebuilt = Animation::from_document(doc, None).unwrap();
		assert_eq!(rebuilt.header.clock_end_frame, 1);
	}

	#[test]
	fn test_malformed_bitmap_row_fails() {
		let mut doc = sample_animation().to_document();
		doc.frames[0].bitmap[5] = "|short|".to_string();
		let err = Animation::from_document(doc, None).unwrap_err();
		assert!(matches!(err, DmdError::MalformedFrameRow { row: 5, .. }));
	}

	#[test]
	fn test_header_document_partial_apply() {
		let mut header = ImageHeader::new();
		header.total_animations = 7;
		header.version = "B134".to_string();

		let doc: HeaderDoc = serde_json::from_str(r#"{"version": "J001"}"#).unwrap();
		header.apply_document(&doc);
		assert_eq!(header.version, "J001");
		assert_eq!(header.total_animations, 7);
	}
}
