//! RunDMD `.img` image format support for `rundmd-rs` project.
//!
//! This module provides support for loading, editing, and writing the
//! proprietary firmware image format of the RunDMD LED display controller.
//! An image bundles a main header, a startup picture, and a set of
//! animations made of 4-bit grayscale 128×32 bitmaps with per-frame timing.
//!
//! # File Structure Overview
//!
//! The format is block-oriented: every structure starts on a 512-byte
//! boundary.
//!
//! ```text
//! Offset        Size      Region
//! ------------  --------  ----------------------------------------------
//! 0x0000        512       Main header ("DGD" marker, counts, version)
//! 0x0200        0xC600    Startup picture blob
//! 0xC800        N × 512   Animation header blocks, one per animation,
//!                         in title-sorted order
//! ...           51200     Fixed zero padding
//! ...           varies    Frame regions, one per animation, same order
//! ```
//!
//! ## Main Header (512 bytes at offset 0x00)
//!
//! ```text
//! Offset  Size  Field               Description
//! ------  ----  ------------------  --------------------------------------
//! 0x000   3     marker              "DGD"
//! 0x003   2     total_animations    Number of animations (big-endian)
//! 0x005   16    unknown             Undetermined, carried verbatim
//! 0x015   2     enabled_animations  1 + number of enabled animations
//! 0x017   472   unknown             Undetermined, carried verbatim
//! 0x1EF   4     version             ASCII version tag (e.g. "B134")
//! 0x1F3   13    unknown             Undetermined, carried verbatim
//! ```
//!
//! ## Animation Header Block (512 bytes each)
//!
//! 52 packed bytes followed by zero padding:
//!
//! ```text
//! Offset  Size  Field             Description
//! ------  ----  ----------------  ----------------------------------------
//! +0x00   2     global_id         Sequence number, assigned from 1
//! +0x02   1     flags             Bit 0 = enabled
//! +0x03   1     num_bitmaps       Distinct bitmaps in the frame region
//! +0x04   4     frames_addr       Frame region address ÷ 512
//! +0x08   1     total_frames      Displayed frame count
//! +0x09   1     display_width     Pixels (128)
//! +0x0A   1     display_height    Pixels (32)
//! +0x0B   1     clock_type        0 none / 1 behind / 2 on top
//! +0x0C   1     intro_transition  0 disable / 1 enable
//! +0x0D   1     outro_transition  0 disable / 1 enable
//! +0x0E   1     clock_size        0 large / 1 small
//! +0x0F   2     clock_position    X, Y
//! +0x11   2     clock_start/end   Bitmap references (see below)
//! +0x13   1     unknown           Undetermined, carried verbatim
//! +0x14   32    name              ASCII, zero-padded, `TITLE_NNN`
//! ```
//!
//! ## Frame Region (per animation, at `frames_addr × 512`)
//!
//! A 512-byte indirection block whose first `total_frames × 2` bytes are
//! `(bitmap_number, encoded_duration)` pairs, followed by the deduplicated
//! 2048-byte bitmaps in first-seen order. Bitmap numbers are 1-based;
//! number 0 denotes the synthetic fully-transparent bitmap, which is never
//! stored. Bitmap `n` lives at `frames_addr + 512 + (n - 1) × 2048`.
//!
//! Durations are quantized to one byte: the top 2 bits select a bucket
//! (2 ms / 10 ms / 100 ms / 1000 ms granularity) and the low 6 bits the
//! magnitude. See [`duration`].
//!
//! The clock start and end header bytes store `assigned_bitmap_number + 1`
//! (0 meaning first/last frame); in memory they are exposed as 0-based
//! frame indices and retranslated through the deduplication pass on write.

pub mod constants;
pub mod duration;
pub mod fields;

mod animation;
mod bitmap;
mod doc;
mod file;
mod header;
mod known_issues;

pub use animation::{
	Animation, AnimationHeader, ClockSize, ClockType, Frame, FrameBlob, Transition,
};
pub use bitmap::Bitmap;
pub use doc::{AnimationDoc, AnimationHeaderDoc, FrameDoc, HeaderDoc};
pub use file::File;
pub use header::ImageHeader;
pub use known_issues::KnownIssues;
