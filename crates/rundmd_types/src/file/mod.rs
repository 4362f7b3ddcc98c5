//! File type support for `rundmd-rs` project.

mod error;

pub mod dmd;

// Re-export unified error type
pub use error::DmdError;

// Re-export main file types
pub use dmd::{
	Animation, AnimationDoc, AnimationHeaderDoc, Bitmap, ClockSize, ClockType,
	File as DmdFile, Frame, FrameDoc, HeaderDoc, ImageHeader, KnownIssues, Transition,
};
