//! Prelude module for `rundmd_types`.
//!
//! This module provides a convenient way to import commonly used types, traits, and constants.
//!
//! # Examples
//!
//! ```no_run
//! use rundmd_types::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = DmdFile::open("B134.img")?;
//! println!("{image}");
//! # Ok(())
//! # }
//! ```

// File module types
#[doc(inline)]
pub use crate::file::{
	// Animation types
	Animation,
	AnimationDoc,
	AnimationHeaderDoc,

	// Bitmap types
	Bitmap,
	ClockSize,
	ClockType,

	// Image types
	DmdError,
	DmdFile,

	Frame,
	FrameDoc,
	HeaderDoc,
	ImageHeader,
	KnownIssues,
	Transition,
};

// Format constants
#[doc(inline)]
pub use crate::file::dmd::constants::{BITMAP_HEIGHT, BITMAP_WIDTH, BLOCK_SIZE};

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
