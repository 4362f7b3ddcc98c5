//! This crate provides core data types and file format support for the `rundmd-rs` project.
//!
//! # File Formats
//!
//! - **DMD**: RunDMD `.img` firmware images holding a startup picture and a set of
//!   128×32 4-bit grayscale animations with per-frame timing and clock overlay settings
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use rundmd_types::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = DmdFile::open("B134.img")?;
//! for (title, group) in image.animations() {
//!     println!("{title}: {} animations", group.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use rundmd_types::file::dmd::File;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = File::open("B134.img")?;
//! # Ok(())
//! # }
//! ```

pub mod file;

/// `use rundmd_types::prelude::*;` to import commonly used items.
pub mod prelude;
