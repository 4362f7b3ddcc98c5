//! RunDMD image format constants.
//!
//! This module contains the fixed sizes, markers, and padding values of the
//! RunDMD binary image layout. The padding and alignment values were
//! determined empirically against hardware-tested images and must not be
//! changed.

/// Alignment unit for headers and frame-table addresses (512 bytes)
pub const BLOCK_SIZE: usize = 512;

/// 3-byte ASCII marker at the start of every image
pub const IMAGE_MARKER: &str = "DGD";

/// Size of the packed main header fields (one block)
pub const MAIN_HEADER_SIZE: usize = 512;

/// Size of the startup picture blob that follows the main header
pub const STARTUP_PIC_SIZE: usize = 0xC600;

/// Size of the packed animation header fields (the rest of the 512-byte
/// header block is zero padding)
pub const ANIMATION_HEADER_SIZE: usize = 52;

/// Display width in pixels
pub const BITMAP_WIDTH: usize = 128;

/// Display height in pixels
pub const BITMAP_HEIGHT: usize = 32;

/// Size of one stored bitmap: one 4-bit grayscale nibble per pixel
pub const BITMAP_SIZE: usize = BITMAP_WIDTH * BITMAP_HEIGHT / 2;

/// Zero padding between the animation header blocks and the first frame blob
pub const HEADER_TO_FRAME_DATA_PADDING: usize = 51200;

/// Version tag written into the main header on finalize
pub const VERSION_TAG: &str = "J001";

/// Nibble value used for the synthetic fully-transparent bitmap
pub const TRANSPARENT_NIBBLE: u8 = 0xA;
