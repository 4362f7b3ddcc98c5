//! Facade smoke test: the root crate re-exports the whole codec surface.

use anyhow::Result;
use rundmd_rs::prelude::*;
use test_log::test;

#[test]
fn test_build_and_reload_through_facade() -> Result<()> {
	let mut image = DmdFile::new();

	let mut animation = Animation::new("SMOKE_TEST_001");
	animation.frames.push(Frame {
		duration_ms: 100,
		bitmap: Bitmap::transparent(),
	});
	image.add_animation(animation);
	image.finalize(true)?;

	let bytes = image.to_bytes()?;
	let reloaded = DmdFile::from_bytes(&bytes)?;
	assert_eq!(reloaded.animation_count(), 1);
	assert_eq!(reloaded.animations()["SMOKE_TEST"][0].frames.len(), 1);
	Ok(())
}
