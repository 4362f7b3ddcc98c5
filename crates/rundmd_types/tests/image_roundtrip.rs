//! End-to-end image tests: document ingest, finalize, serialize, reload.

use anyhow::Result;
use rundmd_types::prelude::*;
use test_log::test;

/// Bitmap rows with a recognizable diagonal stripe, seeded per frame.
fn stripe_rows(seed: usize) -> Vec<String> {
	(0..32)
		.map(|y| {
			let row: String = (0..128)
				.map(|x| if (x + y + seed) % 7 == 0 { 'f' } else { '0' })
				.collect();
			format!("|{row}|")
		})
		.collect()
}

fn animation_doc(frames: usize, seed: usize) -> String {
	let frames: Vec<serde_json::Value> = (0..frames)
		.map(|index| {
			serde_json::json!({
				"duration_ms": 100 * (index + 1),
				"bitmap": stripe_rows(seed + index),
			})
		})
		.collect();
	serde_json::json!({
		"header": {
			"clock_type": "ClockBehind",
			"clock_start_frame": 0,
			"clock_end_frame": frames.len() - 1,
		},
		"frames": frames,
	})
	.to_string()
}

#[test]
fn test_documents_to_image_and_back() -> Result<()> {
	let mut image = DmdFile::new();
	image.load_animation_document(&animation_doc(3, 0), Some("MEDIEVAL_MADNESS_001"))?;
	image.load_animation_document(&animation_doc(2, 40), Some("MEDIEVAL_MADNESS_002"))?;
	image.load_animation_document(&animation_doc(1, 80), Some("ATTACK_FROM_MARS_001"))?;
	image.load_header_document(r#"{"version": "B134"}"#)?;
	assert_eq!(image.header().version, "B134");

	image.finalize(true)?;
	// finalize stamps the current version tag over the edited one
	assert_eq!(image.header().version, "J001");
	assert_eq!(image.header().total_animations, 3);
	assert_eq!(image.header().enabled_animations, 4);

	let bytes = image.to_bytes()?;
	let reloaded = DmdFile::from_bytes(&bytes)?;
	assert_eq!(reloaded, image);

	// Documents come back out sorted by title
	let titles: Vec<&str> = reloaded.animation_documents().map(|(title, _)| title).collect();
	assert_eq!(
		titles,
		["ATTACK_FROM_MARS", "MEDIEVAL_MADNESS", "MEDIEVAL_MADNESS"]
	);

	// And their pixel content survives the trip
	let (_, doc) = reloaded
		.animation_documents()
		.find(|(title, _)| *title == "ATTACK_FROM_MARS")
		.unwrap();
	assert_eq!(doc.frames[0].bitmap, stripe_rows(80));
	Ok(())
}

#[test]
fn test_duration_quantization_is_visible_in_documents() -> Result<()> {
	let mut image = DmdFile::new();
	let json = serde_json::json!({
		"header": {},
		"frames": [{"duration_ms": 127, "bitmap": stripe_rows(0)}],
	})
	.to_string();
	image.load_animation_document(&json, Some("TIMING_001"))?;
	image.finalize(false)?;

	let reloaded = DmdFile::from_bytes(&image.to_bytes()?)?;
	let (_, doc) = reloaded.animation_documents().next().unwrap();
	// 127 ms truncates to 126 ms in the 2 ms bucket
	assert_eq!(doc.frames[0].duration_ms, 126);
	Ok(())
}

#[test]
fn test_shared_bitmaps_are_stored_once() -> Result<()> {
	let mut image = DmdFile::new();
	let rows = stripe_rows(3);
	let json = serde_json::json!({
		"header": {},
		"frames": [
			{"duration_ms": 100, "bitmap": rows},
			{"duration_ms": 200, "bitmap": rows},
			{"duration_ms": 300, "bitmap": stripe_rows(9)},
		],
	})
	.to_string();
	image.load_animation_document(&json, Some("DEDUP_001"))?;
	image.finalize(false)?;

	let animation = &image.animations()["DEDUP"][0];
	assert_eq!(animation.header.num_bitmaps, 2);
	assert_eq!(animation.header.total_frames, 3);

	// Region size reflects the deduplicated store
	let bytes = image.to_bytes()?;
	let frames_addr = animation.header.frames_addr as usize;
	assert_eq!(bytes.len(), frames_addr + BLOCK_SIZE + 2 * 2048);
	Ok(())
}

#[test]
fn test_reload_preserves_startup_picture() -> Result<()> {
	let mut image = DmdFile::new();
	image.header_mut().startup_picture[0..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
	image.load_animation_document(&animation_doc(1, 0), Some("BOOT_001"))?;
	image.finalize(false)?;

	let reloaded = DmdFile::from_bytes(&image.to_bytes()?)?;
	assert_eq!(&reloaded.header().startup_picture[0..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
	Ok(())
}
