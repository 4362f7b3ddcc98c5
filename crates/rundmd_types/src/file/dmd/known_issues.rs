//! Allow-list of animations with known structural anomalies.
//!
//! Some animations shipped in official firmware images declare more bitmaps
//! in their header than their frame table ever references. These are
//! firmware quirks confirmed on hardware, not corruption, so loads of
//! allow-listed animations downgrade the anomaly to a warning. The registry
//! is immutable configuration injected into the loader; it is never ambient
//! global state.

use std::collections::{HashMap, HashSet};

/// Registry of animation names with accepted structural anomalies, keyed by
/// the image's version tag.
///
/// # Examples
///
/// ```
/// use rundmd_types::file::dmd::KnownIssues;
///
/// let mut registry = KnownIssues::new();
/// registry.allow("B134", "WORLD_CUP_SOCCER_028");
/// assert!(registry.is_known("B134", "WORLD_CUP_SOCCER_028"));
/// assert!(!registry.is_known("J001", "WORLD_CUP_SOCCER_028"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KnownIssues {
	by_version: HashMap<String, HashSet<String>>,
}

impl KnownIssues {
	/// Creates an empty registry that accepts no anomalies.
	pub fn new() -> Self {
		Self::default()
	}

	/// The registry of anomalies observed on shipped firmware images.
	pub fn builtin() -> Self {
		let mut registry = Self::new();
		for name in [
			"WORLD_CUP_SOCCER_028",
			"CIRQUS_VOLTAIRE_012",
			"NO_GOOD_GOFERS_003",
		] {
			registry.allow("B134", name);
		}
		registry
	}

	/// Adds an animation name to the allow-list for a version tag.
	pub fn allow(&mut self, version: impl Into<String>, animation: impl Into<String>) {
		self.by_version.entry(version.into()).or_default().insert(animation.into());
	}

	/// Returns `true` if the animation's anomalies are accepted for the
	/// given version tag.
	pub fn is_known(&self, version: &str, animation: &str) -> bool {
		self.by_version.get(version).is_some_and(|names| names.contains(animation))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_registry_knows_nothing() {
		let registry = KnownIssues::new();
		assert!(!registry.is_known("B134", "ANY_001"));
	}

	#[test]
	fn test_allow_is_scoped_to_version() {
		let mut registry = KnownIssues::new();
		registry.allow("B134", "GAME_001");
		assert!(registry.is_known("B134", "GAME_001"));
		assert!(!registry.is_known("B135", "GAME_001"));
		assert!(!registry.is_known("B134", "GAME_002"));
	}

	#[test]
	fn test_builtin_covers_shipped_quirks() {
		let registry = KnownIssues::builtin();
		assert!(registry.is_known("B134", "WORLD_CUP_SOCCER_028"));
	}
}
