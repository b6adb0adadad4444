use serde::{Deserialize, Serialize};

use super::error::MapResult;

/// Smallest zoom a loaded config may allow.
const ZOOM_FLOOR: f64 = 0.05;

/// Tunables of the editor. Every field has a default, so a JSON document only
/// needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
	pub zoom_min: f64,
	pub zoom_max: f64,
	pub zoom_step: f64,
	/// Wheel zoom factor per notch.
	pub wheel_step: f64,
	/// Screen pixels moved per arrow key press.
	pub pan_step: f64,
	/// Nodes are kept this many percent away from the canvas edges.
	pub position_margin: f64,
	/// Vertical distance, in percent, from a parent to its children's bus.
	pub bus_offset: f64,
	/// Curve bulge of non-hierarchy links relative to their horizontal span.
	pub curve_factor: f64,
	pub suggestion_limit: usize,
	pub split_word_threshold: usize,
	pub content_block_threshold: usize,
	/// Pointer travel, in screen pixels, under which a press counts as a click.
	pub click_slop: f64,
	pub relax_iterations: usize,
}

impl Default for MapConfig {
	fn default() -> Self {
		Self {
			zoom_min: 0.3,
			zoom_max: 3.0,
			zoom_step: 1.2,
			wheel_step: 1.1,
			pan_step: 40.0,
			position_margin: 5.0,
			bus_offset: 12.0,
			curve_factor: 0.2,
			suggestion_limit: 3,
			split_word_threshold: 4,
			content_block_threshold: 2,
			click_slop: 3.0,
			relax_iterations: 120,
		}
	}
}

impl MapConfig {
	pub fn from_json(raw: &str) -> MapResult<Self> {
		let mut config: Self = serde_json::from_str(raw)?;
		if config.zoom_min > config.zoom_max {
			std::mem::swap(&mut config.zoom_min, &mut config.zoom_max);
		}
		config.zoom_min = config.zoom_min.max(ZOOM_FLOOR);
		config.zoom_max = config.zoom_max.max(config.zoom_min);
		config.position_margin = config.position_margin.clamp(0.0, 50.0);
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::error::MapError;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = MapConfig::from_json(r#"{"zoom_step": 1.5}"#).unwrap();
		assert_eq!(config.zoom_step, 1.5);
		assert_eq!(config.zoom_min, 0.3);
		assert_eq!(config.suggestion_limit, 3);
	}

	#[test]
	fn inverted_zoom_bounds_are_swapped() {
		let config = MapConfig::from_json(r#"{"zoom_min": 4.0, "zoom_max": 0.5}"#).unwrap();
		assert_eq!((config.zoom_min, config.zoom_max), (0.5, 4.0));
	}

	#[test]
	fn non_positive_zoom_min_is_raised_to_floor() {
		let config = MapConfig::from_json(r#"{"zoom_min": 0.0}"#).unwrap();
		assert_eq!((config.zoom_min, config.zoom_max), (ZOOM_FLOOR, 3.0));

		let config = MapConfig::from_json(r#"{"zoom_min": -2.0, "zoom_max": -1.0}"#).unwrap();
		assert_eq!((config.zoom_min, config.zoom_max), (ZOOM_FLOOR, ZOOM_FLOOR));
	}

	#[test]
	fn malformed_json_is_an_error() {
		assert!(matches!(MapConfig::from_json("{"), Err(MapError::Json(_))));
	}
}
