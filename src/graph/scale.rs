//! Weight → pixel size lookups.

/// Lowest weight; nodes at this weight can be removed.
pub const MIN_WEIGHT: u8 = 1;
/// Highest weight.
pub const MAX_WEIGHT: u8 = 5;
/// Weight assumed when none is known.
pub const DEFAULT_WEIGHT: u8 = 2;

const NODE_SIZES: [f64; 5] = [14.0, 18.0, 24.0, 30.0, 36.0];
const BUTTON_SIZES: [f64; 5] = [14.0, 18.0, 22.0, 26.0, 32.0];

/// Clamp any integer weight into `[MIN_WEIGHT, MAX_WEIGHT]`.
pub fn clamp_weight(weight: i32) -> u8 {
	weight.clamp(MIN_WEIGHT as i32, MAX_WEIGHT as i32) as u8
}

fn slot(weight: Option<u8>) -> usize {
	(clamp_weight(weight.unwrap_or(DEFAULT_WEIGHT) as i32) - MIN_WEIGHT) as usize
}

/// Node diameter in pixels at zoom 1.
pub fn node_size(weight: Option<u8>) -> f64 {
	NODE_SIZES[slot(weight)]
}

/// Base size of a control button and its glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonDimensions {
	pub size: f64,
	pub font_size: f64,
}

pub fn button_dimensions(weight: Option<u8>) -> ButtonDimensions {
	let size = BUTTON_SIZES[slot(weight)];
	ButtonDimensions {
		size,
		font_size: (size * 0.5).round(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sizes_follow_lookup_and_clamp() {
		assert_eq!(node_size(Some(1)), 14.0);
		assert_eq!(node_size(Some(3)), 24.0);
		assert_eq!(node_size(Some(5)), 36.0);
		assert_eq!(node_size(Some(0)), 14.0);
		assert_eq!(node_size(Some(9)), 36.0);
		assert_eq!(node_size(None), 18.0);
	}

	#[test]
	fn sizes_are_monotonic() {
		for w in MIN_WEIGHT..MAX_WEIGHT {
			assert!(node_size(Some(w)) <= node_size(Some(w + 1)));
			assert!(button_dimensions(Some(w)).size <= button_dimensions(Some(w + 1)).size);
		}
	}

	#[test]
	fn button_font_is_half_size() {
		let dims = button_dimensions(Some(3));
		assert_eq!(dims.size, 22.0);
		assert_eq!(dims.font_size, 11.0);
		assert_eq!(button_dimensions(None).font_size, 9.0);
	}
}
