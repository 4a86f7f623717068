//! Choosing how many colors to extract and turning clusters into extracted colors

use crate::{distinct::select_distinct_colors, kmeans, kmeans::DominantColors};

/// The largest number of candidate clusters extracted for distinct mode
pub const MAX_DISTINCT_CANDIDATES: usize = 64;

/// How many more candidates than requested colors are extracted for distinct mode
const DISTINCT_CANDIDATE_MULTIPLIER: usize = 2;

/// Options for [`pick_auto_color_count`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoCountOptions {
	/// The percentage of pixels that the chosen colors should cover
	pub coverage_pct: f64,
	/// The fewest colors to choose
	pub min: usize,
	/// The most colors to choose
	pub max: usize,
}

impl Default for AutoCountOptions {
	fn default() -> Self {
		Self { coverage_pct: 99.0, min: 5, max: 12 }
	}
}

/// Choose the number of colors needed to cover enough of the image
///
/// `cluster_sizes` should be sorted in descending order.
/// The result is the length of the shortest prefix whose share of the total size
/// reaches `coverage_pct`, clamped to `min..=max` (with both first limited to the number of clusters).
///
/// Returns 0 for empty input or when every size is 0.
#[must_use]
pub fn pick_auto_color_count(cluster_sizes: &[u32], options: AutoCountOptions) -> usize {
	let total = cluster_sizes.iter().copied().map(u64::from).sum::<u64>();
	if total == 0 {
		return 0;
	}

	#[allow(clippy::cast_precision_loss)]
	let total = total as f64;

	let mut cumulative = 0;
	let mut count = 0;
	for &size in cluster_sizes {
		cumulative += u64::from(size);
		count += 1;

		#[allow(clippy::cast_precision_loss)]
		let share = cumulative as f64 / total * 100.0;
		if share >= options.coverage_pct {
			break;
		}
	}

	let max = usize::min(options.max, cluster_sizes.len());
	let min = usize::min(options.min, max);
	count.clamp(min, max)
}

/// How the extracted colors are chosen from the k-means clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ExtractionMode {
	/// The largest clusters
	#[default]
	Dominant,
	/// Clusters that are far apart from each other, see [`select_distinct_colors`]
	Distinct,
}

impl ExtractionMode {
	/// The options used when the color count is [`ColorCount::Auto`]
	#[must_use]
	pub const fn auto_count_options(self) -> AutoCountOptions {
		match self {
			Self::Dominant => AutoCountOptions { coverage_pct: 99.0, min: 5, max: 12 },
			Self::Distinct => AutoCountOptions { coverage_pct: 99.5, min: 8, max: 32 },
		}
	}

	/// The number of k-means clusters to compute in order to select `count` colors
	#[must_use]
	pub fn candidate_count(self, count: usize) -> usize {
		match self {
			Self::Dominant => count,
			Self::Distinct => usize::max(
				count,
				usize::min(count.saturating_mul(DISTINCT_CANDIDATE_MULTIPLIER), MAX_DISTINCT_CANDIDATES),
			),
		}
	}

	/// Select `count` colors from the ranked clusters
	#[must_use]
	pub fn select(self, clusters: &DominantColors, count: usize) -> DominantColors {
		match self {
			Self::Dominant => DominantColors {
				colors: clusters.colors.iter().take(count).cloned().collect(),
				cluster_sizes: clusters.cluster_sizes.iter().take(count).copied().collect(),
			},
			Self::Distinct => select_distinct_colors(&clusters.colors, &clusters.cluster_sizes, count),
		}
	}
}

/// The number of colors to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorCount {
	/// Choose the number based on how much of the image the colors cover
	#[default]
	Auto,
	/// Exactly this many colors (or fewer if the image does not have enough)
	Exact(usize),
}

/// A color extracted from an image
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ExtractedColor {
	/// The color as `rgb(r, g, b)`
	pub rgb_string: String,
	/// The percentage of the visible pixels that are closest to this color
	pub coverage_pct: f64,
}

/// Pair each selected color with its share of `total` pixels
///
/// Every coverage is 0 if `total` is 0.
#[must_use]
pub fn to_extracted_colors(selected: &DominantColors, total: u64) -> Vec<ExtractedColor> {
	selected
		.colors
		.iter()
		.enumerate()
		.map(|(i, color)| {
			let size = selected.cluster_sizes.get(i).copied().unwrap_or(0);

			#[allow(clippy::cast_precision_loss)]
			let coverage_pct = if total > 0 {
				f64::from(size) / total as f64 * 100.0
			} else {
				0.0
			};

			ExtractedColor { rgb_string: color.clone(), coverage_pct }
		})
		.collect()
}

/// Run k-means for `candidates` clusters, then select `count` of them
fn extract_with(pixels: &[u8], candidates: usize, count: impl FnOnce(&DominantColors) -> usize, mode: ExtractionMode) -> Vec<ExtractedColor> {
	let clusters = DominantColors::from(kmeans::run(pixels, candidates).as_slice());
	let count = count(&clusters);
	let selected = mode.select(&clusters, count);
	to_extracted_colors(&selected, clusters.total_size())
}

/// Extract colors from an RGBA8 pixel buffer
///
/// With [`ColorCount::Auto`], the count is chosen by [`pick_auto_color_count`]
/// using the options of the given [`ExtractionMode`].
#[must_use]
pub fn extract_colors(pixels: &[u8], count: ColorCount, mode: ExtractionMode) -> Vec<ExtractedColor> {
	match count {
		ColorCount::Auto => extract_colors_auto(pixels, mode, mode.auto_count_options()),
		ColorCount::Exact(0) => Vec::new(),
		ColorCount::Exact(n) => extract_with(pixels, mode.candidate_count(n), |_| n, mode),
	}
}

/// Extract an automatically chosen number of colors from an RGBA8 pixel buffer
///
/// Candidates are computed for `options.max` colors, and then [`pick_auto_color_count`] picks the final count.
#[must_use]
pub fn extract_colors_auto(pixels: &[u8], mode: ExtractionMode, options: AutoCountOptions) -> Vec<ExtractedColor> {
	extract_with(
		pixels,
		mode.candidate_count(options.max),
		|clusters| pick_auto_color_count(&clusters.cluster_sizes, options),
		mode,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn pixels(colors: &[([u8; 3], usize)]) -> Vec<u8> {
		colors
			.iter()
			.flat_map(|&([r, g, b], n)| std::iter::repeat([r, g, b, 255]).take(n).flatten())
			.collect()
	}

	#[test]
	fn auto_count_reaches_coverage() {
		let options = AutoCountOptions { coverage_pct: 90.0, min: 1, max: 4 };
		assert_eq!(pick_auto_color_count(&[60, 25, 10, 5], options), 3);
	}

	#[test]
	fn auto_count_is_clamped() {
		let sizes = [97, 1, 1, 1];
		assert_eq!(pick_auto_color_count(&sizes, AutoCountOptions { coverage_pct: 50.0, min: 2, max: 4 }), 2);
		assert_eq!(pick_auto_color_count(&sizes, AutoCountOptions { coverage_pct: 100.0, min: 1, max: 3 }), 3);

		// min and max are limited by the number of clusters
		assert_eq!(pick_auto_color_count(&[10, 5], AutoCountOptions::default()), 2);
	}

	#[test]
	fn auto_count_of_nothing_is_zero() {
		assert_eq!(pick_auto_color_count(&[], AutoCountOptions::default()), 0);
		assert_eq!(pick_auto_color_count(&[0, 0, 0], AutoCountOptions::default()), 0);
	}

	#[test]
	fn distinct_mode_extracts_more_candidates() {
		assert_eq!(ExtractionMode::Dominant.candidate_count(5), 5);
		assert_eq!(ExtractionMode::Distinct.candidate_count(5), 10);
		assert_eq!(ExtractionMode::Distinct.candidate_count(40), 64);
		assert_eq!(ExtractionMode::Distinct.candidate_count(100), 100);
	}

	#[test]
	fn coverage_is_share_of_total() {
		let selected = DominantColors {
			colors: vec!["rgb(1, 2, 3)".into(), "rgb(9, 8, 7)".into()],
			cluster_sizes: vec![5, 3],
		};

		let colors = to_extracted_colors(&selected, 8);
		assert_eq!(colors[0].rgb_string, "rgb(1, 2, 3)");
		assert_relative_eq!(colors[0].coverage_pct, 62.5);
		assert_relative_eq!(colors[1].coverage_pct, 37.5);

		let colors = to_extracted_colors(&selected, 16);
		assert_relative_eq!(colors[0].coverage_pct, 31.25);

		assert!(to_extracted_colors(&selected, 0).iter().all(|color| color.coverage_pct == 0.0));
	}

	#[test]
	fn zero_colors_requested() {
		let pixels = pixels(&[([255, 0, 0], 4)]);
		assert!(extract_colors(&pixels, ColorCount::Exact(0), ExtractionMode::Dominant).is_empty());
		assert!(extract_colors(&pixels, ColorCount::Exact(0), ExtractionMode::Distinct).is_empty());
	}

	#[test]
	fn dominant_extraction_keeps_largest() {
		let pixels = pixels(&[([255, 0, 0], 4), ([0, 0, 255], 2)]);
		let colors = extract_colors(&pixels, ColorCount::Exact(2), ExtractionMode::Dominant);

		assert_eq!(colors.len(), 2);
		assert_eq!(colors[0].rgb_string, "rgb(255, 0, 0)");
		assert_eq!(colors[1].rgb_string, "rgb(0, 0, 255)");
		assert_relative_eq!(colors[0].coverage_pct, 400.0 / 6.0);
		assert_relative_eq!(colors[1].coverage_pct, 200.0 / 6.0);
	}

	#[test]
	fn distinct_extraction_skips_near_duplicates() {
		let pixels = pixels(&[([0, 0, 0], 6), ([20, 20, 20], 5), ([255, 255, 0], 1)]);

		let colors = extract_colors(&pixels, ColorCount::Exact(2), ExtractionMode::Distinct);
		let strings = colors.iter().map(|color| color.rgb_string.as_str()).collect::<Vec<_>>();
		assert_eq!(strings, ["rgb(0, 0, 0)", "rgb(255, 255, 0)"]);

		// coverage is relative to every visible pixel, not just the selected ones
		assert_relative_eq!(colors[0].coverage_pct, 50.0);
		assert_relative_eq!(colors[1].coverage_pct, 100.0 / 12.0);
	}

	#[test]
	fn auto_extraction_covers_whole_image() {
		let pixels = pixels(&[([0, 0, 0], 50), ([255, 255, 255], 30), ([255, 0, 0], 20)]);
		let colors = extract_colors(&pixels, ColorCount::Auto, ExtractionMode::Dominant);

		// the minimum of 5 is met with empty clusters
		assert_eq!(colors.len(), 5);
		assert_eq!(colors[0].rgb_string, "rgb(0, 0, 0)");
		assert_relative_eq!(colors[0].coverage_pct, 50.0);
		assert!(colors[3..].iter().all(|color| color.coverage_pct == 0.0));

		let total = colors.iter().map(|color| color.coverage_pct).sum::<f64>();
		assert_relative_eq!(total, 100.0, epsilon = 1e-9);
	}

	#[test]
	fn auto_extraction_with_custom_options() {
		let pixels = pixels(&[([0, 0, 0], 50), ([255, 255, 255], 30), ([255, 0, 0], 20)]);
		let options = AutoCountOptions { coverage_pct: 75.0, min: 1, max: 3 };
		let colors = extract_colors_auto(&pixels, ExtractionMode::Dominant, options);

		assert_eq!(colors.len(), 2);
		assert_eq!(colors[0].rgb_string, "rgb(0, 0, 0)");
		assert_eq!(colors[1].rgb_string, "rgb(255, 255, 255)");
	}

	#[test]
	fn transparent_image_gives_no_colors() {
		let pixels = [0u8, 0, 0, 0].repeat(16);
		assert!(extract_colors(&pixels, ColorCount::Auto, ExtractionMode::Distinct).is_empty());
		assert!(extract_colors(&pixels, ColorCount::Exact(3), ExtractionMode::Dominant).is_empty());
	}
}
