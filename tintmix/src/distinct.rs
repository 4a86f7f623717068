//! Greedy selection of perceptually distinct colors from ranked clusters

use crate::{
	convert::{delta_e94, rgb_string_to_rgb, rgb_to_lab, Lab},
	kmeans::DominantColors,
};

/// Distances closer than this are considered equal
const DISTANCE_EPSILON: f64 = 1e-6;

/// A cluster that can be selected
struct Candidate<'a> {
	/// Position in the input lists
	index: usize,
	/// The color string from the input
	color: &'a str,
	/// The cluster size
	size: u32,
	/// The color converted to Lab
	lab: Lab,
}

/// The smallest CIE94 distance from `candidate` to any of the `selected` candidates
fn min_distance(candidate: &Candidate, selected: &[&Candidate]) -> f64 {
	selected
		.iter()
		.map(|picked| delta_e94(candidate.lab, picked.lab))
		.fold(f64::INFINITY, f64::min)
}

/// Whether `candidate` should replace `best` as the next selection
fn is_better(candidate: &Candidate, distance: f64, best: &Candidate, best_distance: f64) -> bool {
	if distance > best_distance + DISTANCE_EPSILON {
		true
	} else if (distance - best_distance).abs() <= DISTANCE_EPSILON {
		candidate.size > best.size || (candidate.size == best.size && candidate.index < best.index)
	} else {
		false
	}
}

/// Select `count` colors that are far apart from each other in Lab space
///
/// `colors` and `cluster_sizes` are parallel lists, as returned by [`crate::extract_dominant_colors`].
/// A missing size counts as 0, and colors with a size of 0 are never selected.
///
/// The largest cluster is always selected first (the lowest index wins ties).
/// Then, each round adds the remaining color with the greatest CIE94 distance to its nearest selected color.
/// Distances within `1e-6` are tied, in which case the larger cluster and then the lower index is preferred.
///
/// If `count` is at least the number of selectable colors,
/// all of them are returned ordered by size descending and then index ascending.
/// Otherwise, the colors are returned in the order they were selected.
#[must_use]
pub fn select_distinct_colors<S: AsRef<str>>(colors: &[S], cluster_sizes: &[u32], count: usize) -> DominantColors {
	if colors.is_empty() || count == 0 {
		return DominantColors::empty();
	}

	let candidates = colors
		.iter()
		.enumerate()
		.map(|(index, color)| {
			let color = color.as_ref();
			Candidate {
				index,
				color,
				size: cluster_sizes.get(index).copied().unwrap_or(0),
				lab: rgb_to_lab(rgb_string_to_rgb(color)),
			}
		})
		.filter(|candidate| candidate.size > 0)
		.collect::<Vec<_>>();

	let Some(largest) = candidates
		.iter()
		.min_by(|x, y| y.size.cmp(&x.size).then(x.index.cmp(&y.index)))
	else {
		return DominantColors::empty();
	};

	if count >= candidates.len() {
		let mut ranked = candidates.iter().collect::<Vec<_>>();
		ranked.sort_by(|x, y| y.size.cmp(&x.size).then(x.index.cmp(&y.index)));
		return collect_selection(&ranked);
	}

	let mut selected = vec![largest];
	while selected.len() < count {
		let remaining = candidates
			.iter()
			.filter(|candidate| selected.iter().all(|picked| picked.index != candidate.index))
			.collect::<Vec<_>>();

		let Some((&last, rest)) = remaining.split_last() else {
			break;
		};

		let mut best = last;
		let mut best_distance = min_distance(best, &selected);

		for &candidate in rest.iter().rev() {
			let distance = min_distance(candidate, &selected);
			if is_better(candidate, distance, best, best_distance) {
				best = candidate;
				best_distance = distance;
			}
		}

		selected.push(best);
	}

	collect_selection(&selected)
}

/// Convert the selected candidates back into parallel lists
fn collect_selection(selected: &[&Candidate]) -> DominantColors {
	DominantColors {
		colors: selected.iter().map(|candidate| candidate.color.to_owned()).collect(),
		cluster_sizes: selected.iter().map(|candidate| candidate.size).collect(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BLACK: &str = "rgb(0, 0, 0)";
	const NEAR_BLACK: &str = "rgb(20, 20, 20)";
	const YELLOW: &str = "rgb(255, 255, 0)";
	const WHITE: &str = "rgb(255, 255, 255)";

	#[test]
	fn nothing_to_select() {
		assert!(select_distinct_colors::<&str>(&[], &[], 3).is_empty());
		assert!(select_distinct_colors(&[BLACK], &[1], 0).is_empty());
		assert!(select_distinct_colors(&[BLACK, WHITE], &[0, 0], 1).is_empty());
		assert!(select_distinct_colors(&[BLACK, WHITE], &[], 1).is_empty());
	}

	#[test]
	fn prefers_distant_colors_over_large_clusters() {
		let result = select_distinct_colors(&[BLACK, NEAR_BLACK, YELLOW], &[6, 5, 1], 2);
		assert_eq!(result.colors, [BLACK, YELLOW]);
		assert_eq!(result.cluster_sizes, [6, 1]);
	}

	#[test]
	fn largest_cluster_is_selected_first() {
		let result = select_distinct_colors(&[NEAR_BLACK, YELLOW, BLACK], &[5, 1, 6], 1);
		assert_eq!(result.colors, [BLACK]);
		assert_eq!(result.cluster_sizes, [6]);

		let tied = select_distinct_colors(&[NEAR_BLACK, YELLOW, BLACK], &[6, 1, 6], 1);
		assert_eq!(tied.colors, [NEAR_BLACK]);
	}

	#[test]
	fn returns_all_candidates_by_size_when_count_is_large() {
		let result = select_distinct_colors(&[YELLOW, BLACK, WHITE, NEAR_BLACK], &[2, 7, 2, 0], 10);
		assert_eq!(result.colors, [BLACK, YELLOW, WHITE]);
		assert_eq!(result.cluster_sizes, [7, 2, 2]);
	}

	#[test]
	fn missing_sizes_count_as_zero() {
		let result = select_distinct_colors(&[BLACK, WHITE, YELLOW], &[3, 1], 3);
		assert_eq!(result.colors, [BLACK, WHITE]);
		assert_eq!(result.cluster_sizes, [3, 1]);
	}

	#[test]
	fn equal_distances_prefer_larger_clusters() {
		let result = select_distinct_colors(&[WHITE, BLACK, BLACK], &[10, 3, 4], 2);
		assert_eq!(result.colors, [WHITE, BLACK]);
		assert_eq!(result.cluster_sizes, [10, 4]);
	}

	#[test]
	fn equal_distances_and_sizes_prefer_lower_index() {
		// unrecognized strings are treated as black
		let result = select_distinct_colors(&[WHITE, BLACK, "black"], &[10, 3, 3], 2);
		assert_eq!(result.colors, [WHITE, BLACK]);

		let result = select_distinct_colors(&[WHITE, "black", BLACK], &[10, 3, 3], 2);
		assert_eq!(result.colors, [WHITE, "black"]);
	}

	#[test]
	fn selection_order_is_kept() {
		let colors = [NEAR_BLACK, "rgb(250, 250, 250)", BLACK, "rgb(0, 0, 255)"];
		let result = select_distinct_colors(&colors, &[9, 8, 7, 1], 3);
		assert_eq!(result.colors[0], NEAR_BLACK);
		assert_eq!(result.colors[1], "rgb(250, 250, 250)");
		assert_eq!(result.colors.len(), 3);
	}
}
