//! Provides the implementation for dominant color extraction using k-means
//!
//! Everything here is deterministic: the initial centroids are chosen by farthest-point seeding,
//! a fixed number of iterations is run, and large images are subsampled with a fixed integer hash.

use crate::convert::to_rgb_string;
use palette::{rgb::channels, Srgb, Srgba};
use std::collections::HashMap;

/// The number of pixels above which the k-means samples are thinned out
pub const MAX_SAMPLE_PIXELS: usize = 120_000;

/// Pixels with an alpha below this are ignored entirely
pub const MIN_ALPHA: u8 = 128;

/// The number of k-means iterations that are always run
pub const KMEANS_ITERATIONS: u32 = 10;

/// Multiplicative hash constant (Knuth) used to choose which pixels are sampled
const HASH_MULTIPLIER: u32 = 2_654_435_761;

/// A color with unrounded channels in the range `0.0..=255.0`
type Rgb = Srgb<f64>;

/// Deduplicated sRGB colors, in the order they were first encountered
#[derive(Debug, Clone, Default)]
struct ColorCounts {
	/// Unique colors
	colors: Vec<Srgb<u8>>,
	/// The number of pixels for each color
	counts: Vec<u32>,
	/// Packed sRGB -> index into `colors`
	memo: HashMap<u32, u32>,
}

impl ColorCounts {
	/// Record one more pixel of the given color
	fn push(&mut self, color: Srgb<u8>) {
		let key = color.into_u32::<channels::Rgba>();
		let index = *self.memo.entry(key).or_insert_with(|| {
			// there are only (2^8)^3 < u32::MAX possible sRGB colors
			#[allow(clippy::cast_possible_truncation)]
			let index = self.colors.len() as u32;

			self.colors.push(color);
			self.counts.push(0);
			index
		});

		self.counts[index as usize] += 1;
	}

	/// The number of unique colors
	fn num_colors(&self) -> usize {
		self.colors.len()
	}

	/// The total number of pixels
	fn num_pixels(&self) -> u64 {
		self.counts.iter().copied().map(u64::from).sum()
	}

	/// Iterate over each color and its count
	fn pairs(&self) -> impl Iterator<Item = (Rgb, u32)> + '_ {
		self.colors.iter().map(|&color| to_float(color)).zip(self.counts.iter().copied())
	}
}

/// A k-means cluster of pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
	/// The average color of the cluster, with unrounded channels in the range `0.0..=255.0`
	pub centroid: Srgb<f64>,
	/// The number of visible pixels in the whole image closest to this centroid
	pub size: u32,
}

/// Colors ranked by cluster size, each as a `rgb(r, g, b)` string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DominantColors {
	/// The color of each cluster
	pub colors: Vec<String>,
	/// The number of pixels in each cluster
	pub cluster_sizes: Vec<u32>,
}

impl DominantColors {
	/// Create a [`DominantColors`] with no colors
	#[must_use]
	pub const fn empty() -> Self {
		Self { colors: Vec::new(), cluster_sizes: Vec::new() }
	}

	/// The number of colors
	#[must_use]
	pub fn len(&self) -> usize {
		self.colors.len()
	}

	/// Whether there are no colors
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}

	/// The sum of all the cluster sizes
	#[must_use]
	pub fn total_size(&self) -> u64 {
		self.cluster_sizes.iter().copied().map(u64::from).sum()
	}
}

impl From<&[Cluster]> for DominantColors {
	fn from(clusters: &[Cluster]) -> Self {
		Self {
			colors: clusters.iter().map(|cluster| to_rgb_string(to_bytes(cluster.centroid))).collect(),
			cluster_sizes: clusters.iter().map(|cluster| cluster.size).collect(),
		}
	}
}

/// Widen an 8-bit color without rescaling
fn to_float(color: Srgb<u8>) -> Rgb {
	Srgb::new(f64::from(color.red), f64::from(color.green), f64::from(color.blue))
}

/// Round and clamp a single channel to a byte
fn clamp_to_byte(value: f64) -> u8 {
	// clamped to the u8 range beforehand
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	{
		value.round().clamp(0.0, 255.0) as u8
	}
}

/// Round and clamp a centroid to an 8-bit color
fn to_bytes(color: Rgb) -> Srgb<u8> {
	Srgb::new(clamp_to_byte(color.red), clamp_to_byte(color.green), clamp_to_byte(color.blue))
}

/// Squared euclidean distance in sRGB
fn squared_distance(x: Rgb, y: Rgb) -> f64 {
	let dr = x.red - y.red;
	let dg = x.green - y.green;
	let db = x.blue - y.blue;
	dr * dr + dg * dg + db * db
}

/// Whether the pixel at `index` is part of the k-means sample
fn is_sampled(index: usize, stride: usize) -> bool {
	if stride <= 1 {
		return true;
	}

	// only the low 32 bits of the product matter
	#[allow(clippy::cast_possible_truncation)]
	let hash = (index as u32).wrapping_mul(HASH_MULTIPLIER);

	hash as usize % stride == 0
}

/// Collect the sampled pixels and all the visible pixels
fn collect_pixels(pixels: &[Srgba<u8>]) -> (ColorCounts, ColorCounts) {
	let stride = usize::max(1, pixels.len() / MAX_SAMPLE_PIXELS);
	let mut samples = ColorCounts::default();
	let mut visible = ColorCounts::default();

	for (i, pixel) in pixels.iter().enumerate() {
		if pixel.alpha < MIN_ALPHA {
			continue;
		}

		visible.push(pixel.color);
		if is_sampled(i, stride) {
			samples.push(pixel.color);
		}
	}

	(samples, visible)
}

/// The index of the closest centroid, preferring the first on ties
fn nearest_centroid(color: Rgb, centroids: &[Rgb]) -> usize {
	let mut min_center = 0;
	let mut min_dist = f64::INFINITY;
	for (i, &centroid) in centroids.iter().enumerate() {
		let dist = squared_distance(color, centroid);
		if dist < min_dist {
			min_dist = dist;
			min_center = i;
		}
	}
	min_center
}

/// The index of the color with the largest distance, preferring the first on ties
fn farthest(distances: impl Iterator<Item = f64>) -> usize {
	let mut max_index = 0;
	let mut max_dist = -1.0;
	for (i, dist) in distances.enumerate() {
		if dist > max_dist {
			max_dist = dist;
			max_index = i;
		}
	}
	max_index
}

/// Choose the starting centroids by farthest-point seeding
///
/// The first centroid is the sample farthest from the mean of all samples,
/// and each next centroid is the sample farthest from all centroids chosen so far.
fn initial_centroids(samples: &ColorCounts, k: usize) -> Vec<Rgb> {
	let mut centroids = Vec::with_capacity(k);
	let colors = samples.pairs().map(|(color, _)| color).collect::<Vec<_>>();

	#[allow(clippy::cast_precision_loss)]
	let n = samples.num_pixels() as f64;
	let mut sum = Srgb::new(0.0, 0.0, 0.0);
	for (color, count) in samples.pairs() {
		let count = f64::from(count);
		sum.red += count * color.red;
		sum.green += count * color.green;
		sum.blue += count * color.blue;
	}
	let mean = Srgb::new(sum.red / n, sum.green / n, sum.blue / n);

	let first = colors[farthest(colors.iter().map(|&color| squared_distance(color, mean)))];
	centroids.push(first);

	let mut min_distances = colors
		.iter()
		.map(|&color| squared_distance(color, first))
		.collect::<Vec<_>>();

	while centroids.len() < k {
		let next = colors[farthest(min_distances.iter().copied())];
		centroids.push(next);

		for (min_dist, &color) in min_distances.iter_mut().zip(&colors) {
			*min_dist = f64::min(*min_dist, squared_distance(color, next));
		}
	}

	centroids
}

/// Data for each center/centroid
struct CenterData {
	/// The centroid point
	centroid: Vec<Rgb>,
	/// Vector sum for all samples in this center
	sum: Vec<Rgb>,
	/// Number of samples in this center
	count: Vec<u32>,
}

impl CenterData {
	/// Create a [`CenterData`] from the initial centroids
	fn new(centroid: Vec<Rgb>) -> Self {
		let k = centroid.len();
		Self {
			centroid,
			sum: vec![Srgb::new(0.0, 0.0, 0.0); k],
			count: vec![0; k],
		}
	}
}

/// Assign each sample to its closest center, recomputing the center sums from scratch
fn update_assignments(samples: &ColorCounts, centers: &mut CenterData) {
	centers.sum.fill(Srgb::new(0.0, 0.0, 0.0));
	centers.count.fill(0);

	for (color, n) in samples.pairs() {
		let i = nearest_centroid(color, &centers.centroid);
		let nf = f64::from(n);
		let sum = &mut centers.sum[i];
		sum.red += nf * color.red;
		sum.green += nf * color.green;
		sum.blue += nf * color.blue;
		centers.count[i] += n;
	}
}

/// Move each centroid to the mean of its samples
///
/// A centroid without any samples is left where it is.
fn update_centroids(centers: &mut CenterData) {
	for ((centroid, &n), sum) in centers.centroid.iter_mut().zip(&centers.count).zip(&centers.sum) {
		if n > 0 {
			let n = f64::from(n);
			*centroid = Srgb::new(sum.red / n, sum.green / n, sum.blue / n);
		}
	}
}

/// Count how many visible pixels are closest to each centroid
#[cfg(not(feature = "threads"))]
fn cluster_sizes(visible: &ColorCounts, centroids: &[Rgb]) -> Vec<u32> {
	let mut sizes = vec![0; centroids.len()];
	for (color, n) in visible.pairs() {
		sizes[nearest_centroid(color, centroids)] += n;
	}
	sizes
}

/// Count how many visible pixels are closest to each centroid
#[cfg(feature = "threads")]
fn cluster_sizes(visible: &ColorCounts, centroids: &[Rgb]) -> Vec<u32> {
	use rayon::prelude::*;

	let k = centroids.len();
	let num_colors = visible.num_colors();
	visible
		.colors
		.par_iter()
		.with_min_len(usize::max(1, num_colors / rayon::current_num_threads()))
		.zip(&visible.counts)
		.fold(
			|| vec![0; k],
			|mut sizes, (&color, &n)| {
				sizes[nearest_centroid(to_float(color), centroids)] += n;
				sizes
			},
		)
		.reduce(
			|| vec![0; k],
			|mut sizes, other| {
				for (size, n) in sizes.iter_mut().zip(other) {
					*size += n;
				}
				sizes
			},
		)
}

/// Order clusters by descending size, then by ascending red, green, and blue
fn sort_clusters(clusters: &mut [Cluster]) {
	clusters.sort_by(|x, y| {
		y.size
			.cmp(&x.size)
			.then_with(|| f64::total_cmp(&x.centroid.red, &y.centroid.red))
			.then_with(|| f64::total_cmp(&x.centroid.green, &y.centroid.green))
			.then_with(|| f64::total_cmp(&x.centroid.blue, &y.centroid.blue))
	});
}

/// Run k-means over an RGBA8 pixel buffer, returning the ranked clusters
///
/// A trailing partial pixel is ignored.
/// No clusters are returned if `k` is 0 or no pixel is visible.
/// Clusters without any pixels are kept.
#[must_use]
pub fn run(pixels: &[u8], k: usize) -> Vec<Cluster> {
	let len = pixels.len() / 4 * 4;
	if len == 0 || k == 0 {
		return Vec::new();
	}

	let pixels: &[Srgba<u8>] = palette::cast::from_component_slice(&pixels[..len]);
	let (samples, visible) = collect_pixels(pixels);

	let num_samples = samples.num_pixels();
	if num_samples == 0 {
		return Vec::new();
	}

	let k = usize::try_from(num_samples).map_or(k, |n| usize::min(k, n));
	let mut centers = CenterData::new(initial_centroids(&samples, k));

	for _ in 0..KMEANS_ITERATIONS {
		update_assignments(&samples, &mut centers);
		update_centroids(&mut centers);
	}

	let sizes = cluster_sizes(&visible, &centers.centroid);
	let mut clusters = centers
		.centroid
		.into_iter()
		.zip(sizes)
		.map(|(centroid, size)| Cluster { centroid, size })
		.collect::<Vec<_>>();

	sort_clusters(&mut clusters);
	clusters
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pixels(colors: &[([u8; 3], u8, usize)]) -> Vec<u8> {
		let mut pixels = Vec::new();
		for &([r, g, b], a, n) in colors {
			for _ in 0..n {
				pixels.extend_from_slice(&[r, g, b, a]);
			}
		}
		pixels
	}

	fn dominant(pixels: &[u8], k: usize) -> DominantColors {
		DominantColors::from(run(pixels, k).as_slice())
	}

	#[test]
	fn empty_inputs_give_no_clusters() {
		assert!(run(&[], 0).is_empty());
		assert!(run(&[], 3).is_empty());
		assert!(run(&pixels(&[([255, 0, 0], 255, 4)]), 0).is_empty());
		assert!(run(&[255, 0, 0], 2).is_empty());
	}

	#[test]
	fn sorted_by_cluster_size() {
		let pixels = pixels(&[([255, 0, 0], 255, 4), ([0, 0, 255], 255, 2)]);
		let result = dominant(&pixels, 2);
		assert_eq!(result.colors, ["rgb(255, 0, 0)", "rgb(0, 0, 255)"]);
		assert_eq!(result.cluster_sizes, [4, 2]);
	}

	#[test]
	fn ties_broken_by_red_then_green_then_blue() {
		let red = dominant(&pixels(&[([200, 20, 30], 255, 1), ([10, 20, 30], 255, 1)]), 2);
		assert_eq!(red.colors, ["rgb(10, 20, 30)", "rgb(200, 20, 30)"]);
		assert_eq!(red.cluster_sizes, [1, 1]);

		let green = dominant(&pixels(&[([10, 200, 30], 255, 1), ([10, 20, 30], 255, 1)]), 2);
		assert_eq!(green.colors, ["rgb(10, 20, 30)", "rgb(10, 200, 30)"]);

		let blue = dominant(&pixels(&[([10, 20, 200], 255, 1), ([10, 20, 30], 255, 1)]), 2);
		assert_eq!(blue.colors, ["rgb(10, 20, 30)", "rgb(10, 20, 200)"]);
	}

	#[test]
	fn empty_clusters_are_kept() {
		let result = dominant(&pixels(&[([50, 50, 50], 255, 2)]), 2);
		assert_eq!(result.colors, ["rgb(50, 50, 50)", "rgb(50, 50, 50)"]);
		assert_eq!(result.cluster_sizes, [2, 0]);
	}

	#[test]
	fn k_is_limited_by_the_number_of_samples() {
		let result = run(&pixels(&[([1, 2, 3], 255, 2)]), 8);
		assert_eq!(result.len(), 2);
	}

	#[test]
	fn transparent_pixels_are_ignored() {
		let mixed = pixels(&[([255, 0, 0], 255, 1), ([0, 255, 0], 0, 1), ([255, 0, 0], 255, 1)]);
		let result = dominant(&mixed, 1);
		assert_eq!(result.colors, ["rgb(255, 0, 0)"]);
		assert_eq!(result.cluster_sizes, [2]);

		let translucent = pixels(&[([0, 0, 0], MIN_ALPHA - 1, 3), ([0, 0, 0], MIN_ALPHA, 1)]);
		assert_eq!(dominant(&translucent, 1).cluster_sizes, [1]);
	}

	#[test]
	fn fully_transparent_gives_no_clusters() {
		assert!(run(&pixels(&[([0, 0, 0], 0, 2)]), 3).is_empty());
	}

	#[test]
	fn trailing_partial_pixel_is_ignored() {
		let mut pixels = pixels(&[([9, 9, 9], 255, 3)]);
		pixels.extend_from_slice(&[255, 255, 255]);
		let result = dominant(&pixels, 2);
		assert_eq!(result.cluster_sizes, [3, 0]);
	}

	#[test]
	fn large_images_are_sampled_but_fully_counted() {
		let total = 2 * MAX_SAMPLE_PIXELS;
		let pixels = pixels(&[([10, 20, 30], 255, total)]);
		let result = dominant(&pixels, 1);
		assert_eq!(result.colors, ["rgb(10, 20, 30)"]);
		assert_eq!(result.cluster_sizes, [u32::try_from(total).unwrap_or(u32::MAX)]);
	}

	#[test]
	fn hashed_sampling_picks_every_stride_on_average() {
		assert!((0..100).all(|i| is_sampled(i, 1)));

		// the multiplier is odd, so the hash keeps the parity of the index
		let sampled = (0..1000).filter(|&i| is_sampled(i, 2)).count();
		assert_eq!(sampled, 500);
	}

	#[test]
	fn color_counts_merge_duplicates_in_encounter_order() {
		let mut counts = ColorCounts::default();
		for color in [Srgb::new(1, 1, 1), Srgb::new(2, 2, 2), Srgb::new(1, 1, 1)] {
			counts.push(color);
		}
		assert_eq!(counts.colors, [Srgb::new(1, 1, 1), Srgb::new(2, 2, 2)]);
		assert_eq!(counts.counts, [2, 1]);
		assert_eq!(counts.num_pixels(), 3);
	}

	#[test]
	fn first_centroid_is_farthest_from_mean() {
		let mut samples = ColorCounts::default();
		for _ in 0..4 {
			samples.push(Srgb::new(255, 0, 0));
		}
		for _ in 0..2 {
			samples.push(Srgb::new(0, 0, 255));
		}

		let centroids = initial_centroids(&samples, 2);
		assert_eq!(centroids, [Srgb::new(0.0, 0.0, 255.0), Srgb::new(255.0, 0.0, 0.0)]);
	}

	#[test]
	fn cluster_sizes_sum_to_visible_pixels() {
		let pixels = pixels(&[
			([0, 0, 0], 255, 7),
			([128, 64, 32], 255, 5),
			([250, 250, 250], 255, 3),
			([12, 200, 90], 10, 9),
			([30, 30, 30], 255, 2),
		]);

		let clusters = run(&pixels, 3);
		assert_eq!(clusters.iter().map(|c| c.size).sum::<u32>(), 17);
	}

	#[test]
	fn repeated_runs_are_identical() {
		let pixels = (0..4096u32)
			.flat_map(|i| {
				#[allow(clippy::cast_possible_truncation)]
				let [a, b, c, _] = i.wrapping_mul(2_246_822_519).to_le_bytes();
				[a, b, c, 255]
			})
			.collect::<Vec<_>>();

		assert_eq!(run(&pixels, 6), run(&pixels, 6));
	}

	#[test]
	fn near_duplicates_are_separate_clusters() {
		let pixels = pixels(&[([0, 0, 0], 255, 6), ([20, 20, 20], 255, 5), ([255, 255, 0], 255, 1)]);
		let result = dominant(&pixels, 3);
		assert_eq!(result.colors, ["rgb(0, 0, 0)", "rgb(20, 20, 20)", "rgb(255, 255, 0)"]);
		assert_eq!(result.cluster_sizes, [6, 5, 1]);
	}
}
