//! Searching a palette for the paint mixture closest to a target color
//!
//! Every combination of up to three paints is tried with every integer ratio of parts
//! up to a maximum total. Each mixture is predicted with a [`PigmentMixer`],
//! and the mixture with the smallest CIE94 distance to the target is returned.

use crate::{
	convert::{delta_e94, parse_color, rgb_to_lab, to_rgb_string, Lab},
	mixer::{mix_latents, Latent, PigmentMixer, LATENT_DIMENSIONS},
	paint::BasePaint,
};
use palette::Srgb;

/// The default maximum number of paints in a recipe
pub const DEFAULT_MAX_COLORS: usize = 3;

/// The default maximum total number of parts in a recipe
pub const DEFAULT_MAX_TOTAL_PARTS: u32 = 10;

/// Palettes with more paints than this are first narrowed down to the paints closest to the target
pub const LARGE_PALETTE_THRESHOLD: usize = 25;

/// The number of paints kept when narrowing down a large palette
pub const MAX_CANDIDATE_PAINTS: usize = 12;

/// Differences in distance up to this are considered ties
const TIE_EPSILON: f64 = 1e-6;

/// Options for [`suggest_recipe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOptions {
	/// The maximum number of paints in a recipe (at most 3 are ever used)
	pub max_colors: usize,
	/// The maximum total number of parts in a recipe (at least 1)
	pub max_total_parts: u32,
}

impl Default for RecipeOptions {
	fn default() -> Self {
		Self {
			max_colors: DEFAULT_MAX_COLORS,
			max_total_parts: DEFAULT_MAX_TOTAL_PARTS,
		}
	}
}

/// A number of parts of one paint in a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ingredient {
	/// The index of the paint in the palette given to the search
	pub index: usize,
	/// The number of parts, at least 1
	pub parts: u32,
}

/// The best recipe found for a target color
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RecipeSuggestion {
	/// The paints in the recipe and their parts
	pub ingredients: Vec<Ingredient>,
	/// The predicted color of the mixture as `rgb(r, g, b)`
	pub result_rgb: String,
	/// The CIE94 distance from the mixture to the target
	pub delta_e: f64,
	/// `100 - delta_e`, clamped to `0.0..=100.0`
	pub match_pct: f64,
}

impl RecipeSuggestion {
	/// The total number of parts in the recipe
	#[must_use]
	pub fn total_parts(&self) -> u32 {
		self.ingredients.iter().map(|ingredient| ingredient.parts).sum()
	}
}

/// The match percentage for a CIE94 distance
#[must_use]
pub fn match_pct_from_delta_e(delta_e: f64) -> f64 {
	(100.0 - delta_e).clamp(0.0, 100.0)
}

/// The state of a recipe search for one target
struct Search<'a, M: ?Sized> {
	/// The latent vector of each paint, `None` if the mixer does not support it
	latents: &'a [Option<Latent>],
	/// The mixer used to predict mixtures
	mixer: &'a M,
	/// The target color in Lab
	target: Lab,
	/// The best candidate so far
	best: Option<RecipeSuggestion>,
}

impl<'a, M: PigmentMixer + ?Sized> Search<'a, M> {
	/// Create a new [`Search`] with no best candidate
	fn new(latents: &'a [Option<Latent>], mixer: &'a M, target: Lab) -> Self {
		Self { latents, mixer, target, best: None }
	}

	/// Predict the result of a mixture, returning it along with its distance to the target
	fn evaluate(&self, ingredients: &[Ingredient]) -> Option<(Srgb<u8>, f64)> {
		let unused = [0.0; LATENT_DIMENSIONS];
		let mut weighted = [(&unused, 0); 3];
		for (slot, ingredient) in weighted.iter_mut().zip(ingredients) {
			*slot = (self.latents[ingredient.index].as_ref()?, ingredient.parts);
		}

		let latent = mix_latents(&weighted[..ingredients.len()])?;
		let result = self.mixer.from_latent(&latent);
		let delta_e = delta_e94(rgb_to_lab(result), self.target);
		Some((result, delta_e))
	}

	/// Evaluate a candidate recipe and keep it if it is better than the current best
	fn consider(&mut self, ingredients: &[Ingredient]) {
		let Some((result, delta_e)) = self.evaluate(ingredients) else {
			return;
		};

		let total_parts = ingredients.iter().map(|ingredient| ingredient.parts).sum();
		if self
			.best
			.as_ref()
			.map_or(true, |best| is_better(best, delta_e, ingredients.len(), total_parts))
		{
			self.best = Some(RecipeSuggestion {
				ingredients: ingredients.to_vec(),
				result_rgb: to_rgb_string(result),
				delta_e,
				match_pct: match_pct_from_delta_e(delta_e),
			});
		}
	}
}

/// Whether a candidate with the given distance, number of ingredients, and total parts
/// should replace the current best
///
/// A smaller distance wins. If the distances are tied,
/// fewer ingredients and then fewer total parts win. Otherwise, the earlier candidate is kept.
fn is_better(best: &RecipeSuggestion, delta_e: f64, num_ingredients: usize, total_parts: u32) -> bool {
	let gap = delta_e - best.delta_e;
	if gap < -TIE_EPSILON {
		true
	} else if gap.abs() <= TIE_EPSILON {
		let best_len = best.ingredients.len();
		num_ingredients < best_len || (num_ingredients == best_len && total_parts < best.total_parts())
	} else {
		false
	}
}

/// The indices of the paints to search, in search order
///
/// Large palettes are narrowed down to the paints closest to the target,
/// ordered by distance and then by index.
/// Paints that fail to parse are treated as black here.
fn candidate_indices(palette: &[BasePaint], target: Lab) -> Vec<usize> {
	if palette.len() <= LARGE_PALETTE_THRESHOLD {
		return (0..palette.len()).collect();
	}

	let mut scored = palette
		.iter()
		.enumerate()
		.map(|(i, paint)| {
			let rgb = parse_color(&paint.rgb_string).unwrap_or(Srgb::new(0, 0, 0));
			(delta_e94(rgb_to_lab(rgb), target), i)
		})
		.collect::<Vec<_>>();

	scored.sort_by(|(x, i), (y, j)| f64::total_cmp(x, y).then(i.cmp(j)));
	scored.into_iter().take(MAX_CANDIDATE_PAINTS).map(|(_, i)| i).collect()
}

/// Find the mixture of paints in `palette` that is closest to `target`
///
/// Single paints are tried first (always at 1 part),
/// then pairs with every split of 2 to `max_total_parts` total parts,
/// then triples with every split of 3 to `max_total_parts` total parts.
/// Paints that the mixer cannot convert are skipped.
///
/// `target` may be any color accepted by [`parse_color`]; anything else is treated as black.
///
/// Returns `None` if the palette is empty, `max_colors` is 0, or no paint is supported by the mixer.
#[must_use]
pub fn suggest_recipe<M: PigmentMixer + ?Sized>(
	palette: &[BasePaint],
	target: &str,
	mixer: &M,
	options: RecipeOptions,
) -> Option<RecipeSuggestion> {
	if palette.is_empty() || options.max_colors == 0 {
		return None;
	}

	let max_parts = u32::max(1, options.max_total_parts);
	let target = rgb_to_lab(parse_color(target).unwrap_or(Srgb::new(0, 0, 0)));

	let latents = palette
		.iter()
		.map(|paint| mixer.to_latent(&paint.rgb_string))
		.collect::<Vec<_>>();

	let active = candidate_indices(palette, target)
		.into_iter()
		.filter(|&i| latents[i].is_some())
		.collect::<Vec<_>>();

	if active.is_empty() {
		return None;
	}

	let mut search = Search::new(&latents, mixer, target);
	let ingredient = |index, parts| Ingredient { index, parts };

	for &a in &active {
		search.consider(&[ingredient(a, 1)]);
	}

	if options.max_colors >= 2 {
		for (i, &a) in active.iter().enumerate() {
			for &b in &active[(i + 1)..] {
				for total in 2..=max_parts {
					for parts_a in 1..total {
						search.consider(&[ingredient(a, parts_a), ingredient(b, total - parts_a)]);
					}
				}
			}
		}
	}

	if options.max_colors >= 3 {
		for (i, &a) in active.iter().enumerate() {
			for (j, &b) in active.iter().enumerate().skip(i + 1) {
				for &c in &active[(j + 1)..] {
					for total in 3..=max_parts {
						for parts_a in 1..=(total - 2) {
							for parts_b in 1..=(total - parts_a - 1) {
								search.consider(&[
									ingredient(a, parts_a),
									ingredient(b, parts_b),
									ingredient(c, total - parts_a - parts_b),
								]);
							}
						}
					}
				}
			}
		}
	}

	search.best
}

/// Find a recipe for each target color, see [`suggest_recipe`]
///
/// The suggestions are in the same order as `targets`.
#[cfg(not(feature = "threads"))]
#[must_use]
pub fn suggest_recipes<M, S>(
	palette: &[BasePaint],
	targets: &[S],
	mixer: &M,
	options: RecipeOptions,
) -> Vec<Option<RecipeSuggestion>>
where
	M: PigmentMixer + Sync + ?Sized,
	S: AsRef<str> + Sync,
{
	targets
		.iter()
		.map(|target| suggest_recipe(palette, target.as_ref(), mixer, options))
		.collect()
}

/// Find a recipe for each target color in parallel, see [`suggest_recipe`]
///
/// The suggestions are in the same order as `targets`.
#[cfg(feature = "threads")]
#[must_use]
pub fn suggest_recipes<M, S>(
	palette: &[BasePaint],
	targets: &[S],
	mixer: &M,
	options: RecipeOptions,
) -> Vec<Option<RecipeSuggestion>>
where
	M: PigmentMixer + Sync + ?Sized,
	S: AsRef<str> + Sync,
{
	use rayon::prelude::*;

	targets
		.par_iter()
		.map(|target| suggest_recipe(palette, target.as_ref(), mixer, options))
		.collect()
}
