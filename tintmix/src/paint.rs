//! Paints and the palette of paints being mixed
//!
//! A [`Palette`] is an immutable value: every edit returns a new palette.

use crate::{
	convert::{delta_e94, hex_key, parse_color, rgb_to_lab, to_rgb_string},
	error::{ColorError, SwatchError},
	mixer::{mix_latents, PigmentMixer},
	recipe::{match_pct_from_delta_e, RecipeSuggestion},
};
use palette::Srgb;

/// A paint straight from the tube
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasePaint {
	/// The display name
	pub label: String,
	/// The color of the paint
	pub rgb_string: String,
	/// The number of parts of this paint in the current mix
	pub parts_in_mix: u32,
}

impl BasePaint {
	/// Create a new [`BasePaint`] that is not part of the current mix
	pub fn new(label: impl Into<String>, rgb_string: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			rgb_string: rgb_string.into(),
			parts_in_mix: 0,
		}
	}
}

/// A paint that was saved from a mix of other paints
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MixedPaint {
	/// The display name
	pub label: String,
	/// The color of the mix
	pub rgb_string: String,
	/// The number of parts of this paint in the current mix
	pub parts_in_mix: u32,
	/// The paints and their parts that made up the mix when it was saved
	pub recipe: Vec<Paint>,
}

/// An entry in a [`Palette`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "PaintRecord", into = "PaintRecord"))]
pub enum Paint {
	/// A paint without a recipe
	Base(BasePaint),
	/// A paint with a recipe
	Mixed(MixedPaint),
}

impl Paint {
	/// Create a new [`Paint::Base`] that is not part of the current mix
	pub fn base(label: impl Into<String>, rgb_string: impl Into<String>) -> Self {
		Self::Base(BasePaint::new(label, rgb_string))
	}

	/// The display name
	#[must_use]
	pub fn label(&self) -> &str {
		match self {
			Self::Base(paint) => &paint.label,
			Self::Mixed(paint) => &paint.label,
		}
	}

	/// The color of the paint
	#[must_use]
	pub fn rgb_string(&self) -> &str {
		match self {
			Self::Base(paint) => &paint.rgb_string,
			Self::Mixed(paint) => &paint.rgb_string,
		}
	}

	/// The number of parts of this paint in the current mix
	#[must_use]
	pub const fn parts_in_mix(&self) -> u32 {
		match self {
			Self::Base(paint) => paint.parts_in_mix,
			Self::Mixed(paint) => paint.parts_in_mix,
		}
	}

	/// The recipe of a mixed paint
	#[must_use]
	pub fn recipe(&self) -> Option<&[Paint]> {
		match self {
			Self::Base(_) => None,
			Self::Mixed(paint) => Some(&paint.recipe),
		}
	}

	/// Whether this is a [`Paint::Base`]
	#[must_use]
	pub const fn is_base(&self) -> bool {
		matches!(self, Self::Base(_))
	}

	/// The `#rrggbb` key identifying the color of this paint
	///
	/// # Errors
	/// Returns an error if the color of the paint cannot be parsed.
	pub fn hex_key(&self) -> Result<String, ColorError> {
		hex_key(self.rgb_string())
	}

	/// Mutable access to the number of parts
	fn parts_mut(&mut self) -> &mut u32 {
		match self {
			Self::Base(paint) => &mut paint.parts_in_mix,
			Self::Mixed(paint) => &mut paint.parts_in_mix,
		}
	}

	/// Mutable access to the display name
	fn label_mut(&mut self) -> &mut String {
		match self {
			Self::Base(paint) => &mut paint.label,
			Self::Mixed(paint) => &mut paint.label,
		}
	}
}

/// The serialized form of a [`Paint`], where the presence of `recipe` selects [`Paint::Mixed`]
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaintRecord {
	/// See [`Paint::label`]
	label: String,
	/// See [`Paint::rgb_string`]
	rgb_string: String,
	/// See [`Paint::parts_in_mix`]
	#[serde(default)]
	parts_in_mix: u32,
	/// See [`Paint::recipe`]
	#[serde(default, skip_serializing_if = "Option::is_none")]
	recipe: Option<Vec<Paint>>,
}

#[cfg(feature = "serde")]
impl From<PaintRecord> for Paint {
	fn from(record: PaintRecord) -> Self {
		let PaintRecord { label, rgb_string, parts_in_mix, recipe } = record;
		match recipe {
			Some(recipe) => Self::Mixed(MixedPaint { label, rgb_string, parts_in_mix, recipe }),
			None => Self::Base(BasePaint { label, rgb_string, parts_in_mix }),
		}
	}
}

#[cfg(feature = "serde")]
impl From<Paint> for PaintRecord {
	fn from(paint: Paint) -> Self {
		match paint {
			Paint::Base(BasePaint { label, rgb_string, parts_in_mix }) => {
				Self { label, rgb_string, parts_in_mix, recipe: None }
			},
			Paint::Mixed(MixedPaint { label, rgb_string, parts_in_mix, recipe }) => {
				Self { label, rgb_string, parts_in_mix, recipe: Some(recipe) }
			},
		}
	}
}

/// An ordered list of paints
///
/// Deserializing goes through [`Palette::from_paints`], so duplicate colors are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Paint>", into = "Vec<Paint>"))]
pub struct Palette {
	/// The paints, with unique hex keys
	paints: Vec<Paint>,
}

impl From<Vec<Paint>> for Palette {
	fn from(paints: Vec<Paint>) -> Self {
		Self::from_paints(paints)
	}
}

impl From<Palette> for Vec<Paint> {
	fn from(palette: Palette) -> Self {
		palette.paints
	}
}

impl Palette {
	/// Create an empty palette
	#[must_use]
	pub const fn new() -> Self {
		Self { paints: Vec::new() }
	}

	/// Create a palette from a list of paints
	///
	/// Paints whose color has the same hex key as an earlier paint are dropped.
	/// Paints with a color that cannot be parsed are kept.
	pub fn from_paints(paints: impl IntoIterator<Item = Paint>) -> Self {
		let mut keys = std::collections::HashSet::new();
		let paints = paints
			.into_iter()
			.filter(|paint| paint.hex_key().map_or(true, |key| keys.insert(key)))
			.collect();

		Self { paints }
	}

	/// The paints in the palette
	#[must_use]
	pub fn paints(&self) -> &[Paint] {
		&self.paints
	}

	/// The number of paints
	#[must_use]
	pub fn len(&self) -> usize {
		self.paints.len()
	}

	/// Whether the palette has no paints
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.paints.is_empty()
	}

	/// Check that `index` refers to a paint
	fn check_index(&self, index: usize) -> Result<(), SwatchError> {
		if index < self.paints.len() {
			Ok(())
		} else {
			Err(SwatchError::IndexOutOfRange { index, len: self.paints.len() })
		}
	}

	/// Return a copy of the palette with one paint modified
	fn with_paint(&self, index: usize, update: impl FnOnce(&mut Paint)) -> Result<Self, SwatchError> {
		self.check_index(index)?;
		let mut palette = self.clone();
		update(&mut palette.paints[index]);
		Ok(palette)
	}

	/// Whether the palette has a paint with the same hex key as `rgb_string`
	///
	/// Returns `false` if `rgb_string` cannot be parsed.
	#[must_use]
	pub fn contains_color(&self, rgb_string: &str) -> bool {
		let Ok(key) = hex_key(rgb_string) else {
			return false;
		};

		self.paints
			.iter()
			.any(|paint| paint.hex_key().map_or(false, |other| other == key))
	}

	/// Add a new paint at the end of the palette
	///
	/// The color is stored as `rgb(r, g, b)`. If `include_recipe` is set, the new paint is a
	/// [`Paint::Mixed`] whose recipe is a snapshot of the paints currently in the mix.
	///
	/// # Errors
	/// Returns [`SwatchError::Color`] if `rgb_string` cannot be parsed
	/// and [`SwatchError::Duplicate`] if a paint with the same hex key is already in the palette.
	pub fn with_color(&self, rgb_string: &str, label: impl Into<String>, include_recipe: bool) -> Result<Self, SwatchError> {
		let rgb = parse_color(rgb_string)?;
		if self.contains_color(rgb_string) {
			return Err(SwatchError::Duplicate(rgb_string.to_owned()));
		}

		let label = label.into();
		let rgb_string = to_rgb_string(rgb);
		let paint = if include_recipe {
			let recipe = self.paints.iter().filter(|paint| paint.parts_in_mix() > 0).cloned().collect();
			Paint::Mixed(MixedPaint { label, rgb_string, parts_in_mix: 0, recipe })
		} else {
			Paint::Base(BasePaint { label, rgb_string, parts_in_mix: 0 })
		};

		let mut palette = self.clone();
		palette.paints.push(paint);
		Ok(palette)
	}

	/// Add one part of the paint at `index` to the mix
	///
	/// # Errors
	/// Returns [`SwatchError::IndexOutOfRange`] if there is no paint at `index`.
	pub fn incremented(&self, index: usize) -> Result<Self, SwatchError> {
		self.with_paint(index, |paint| {
			let parts = paint.parts_mut();
			*parts = parts.saturating_add(1);
		})
	}

	/// Remove one part of the paint at `index` from the mix, stopping at 0
	///
	/// # Errors
	/// Returns [`SwatchError::IndexOutOfRange`] if there is no paint at `index`.
	pub fn decremented(&self, index: usize) -> Result<Self, SwatchError> {
		self.with_paint(index, |paint| {
			let parts = paint.parts_mut();
			*parts = parts.saturating_sub(1);
		})
	}

	/// Remove the paint at `index` from the palette
	///
	/// # Errors
	/// Returns [`SwatchError::IndexOutOfRange`] if there is no paint at `index`.
	pub fn without(&self, index: usize) -> Result<Self, SwatchError> {
		self.check_index(index)?;
		let mut palette = self.clone();
		palette.paints.remove(index);
		Ok(palette)
	}

	/// Change the label of the paint at `index`
	///
	/// # Errors
	/// Returns [`SwatchError::IndexOutOfRange`] if there is no paint at `index`.
	pub fn renamed(&self, index: usize, label: impl Into<String>) -> Result<Self, SwatchError> {
		let label = label.into();
		self.with_paint(index, |paint| *paint.label_mut() = label)
	}

	/// Remove every paint from the mix
	#[must_use]
	pub fn reset_parts(&self) -> Self {
		let mut palette = self.clone();
		for paint in &mut palette.paints {
			*paint.parts_mut() = 0;
		}
		palette
	}

	/// Replace the mix with the given `(index, parts)` updates
	///
	/// Every paint is first removed from the mix. Updates with an index that does not refer to a paint are ignored.
	#[must_use]
	pub fn with_mix_parts(&self, updates: &[(usize, u32)]) -> Self {
		let mut palette = self.reset_parts();
		for &(index, parts) in updates {
			if let Some(paint) = palette.paints.get_mut(index) {
				*paint.parts_mut() = parts;
			}
		}
		palette
	}

	/// Replace the mix with a recipe suggested for [`Palette::base_paints`]
	///
	/// The ingredient indices are mapped back to palette indices.
	/// The palette is returned unchanged if no ingredient refers to a base paint.
	#[must_use]
	pub fn with_suggestion(&self, suggestion: &RecipeSuggestion) -> Self {
		let base_indices = self.base_indices();
		let updates = suggestion
			.ingredients
			.iter()
			.filter_map(|ingredient| base_indices.get(ingredient.index).map(|&i| (i, ingredient.parts)))
			.collect::<Vec<_>>();

		if updates.is_empty() {
			self.clone()
		} else {
			self.with_mix_parts(&updates)
		}
	}

	/// The palette indices of the base paints, in order
	#[must_use]
	pub fn base_indices(&self) -> Vec<usize> {
		self.paints
			.iter()
			.enumerate()
			.filter(|(_, paint)| paint.is_base())
			.map(|(i, _)| i)
			.collect()
	}

	/// The base paints, in order, for use with [`crate::suggest_recipe`]
	#[must_use]
	pub fn base_paints(&self) -> Vec<BasePaint> {
		self.paints
			.iter()
			.filter_map(|paint| match paint {
				Paint::Base(paint) => Some(paint.clone()),
				Paint::Mixed(_) => None,
			})
			.collect()
	}

	/// The total number of parts in the mix
	#[must_use]
	pub fn total_parts(&self) -> u32 {
		self.paints.iter().map(Paint::parts_in_mix).fold(0, u32::saturating_add)
	}

	/// The predicted color of the current mix
	///
	/// Paints that the mixer does not support are left out of the mix.
	/// Returns `None` if no supported paint is in the mix.
	#[must_use]
	pub fn mixed_color<M: PigmentMixer + ?Sized>(&self, mixer: &M) -> Option<Srgb<u8>> {
		let latents = self
			.paints
			.iter()
			.filter(|paint| paint.parts_in_mix() > 0)
			.filter_map(|paint| Some((mixer.to_latent(paint.rgb_string())?, paint.parts_in_mix())))
			.collect::<Vec<_>>();

		let weighted = latents.iter().map(|(latent, parts)| (latent, *parts)).collect::<Vec<_>>();
		mix_latents(&weighted).map(|latent| mixer.from_latent(&latent))
	}
}

/// How closely two colors match as a percentage, `100 - ΔE94` clamped to `0.0..=100.0`
///
/// Returns 0 if either color cannot be parsed.
#[must_use]
pub fn match_pct(color1: &str, color2: &str) -> f64 {
	match (parse_color(color1), parse_color(color2)) {
		(Ok(x), Ok(y)) => match_pct_from_delta_e(delta_e94(rgb_to_lab(x), rgb_to_lab(y))),
		_ => 0.0,
	}
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
	use super::*;
	use crate::{mixer::LinearLightMixer, recipe::Ingredient};

	fn palette() -> Palette {
		Palette::from_paints([
			Paint::base("Cadmium Red", "rgb(227, 0, 34)"),
			Paint::base("Ultramarine", "rgb(18, 10, 143)"),
			Paint::base("Titanium White", "rgb(255, 255, 255)"),
		])
	}

	fn parts(palette: &Palette) -> Vec<u32> {
		palette.paints().iter().map(Paint::parts_in_mix).collect()
	}

	#[test]
	fn from_paints_drops_duplicate_colors() {
		let palette = Palette::from_paints([
			Paint::base("Red", "rgb(255, 0, 0)"),
			Paint::base("Also red", "#ff0000"),
			Paint::base("Broken", "reddish"),
			Paint::base("Broken too", "reddish"),
		]);

		let labels = palette.paints().iter().map(Paint::label).collect::<Vec<_>>();
		assert_eq!(labels, ["Red", "Broken", "Broken too"]);
	}

	#[test]
	fn add_color() {
		let palette = palette().with_color("#FFFF00", "Yellow", false).unwrap();
		assert_eq!(palette.len(), 4);
		assert_eq!(palette.paints()[3], Paint::base("Yellow", "rgb(255, 255, 0)"));
	}

	#[test]
	fn add_duplicate_color() {
		let result = palette().with_color("rgb(255,255,255)", "White", false);
		assert_eq!(result, Err(SwatchError::Duplicate("rgb(255,255,255)".into())));

		let result = palette().with_color("#fff", "White", false);
		assert!(matches!(result, Err(SwatchError::Duplicate(_))));
	}

	#[test]
	fn add_invalid_color() {
		let result = palette().with_color("not a color", "?", false);
		assert!(matches!(result, Err(SwatchError::Color(_))));
	}

	#[test]
	fn add_color_with_recipe() {
		let mixing = palette().with_mix_parts(&[(0, 2), (2, 1)]);
		let palette = mixing.with_color("rgb(240, 128, 128)", "Pink", true).unwrap();

		let Paint::Mixed(pink) = &palette.paints()[3] else {
			panic!("expected a mixed paint");
		};

		assert_eq!(pink.parts_in_mix, 0);
		assert_eq!(pink.recipe.len(), 2);
		assert_eq!(pink.recipe[0].label(), "Cadmium Red");
		assert_eq!(pink.recipe[0].parts_in_mix(), 2);
		assert_eq!(pink.recipe[1].label(), "Titanium White");
	}

	#[test]
	fn increment_and_decrement() {
		let palette = palette().incremented(1).unwrap().incremented(1).unwrap();
		assert_eq!(parts(&palette), [0, 2, 0]);

		let palette = palette.decremented(1).unwrap().decremented(0).unwrap();
		assert_eq!(parts(&palette), [0, 1, 0]);
	}

	#[test]
	fn edits_do_not_change_the_original() {
		let original = palette();
		let edited = original.incremented(0).unwrap();
		assert_eq!(parts(&original), [0, 0, 0]);
		assert_eq!(parts(&edited), [1, 0, 0]);
	}

	#[test]
	fn out_of_range_indices() {
		let palette = palette();
		let error = SwatchError::IndexOutOfRange { index: 3, len: 3 };
		assert_eq!(palette.incremented(3), Err(error.clone()));
		assert_eq!(palette.decremented(3), Err(error.clone()));
		assert_eq!(palette.without(3), Err(error.clone()));
		assert_eq!(palette.renamed(3, "x"), Err(error));
	}

	#[test]
	fn remove_and_rename() {
		let palette = palette().without(0).unwrap().renamed(1, "White").unwrap();
		let labels = palette.paints().iter().map(Paint::label).collect::<Vec<_>>();
		assert_eq!(labels, ["Ultramarine", "White"]);
	}

	#[test]
	fn reset_and_apply_parts() {
		let palette = palette().with_mix_parts(&[(0, 3), (1, 1), (7, 5)]);
		assert_eq!(parts(&palette), [3, 1, 0]);
		assert_eq!(palette.total_parts(), 4);

		let palette = palette.with_mix_parts(&[(2, 2)]);
		assert_eq!(parts(&palette), [0, 0, 2]);

		assert_eq!(parts(&palette.reset_parts()), [0, 0, 0]);
	}

	#[test]
	fn base_paints_skip_mixed_paints() {
		let palette = palette()
			.with_mix_parts(&[(0, 1), (1, 1)])
			.with_color("rgb(120, 5, 90)", "Purple", true)
			.unwrap()
			.with_color("rgb(0, 0, 0)", "Black", false)
			.unwrap();

		assert_eq!(palette.base_indices(), [0, 1, 2, 4]);
		let labels = palette.base_paints().into_iter().map(|paint| paint.label).collect::<Vec<_>>();
		assert_eq!(labels, ["Cadmium Red", "Ultramarine", "Titanium White", "Black"]);
	}

	#[test]
	fn apply_suggestion_maps_indices() {
		let palette = palette()
			.with_color("rgb(120, 5, 90)", "Purple", true)
			.unwrap()
			.with_color("rgb(0, 0, 0)", "Black", false)
			.unwrap();

		let suggestion = RecipeSuggestion {
			ingredients: vec![Ingredient { index: 3, parts: 2 }, Ingredient { index: 0, parts: 1 }],
			result_rgb: "rgb(80, 0, 10)".into(),
			delta_e: 1.0,
			match_pct: 99.0,
		};

		assert_eq!(parts(&palette.with_suggestion(&suggestion)), [1, 0, 0, 0, 2]);
	}

	#[test]
	fn apply_suggestion_without_base_paints() {
		let palette = palette().incremented(2).unwrap();
		let suggestion = RecipeSuggestion {
			ingredients: vec![Ingredient { index: 9, parts: 2 }],
			result_rgb: String::new(),
			delta_e: 0.0,
			match_pct: 100.0,
		};

		assert_eq!(palette.with_suggestion(&suggestion), palette);
	}

	#[test]
	fn mixed_color_of_palette() {
		assert_eq!(palette().mixed_color(&LinearLightMixer), None);

		let white = palette().with_mix_parts(&[(2, 3)]);
		assert_eq!(white.mixed_color(&LinearLightMixer), Some(Srgb::new(255, 255, 255)));

		// unsupported paints are left out
		let palette = Palette::from_paints([Paint::base("?", "unknown"), Paint::base("Red", "rgb(255, 0, 0)")])
			.with_mix_parts(&[(0, 5), (1, 1)]);
		assert_eq!(palette.mixed_color(&LinearLightMixer), Some(Srgb::new(255, 0, 0)));
	}

	#[test]
	fn contains_color_uses_hex_keys() {
		let palette = palette();
		assert!(palette.contains_color("#e30022"));
		assert!(palette.contains_color("rgba(18, 10, 143, 0.5)"));
		assert!(!palette.contains_color("rgb(1, 2, 3)"));
		assert!(!palette.contains_color("nonsense"));
	}

	#[test]
	fn match_percentage() {
		assert_eq!(match_pct("rgb(10, 20, 30)", "#0a141e"), 100.0);
		assert_eq!(match_pct("rgb(0, 0, 0)", "rgb(255, 255, 255)"), 0.0);
		assert_eq!(match_pct("", "rgb(1, 1, 1)"), 0.0);

		let pct = match_pct("rgb(200, 100, 50)", "rgb(205, 100, 50)");
		assert!(pct > 95.0 && pct < 100.0);
	}

	#[cfg(feature = "serde")]
	#[test]
	fn paints_from_json() {
		let json = r#"[
			{ "label": "Red", "rgbString": "rgb(255, 0, 0)", "partsInMix": 2 },
			{ "label": "Pink", "rgbString": "rgb(255, 128, 128)", "partsInMix": 0,
			  "recipe": [{ "label": "Red", "rgbString": "rgb(255, 0, 0)", "partsInMix": 1 }] }
		]"#;

		let palette: Palette = serde_json::from_str(json).unwrap();
		assert_eq!(palette.len(), 2);
		assert!(palette.paints()[0].is_base());
		assert_eq!(palette.paints()[0].parts_in_mix(), 2);
		assert_eq!(palette.paints()[1].recipe().map(<[Paint]>::len), Some(1));

		let json = serde_json::to_value(&palette).unwrap();
		assert!(json[0].get("recipe").is_none());
		assert_eq!(json[1]["recipe"][0]["rgbString"], "rgb(255, 0, 0)");
	}

	#[cfg(feature = "serde")]
	#[test]
	fn duplicate_colors_dropped_from_json() {
		let json = r##"[
			{ "label": "Red", "rgbString": "rgb(255, 0, 0)" },
			{ "label": "Also red", "rgbString": "#ff0000" },
			{ "label": "Blue", "rgbString": "rgb(0, 0, 255)" }
		]"##;

		let palette: Palette = serde_json::from_str(json).unwrap();
		assert_eq!(palette.len(), 2);
		assert_eq!(palette.paints()[0].label(), "Red");
		assert_eq!(palette.paints()[1].label(), "Blue");
	}
}
