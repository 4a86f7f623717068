//! Find representative colors in an image and the paint mixtures that reproduce them.
//!
//! # Examples
//!
//! ## Read an image file and get its dominant colors.
//!
//! ```no_run
//! let image = image::open("some image").unwrap().into_rgba8();
//! let colors = tintmix::extract_colors_from_image(&image, tintmix::ColorCount::Auto, tintmix::ExtractionMode::Dominant);
//!
//! for color in colors {
//!     println!("{} {:.1}%", color.rgb_string, color.coverage_pct);
//! }
//! ```
//!
//! ## Find a recipe for a target color.
//!
//! ```
//! use tintmix::{BasePaint, LinearLightMixer, RecipeOptions};
//!
//! let palette = [
//!     BasePaint::new("Red", "rgb(255, 0, 0)"),
//!     BasePaint::new("Blue", "rgb(0, 0, 255)"),
//! ];
//!
//! let suggestion = tintmix::suggest_recipe(&palette, "rgb(255, 0, 0)", &LinearLightMixer, RecipeOptions::default()).unwrap();
//! assert_eq!(suggestion.ingredients[0].index, 0);
//! ```
//!
//! # Extraction
//!
//! Colors are found by running k-means over the pixels in the sRGB color space.
//! Pixels with an alpha below [`kmeans::MIN_ALPHA`] are ignored.
//! Images with more than [`kmeans::MAX_SAMPLE_PIXELS`] pixels are subsampled for k-means,
//! but the final cluster sizes are always computed over every visible pixel.
//! The whole process is deterministic, so the same image always gives the same colors.
//!
//! In [`ExtractionMode::Distinct`], more clusters than requested are computed,
//! and then colors that are far apart from each other (in CIE94) are chosen over colors that cover the most pixels.
//!
//! # Recipes
//!
//! The color of a paint mixture is predicted by a [`PigmentMixer`].
//! A real pigment model should be used for sensible results;
//! the provided [`LinearLightMixer`] is only a simple approximation.
//!
//! The search tries every combination of up to three paints with every ratio of parts up to a maximum total,
//! so the number of candidates grows quickly with the size of the palette.
//! Palettes with more than [`recipe::LARGE_PALETTE_THRESHOLD`] paints are first narrowed down
//! to the [`recipe::MAX_CANDIDATE_PAINTS`] paints closest to the target.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::cargo)]
#![warn(clippy::use_debug, clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![warn(clippy::unwrap_used, clippy::unwrap_in_result)]
#![warn(clippy::unneeded_field_pattern, clippy::rest_pat_in_fully_bound_structs)]
#![warn(clippy::unnecessary_self_imports)]
#![warn(clippy::str_to_string, clippy::string_to_string, clippy::string_slice)]
#![warn(missing_docs, clippy::missing_docs_in_private_items, rustdoc::all)]
#![warn(clippy::float_cmp_const, clippy::lossy_float_literal)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unreadable_literal)]

use image::RgbaImage;

pub mod convert;
mod distinct;
mod error;
mod extract;
pub mod kmeans;
mod mixer;
mod paint;
pub mod recipe;

pub use distinct::select_distinct_colors;
pub use error::{ColorError, SwatchError};
pub use extract::{
	extract_colors, extract_colors_auto, pick_auto_color_count, to_extracted_colors, AutoCountOptions, ColorCount,
	ExtractedColor, ExtractionMode,
};
pub use kmeans::{Cluster, DominantColors};
pub use mixer::{mix_latents, Latent, LinearLightMixer, PigmentMixer, LATENT_DIMENSIONS};
pub use paint::{match_pct, BasePaint, MixedPaint, Paint, Palette};
pub use recipe::{suggest_recipe, suggest_recipes, Ingredient, RecipeOptions, RecipeSuggestion};

/// Runs k-means on a RGBA8 pixel buffer, returning up to `k` clusters ranked by size.
///
/// See [`kmeans::run`] for details.
#[must_use]
pub fn dominant_clusters(pixels: &[u8], k: usize) -> Vec<Cluster> {
	kmeans::run(pixels, k)
}

/// Finds the `k` dominant colors of a RGBA8 pixel buffer as `rgb(r, g, b)` strings,
/// along with the number of pixels closest to each color.
///
/// The colors are sorted by descending cluster size.
/// Clusters without any pixels are kept, so `k` colors are returned
/// unless `k` is greater than the number of visible sampled pixels.
/// No colors are returned if `k` is 0 or no pixel is visible.
#[must_use]
pub fn extract_dominant_colors(pixels: &[u8], k: usize) -> DominantColors {
	DominantColors::from(kmeans::run(pixels, k).as_slice())
}

/// Extracts colors from an image, see [`extract_colors`].
#[must_use]
pub fn extract_colors_from_image(image: &RgbaImage, count: ColorCount, mode: ExtractionMode) -> Vec<ExtractedColor> {
	extract_colors(image.as_raw(), count, mode)
}
