//! The pigment mixing model used to predict the color of a mixture
//!
//! Paint colors are mapped into a latent space where mixing is a weighted average.
//! Any pigment model (e.g., Kubelka-Munk based) can be plugged in by implementing [`PigmentMixer`].

use crate::convert::parse_color;
use palette::{LinSrgb, Srgb};

/// The number of components in a [`Latent`] vector
pub const LATENT_DIMENSIONS: usize = 7;

/// A color in the latent space of a [`PigmentMixer`]
pub type Latent = [f64; LATENT_DIMENSIONS];

/// Converts colors to and from a latent space where paints mix linearly
pub trait PigmentMixer {
	/// Convert a color string into its latent vector, or `None` if the color is not supported
	fn to_latent(&self, color: &str) -> Option<Latent>;

	/// Convert a latent vector back into a displayable color
	fn from_latent(&self, latent: &Latent) -> Srgb<u8>;
}

impl<M: PigmentMixer + ?Sized> PigmentMixer for &M {
	fn to_latent(&self, color: &str) -> Option<Latent> {
		(**self).to_latent(color)
	}

	fn from_latent(&self, latent: &Latent) -> Srgb<u8> {
		(**self).from_latent(latent)
	}
}

/// Average latent vectors weighted by their parts
///
/// Returns `None` if the total number of parts is 0.
#[must_use]
pub fn mix_latents(ingredients: &[(&Latent, u32)]) -> Option<Latent> {
	let total = ingredients.iter().map(|&(_, parts)| u64::from(parts)).sum::<u64>();
	if total == 0 {
		return None;
	}

	#[allow(clippy::cast_precision_loss)]
	let total = total as f64;

	let mut mix = [0.0; LATENT_DIMENSIONS];
	for &(latent, parts) in ingredients {
		let weight = f64::from(parts) / total;
		for (x, &y) in mix.iter_mut().zip(latent) {
			*x += y * weight;
		}
	}

	Some(mix)
}

/// A simple mixer that averages colors in linear sRGB
///
/// This is additive light mixing rather than pigment mixing,
/// so e.g. blue and yellow give gray instead of green.
/// It only uses the first three latent components.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLightMixer;

impl PigmentMixer for LinearLightMixer {
	fn to_latent(&self, color: &str) -> Option<Latent> {
		let linear: LinSrgb<f64> = parse_color(color).ok()?.into_format::<f64>().into_linear();
		let mut latent = [0.0; LATENT_DIMENSIONS];
		latent[..3].copy_from_slice(&[linear.red, linear.green, linear.blue]);
		Some(latent)
	}

	fn from_latent(&self, latent: &Latent) -> Srgb<u8> {
		let [red, green, blue, ..] = latent.map(|x| x.clamp(0.0, 1.0));
		Srgb::<f64>::from_linear(LinSrgb::new(red, green, blue)).into_format()
	}
}
