//! Conversions between sRGB, CIE XYZ, and CIE Lab, the CIE94 color difference,
//! and parsing and formatting of color strings.

use crate::ColorError;
use palette::{encoding, FromColor, Hsla, Srgb, Srgba};

/// D65 reference white, scaled so that `y = 100`
const WHITE: Xyz = Xyz { x: 95.047, y: 100.0, z: 108.883 };

/// `(6/29)^3`, below which the Lab transfer function is linear
const LAB_EPSILON: f64 = 216.0 / 24389.0;

/// Graphic arts weighting constants for CIE94
const CIE94_K1: f64 = 0.045;
/// See [`CIE94_K1`]
const CIE94_K2: f64 = 0.015;

/// A color in the CIE XYZ color space, scaled so that white has `y = 100`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
	/// X component
	pub x: f64,
	/// Y component (luminance)
	pub y: f64,
	/// Z component
	pub z: f64,
}

/// A color in the CIE Lab color space relative to the D65 white point
///
/// `l` ranges from `0.0` (black) to `100.0` (white).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
	/// Lightness
	pub l: f64,
	/// Green-red axis
	pub a: f64,
	/// Blue-yellow axis
	pub b: f64,
}

/// Removes the sRGB gamma from a channel value in `0.0..=1.0`.
///
/// Values outside of the range are clamped first.
#[must_use]
pub fn srgb_to_linear(value: f64) -> f64 {
	let value = value.clamp(0.0, 1.0);
	if value <= 0.04045 {
		value / 12.92
	} else {
		((value + 0.055) / 1.055).powf(2.4)
	}
}

/// Converts sRGB channel values in `0.0..=255.0` to XYZ.
#[must_use]
pub fn channels_to_xyz(red: f64, green: f64, blue: f64) -> Xyz {
	let r = srgb_to_linear(red / 255.0);
	let g = srgb_to_linear(green / 255.0);
	let b = srgb_to_linear(blue / 255.0);

	Xyz {
		x: (r * 0.4124564 + g * 0.3575761 + b * 0.1804375) * 100.0,
		y: (r * 0.2126729 + g * 0.7151522 + b * 0.0721750) * 100.0,
		z: (r * 0.0193339 + g * 0.1191920 + b * 0.9503041) * 100.0,
	}
}

/// Converts an 8-bit sRGB color to XYZ.
#[must_use]
pub fn rgb_to_xyz(rgb: Srgb<u8>) -> Xyz {
	channels_to_xyz(f64::from(rgb.red), f64::from(rgb.green), f64::from(rgb.blue))
}

/// Converts an XYZ color to Lab using the D65 white point.
#[must_use]
pub fn xyz_to_lab(xyz: Xyz) -> Lab {
	fn f(t: f64) -> f64 {
		if t > LAB_EPSILON {
			t.cbrt()
		} else {
			7.787 * t + 16.0 / 116.0
		}
	}

	let fx = f(xyz.x / WHITE.x);
	let fy = f(xyz.y / WHITE.y);
	let fz = f(xyz.z / WHITE.z);

	Lab {
		l: 116.0 * fy - 16.0,
		a: 500.0 * (fx - fy),
		b: 200.0 * (fy - fz),
	}
}

/// Converts an 8-bit sRGB color to Lab.
#[must_use]
pub fn rgb_to_lab(rgb: Srgb<u8>) -> Lab {
	xyz_to_lab(rgb_to_xyz(rgb))
}

/// The CIE94 color difference between `reference` and `sample`.
///
/// The chroma and hue weights are computed from `reference`,
/// so swapping the arguments can give a slightly different result.
#[must_use]
pub fn delta_e94(reference: Lab, sample: Lab) -> f64 {
	let dl = reference.l - sample.l;
	let c1 = (reference.a * reference.a + reference.b * reference.b).sqrt();
	let c2 = (sample.a * sample.a + sample.b * sample.b).sqrt();
	let dc = c1 - c2;
	let da = reference.a - sample.a;
	let db = reference.b - sample.b;
	// rounding can push this slightly below zero
	let dh_squared = f64::max(da * da + db * db - dc * dc, 0.0);

	let sc = 1.0 + CIE94_K1 * c1;
	let sh = 1.0 + CIE94_K2 * c1;

	let tc = dc / sc;
	(dl * dl + tc * tc + dh_squared / (sh * sh)).sqrt()
}

/// Input accepted by [`normalize_rgb_string`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RgbInput<'a> {
	/// Numeric channel values, of which the first three are used
	Components(&'a [f64]),
	/// A `rgb(...)` string
	Text(&'a str),
}

impl<'a> From<&'a [f64]> for RgbInput<'a> {
	fn from(components: &'a [f64]) -> Self {
		Self::Components(components)
	}
}

impl<'a, const N: usize> From<&'a [f64; N]> for RgbInput<'a> {
	fn from(components: &'a [f64; N]) -> Self {
		Self::Components(components)
	}
}

impl<'a> From<&'a str> for RgbInput<'a> {
	fn from(text: &'a str) -> Self {
		Self::Text(text)
	}
}

impl<'a> From<&'a String> for RgbInput<'a> {
	fn from(text: &'a String) -> Self {
		Self::Text(text)
	}
}

/// Splits a color function like `rgb(1, 2, 3)` into its name and trimmed arguments.
fn split_function(text: &str) -> Option<(&str, Vec<&str>)> {
	let (name, rest) = text.trim().split_once('(')?;
	let args = rest.trim_end().strip_suffix(')')?;
	Some((name.trim(), args.split(',').map(str::trim).collect()))
}

/// Normalizes a color given as channel values or as a `rgb(...)` string into `rgb(r, g, b)`.
///
/// Strings whose channels lie outside of `0..=255` are returned unchanged.
///
/// # Errors
/// Returns [`ColorError::UnexpectedFormat`] if fewer than three numeric channels are provided
/// or the string is not a `rgb(...)` function.
pub fn normalize_rgb_string<'a>(input: impl Into<RgbInput<'a>>) -> Result<String, ColorError> {
	match input.into() {
		RgbInput::Components(components) => match components {
			[r, g, b, ..] => Ok(format!("rgb({r}, {g}, {b})")),
			_ => Err(ColorError::UnexpectedFormat(format!("{components:?}"))),
		},
		RgbInput::Text(text) => {
			let unexpected = || ColorError::UnexpectedFormat(text.to_owned());

			let (name, args) = split_function(text).ok_or_else(unexpected)?;
			if !name.eq_ignore_ascii_case("rgb") || args.len() < 3 {
				return Err(unexpected());
			}

			let mut channels = [0.0; 3];
			for (channel, arg) in channels.iter_mut().zip(&args) {
				*channel = arg.parse::<f64>().map_err(|_| unexpected())?;
			}

			if channels.iter().all(|c| (0.0..=255.0).contains(c)) {
				let [r, g, b] = channels;
				Ok(format!("rgb({r}, {g}, {b})"))
			} else {
				Ok(text.to_owned())
			}
		},
	}
}

/// Parses a `rgb(r, g, b)` string with integer channels.
///
/// Anything else, including `rgba(...)`, gives black.
#[must_use]
pub fn rgb_string_to_rgb(text: &str) -> Srgb<u8> {
	fn parse(text: &str) -> Option<Srgb<u8>> {
		match split_function(text)? {
			(name, args) if name.eq_ignore_ascii_case("rgb") => match args.as_slice() {
				[r, g, b] => Some(Srgb::new(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?)),
				_ => None,
			},
			_ => None,
		}
	}

	parse(text).unwrap_or_else(|| Srgb::new(0, 0, 0))
}

/// Parses a single `0..=255` channel of a color function, rounding fractional values.
fn parse_channel(arg: &str) -> Result<u8, ColorError> {
	let value = arg
		.parse::<f64>()
		.map_err(|_| ColorError::InvalidComponent(arg.to_owned()))?;

	if (0.0..=255.0).contains(&value) {
		// in range, so the cast is exact after rounding
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		Ok(value.round() as u8)
	} else {
		Err(ColorError::InvalidComponent(arg.to_owned()))
	}
}

/// Parses `rgb(r, g, b)`, `rgba(r, g, b, a)`, `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`.
///
/// Any alpha component is validated but discarded.
///
/// # Errors
/// Returns [`ColorError::UnexpectedFormat`] for unrecognized shapes
/// and [`ColorError::InvalidComponent`] for channels that cannot be parsed or are out of range.
pub fn parse_color(text: &str) -> Result<Srgb<u8>, ColorError> {
	let trimmed = text.trim();

	if let Some(hex) = trimmed.strip_prefix('#') {
		let rgb = match hex.len() {
			3 | 6 => Some(hex),
			4 => hex.get(..3),
			8 => hex.get(..6),
			_ => None,
		}
		.ok_or_else(|| ColorError::UnexpectedFormat(text.to_owned()))?;

		if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(ColorError::InvalidComponent(text.to_owned()));
		}

		return rgb.parse().map_err(|_| ColorError::InvalidComponent(text.to_owned()));
	}

	let (name, args) = split_function(trimmed).ok_or_else(|| ColorError::UnexpectedFormat(text.to_owned()))?;

	let channels = match args.as_slice() {
		[r, g, b] if name.eq_ignore_ascii_case("rgb") => [r, g, b],
		[r, g, b, a] if name.eq_ignore_ascii_case("rgba") => {
			let alpha = a
				.parse::<f64>()
				.map_err(|_| ColorError::InvalidComponent((*a).to_owned()))?;
			if !(0.0..=1.0).contains(&alpha) {
				return Err(ColorError::InvalidComponent((*a).to_owned()));
			}
			[r, g, b]
		},
		_ => return Err(ColorError::UnexpectedFormat(text.to_owned())),
	};

	Ok(Srgb::new(
		parse_channel(channels[0])?,
		parse_channel(channels[1])?,
		parse_channel(channels[2])?,
	))
}

/// The lowercase `#rrggbb` key used to tell whether two color strings denote the same color.
///
/// # Errors
/// Returns an error if the color cannot be parsed by [`parse_color`].
pub fn hex_key(text: &str) -> Result<String, ColorError> {
	let rgb = parse_color(text)?;
	Ok(format!("#{rgb:x}"))
}

/// Formats an 8-bit sRGB color as `rgb(r, g, b)`.
#[must_use]
pub fn to_rgb_string(rgb: Srgb<u8>) -> String {
	format!("rgb({}, {}, {})", rgb.red, rgb.green, rgb.blue)
}

/// Converts an HSLA color to a hex code.
///
/// The hue is in degrees and wraps around (negative values included),
/// while saturation, lightness, and alpha are clamped to `0.0..=1.0`.
/// The result is `#rrggbb` when alpha is exactly 1 and `#rrggbbaa` otherwise.
#[must_use]
pub fn hsla_to_hex(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> String {
	let alpha = alpha.clamp(0.0, 1.0);
	let hsla: Hsla<encoding::Srgb, f64> = Hsla::new(
		hue.rem_euclid(360.0),
		saturation.clamp(0.0, 1.0),
		lightness.clamp(0.0, 1.0),
		alpha,
	);

	let rgba: Srgba<u8> = Srgba::<f64>::from_color(hsla).into_format();
	if alpha >= 1.0 {
		format!("#{:x}", rgba.color)
	} else {
		format!("#{:x}{:02x}", rgba.color, rgba.alpha)
	}
}
