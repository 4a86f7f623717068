//! Specifies the CLI and handles arg parsing

use clap::{Parser, ValueEnum};
use std::{
    fmt::{Debug, Display},
    ops::RangeBounds,
    path::PathBuf,
    str::FromStr,
};
use tintmix::ColorCount;

/// Supported output formats for the colors
#[derive(Copy, Clone, ValueEnum)]
pub enum FormatOutput {
    /// sRGB hexcode
    Hex,
    /// sRGB rgb(r, g, b) function
    Rgb,
    /// Whitespace with true color background
    Swatch,
}

/// Ways to colorize the output text
#[derive(Copy, Clone, ValueEnum)]
pub enum ColorizeOutput {
    /// Foreground
    Fg,
    /// Background
    Bg,
}

/// Find the representative colors of an image and the paint mixtures that best reproduce them.
///
/// Each color is printed along with the share of the image it covers
/// and the best recipe found in the palette.
#[derive(Parser)]
#[command(version)]
pub struct Options {
    /// The path to the input image
    pub image: Option<PathBuf>,

    /// Additional target colors to find recipes for, e.g. "rgb(200, 120, 40)" or "#c87828"
    #[arg(short, long, value_parser = parse_target)]
    pub target: Vec<String>,

    /// A JSON file with the paints to mix
    ///
    /// The file should contain an array of paints like {"label": "Red", "rgbString": "rgb(255, 0, 0)"}.
    /// Paints with a "recipe" are mixed paints and are not used as ingredients.
    /// A built-in palette of common artist paints is used if this is not provided.
    #[arg(short, long)]
    pub palette: Option<PathBuf>,

    /// The number of colors to extract from the image, or "auto"
    #[arg(short, default_value = "auto", value_parser = parse_color_count)]
    pub k: ColorCount,

    /// Prefer colors that are distinct from each other over the most common colors
    #[arg(short, long)]
    pub distinct: bool,

    /// The percentage of the image that the extracted colors should cover when using "-k auto"
    ///
    /// Defaults to 99 or, with --distinct, 99.5.
    #[arg(long, value_parser = parse_valid_coverage)]
    pub coverage: Option<f64>,

    /// The maximum number of paints in a recipe, in the range [0, 3]
    #[arg(long, default_value_t = 3, value_parser = parse_valid_max_colors)]
    pub max_colors: usize,

    /// The maximum total number of parts in a recipe
    ///
    /// Higher values allow finer ratios, but the search takes longer.
    #[arg(long, default_value_t = 10, value_parser = parse_valid_max_parts)]
    pub max_parts: u32,

    /// The maximum width or height of the image before a thumbnail is created
    #[arg(long, default_value_t = 480, value_parser = parse_valid_dimension)]
    pub max_dimension: u32,

    /// The format to print the colors in
    #[arg(short, long, default_value = "hex")]
    pub output: FormatOutput,

    /// Color the foreground or background for each printed color
    #[arg(short, long)]
    pub colorize: Option<ColorizeOutput>,

    /// The number of threads to use
    ///
    /// A value of 0 indicates to automatically choose the number of threads.
    #[cfg(feature = "threads")]
    #[arg(long, default_value_t = 0)]
    pub threads: u8,

    /// Print additional information, such as the running time of each step
    #[arg(long)]
    pub verbose: bool,
}

/// Parse a value and ensure it in the provided, valid range
fn parse_in_range<T>(s: &str, range: impl RangeBounds<T> + Debug) -> Result<T, String>
where
    T: FromStr + Display + PartialOrd,
    T::Err: Display,
{
    let value: T = s.parse().map_err(|e| format!("{e}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {range:?}"))
    }
}

/// Parse the coverage percentage and ensure it is in `0.0..=100.0`
fn parse_valid_coverage(s: &str) -> Result<f64, String> {
    parse_in_range(s, 0.0..=100.0)
}

/// Parse the maximum number of paints in a recipe and ensure it is in `0..=3`
fn parse_valid_max_colors(s: &str) -> Result<usize, String> {
    parse_in_range(s, 0..=tintmix::recipe::DEFAULT_MAX_COLORS)
}

/// Parse the maximum number of parts and ensure it is >= 1
fn parse_valid_max_parts(s: &str) -> Result<u32, String> {
    parse_in_range(s, 1..)
}

/// Parse the maximum image dimension and ensure it is >= 1
fn parse_valid_dimension(s: &str) -> Result<u32, String> {
    parse_in_range(s, 1..)
}

/// Parse "auto" or a number of colors
fn parse_color_count(s: &str) -> Result<ColorCount, String> {
    if s.eq_ignore_ascii_case("auto") {
        Ok(ColorCount::Auto)
    } else {
        parse_in_range(s, 0..).map(ColorCount::Exact)
    }
}

/// Parse a target color, normalizing it to rgb(r, g, b)
fn parse_target(s: &str) -> Result<String, String> {
    tintmix::convert::parse_color(s)
        .map(tintmix::convert::to_rgb_string)
        .map_err(|e| e.to_string())
}
