//! Find the representative colors of an image and print a paint mixing recipe for each of them.

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::unreadable_literal
)]

mod cli;

#[allow(clippy::wildcard_imports)]
use cli::*;

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use colored::Colorize;
use image::{DynamicImage, GenericImageView};
use palette::Srgb;
use tintmix::{
    convert::rgb_string_to_rgb, BasePaint, ColorCount, ExtractedColor, ExtractionMode, LinearLightMixer, Paint,
    Palette, RecipeOptions, RecipeSuggestion,
};

/// Record the running time of a function and print the elapsed time
macro_rules! time {
    ($name: literal, $verbose: expr, $func_call: expr) => {{
        let start = Instant::now();
        let result = $func_call;
        if $verbose {
            println!("{} took {}ms", $name, start.elapsed().as_millis());
        }
        result
    }};
}

/// Error cases for the CLI
#[derive(Debug)]
enum CliError {
    /// Failed to read or decode the image file
    ImageLoad(image::ImageError),
    /// Failed to read the palette file
    PaletteRead(PathBuf, std::io::Error),
    /// The palette file is not a valid list of paints
    PaletteParse(PathBuf, serde_json::Error),
    /// Neither an image nor a target color was given
    NoInput,
    /// Failed to build the thread pool
    #[cfg(feature = "threads")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CliError::ImageLoad(e) => write!(f, "Failed to load the image file: {e}"),
            CliError::PaletteRead(path, e) => {
                write!(f, "Failed to read the palette file {}: {e}", path.display())
            }
            CliError::PaletteParse(path, e) => {
                write!(f, "Failed to parse the palette file {}: {e}", path.display())
            }
            CliError::NoInput => write!(f, "Provide an image or at least one --target color"),
            #[cfg(feature = "threads")]
            CliError::ThreadPool(e) => write!(f, "Failed to start the thread pool: {e}"),
        }
    }
}

/// The paints used when no palette file is given
const DEFAULT_PAINTS: [(&str, &str); 11] = [
    ("Titanium White", "rgb(255, 255, 255)"),
    ("Ivory Black", "rgb(35, 31, 32)"),
    ("Cadmium Yellow", "rgb(254, 236, 0)"),
    ("Yellow Ochre", "rgb(196, 140, 40)"),
    ("Cadmium Red", "rgb(227, 0, 34)"),
    ("Quinacridone Magenta", "rgb(128, 2, 46)"),
    ("Burnt Sienna", "rgb(138, 54, 15)"),
    ("Burnt Umber", "rgb(80, 50, 30)"),
    ("Ultramarine Blue", "rgb(25, 0, 89)"),
    ("Phthalo Blue", "rgb(13, 27, 68)"),
    ("Phthalo Green", "rgb(0, 60, 50)"),
];

fn main() -> ExitCode {
    let options = Options::parse();

    let result = run_match_and_print(&options);

    // Returning Result<_> uses Debug printing instead of Display
    if let Err(e) = result {
        eprintln!("{e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Builds a thread pool and then runs `match_and_print`
#[cfg(feature = "threads")]
fn run_match_and_print(options: &Options) -> Result<(), CliError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .map_err(CliError::ThreadPool)?;

    pool.install(|| match_and_print(options))
}

/// Runs `match_and_print` on a single thread
#[cfg(not(feature = "threads"))]
fn run_match_and_print(options: &Options) -> Result<(), CliError> {
    match_and_print(options)
}

/// Extract the colors of the image, find a recipe for each color and target, and print the results
fn match_and_print(options: &Options) -> Result<(), CliError> {
    if options.image.is_none() && options.target.is_empty() {
        return Err(CliError::NoInput);
    }

    let palette = match &options.palette {
        Some(path) => time!("Palette loading", options.verbose, load_palette(path))?,
        None => default_palette(),
    };

    let mut colors = match &options.image {
        Some(path) => {
            let img = time!("Image loading", options.verbose, load_image(path))?;
            let img = generate_thumbnail(img, options.max_dimension, options.verbose);
            extract(&img, options)
        }
        None => Vec::new(),
    };

    colors.extend(options.target.iter().map(|target| ExtractedColor {
        rgb_string: target.clone(),
        coverage_pct: f64::NAN,
    }));

    let paints = palette.base_paints();
    if options.verbose {
        println!(
            "Searching {} base paints ({} mixed paints are not used)",
            paints.len(),
            palette.len() - paints.len()
        );
    }

    let targets = colors
        .iter()
        .map(|color| color.rgb_string.as_str())
        .collect::<Vec<_>>();

    let recipe_options = RecipeOptions {
        max_colors: options.max_colors,
        max_total_parts: options.max_parts,
    };

    let suggestions = time!(
        "Recipe search",
        options.verbose,
        tintmix::suggest_recipes(&paints, &targets, &LinearLightMixer, recipe_options)
    );

    for (color, suggestion) in colors.iter().zip(&suggestions) {
        println!("{}", format_line(color, suggestion.as_ref(), &paints, options));
    }

    Ok(())
}

/// Load the image at the given path
fn load_image(path: &Path) -> Result<DynamicImage, CliError> {
    image::open(path).map_err(CliError::ImageLoad)
}

/// Load a JSON list of paints, dropping paints with the same color as an earlier paint
fn load_palette(path: &Path) -> Result<Palette, CliError> {
    let json = std::fs::read_to_string(path).map_err(|e| CliError::PaletteRead(path.to_owned(), e))?;
    parse_palette(&json).map_err(|e| CliError::PaletteParse(path.to_owned(), e))
}

/// Parse a JSON list of paints
fn parse_palette(json: &str) -> Result<Palette, serde_json::Error> {
    serde_json::from_str(json)
}

/// The built-in palette of common artist paints
fn default_palette() -> Palette {
    Palette::from_paints(
        DEFAULT_PAINTS
            .iter()
            .map(|&(label, rgb)| Paint::base(label, rgb)),
    )
}

/// Create a thumbnail no wider or taller than `max_dimension` if the image is larger than that
fn generate_thumbnail(image: DynamicImage, max_dimension: u32, verbose: bool) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        if verbose {
            println!("Skipping image thumbnail since the image is {width}x{height}");
        }

        image
    } else {
        let thumb = time!(
            "Image thumbnail",
            verbose,
            image.thumbnail(max_dimension, max_dimension)
        );

        if verbose {
            let (thumb_width, thumb_height) = thumb.dimensions();
            println!("Created a thumbnail with dimensions {thumb_width}x{thumb_height}");
        }

        thumb
    }
}

/// Extract colors from the image according to the options
fn extract(image: &DynamicImage, options: &Options) -> Vec<ExtractedColor> {
    let image = image.to_rgba8();
    let mode = if options.distinct {
        ExtractionMode::Distinct
    } else {
        ExtractionMode::Dominant
    };

    let colors = time!(
        "Color extraction",
        options.verbose,
        match (options.k, options.coverage) {
            (ColorCount::Auto, Some(coverage_pct)) => tintmix::extract_colors_auto(
                image.as_raw(),
                mode,
                tintmix::AutoCountOptions {
                    coverage_pct,
                    ..mode.auto_count_options()
                },
            ),
            (count, _) => tintmix::extract_colors_from_image(&image, count, mode),
        }
    );

    if options.verbose {
        println!("Extracted {} colors", colors.len());
    }

    colors
}

/// Format a color according to the output and colorize options
fn format_color(color: Srgb<u8>, options: &Options) -> String {
    let text = match options.output {
        FormatOutput::Hex => format!("#{color:x}"),
        FormatOutput::Rgb => tintmix::convert::to_rgb_string(color),
        FormatOutput::Swatch => {
            return "   "
                .on_truecolor(color.red, color.green, color.blue)
                .to_string()
        }
    };

    match options.colorize {
        Some(ColorizeOutput::Fg) => text
            .truecolor(color.red, color.green, color.blue)
            .to_string(),
        Some(ColorizeOutput::Bg) => text
            .on_truecolor(color.red, color.green, color.blue)
            .to_string(),
        None => text,
    }
}

/// Describe a recipe like "2 Cadmium Red + 1 Ultramarine Blue (97.31% match)"
fn format_recipe(suggestion: &RecipeSuggestion, paints: &[BasePaint]) -> String {
    let ingredients = suggestion
        .ingredients
        .iter()
        .map(|ingredient| {
            let label = paints
                .get(ingredient.index)
                .map_or("?", |paint| paint.label.as_str());
            format!("{} {label}", ingredient.parts)
        })
        .collect::<Vec<_>>()
        .join(" + ");

    format!("{ingredients} ({:.2}% match)", suggestion.match_pct)
}

/// Format one line of output for a color and its recipe
fn format_line(
    color: &ExtractedColor,
    suggestion: Option<&RecipeSuggestion>,
    paints: &[BasePaint],
    options: &Options,
) -> String {
    let mut line = format_color(rgb_string_to_rgb(&color.rgb_string), options);

    if !color.coverage_pct.is_nan() {
        line.push_str(&format!(" {:>5.1}%", color.coverage_pct));
    }

    line.push_str("  ");
    match suggestion {
        Some(suggestion) => line.push_str(&format_recipe(suggestion, paints)),
        None => line.push_str("no recipe"),
    }

    line
}
