use crate::error::GifError;
use crate::filters::{validate_palette_size, validate_positive};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Convert a video into an optimized animated GIF by driving ffmpeg (and
/// optionally gifsicle) with a two-pass palette filter graph.
#[derive(Parser, Debug)]
#[command(
    name = "vid2gif",
    version,
    about = "Convert a video into an optimized animated GIF",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Input video file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output GIF path (default: input with a .gif extension)
    #[arg(value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Start offset, passed verbatim to the transcoder (e.g. 12, 0:35)
    #[arg(short = 's', long)]
    pub seek: Option<String>,

    /// Clip length, passed verbatim to the transcoder
    #[arg(short = 't', long)]
    pub time: Option<String>,

    /// Output frame rate
    #[arg(short = 'f', long, default_value = "15", value_parser = validate_positive)]
    pub fps: u32,

    /// Output width in pixels; height keeps aspect (default: no scaling)
    #[arg(short = 'w', long, value_parser = validate_positive)]
    pub width: Option<u32>,

    /// Palette size in colors (2-256)
    #[arg(short = 'p', long, default_value = "256", value_parser = validate_palette_size)]
    pub palette: u32,

    /// Crop region width (default: full frame)
    #[arg(short = 'c', long = "crop-size-w", value_parser = validate_positive)]
    pub crop_size_w: Option<u32>,

    /// Crop region height (default: full frame). Reuses -h; help is --help
    #[arg(short = 'h', long = "crop-size-h", value_parser = validate_positive)]
    pub crop_size_h: Option<u32>,

    /// Crop region x offset
    #[arg(short = 'x', long = "crop-offset-x", default_value = "0")]
    pub crop_offset_x: u32,

    /// Crop region y offset
    #[arg(short = 'y', long = "crop-offset-y", default_value = "0")]
    pub crop_offset_y: u32,

    /// Probe the input with cropdetect and crop to the detected region
    #[arg(short = 'd', long, action = ArgAction::SetTrue, overrides_with = "no_crop_detect")]
    pub crop_detect: bool,

    /// Disable crop detection
    #[arg(long = "no-crop-detect", action = ArgAction::SetTrue)]
    pub no_crop_detect: bool,

    /// Pipe the GIF through gifsicle for layer optimization
    #[arg(short = 'o', long, action = ArgAction::SetTrue, overrides_with = "no_optimize")]
    pub optimize: bool,

    /// Disable gifsicle optimization
    #[arg(long = "no-optimize", action = ArgAction::SetTrue)]
    pub no_optimize: bool,

    /// Overlay text (use \n for line breaks)
    #[arg(short = 'T', long)]
    pub text: Option<String>,

    /// Overlay text color
    #[arg(short = 'C', long, default_value = "white")]
    pub text_color: String,

    /// Overlay font size
    #[arg(short = 'S', long, default_value = "32", value_parser = validate_positive)]
    pub text_size: u32,

    /// Overlay border width
    #[arg(short = 'B', long, default_value = "3")]
    pub text_border: u32,

    /// Overlay font family
    #[arg(short = 'F', long, default_value = "Arial")]
    pub text_font: String,

    /// Overlay font variant (style). Reuses -V; version is --version
    #[arg(short = 'V', long, default_value = "Bold")]
    pub text_variant: String,

    /// Overlay x position expression (default: centered)
    #[arg(short = 'X', long = "text-x-position")]
    pub text_x_position: Option<String>,

    /// Overlay y position expression (default: near the bottom)
    #[arg(short = 'Y', long = "text-y-position")]
    pub text_y_position: Option<String>,

    /// Stream external tool diagnostics to the log
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Suppress all log output (overrides --verbose)
    #[arg(short = 'q', long, action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Every user-supplied conversion parameter, resolved. Built once from the
/// CLI, mutated once if crop detection runs, read-only afterwards.
#[derive(Debug, Clone)]
pub struct GifConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub seek: Option<String>,
    pub time: Option<String>,
    pub fps: u32,
    pub width: Option<u32>,
    pub palette: u32,
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    pub crop_offset_x: u32,
    pub crop_offset_y: u32,
    pub crop_detect: bool,
    pub detected_crop: Option<String>,
    pub text: Option<String>,
    pub text_color: String,
    pub text_size: u32,
    pub text_border: u32,
    pub text_font: String,
    pub text_variant: String,
    pub text_x: Option<String>,
    pub text_y: Option<String>,
    pub optimize: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<GifConfig> {
        if !self.input.is_file() {
            return Err(GifError::InvalidArguments(format!(
                "input not found: {}",
                self.input.display()
            ))
            .into());
        }
        let output = resolve_output(&self.input, self.output.as_deref());

        Ok(GifConfig {
            input: self.input,
            output,
            seek: self.seek,
            time: self.time,
            fps: self.fps,
            width: self.width,
            palette: self.palette,
            crop_width: self.crop_size_w,
            crop_height: self.crop_size_h,
            crop_offset_x: self.crop_offset_x,
            crop_offset_y: self.crop_offset_y,
            crop_detect: self.crop_detect,
            detected_crop: None,
            text: self.text,
            text_color: self.text_color,
            text_size: self.text_size,
            text_border: self.text_border,
            text_font: self.text_font,
            text_variant: self.text_variant,
            text_x: self.text_x_position,
            text_y: self.text_y_position,
            optimize: self.optimize,
            verbose: self.verbose && !self.quiet,
            quiet: self.quiet,
        })
    }
}

/// Default to the input path with the gif extension; an explicit output is
/// forced to carry it.
pub fn resolve_output(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.extension() == Some(OsStr::new("gif")) => path.to_path_buf(),
        Some(path) => path.with_extension("gif"),
        None => input.with_extension("gif"),
    }
}

#[cfg(test)]
impl Default for GifConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("clip.mov"),
            output: PathBuf::from("clip.gif"),
            seek: None,
            time: None,
            fps: 15,
            width: None,
            palette: 256,
            crop_width: None,
            crop_height: None,
            crop_offset_x: 0,
            crop_offset_y: 0,
            crop_detect: false,
            detected_crop: None,
            text: None,
            text_color: "white".into(),
            text_size: 32,
            text_border: 3,
            text_font: "Arial".into(),
            text_variant: "Bold".into(),
            text_x: None,
            text_y: None,
            optimize: false,
            verbose: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_output_defaults_to_input_with_gif_extension() {
        assert_eq!(
            resolve_output(Path::new("clip.mov"), None),
            PathBuf::from("clip.gif")
        );
    }

    #[test]
    fn test_explicit_output_gains_gif_extension() {
        assert_eq!(
            resolve_output(Path::new("clip.mov"), Some(Path::new("out"))),
            PathBuf::from("out.gif")
        );
    }

    #[test]
    fn test_explicit_gif_output_unchanged() {
        assert_eq!(
            resolve_output(Path::new("clip.mov"), Some(Path::new("out.gif"))),
            PathBuf::from("out.gif")
        );
    }

    #[test]
    fn test_short_h_is_crop_height_not_help() {
        let cli = parse(&["vid2gif", "clip.mov", "-h", "240"]);
        assert_eq!(cli.crop_size_h, Some(240));
    }

    #[test]
    fn test_short_v_upper_is_text_variant() {
        let cli = parse(&["vid2gif", "clip.mov", "-V", "Italic"]);
        assert_eq!(cli.text_variant, "Italic");
    }

    #[test]
    fn test_negatable_flags_last_one_wins() {
        let cli = parse(&["vid2gif", "clip.mov", "-d", "--no-crop-detect"]);
        assert!(!cli.crop_detect);

        let cli = parse(&["vid2gif", "clip.mov", "--no-optimize", "-o"]);
        assert!(cli.optimize);
    }

    #[test]
    fn test_positional_output_accepted() {
        let cli = parse(&["vid2gif", "clip.mov", "out.gif"]);
        assert_eq!(cli.output, Some(PathBuf::from("out.gif")));
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["vid2gif", "clip.mov"]);
        assert_eq!(cli.fps, 15);
        assert_eq!(cli.palette, 256);
        assert_eq!(cli.text_color, "white");
        assert_eq!(cli.text_size, 32);
        assert_eq!(cli.text_border, 3);
        assert_eq!(cli.text_font, "Arial");
        assert_eq!(cli.text_variant, "Bold");
        assert!(!cli.crop_detect);
        assert!(!cli.optimize);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        assert!(Cli::try_parse_from(["vid2gif"]).is_err());
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        // cargo test runs from the crate root, so Cargo.toml exists
        let cli = parse(&["vid2gif", "Cargo.toml", "-v", "-q"]);
        let cfg = cli.into_config().unwrap();
        assert!(cfg.quiet);
        assert!(!cfg.verbose);
    }

    #[test]
    fn test_nonexistent_input_rejected() {
        let cli = parse(&["vid2gif", "no_such_file.mov"]);
        assert!(cli.into_config().is_err());
    }
}
