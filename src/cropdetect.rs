use crate::cli::GifConfig;
use crate::error::GifError;
use crate::ffmpeg::{self, FFMPEG, Tools};
use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::process::Stdio;

/// ffmpeg prefixes every cropdetect report with this filter tag.
const CROP_MARKER: &str = "Parsed_cropdetect";

/// Run the probe pass and return the detected `w:h:x:y` region. A probe
/// that reports nothing is not an error; the manual crop fields stay in
/// effect. A probe that exits non-zero is fatal.
pub fn detect_crop(tools: &Tools, cfg: &GifConfig) -> Result<Option<String>> {
    let args = ffmpeg::crop_probe_args(cfg);
    debug!("crop probe: {}", ffmpeg::shell_preview(FFMPEG, &args));

    let mut child = ffmpeg::command(&tools.ffmpeg, &args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn ffmpeg crop probe")?;

    let stderr = child
        .stderr
        .take()
        .context("failed to capture crop probe diagnostics")?;

    let pattern = crop_pattern();
    let mut token: Option<String> = None;
    // scan as the probe produces output; keep draining after a match so the
    // process never blocks on a full pipe
    for line in BufReader::new(stderr).lines() {
        let line = line.context("failed to read crop probe diagnostics")?;
        debug!("[{FFMPEG}] {line}");
        if token.is_none() {
            token = parse_crop_line(&pattern, &line);
        }
    }

    let status = child.wait().context("failed to wait for crop probe")?;
    if !status.success() {
        return Err(GifError::ExternalProcessFailure {
            tool: FFMPEG.to_string(),
            status,
        }
        .into());
    }
    Ok(token)
}

fn crop_pattern() -> Regex {
    Regex::new(r"crop=(\d+:\d+:\d+:\d+)").unwrap()
}

/// First match wins; lines without the cropdetect marker are ignored even
/// if they happen to contain a crop token.
fn parse_crop_line(pattern: &Regex, line: &str) -> Option<String> {
    if !line.contains(CROP_MARKER) {
        return None;
    }
    pattern.captures(line).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marker_line() {
        let line = "[Parsed_cropdetect_0 @ 0x55] x1:0 x2:639 y1:60 y2:419 w:640 h:360 x:0 y:60 pts:1234 t:1.23 crop=640:360:0:60";
        assert_eq!(
            parse_crop_line(&crop_pattern(), line),
            Some("640:360:0:60".to_string())
        );
    }

    #[test]
    fn test_lines_without_marker_are_skipped() {
        let line = "frame=  42 fps=15 crop=640:360:0:60";
        assert_eq!(parse_crop_line(&crop_pattern(), line), None);
    }

    #[test]
    fn test_marker_line_without_token_is_skipped() {
        let line = "[Parsed_cropdetect_0 @ 0x55] analyzing";
        assert_eq!(parse_crop_line(&crop_pattern(), line), None);
    }
}
