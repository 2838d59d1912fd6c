use crate::cli::GifConfig;
use crate::error::GifError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;

pub const FFMPEG: &str = "ffmpeg";
pub const GIFSICLE: &str = "gifsicle";

#[derive(Debug, Clone)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub gifsicle: Option<PathBuf>,
}

/// ffmpeg is required; a missing gifsicle only downgrades --optimize.
pub fn resolve_tools() -> Result<Tools> {
    let ffmpeg = which(FFMPEG).map_err(|_| GifError::MissingTool(FFMPEG))?;
    Ok(Tools {
        ffmpeg,
        gifsicle: which(GIFSICLE).ok(),
    })
}

/// Probe invocation: run cropdetect at a fixed sensitivity against a null
/// sink. The interesting output is the diagnostic stream; nothing is written.
pub fn crop_probe_args(cfg: &GifConfig) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into()];
    push_clip_window(&mut args, cfg);
    args.extend([
        "-i".into(),
        path_arg(&cfg.input),
        "-vf".into(),
        "cropdetect=24:16:0".into(),
        "-an".into(),
        "-f".into(),
        "null".into(),
        "-y".into(),
        "-".into(),
    ]);
    args
}

/// Main transcode invocation. Probe limits are maxed out so odd inputs are
/// not misdetected. The sink is stdout when the GIF is piped on to the
/// optimizer, the resolved output path otherwise.
pub fn transcode_args(cfg: &GifConfig, filter_expr: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-analyzeduration".into(),
        "2147483647".into(),
        "-probesize".into(),
        "2147483647".into(),
        "-nostdin".into(),
    ];
    if !cfg.verbose {
        args.extend([
            "-hide_banner".into(),
            "-nostats".into(),
            "-loglevel".into(),
            "error".into(),
        ]);
    }
    push_clip_window(&mut args, cfg);
    args.extend([
        "-i".into(),
        path_arg(&cfg.input),
        "-filter_complex".into(),
        filter_expr.to_string(),
        "-f".into(),
        "gif".into(),
        "-y".into(),
    ]);
    args.push(if cfg.optimize {
        "-".into()
    } else {
        path_arg(&cfg.output)
    });
    args
}

/// Optimizer invocation: read the GIF from stdin, apply layer optimization,
/// write the resolved output path.
pub fn optimizer_args(cfg: &GifConfig) -> Vec<String> {
    vec![
        "-O3".into(),
        "-o".into(),
        path_arg(&cfg.output),
        "-".into(),
    ]
}

pub fn command(program: &Path, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd
}

/// Render an argument vector as a copy-pastable shell line for diagnostics.
pub fn shell_preview(program: &str, args: &[String]) -> String {
    let mut parts = vec![quote(program)];
    parts.extend(args.iter().map(|arg| quote(arg)));
    parts.join(" ")
}

fn push_clip_window(args: &mut Vec<String>, cfg: &GifConfig) {
    if let Some(seek) = &cfg.seek {
        args.extend(["-ss".into(), seek.clone()]);
    }
    if let Some(time) = &cfg.time {
        args.extend(["-t".into(), time.clone()]);
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=+./:,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
