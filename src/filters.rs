use crate::cli::GifConfig;
use regex::Regex;

pub fn validate_positive(raw: &str) -> Result<u32, String> {
    let parsed: u32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` must be a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".into());
    }
    Ok(parsed)
}

pub fn validate_palette_size(raw: &str) -> Result<u32, String> {
    let parsed = validate_positive(raw)?;
    if !(2..=256).contains(&parsed) {
        return Err("palette size must be between 2 and 256".into());
    }
    Ok(parsed)
}

/// Rewrite overlay text so it can be embedded unquoted in a drawtext stage.
/// The passes run in a fixed order; later patterns assume earlier ones ran
/// (typographic quotes are only safe to introduce once the straight
/// metacharacters have been escaped away).
pub fn sanitize_text(raw: &str) -> String {
    // 1. escape the filter-expression separators
    let text = raw.replace(':', r"\:").replace(',', r"\,");

    // 2. collapse literal \n tokens into real line breaks
    let text = text.replace("\\n", "\n");

    // 3. apostrophes inside words become typographic
    let text = Regex::new(r"(\w)'(\w)")
        .unwrap()
        .replace_all(&text, "${1}\u{2019}${2}")
        .into_owned();

    // 4. remaining straight-quoted spans become typographic pairs
    let text = Regex::new("\"([^\"]*)\"")
        .unwrap()
        .replace_all(&text, "\u{201C}${1}\u{201D}")
        .into_owned();
    Regex::new("'([^']*)'")
        .unwrap()
        .replace_all(&text, "\u{2018}${1}\u{2019}")
        .into_owned()
}

/// One pass of the processing chain: {fps, crop, scale, drawtext} in that
/// order, optional stages skipped. drawtext stays last so scaling never
/// blurs the annotation.
pub fn stage_chain(cfg: &GifConfig) -> String {
    let mut stages = vec![format!("fps={}", cfg.fps), crop_stage(cfg)];

    if let Some(width) = cfg.width {
        stages.push(format!("scale={width}:-1:flags=lanczos"));
    }
    if let Some(text) = &cfg.text {
        stages.push(drawtext_stage(cfg, text));
    }

    stages.join(",")
}

/// The full two-pass palette graph. The same stage chain runs twice: once
/// into palettegen so the palette is computed from the post-processed
/// frames, and once more to render the frames that palette is applied to.
pub fn filter_complex(cfg: &GifConfig) -> String {
    let chain = stage_chain(cfg);
    format!(
        "{chain},palettegen=max_colors={palette}[pal];[0:v]{chain}[gif];[gif][pal]paletteuse",
        palette = cfg.palette
    )
}

fn crop_stage(cfg: &GifConfig) -> String {
    // a detected region supersedes the manual crop fields
    if let Some(token) = &cfg.detected_crop {
        return format!("crop={token}");
    }
    let width = cfg
        .crop_width
        .map_or_else(|| "in_w".to_string(), |v| v.to_string());
    let height = cfg
        .crop_height
        .map_or_else(|| "in_h".to_string(), |v| v.to_string());
    format!(
        "crop={width}:{height}:{}:{}",
        cfg.crop_offset_x, cfg.crop_offset_y
    )
}

fn drawtext_stage(cfg: &GifConfig, raw: &str) -> String {
    let text = sanitize_text(raw);
    let lines = text.matches('\n').count() as u32 + 1;
    let x = cfg
        .text_x
        .clone()
        .unwrap_or_else(|| "(w-text_w)/2".to_string());
    let y = cfg
        .text_y
        .clone()
        .unwrap_or_else(|| format!("h-{}", cfg.text_size * lines + 20));
    format!(
        "drawtext=font='{}:style={}':fontcolor={}:fontsize={}:borderw={}:bordercolor=black:x={x}:y={y}:text={text}",
        cfg.text_font, cfg.text_variant, cfg.text_color, cfg.text_size, cfg.text_border
    )
}
