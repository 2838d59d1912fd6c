use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Spinner shown while the external stages run. Disabled when quiet, and
/// when verbose so it does not fight the streamed diagnostics.
pub struct PipelineUi {
    spinner: Option<ProgressBar>,
}

impl PipelineUi {
    pub fn start(enabled: bool, optimize: bool) -> Self {
        if !enabled {
            return Self { spinner: None };
        }
        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap()
                .tick_strings(&["-", "\\", "|", "/"]),
        );
        spinner.set_message(if optimize {
            "Transcoding and optimizing..."
        } else {
            "Transcoding..."
        });
        Self {
            spinner: Some(spinner),
        }
    }

    pub fn finish(&self, output: &Path) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(format!("Wrote {}", output.display()));
        }
    }

    pub fn clear(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }
    }
}
