//! Progress bar for the per-dataset stages.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

/// A bar over `length` datasets, hidden when disabled.
pub fn dataset_progress(length: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(length);
    match ProgressStyle::default_bar().template(TEMPLATE) {
        Ok(style) => bar.set_style(style.progress_chars("#>-")),
        Err(error) => tracing::debug!(%error, "default progress style kept"),
    }
    bar
}
