use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Progress for a watchlist import: a bar on a terminal, structured log
/// lines everywhere else.
pub struct ImportProgress {
    bar: Option<ProgressBar>,
}

impl ImportProgress {
    pub fn new(enabled: bool) -> Self {
        if !enabled || !is_interactive() {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress bar disabled, using structured logging"
            );
            return Self { bar: None };
        }

        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.set_message("Reading export...");
        Self { bar: Some(bar) }
    }

    pub fn update(&self, done: usize, total: usize, title: &str) {
        match &self.bar {
            Some(bar) => {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
                bar.set_message(title.to_string());
            }
            None => tracing::info!(
                operation = "import_progress",
                current = done,
                total = total,
                percent = (done as f64 / total.max(1) as f64 * 100.0) as u8,
                title = title,
                "Import progress update"
            ),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
