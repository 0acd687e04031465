use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::convert::ProgressInfo;
use crate::ConversionSummary;

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Per-batch progress reporter: one spinner per file, then a printed
/// summary. Instantiated once per run and passed down by reference.
pub struct ProgressTracker {
    total: usize,
    current: usize,
    current_name: String,
    spinner: Option<ProgressBar>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            current_name: String::new(),
            spinner: None,
        }
    }

    pub fn start(&mut self, path: &Path) {
        self.current_name = base_name(path);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static spinner template"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!(
            "[{}/{}] Converting: {}",
            self.current + 1,
            self.total,
            self.current_name
        ));
        self.spinner = Some(spinner);
    }

    pub fn update(&mut self, progress: &ProgressInfo) {
        if let (Some(spinner), Some(percent)) = (&self.spinner, progress.percent) {
            spinner.set_message(format!(
                "[{}/{}] Converting: {} ({percent:.1}%)",
                self.current + 1,
                self.total,
                self.current_name
            ));
        }
    }

    pub fn success(&mut self, path: &Path) {
        self.current += 1;
        self.clear_spinner();
        println!(
            "✔ [{}/{}] Converted: {}",
            self.current,
            self.total,
            base_name(path)
        );
    }

    pub fn fail(&mut self, path: &Path, error: &str) {
        self.current += 1;
        self.clear_spinner();
        println!(
            "✖ [{}/{}] Failed: {} - {}",
            self.current,
            self.total,
            base_name(path),
            error
        );
    }

    pub fn skip(&mut self, path: &Path, reason: &str) {
        self.current += 1;
        println!(
            "- [{}/{}] Skipped: {} - {}",
            self.current,
            self.total,
            base_name(path),
            reason
        );
    }

    pub fn finish(&mut self, summary: &ConversionSummary) {
        self.clear_spinner();
        println!("\nConversion Summary:");
        println!("  Successful: {}", summary.successful.len());
        println!("  Failed:     {}", summary.failed.len());
        println!("  Skipped:    {}", summary.skipped.len());

        if !summary.failed.is_empty() {
            println!("\nFailed files:");
            for failure in &summary.failed {
                println!("  - {}: {}", base_name(&failure.input_path), failure.error);
            }
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}
