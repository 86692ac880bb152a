// file: src/pipeline/progress.rs
// description: per-item progress bars and run statistics for the RAG stages
// reference: uses indicatif for progress bars and tracks processing metrics

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub sources_indexed: usize,
    pub documents_indexed: usize,
    pub queries_answered: usize,
    pub items_evaluated: usize,
    pub items_skipped: usize,
    pub mean_score: Option<f64>,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn queries_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.queries_answered as f64 / self.duration_secs as f64
    }

    /// Percentage of evaluation items that produced a result.
    pub fn evaluation_rate(&self) -> f64 {
        let total = self.items_evaluated + self.items_skipped;
        if total == 0 {
            return 0.0;
        }
        (self.items_evaluated as f64 / total as f64) * 100.0
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mean = match self.mean_score {
            Some(score) => format!("{:.3}", score),
            None => "n/a".to_string(),
        };

        vec![
            format!(
                "Indexed: {} documents from {} sources",
                self.documents_indexed.to_string().cyan(),
                self.sources_indexed
            ),
            format!(
                "Answered: {} queries ({:.2}/s)",
                self.queries_answered.to_string().cyan(),
                self.queries_per_second()
            ),
            format!(
                "Evaluated: {} ({} skipped, {:.1}% scored)",
                self.items_evaluated.to_string().cyan(),
                self.items_skipped.to_string().yellow(),
                self.evaluation_rate()
            ),
            format!("Mean faithfulness: {}", mean.green().bold()),
            format!("Duration: {}s", self.duration_secs),
        ]
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    completed: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
}

impl ProgressTracker {
    pub fn new(total_items: usize) -> Self {
        Self::with_color(total_items, true)
    }

    pub fn with_color(total_items: usize, colored: bool) -> Self {
        Self::build(MultiProgress::new(), total_items, colored)
    }

    /// Tracker that counts but never draws.
    pub fn hidden(total_items: usize) -> Self {
        Self::build(
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            total_items,
            false,
        )
    }

    fn build(multi_progress: MultiProgress, total_items: usize, colored: bool) -> Self {
        let main_bar = create_progress_bar(&multi_progress, total_items as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            completed: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    pub fn set_message(&self, message: String) {
        self.main_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_and_clear();
        self.detail_bar.finish_and_clear();
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Completed: {} | Skipped: {}",
            self.completed(),
            self.skipped()
        );
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
