//! Progress reporting service
//!
//! Separates progress reporting from the edit pipeline so different frontends
//! can implement their own progress handling.

use crate::types::EditTimings;
use instant::Instant;
use std::sync::Arc;

/// Stages an edit operation moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStage {
    /// Loading and decoding the input image
    ImageLoading,
    /// Cropping to the selected area
    Cropping,
    /// Resampling to the target dimensions
    Resizing,
    /// Applying brightness/contrast/saturation/filter adjustments
    Adjusting,
    /// Uploading to a remote service
    Uploading,
    /// Waiting on the background-removal service
    RemovingBackground,
    /// Waiting on the upscaling service
    Upscaling,
    /// Stamping the watermark
    Watermarking,
    /// Encoding the result
    Encoding,
    /// Edit completed
    Completed,
}

impl EditStage {
    /// Human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            EditStage::ImageLoading => "Loading input image",
            EditStage::Cropping => "Cropping image",
            EditStage::Resizing => "Resizing image",
            EditStage::Adjusting => "Applying adjustments",
            EditStage::Uploading => "Uploading image",
            EditStage::RemovingBackground => "Removing background",
            EditStage::Upscaling => "Enhancing resolution",
            EditStage::Watermarking => "Applying watermark",
            EditStage::Encoding => "Encoding result",
            EditStage::Completed => "Edit completed",
        }
    }

    /// Typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            EditStage::ImageLoading => 10,
            EditStage::Cropping | EditStage::Resizing | EditStage::Adjusting => 50,
            EditStage::Uploading => 30,
            EditStage::RemovingBackground | EditStage::Upscaling => 70,
            EditStage::Watermarking => 90,
            EditStage::Encoding => 95,
            EditStage::Completed => 100,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current stage
    pub stage: EditStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since the operation started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(stage: EditStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }

    /// Create a progress update with a custom description
    #[must_use]
    pub fn with_description(stage: EditStage, description: String, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Trait for reporting progress during edit operations
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report operation completion with final timings
    fn report_completion(&self, timings: &EditTimings);

    /// Report an error during an operation
    fn report_error(&self, stage: EditStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {
        // Intentionally empty - discards progress updates
    }

    fn report_completion(&self, _timings: &EditTimings) {
        // Intentionally empty - discards completion notification
    }

    fn report_error(&self, _stage: EditStage, _error: &str) {
        // Intentionally empty - discards error reports
    }
}

/// Console progress reporter that logs progress via `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to show detailed timing information
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: &EditTimings) {
        log::info!("✅ Edit completed in {}ms", timings.total_ms);

        if self.verbose {
            log::info!("  📊 Detailed timings:");
            log::info!("    • Image decode: {}ms", timings.decode_ms);
            log::info!("    • Operation: {}ms", timings.operation_ms);
            log::info!("    • Encode: {}ms", timings.encode_ms);
        }
    }

    fn report_error(&self, stage: EditStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}

/// Couples a reporter with the operation's start time
///
/// Holding an `Arc` keeps reporter wiring cheap to clone into async tasks.
#[derive(Clone)]
pub struct ProgressTracker {
    reporter: Arc<dyn ProgressReporter>,
    start_time: Instant,
}

impl ProgressTracker {
    /// Start tracking a new operation
    #[must_use]
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
        }
    }

    /// Report entering a stage
    pub fn stage(&self, stage: EditStage) {
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    /// Report entering a stage with a custom description
    pub fn stage_with_description(&self, stage: EditStage, description: String) {
        self.reporter.report_progress(ProgressUpdate::with_description(
            stage,
            description,
            self.start_time,
        ));
    }

    /// Report successful completion
    pub fn complete(&self, timings: &EditTimings) {
        self.reporter
            .report_progress(ProgressUpdate::new(EditStage::Completed, self.start_time));
        self.reporter.report_completion(timings);
    }

    /// Report an error
    pub fn error(&self, stage: EditStage, error: &str) {
        self.reporter.report_error(stage, error);
    }

    /// Elapsed time since tracking started (milliseconds)
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}
