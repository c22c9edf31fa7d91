//! Service layer: format conversion, file I/O, and progress reporting

pub mod format;
pub mod io;
pub mod progress;

pub use format::OutputFormatHandler;
pub use io::ImageIOService;
pub use progress::{
    ConsoleProgressReporter, EditStage, NoOpProgressReporter, ProgressReporter, ProgressTracker,
    ProgressUpdate,
};
