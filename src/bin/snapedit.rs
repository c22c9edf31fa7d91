//! snapedit CLI tool
//!
//! Command-line interface for the snapedit photo-editing library: offline
//! compositing operations plus the remote background-removal and upscaling
//! services.

#[cfg(feature = "cli")]
use snapedit::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
