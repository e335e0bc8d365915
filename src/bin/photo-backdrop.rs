//! Photo backdrop CLI tool
//!
//! Blurs the background behind the subject of a photo, adds film grain and
//! exports the result as PNG.

#[cfg(feature = "cli")]
use photo_backdrop::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
