//! Runs every slide walkthrough in order.
//!
//! The scratch directory `Presentations/New` is prepared first. When
//! `Presentations/Existing/test.pptx` is missing, a two-slide deck is written
//! there so the walkthroughs that edit an existing deck have something to open.
//!
//! Run with: cargo run --example slide_walkthrough
//! Set `RUST_LOG=debug` to see every slide update.

use pptx_slides::{DemoConfig, SlideDemos};
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let demos = SlideDemos::new(DemoConfig::default())?;

    if let Err(err) = demos.run_all() {
        eprintln!("{}", err);
        if let Some(source) = err.source() {
            eprintln!("  caused by: {}", source);
        }
        return Err(err.into());
    }

    println!("All walkthroughs finished.");
    println!("New deck: {}", demos.config().new_document().display());
    println!("Existing deck: {}", demos.config().existing_document().display());

    Ok(())
}
