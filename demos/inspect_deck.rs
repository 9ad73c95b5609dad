//! Prints the slides of a presentation: part, background and text shapes.
//!
//! Run with: cargo run --example inspect_deck <path/to/your/presentation.pptx>

use pptx_slides::{Presentation, Result};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let pptx_path = if args.len() > 1 {
        &args[1]
    } else {
        eprintln!("Usage: cargo run --example inspect_deck <path/to/presentation.pptx>");
        return Ok(());
    };

    let presentation = Presentation::open(pptx_path)?;

    println!(
        "{}: {} slides, {} x {} pt",
        pptx_path,
        presentation.slide_count(),
        presentation.slide_width(),
        presentation.slide_height()
    );

    for (index, slide) in presentation.slides().iter().enumerate() {
        let background = slide
            .background_color()
            .map(|color| color.to_string())
            .unwrap_or_else(|| "inherited".to_string());
        println!(
            "\n[{}] {} (background {})",
            index,
            slide.part_name().unwrap_or("?"),
            background
        );
        for shape in slide.text_shapes() {
            println!(
                "  - at ({:.1}%, {:.1}%) size {:.1}% x {:.1}%: {:?}",
                shape.x, shape.y, shape.width, shape.height, shape.text
            );
        }
    }

    Ok(())
}
