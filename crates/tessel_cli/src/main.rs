use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tessel_core::SceneDescription;
use tessel_renderer::Renderer;

const DEFAULT_OUTPUT: &str = "render.png";

#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Args {
    /// Scene description (.json). Built-in defaults are used when omitted.
    #[arg(value_name = "scene.json")]
    scene: Option<PathBuf>,

    /// Write the final image to the given filename (.png or .exr).
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,

    /// Use specified number of threads for rendering (0 = all cores).
    #[arg(short = 'j', long = "nthreads", value_name = "num", env = "TESSEL_THREADS")]
    threads: Option<usize>,

    /// Samples per pixel.
    #[arg(short = 's', long = "spp", value_name = "num")]
    spp: Option<u32>,

    /// Edge length of the square render tiles.
    #[arg(long, value_name = "px")]
    tile_size: Option<u32>,

    /// Override the image width.
    #[arg(long, value_name = "px")]
    width: Option<u32>,

    /// Override the image height.
    #[arg(long, value_name = "px")]
    height: Option<u32>,

    /// Hide the progress bar.
    #[arg(long, default_value = "false")]
    no_progress: bool,
}

impl Args {
    fn apply(&self, scene: &mut SceneDescription) {
        let settings = &mut scene.settings;
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if let Some(spp) = self.spp {
            settings.samples_per_pixel = spp;
        }
        if let Some(tile_size) = self.tile_size {
            settings.tile_size = tile_size;
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(output) = &self.output {
            scene.output = Some(output.clone());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let mut scene = match &args.scene {
        Some(path) => SceneDescription::from_file(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => {
            log::info!("No scene given, using defaults");
            SceneDescription::default()
        }
    };
    args.apply(&mut scene);
    scene.validate().context("Invalid render settings")?;

    let renderer = Renderer::new(scene.settings.clone())?.with_progress(!args.no_progress);
    let bitmap = renderer.render_scene(&scene).context("Render failed")?;

    let output = scene
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    bitmap
        .save(&output)
        .with_context(|| format!("Failed to save {}", output.display()))?;
    log::info!("Saved {}", output.display());

    Ok(())
}
