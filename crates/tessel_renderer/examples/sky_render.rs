//! Renders the sky gradient through the tiled pipeline and saves a PNG.
//!
//! Run with `RUST_LOG=debug` to see tiles finishing in spiral order.

use tessel_core::{FilterDesc, RenderSettings};
use tessel_renderer::{Camera, CameraIntegrator, Independent, Integrator, Renderer, Vec3};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = RenderSettings {
        width: 800,
        height: 450,
        tile_size: 32,
        samples_per_pixel: 16,
        filter: FilterDesc::Gaussian {
            radius: 2.0,
            stddev: 0.5,
        },
        ..RenderSettings::default()
    };

    let mut camera = Camera::new()
        .with_resolution(settings.width, settings.height)
        .with_position(Vec3::ZERO, Vec3::new(0.0, 0.3, -1.0), Vec3::Y)
        .with_fov(60.0);
    camera.initialize();

    let source = CameraIntegrator::new(camera, Integrator::Sky);
    let sampler = Independent::new(settings.samples_per_pixel, settings.seed);

    let renderer = Renderer::new(settings)?.with_progress(true);
    let bitmap = renderer.render(&source, &sampler)?.to_bitmap();

    let filename = "sky.png";
    bitmap.save(filename)?;
    log::info!("Saved to {}", filename);

    Ok(())
}
