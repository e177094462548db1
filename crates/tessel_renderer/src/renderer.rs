//! Parallel tiled renderer.
//!
//! Workers repeatedly claim a tile from a shared [`BlockGenerator`], render
//! it into a private scratch [`ImageBlock`], and merge that block into the
//! full-image result. Merges use atomic adds, so no lock is held around the
//! result block.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tessel_core::{Bitmap, RenderSettings, SceneDescription};
use tessel_math::IVec2;

use crate::block::ImageBlock;
use crate::camera::Camera;
use crate::error::RenderResult;
use crate::generator::{BlockGenerator, Tile};
use crate::integrator::{CameraIntegrator, Integrator, SampleSource};
use crate::sampler::{Independent, Sampler};

/// Render every sample of the block's current tile into it.
///
/// Each pixel receives `sampler.sample_count()` samples at uniformly
/// jittered positions inside the pixel.
pub fn render_block(source: &dyn SampleSource, sampler: &mut dyn Sampler, block: &ImageBlock) {
    let offset = block.offset();
    let size = block.size();

    for y in 0..size.y {
        for x in 0..size.x {
            let pixel = (offset + IVec2::new(x, y)).as_vec2();
            for _ in 0..sampler.sample_count() {
                let position = pixel + sampler.next_2d();
                let value = source.render_sample(sampler, position);
                block.put(position, &value, true);
            }
        }
    }
}

/// Counts finished tiles and drives the optional progress bar.
struct Progress {
    done: Mutex<usize>,
    total: usize,
    bar: Option<ProgressBar>,
}

impl Progress {
    fn new(total: usize, show: bool) -> Self {
        let bar = show.then(|| {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.bold.green} Rendering: [{wide_bar:.cyan}] {pos}/{len} tiles ({elapsed_precise}|{eta_precise})",
            ) {
                bar.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
            }
            bar.tick();
            bar
        });
        Self {
            done: Mutex::new(0),
            total,
            bar,
        }
    }

    fn tile_done(&self, tile: &Tile) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        log::debug!(
            "Tile {} at {} ({}x{}, {} px) done, {}/{}",
            tile.index,
            tile.offset,
            tile.size.x,
            tile.size.y,
            tile.pixel_count(),
            *done,
            self.total
        );
    }

    fn finish(&self) -> usize {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drives a parallel render for one set of settings.
pub struct Renderer {
    settings: RenderSettings,
    show_progress: bool,
    cancelled: Arc<AtomicBool>,
}

impl Renderer {
    /// Create a renderer, validating the settings up front.
    pub fn new(settings: RenderSettings) -> RenderResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            show_progress: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Show a terminal progress bar while rendering.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Flag that stops tile generation when set.
    ///
    /// Tiles already being rendered still finish and are merged, so a
    /// cancelled render returns a partial image.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Render the whole image and return the full-image block.
    ///
    /// `sampler` is cloned once per worker thread.
    pub fn render(&self, source: &dyn SampleSource, sampler: &dyn Sampler) -> RenderResult<ImageBlock> {
        let settings = &self.settings;
        let filter = settings.filter.build()?;
        let image_size = IVec2::new(settings.width as i32, settings.height as i32);
        let tile_size = settings.tile_size as i32;

        // Work scheduler
        let generator = BlockGenerator::new(image_size, tile_size)?
            .with_cancel_flag(Arc::clone(&self.cancelled));

        // Memory for the entire output image
        let mut result = ImageBlock::new(image_size, Some(filter.as_ref()))?;
        result.clear();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()?;
        let workers = pool.current_num_threads().min(generator.block_count()).max(1);

        // Per-worker scratch block and sampler. No tile is larger than the
        // image, so neither is the scratch block.
        let scratch_size = IVec2::splat(tile_size).min(image_size);
        let mut scratch = (0..workers)
            .map(|_| {
                let block = ImageBlock::new(scratch_size, Some(filter.as_ref()))?;
                Ok((block, sampler.clone_box()))
            })
            .collect::<RenderResult<Vec<(ImageBlock, Box<dyn Sampler>)>>>()?;

        log::info!(
            "Rendering {}x{} in {} tiles of {}px on {} threads ({} filter, radius {}, {} spp)",
            image_size.x,
            image_size.y,
            generator.block_count(),
            tile_size,
            workers,
            settings.filter.name(),
            filter.radius(),
            sampler.sample_count()
        );

        let progress = Progress::new(generator.block_count(), self.show_progress);
        let start = Instant::now();

        {
            let generator = &generator;
            let result = &result;
            let progress = &progress;
            pool.scope(|s| {
                for (block, sampler) in scratch.iter_mut() {
                    s.spawn(move |_| {
                        while let Some(tile) = generator.next_into(block) {
                            block.clear();
                            sampler.prepare(block);
                            render_block(source, sampler.as_mut(), block);

                            // Add the tile to the block covering the whole image
                            result.put_block(block);
                            progress.tile_done(&tile);
                        }
                    });
                }
            });
        }

        let done = progress.finish();
        if generator.is_cancelled() {
            log::warn!("Render cancelled after {}/{} tiles", done, generator.block_count());
        } else {
            log::info!("Rendered {} tiles in {:.2?}", done, start.elapsed());
        }

        Ok(result)
    }

    /// Render a scene description straight to a bitmap.
    pub fn render_scene(&self, scene: &SceneDescription) -> RenderResult<Bitmap> {
        scene.camera.validate()?;
        let camera = Camera::from_desc(&scene.camera, self.settings.width, self.settings.height);
        let source = CameraIntegrator::new(camera, Integrator::from(&scene.integrator));
        let sampler = Independent::new(self.settings.samples_per_pixel, self.settings.seed);

        let block = self.render(&source, &sampler)?;
        Ok(block.to_bitmap())
    }
}
