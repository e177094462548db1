//! Sample generators.
//!
//! A sampler supplies the sub-pixel offsets used to place samples. Each
//! worker thread owns its own clone, reseeded for every tile it claims so
//! a tile renders the same way regardless of which thread picks it up.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessel_math::{IVec2, Vec2};

use crate::block::ImageBlock;

/// Source of sample values in `[0, 1)`.
pub trait Sampler: Send {
    /// Fresh copy for another thread.
    fn clone_box(&self) -> Box<dyn Sampler>;

    /// Prepare to render the block's current tile.
    fn prepare(&mut self, block: &ImageBlock);

    fn next_1d(&mut self) -> f32;

    fn next_2d(&mut self) -> Vec2 {
        let x = self.next_1d();
        let y = self.next_1d();
        Vec2::new(x, y)
    }

    /// Samples taken per pixel.
    fn sample_count(&self) -> u32;
}

/// Independent uniform samples from a seeded `StdRng`.
#[derive(Clone, Debug)]
pub struct Independent {
    sample_count: u32,
    seed: u64,
    rng: StdRng,
}

impl Independent {
    pub fn new(sample_count: u32, seed: u64) -> Self {
        Self {
            sample_count,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn tile_seed(&self, offset: IVec2) -> u64 {
        let position = ((offset.x as u32 as u64) << 32) | offset.y as u32 as u64;
        self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ position
    }
}

impl Default for Independent {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl Sampler for Independent {
    fn clone_box(&self) -> Box<dyn Sampler> {
        Box::new(self.clone())
    }

    fn prepare(&mut self, block: &ImageBlock) {
        self.rng = StdRng::seed_from_u64(self.tile_seed(block.offset()));
    }

    fn next_1d(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_in_unit_interval() {
        let mut sampler = Independent::new(4, 7);
        for _ in 0..1000 {
            let p = sampler.next_2d();
            assert!((0.0..1.0).contains(&p.x));
            assert!((0.0..1.0).contains(&p.y));
        }
        assert_eq!(sampler.sample_count(), 4);
    }

    #[test]
    fn test_prepare_is_deterministic_per_tile() {
        let mut block = ImageBlock::new(IVec2::splat(8), None).unwrap();
        block.set_offset(IVec2::new(32, 64));

        let mut a = Independent::new(1, 3);
        let mut b = a.clone_box();
        // Advance one of them before preparing
        a.next_1d();
        a.prepare(&block);
        b.prepare(&block);
        for _ in 0..16 {
            assert_eq!(a.next_1d(), b.next_1d());
        }

        block.set_offset(IVec2::new(64, 32));
        b.prepare(&block);
        a.prepare(&ImageBlock::new(IVec2::splat(8), None).unwrap());
        let differs = (0..16).any(|_| a.next_1d() != b.next_1d());
        assert!(differs);
    }
}
