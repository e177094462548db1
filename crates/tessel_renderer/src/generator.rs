//! Spiral tile scheduling.
//!
//! Divides the image into tiles that worker threads claim one at a time.
//! Tiles are handed out in a square spiral starting at the center of the
//! image, so an interrupted or previewed render shows the middle first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tessel_math::IVec2;

use crate::block::ImageBlock;
use crate::error::{RenderError, RenderResult};

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Top-left corner in image pixels
    pub offset: IVec2,
    /// Width and height; edge tiles are smaller than the nominal tile size
    pub size: IVec2,
    /// Position of this tile in the render order
    pub index: usize,
}

impl Tile {
    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.size.x as usize * self.size.y as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    fn turn(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }

    fn step(self) -> IVec2 {
        match self {
            Direction::Right => IVec2::X,
            Direction::Down => IVec2::Y,
            Direction::Left => IVec2::NEG_X,
            Direction::Up => IVec2::NEG_Y,
        }
    }
}

/// Mutable spiral position, only touched while holding the lock.
#[derive(Debug)]
struct Spiral {
    tile: IVec2,
    direction: Direction,
    steps_left: i32,
    step_run: i32,
    blocks_left: usize,
}

/// Thread-safe spiral iterator over the tiles of an image.
///
/// Every tile of the `ceil(width / tile) x ceil(height / tile)` grid is
/// returned exactly once, however many threads call [`next`](Self::next).
#[derive(Debug)]
pub struct BlockGenerator {
    image_size: IVec2,
    tile_size: i32,
    num_tiles: IVec2,
    block_count: usize,
    spiral: Mutex<Spiral>,
    cancelled: Arc<AtomicBool>,
}

impl BlockGenerator {
    /// Default tile edge length in pixels.
    pub const DEFAULT_TILE_SIZE: i32 = 32;

    /// Create a generator splitting `image_size` into tiles of at most
    /// `tile_size` pixels per side.
    pub fn new(image_size: IVec2, tile_size: i32) -> RenderResult<Self> {
        if image_size.x <= 0 || image_size.y <= 0 {
            return Err(RenderError::InvalidImageSize(image_size));
        }
        if tile_size <= 0 {
            return Err(RenderError::InvalidTileSize(tile_size));
        }

        let num_tiles = (image_size - 1) / tile_size + 1;
        let block_count = num_tiles.x as usize * num_tiles.y as usize;

        Ok(Self {
            image_size,
            tile_size,
            num_tiles,
            block_count,
            spiral: Mutex::new(Spiral {
                // Integer division: for even counts this is one tile past
                // the exact center on that axis.
                tile: num_tiles / 2,
                direction: Direction::Right,
                steps_left: 1,
                step_run: 1,
                blocks_left: block_count,
            }),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Share an external cancellation flag with this generator.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    pub fn image_size(&self) -> IVec2 {
        self.image_size
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Tile grid dimensions.
    pub fn num_tiles(&self) -> IVec2 {
        self.num_tiles
    }

    /// Total number of tiles.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Tiles not yet handed out.
    pub fn blocks_left(&self) -> usize {
        self.lock().blocks_left
    }

    /// Stop handing out tiles. Tiles already claimed are unaffected.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Spiral> {
        // The spiral is consistent between statements, so a poisoned lock
        // is still usable.
        self.spiral.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the next tile, or `None` once every tile has been handed out
    /// or the generator was cancelled.
    pub fn next(&self) -> Option<Tile> {
        if self.is_cancelled() {
            return None;
        }

        let mut guard = self.lock();
        let spiral = &mut *guard;
        if spiral.blocks_left == 0 {
            return None;
        }

        let offset = spiral.tile * self.tile_size;
        let tile = Tile {
            offset,
            size: IVec2::splat(self.tile_size).min(self.image_size - offset),
            index: self.block_count - spiral.blocks_left,
        };

        spiral.blocks_left -= 1;
        if spiral.blocks_left == 0 {
            return Some(tile);
        }

        // Advance along the spiral, skipping positions outside the grid.
        loop {
            spiral.tile += spiral.direction.step();
            spiral.steps_left -= 1;
            if spiral.steps_left == 0 {
                spiral.direction = spiral.direction.turn();
                if matches!(spiral.direction, Direction::Left | Direction::Right) {
                    spiral.step_run += 1;
                }
                spiral.steps_left = spiral.step_run;
            }

            let t = spiral.tile;
            if t.x >= 0 && t.y >= 0 && t.x < self.num_tiles.x && t.y < self.num_tiles.y {
                break;
            }
        }

        Some(tile)
    }

    /// Claim the next tile and move `block` onto it.
    pub fn next_into(&self, block: &mut ImageBlock) -> Option<Tile> {
        let tile = self.next()?;
        block.set_offset(tile.offset);
        block.set_size(tile.size);
        Some(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn drain(generator: &BlockGenerator) -> Vec<Tile> {
        std::iter::from_fn(|| generator.next()).collect()
    }

    fn assert_partition(tiles: &[Tile], width: i32, height: i32) {
        let mut covered = vec![0u32; (width * height) as usize];
        for tile in tiles {
            assert!(tile.size.x > 0 && tile.size.y > 0);
            for y in tile.offset.y..tile.offset.y + tile.size.y {
                for x in tile.offset.x..tile.offset.x + tile.size.x {
                    assert!(x < width && y < height, "tile {tile:?} overflows the image");
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "tiles must cover every pixel once");
    }

    #[test]
    fn test_exact_fit() {
        let generator = BlockGenerator::new(IVec2::new(128, 128), 64).unwrap();
        assert_eq!(generator.block_count(), 4); // 2x2 grid

        let tiles = drain(&generator);
        assert_eq!(tiles.len(), 4);
        let total_pixels: usize = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
        assert_partition(&tiles, 128, 128);
    }

    #[test]
    fn test_partial_fit() {
        let generator = BlockGenerator::new(IVec2::new(100, 70), 32).unwrap();
        assert_eq!(generator.num_tiles(), IVec2::new(4, 3));

        let tiles = drain(&generator);
        assert_eq!(tiles.len(), 12);
        assert_partition(&tiles, 100, 70);

        let corner = tiles
            .iter()
            .find(|t| t.offset == IVec2::new(96, 64))
            .unwrap();
        assert_eq!(corner.size, IVec2::new(4, 6));
    }

    #[test]
    fn test_spiral_order() {
        let generator = BlockGenerator::new(IVec2::new(96, 96), 32).unwrap();
        let order: Vec<IVec2> = drain(&generator)
            .iter()
            .map(|t| t.offset / 32)
            .collect();

        let expected = [
            (1, 1),
            (2, 1),
            (2, 2),
            (1, 2),
            (0, 2),
            (0, 1),
            (0, 0),
            (1, 0),
            (2, 0),
        ];
        let expected: Vec<IVec2> = expected.iter().map(|&(x, y)| IVec2::new(x, y)).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_even_grid_starts_past_center() {
        let generator = BlockGenerator::new(IVec2::new(64, 64), 32).unwrap();
        let order: Vec<IVec2> = drain(&generator).iter().map(|t| t.offset / 32).collect();
        assert_eq!(
            order,
            vec![
                IVec2::new(1, 1),
                IVec2::new(0, 1),
                IVec2::new(0, 0),
                IVec2::new(1, 0)
            ]
        );
    }

    #[test]
    fn test_indices_follow_claim_order() {
        let generator = BlockGenerator::new(IVec2::new(50, 20), 8).unwrap();
        let tiles = drain(&generator);
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, i);
        }
    }

    #[test]
    fn test_coverage_many_shapes() {
        for (w, h, t) in [(1, 1, 1), (1, 17, 4), (17, 1, 4), (33, 65, 16), (200, 30, 7), (64, 64, 100)] {
            let generator = BlockGenerator::new(IVec2::new(w, h), t).unwrap();
            let expected = (((w + t - 1) / t) * ((h + t - 1) / t)) as usize;
            let tiles = drain(&generator);
            assert_eq!(tiles.len(), expected, "{w}x{h} tile {t}");
            assert_partition(&tiles, w, h);
        }
    }

    #[test]
    fn test_exhausted_stays_exhausted() {
        let generator = BlockGenerator::new(IVec2::new(40, 40), 32).unwrap();
        assert_eq!(drain(&generator).len(), 4);
        assert_eq!(generator.blocks_left(), 0);
        for _ in 0..3 {
            assert!(generator.next().is_none());
        }
    }

    #[test]
    fn test_concurrent_claims_cover_once() {
        let generator = BlockGenerator::new(IVec2::new(333, 257), 16).unwrap();
        let total = generator.block_count();

        let claimed: Vec<Vec<Tile>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| drain(&generator))).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let tiles: Vec<Tile> = claimed.into_iter().flatten().collect();
        assert_eq!(tiles.len(), total);
        let unique: HashSet<IVec2> = tiles.iter().map(|t| t.offset).collect();
        assert_eq!(unique.len(), total);
        assert_partition(&tiles, 333, 257);
    }

    #[test]
    fn test_cancel_stops_generation() {
        let flag = Arc::new(AtomicBool::new(false));
        let generator = BlockGenerator::new(IVec2::new(256, 256), 32)
            .unwrap()
            .with_cancel_flag(flag.clone());

        assert!(generator.next().is_some());
        flag.store(true, Ordering::Release);
        assert!(generator.is_cancelled());
        assert!(generator.next().is_none());
        assert_eq!(generator.blocks_left(), 63);
    }

    #[test]
    fn test_next_into_moves_block() {
        let generator = BlockGenerator::new(IVec2::new(40, 40), 32).unwrap();
        let mut block = ImageBlock::new(IVec2::splat(32), None).unwrap();

        // 2x2 grid: the spiral starts at tile (1, 1), a partial 8x8 tile
        let tile = generator.next_into(&mut block).unwrap();
        assert_eq!(tile.offset, IVec2::new(32, 32));
        assert_eq!(block.offset(), IVec2::new(32, 32));
        assert_eq!(block.size(), IVec2::new(8, 8));
    }

    #[test]
    fn test_tile_larger_than_image() {
        let generator = BlockGenerator::new(IVec2::new(8, 5), 200_000).unwrap();
        assert_eq!(generator.num_tiles(), IVec2::ONE);

        let tiles = drain(&generator);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].offset, IVec2::ZERO);
        assert_eq!(tiles[0].size, IVec2::new(8, 5));
    }

    #[test]
    fn test_huge_dimensions_do_not_overflow() {
        let image = IVec2::splat(i32::MAX);
        let generator = BlockGenerator::new(image, i32::MAX - 1).unwrap();
        assert_eq!(generator.num_tiles(), IVec2::new(2, 2));

        let tiles = drain(&generator);
        assert_eq!(tiles.len(), 4);
        for tile in &tiles {
            assert!(tile.size.x > 0 && tile.size.y > 0);
            let end = tile.offset.as_i64vec2() + tile.size.as_i64vec2();
            assert!(end.x <= i32::MAX as i64 && end.y <= i32::MAX as i64);
        }
        let covered: i64 = tiles
            .iter()
            .map(|t| t.size.x as i64 * t.size.y as i64)
            .sum();
        assert_eq!(covered, i32::MAX as i64 * i32::MAX as i64);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            BlockGenerator::new(IVec2::new(0, 10), 32),
            Err(RenderError::InvalidImageSize(_))
        ));
        assert!(matches!(
            BlockGenerator::new(IVec2::new(10, 10), 0),
            Err(RenderError::InvalidTileSize(0))
        ));
        assert!(matches!(
            BlockGenerator::new(IVec2::new(10, 10), -4),
            Err(RenderError::InvalidTileSize(-4))
        ));
    }
}
