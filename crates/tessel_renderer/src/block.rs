//! Weighted pixel storage for rectangular image regions.
//!
//! An `ImageBlock` records, for every pixel, the filter-weighted sum of the
//! radiance samples that landed near it plus the sum of the weights
//! themselves. Dividing the two gives the reconstructed pixel value.
//!
//! Reconstruction filters have support beyond a single pixel, so samples
//! taken near the edge of a block also contribute to pixels just outside
//! it. Each block therefore stores a border around its nominal region,
//! sized from the filter radius; merging neighbouring blocks into the
//! full-image block sums those overlapping borders and avoids seams.

use tessel_core::{Bitmap, ReconstructionFilter, SceneError};
use tessel_math::{IVec2, Rect2i, Vec2, RAY_EPSILON};

use crate::atomic::AtomicFloat;
use crate::error::{RenderError, RenderResult};

/// Accumulator slots per pixel: RGB plus the filter weight sum.
pub const CHANNEL_COUNT: usize = 4;

/// Index of the weight accumulator within a pixel.
pub const WEIGHT_CHANNEL: usize = CHANNEL_COUNT - 1;

/// Resolution at which reconstruction filters are tabulated.
pub const FILTER_RESOLUTION: usize = 32;

/// A reconstruction filter discretized into a lookup table.
///
/// Evaluating the filter for every pixel of every splat is too slow, so
/// the falloff is sampled once at `FILTER_RESOLUTION` points across the
/// radius. The final entry is a zero sentinel so distances at or past the
/// radius contribute nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTable {
    radius: f32,
    lookup_factor: f32,
    table: [f32; FILTER_RESOLUTION + 1],
}

impl FilterTable {
    /// Tabulate `filter`. The radius must be positive.
    pub fn new(filter: &dyn ReconstructionFilter) -> RenderResult<Self> {
        let radius = filter.radius();
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SceneError::InvalidFilterRadius(radius).into());
        }

        let mut table = [0.0; FILTER_RESOLUTION + 1];
        for (i, entry) in table.iter_mut().take(FILTER_RESOLUTION).enumerate() {
            let pos = (radius * i as f32) / FILTER_RESOLUTION as f32;
            *entry = filter.eval(pos);
        }
        table[FILTER_RESOLUTION] = 0.0;

        Ok(Self {
            radius,
            lookup_factor: FILTER_RESOLUTION as f32 / radius,
            table,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// The tabulated values, sentinel included.
    pub fn values(&self) -> &[f32] {
        &self.table
    }

    /// Filter weight at signed distance `d` from the sample.
    #[inline]
    pub fn lookup(&self, d: f32) -> f32 {
        // Float to int casts saturate, NaN maps to 0.
        let index = ((d.abs() * self.lookup_factor) as usize).min(FILTER_RESOLUTION);
        self.table[index]
    }
}

/// A borrowed view of a padded pixel buffer.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    pub data: &'a [AtomicFloat],
    /// Buffer dimensions in pixels
    pub size: IVec2,
    pub channels: usize,
}

/// Add a rectangle of `source` into `target`.
///
/// The `size` pixels starting at `source_offset` in the source are added
/// onto the pixels starting at `target_offset` in the target. The region is
/// first clipped against the bounds of both buffers; anything outside is
/// ignored, so fully disjoint placements do nothing.
///
/// Target slots are updated with atomic adds, so several sources may be
/// accumulated into one target concurrently. `source` and `target` must
/// not be the same buffer.
pub fn accumulate_2d(
    source: BufferView<'_>,
    target: BufferView<'_>,
    mut source_offset: IVec2,
    mut target_offset: IVec2,
    mut size: IVec2,
) {
    debug_assert_eq!(source.channels, target.channels);
    let channels = source.channels;

    let shift = IVec2::ZERO.max((-source_offset).max(-target_offset));
    source_offset += shift;
    target_offset += shift;
    size -= shift;
    size -= (source_offset + size - source.size).max(IVec2::ZERO);
    size -= (target_offset + size - target.size).max(IVec2::ZERO);

    if size.x <= 0 || size.y <= 0 {
        return;
    }

    let n = size.x as usize * channels;
    for y in 0..size.y {
        let src = ((source_offset.y + y) as usize * source.size.x as usize
            + source_offset.x as usize)
            * channels;
        let dst = ((target_offset.y + y) as usize * target.size.x as usize
            + target_offset.x as usize)
            * channels;

        let src_row = &source.data[src..src + n];
        let dst_row = &target.data[dst..dst + n];
        for (s, t) in src_row.iter().zip(dst_row) {
            let v = s.load();
            if v != 0.0 {
                t.fetch_add(v);
            }
        }
    }
}

/// Weighted pixel storage for a rectangular subregion of an image.
///
/// `put` and `put_block` take `&self` and accumulate atomically, so a
/// single full-image block can be shared by every worker thread. Changing
/// the size or offset requires `&mut self`, which rules out resizing while
/// samples are being splatted.
#[derive(Debug)]
pub struct ImageBlock {
    offset: IVec2,
    size: IVec2,
    border_size: i32,
    filter: Option<FilterTable>,
    data: Vec<AtomicFloat>,
}

impl ImageBlock {
    /// Create a block of the given maximum size.
    ///
    /// Samples are convolved with `filter`; without one every sample lands
    /// in exactly one pixel.
    pub fn new(size: IVec2, filter: Option<&dyn ReconstructionFilter>) -> RenderResult<Self> {
        if size.x <= 0 || size.y <= 0 {
            return Err(RenderError::InvalidBlockSize(size));
        }

        let filter = filter.map(FilterTable::new).transpose()?;
        let border_size = filter
            .as_ref()
            .map(|table| (table.radius() - 0.5 - 2.0 * RAY_EPSILON).ceil() as i32)
            .unwrap_or(0)
            .max(0);

        let mut block = Self {
            offset: IVec2::ZERO,
            size: IVec2::ZERO,
            border_size,
            filter,
            data: Vec::new(),
        };
        block.set_size(size);
        Ok(block)
    }

    /// Position of the block's top-left interior pixel in the full image.
    pub fn offset(&self) -> IVec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: IVec2) {
        self.offset = offset;
    }

    /// Interior size, border excluded.
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Resize the block, reallocating (and zeroing) the buffer if the size
    /// changed. The contents are unspecified otherwise; call `clear`.
    pub fn set_size(&mut self, size: IVec2) {
        debug_assert!(size.x > 0 && size.y > 0, "block size must be positive");
        if size == self.size {
            return;
        }
        self.size = size;
        let padded = self.padded_size();
        let len = CHANNEL_COUNT * padded.x as usize * padded.y as usize;
        self.data = (0..len).map(|_| AtomicFloat::default()).collect();
    }

    pub fn border_size(&self) -> i32 {
        self.border_size
    }

    /// Buffer dimensions including the border on both sides.
    pub fn padded_size(&self) -> IVec2 {
        self.size + 2 * self.border_size
    }

    /// Full-image rectangle covered by the padded buffer.
    pub fn padded_rect(&self) -> Rect2i {
        Rect2i::new(self.offset, self.size).expand(self.border_size)
    }

    /// Radius of the tabulated filter, or 0 when point sampling.
    pub fn filter_radius(&self) -> f32 {
        self.filter.as_ref().map(FilterTable::radius).unwrap_or(0.0)
    }

    pub fn filter_table(&self) -> Option<&FilterTable> {
        self.filter.as_ref()
    }

    /// Number of accumulator slots in the buffer.
    pub fn buffer_len(&self) -> usize {
        self.data.len()
    }

    /// Zero every accumulator.
    pub fn clear(&mut self) {
        for slot in &mut self.data {
            *slot.get_mut() = 0.0;
        }
    }

    fn view(&self) -> BufferView<'_> {
        BufferView {
            data: &self.data,
            size: self.padded_size(),
            channels: CHANNEL_COUNT,
        }
    }

    /// Slot index of padded-buffer pixel `(x, y)`.
    #[inline]
    fn slot(&self, x: i32, y: i32) -> usize {
        CHANNEL_COUNT * (y as usize * self.padded_size().x as usize + x as usize)
    }

    #[inline]
    fn splat(&self, x: i32, y: i32, value: &[f32; CHANNEL_COUNT], weight: f32) {
        let base = self.slot(x, y);
        for (slot, v) in self.data[base..base + CHANNEL_COUNT].iter().zip(value) {
            slot.fetch_add(v * weight);
        }
    }

    /// Record a sample at full-image position `position`.
    ///
    /// `value` holds the color channels followed by the sample weight; all
    /// of them are scaled by the filter weight and accumulated. When
    /// `active` is false nothing is written and `false` is returned.
    /// Otherwise the return value tells whether any pixel of the padded
    /// buffer received a contribution. Samples outside the buffer are not
    /// an error, they simply contribute nothing.
    pub fn put(&self, position: Vec2, value: &[f32; CHANNEL_COUNT], active: bool) -> bool {
        if !active || !position.is_finite() {
            return false;
        }

        let padded = self.padded_size();

        // Convert to pixel coordinates within the padded buffer
        let pos = position - (self.offset - self.border_size).as_vec2() - 0.5;

        match &self.filter {
            Some(table) if table.radius() > 0.5 + RAY_EPSILON => {
                let radius = table.radius();

                // Determine the affected range of pixels. Float to int
                // casts saturate, so far away samples yield an empty range.
                let lo = (pos - radius).ceil().as_ivec2().max(IVec2::ZERO);
                let hi = (pos + radius).floor().as_ivec2().min(padded - 1);
                if lo.x > hi.x || lo.y > hi.y {
                    return false;
                }

                // Pixels at exactly the radius carry zero weight; cap the
                // footprint so rounding cannot pick them up from the table.
                let n = ((radius - 2.0 * RAY_EPSILON) * 2.0).ceil() as i32;
                let hi = hi.min(lo.saturating_add(IVec2::splat(n - 1)));

                for y in lo.y..=hi.y {
                    let weight_y = table.lookup(y as f32 - pos.y);
                    for x in lo.x..=hi.x {
                        let weight = weight_y * table.lookup(x as f32 - pos.x);
                        self.splat(x, y, value, weight);
                    }
                }
                true
            }
            _ => {
                let p = (pos - 0.5).ceil().as_ivec2();
                if p.x < 0 || p.y < 0 || p.x >= padded.x || p.y >= padded.y {
                    return false;
                }
                self.splat(p.x, p.y, value, 1.0);
                true
            }
        }
    }

    /// Merge another block into this one.
    ///
    /// Both padded buffers are placed in full-image coordinates and `other`
    /// is added onto the overlap; parts of `other` outside this block are
    /// dropped. Safe to call from several threads at once.
    pub fn put_block(&self, other: &ImageBlock) {
        debug_assert!(
            !std::ptr::eq(self, other),
            "cannot merge an image block into itself"
        );

        let source_rect = other.padded_rect();
        let target_rect = self.padded_rect();
        let overlap = source_rect.intersect(&target_rect);
        if overlap.is_empty() {
            return;
        }

        accumulate_2d(
            other.view(),
            self.view(),
            overlap.min - source_rect.min,
            overlap.min - target_rect.min,
            overlap.size,
        );
    }

    /// Raw accumulators of pixel `p`.
    ///
    /// `p` is relative to the interior's top-left corner, so the border is
    /// reachable with coordinates down to `-border_size`.
    pub fn pixel(&self, p: IVec2) -> [f32; CHANNEL_COUNT] {
        let base = self.slot(p.x + self.border_size, p.y + self.border_size);
        std::array::from_fn(|k| self.data[base + k].load())
    }

    /// Normalized color of pixel `p` (same coordinates as [`Self::pixel`]).
    ///
    /// Pixels that received no weight are black.
    pub fn finalize(&self, p: IVec2) -> [f32; 3] {
        let px = self.pixel(p);
        let weight = px[WEIGHT_CHANNEL];
        if weight != 0.0 {
            [px[0] / weight, px[1] / weight, px[2] / weight]
        } else {
            [0.0; 3]
        }
    }

    /// Normalize every interior pixel and discard the border.
    pub fn to_bitmap(&self) -> Bitmap {
        let mut bitmap = Bitmap::new(self.size.x as u32, self.size.y as u32);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                bitmap.set(x as u32, y as u32, self.finalize(IVec2::new(x, y)));
            }
        }
        bitmap
    }
}
