//! Lock-free float accumulator.

use std::sync::atomic::{AtomicU32, Ordering};

/// An `f32` stored in an `AtomicU32`, supporting concurrent additions.
///
/// Additions use a compare-and-swap loop, so contributions from many
/// threads to the same slot are all summed. The summation order between
/// threads is unspecified.
#[derive(Debug)]
#[repr(transparent)]
pub struct AtomicFloat {
    bits: AtomicU32,
}

impl Default for AtomicFloat {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl AtomicFloat {
    pub fn new(v: f32) -> Self {
        Self {
            bits: AtomicU32::new(bytemuck::cast(v)),
        }
    }

    #[inline]
    pub fn load(&self) -> f32 {
        bytemuck::cast(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, v: f32) {
        self.bits.store(bytemuck::cast(v), Ordering::Relaxed)
    }

    /// Non-atomic access through an exclusive borrow.
    #[inline]
    pub fn get_mut(&mut self) -> &mut f32 {
        bytemuck::cast_mut(self.bits.get_mut())
    }

    /// Add `v` and return the previous value.
    #[inline]
    pub fn fetch_add(&self, v: f32) -> f32 {
        let mut oldbits = self.bits.load(Ordering::Relaxed);
        loop {
            let newbits: u32 = bytemuck::cast(bytemuck::cast::<u32, f32>(oldbits) + v);
            match self.bits.compare_exchange_weak(
                oldbits,
                newbits,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => oldbits = x,
            }
        }
        bytemuck::cast(oldbits)
    }
}

impl Clone for AtomicFloat {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}
