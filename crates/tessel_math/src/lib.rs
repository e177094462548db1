// Re-export glam for convenience
pub use glam::*;

// Tessel math types
mod ray;
mod rect;
pub use ray::{Ray, RAY_EPSILON};
pub use rect::Rect2i;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ivec2_ceil_division() {
        let size = IVec2::new(100, 64);
        let tiles = (size.as_vec2() / 32.0).ceil().as_ivec2();
        assert_eq!(tiles, IVec2::new(4, 2));
    }

    #[test]
    fn test_vec2_floor_ceil() {
        let p = Vec2::new(1.25, -0.75);
        assert_eq!(p.floor().as_ivec2(), IVec2::new(1, -1));
        assert_eq!(p.ceil().as_ivec2(), IVec2::new(2, 0));
    }
}
