/// Smallest aspect ratio the packer will accept.
///
/// Keeps extremely tall items from collapsing a row's solved height to zero.
pub const MIN_ASPECT_RATIO: f64 = 0.01;

/// Layout-relevant view of a grid item.
///
/// Anything beyond the intrinsic size is opaque to the packer; the payload is
/// carried through to [`PackedItem`](super::PackedItem) untouched.
pub trait Item {
    /// Intrinsic width, in any unit consistent with [`Item::height`].
    fn width(&self) -> f64;

    /// Intrinsic height.
    fn height(&self) -> f64;

    /// Width over height, floored at [`MIN_ASPECT_RATIO`].
    ///
    /// Degenerate sizes (zero, negative or non-finite) are treated as square.
    fn aspect_ratio(&self) -> f64 {
        let (w, h) = (self.width(), self.height());
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return 1.0;
        }
        (w / h).max(MIN_ASPECT_RATIO)
    }
}

/// Plain intrinsic size with no payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub width: f64,
    pub height: f64,
}

impl Tile {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Square tile, the shape folders and placeholders use.
    pub fn square() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl Item for Tile {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }
}

impl Item for (f64, f64) {
    fn width(&self) -> f64 {
        self.0
    }

    fn height(&self) -> f64 {
        self.1
    }
}

impl<T: Item + ?Sized> Item for &T {
    fn width(&self) -> f64 {
        (**self).width()
    }

    fn height(&self) -> f64 {
        (**self).height()
    }
}
