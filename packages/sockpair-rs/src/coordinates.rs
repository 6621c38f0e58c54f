//! Mapping normalized boxes into the pixel space of the displayed image.
use serde::{Deserialize, Serialize};
use sockpair_vision::NormalizedBox;

/// On-screen pixel size of the displayed image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const ZERO: Dimensions = Dimensions {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Nothing laid out yet (or nothing displayed): overlays must not render.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn scaled(&self, k: f64) -> Self {
        Self {
            width: self.width * k,
            height: self.height * k,
        }
    }
}

/// Pixel-space box. Width and height are negative when the source box was inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ScaledBox {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

pub fn scale_box(bbox: &NormalizedBox, dims: Dimensions) -> ScaledBox {
    ScaledBox {
        x1: bbox.xmin * dims.width / NormalizedBox::SCALE,
        y1: bbox.ymin * dims.height / NormalizedBox::SCALE,
        x2: bbox.xmax * dims.width / NormalizedBox::SCALE,
        y2: bbox.ymax * dims.height / NormalizedBox::SCALE,
    }
}

pub fn center(bbox: &ScaledBox) -> Point {
    Point {
        x: (bbox.x1 + bbox.x2) / 2.0,
        y: (bbox.y1 + bbox.y2) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_full_frame_maps_to_canvas() {
        let dims = Dimensions::new(640.0, 480.0);
        let scaled = scale_box(&NormalizedBox::FULL_FRAME, dims);
        assert_eq!(
            scaled,
            ScaledBox {
                x1: 0.0,
                y1: 0.0,
                x2: 640.0,
                y2: 480.0
            }
        );
    }

    #[test]
    fn test_axes_scale_independently() {
        let bbox = NormalizedBox::new(100.0, 200.0, 300.0, 900.0);
        let scaled = scale_box(&bbox, Dimensions::new(1000.0, 50.0));
        assert!(approx(scaled.x1, 200.0));
        assert!(approx(scaled.x2, 900.0));
        assert!(approx(scaled.y1, 5.0));
        assert!(approx(scaled.y2, 15.0));
    }

    #[test]
    fn test_resize_scales_linearly() {
        let bbox = NormalizedBox::new(123.0, 456.0, 789.0, 987.0);
        let dims = Dimensions::new(333.0, 517.0);
        for k in [0.5, 2.0, 3.25] {
            let base = scale_box(&bbox, dims);
            let grown = scale_box(&bbox, dims.scaled(k));
            assert!(approx(grown.x1, base.x1 * k));
            assert!(approx(grown.y1, base.y1 * k));
            assert!(approx(grown.x2, base.x2 * k));
            assert!(approx(grown.y2, base.y2 * k));
        }
    }

    #[test]
    fn test_center_midpoint() {
        let bbox = NormalizedBox::new(250.0, 250.0, 750.0, 750.0);
        let c = center(&scale_box(&bbox, Dimensions::new(200.0, 100.0)));
        assert!(approx(c.x, 100.0));
        assert!(approx(c.y, 50.0));
    }

    #[test]
    fn test_inverted_box_gives_negative_size() {
        let bbox = NormalizedBox::new(800.0, 600.0, 200.0, 100.0);
        let scaled = scale_box(&bbox, Dimensions::new(100.0, 100.0));
        assert!(scaled.width() < 0.0);
        assert!(scaled.height() < 0.0);
    }

    #[test]
    fn test_empty_dimensions() {
        assert!(Dimensions::ZERO.is_empty());
        assert!(Dimensions::new(100.0, 0.0).is_empty());
        assert!(!Dimensions::new(1.0, 1.0).is_empty());
    }
}
