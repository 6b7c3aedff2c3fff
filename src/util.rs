use nalgebra as na;
use na::{vector, Point3, Vector2, Vector4};

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(p: Point3<f32>) -> Vector4<f32> {
    return vector![p.x, p.y, p.z, 1.0];
}

/// Transformation of a point from homogenous coordinates.
/// w must be non-zero, affine view matrices keep it at 1.
pub fn from_hom_point(v: Vector4<f32>) -> Point3<f32> {
    return Point3::new(v.x / v.w, v.y / v.w, v.z / v.w);
}

/// 2D cross product of two vectors, i.e. z component of their 3D cross product.
/// In raster space (y pointing down) it is positive when `b` is clockwise from `a`.
pub fn cross_2d(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    return a.x * b.y - a.y * b.x;
}

/// Axis aligned bounding box of a triangle in raster space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector2<f32>, // upper left corner (raster y grows downwards)
    pub max: Vector2<f32>, // lower right corner
}

/// Inclusive range of integer pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRange {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl BoundingBox {
    /// Bounding box of 3 points, min and max of every coordinate taken independently.
    pub fn from_triangle(a: Vector2<f32>, b: Vector2<f32>, c: Vector2<f32>) -> Self {
        return Self {
            min: vector![a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)],
            max: vector![a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)],
        };
    }

    /// Integer pixel centers inside the box, clipped to a `width` x `height` viewport.
    /// Returns None if no pixel center is covered.
    pub fn pixel_range(&self, width: usize, height: usize) -> Option<PixelRange> {
        if width == 0 || height == 0 {
            return None;
        }
        // f32::min/max silently drop NaN, so it has to be rejected up front.
        if self.min.iter().chain(self.max.iter()).any(|v| v.is_nan()) {
            return None;
        }
        let x_min = self.min.x.ceil().max(0.0);
        let y_min = self.min.y.ceil().max(0.0);
        let x_max = self.max.x.floor().min((width - 1) as f32);
        let y_max = self.max.y.floor().min((height - 1) as f32);
        if x_min > x_max || y_min > y_max {
            return None;
        }
        return Some(PixelRange {
            x_min: x_min as usize,
            x_max: x_max as usize,
            y_min: y_min as usize,
            y_max: y_max as usize,
        });
    }
}

impl PixelRange {
    /// Restricts the range to rows in `[row_start, row_end)`.
    pub fn clip_rows(&self, row_start: usize, row_end: usize) -> Option<PixelRange> {
        let y_min = self.y_min.max(row_start);
        if row_end == 0 || y_min >= row_end {
            return None;
        }
        let y_max = self.y_max.min(row_end - 1);
        if y_min > y_max {
            return None;
        }
        return Some(PixelRange { y_min, y_max, ..*self });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::Matrix4;

    #[test]
    fn homogenous_round_trip_through_translation() {
        let translation = Matrix4::new_translation(&vector![0.0, 0.0, 10.0]);
        let p = from_hom_point(translation * to_hom_point(Point3::new(1.0, 2.0, -2.0)));
        assert_eq!(p, Point3::new(1.0, 2.0, 8.0));
    }

    #[test]
    fn cross_sign_follows_raster_winding() {
        assert_eq!(cross_2d(vector![1.0, 0.0], vector![0.0, 1.0]), 1.0);
        assert_eq!(cross_2d(vector![0.0, 1.0], vector![1.0, 0.0]), -1.0);
        assert_eq!(cross_2d(vector![2.0, 2.0], vector![1.0, 1.0]), 0.0);
    }

    #[test]
    fn bounding_box_takes_min_max_independently() {
        let bbox = BoundingBox::from_triangle(vector![5.0, 1.0], vector![2.0, 7.0], vector![9.0, 3.0]);
        assert_eq!(bbox.min, vector![2.0, 1.0]);
        assert_eq!(bbox.max, vector![9.0, 7.0]);
    }

    #[test]
    fn pixel_range_is_inclusive_and_clipped() {
        let bbox = BoundingBox::from_triangle(vector![-3.5, 2.2], vector![4.0, 12.9], vector![1.0, 5.0]);
        let range = bbox.pixel_range(10, 10).unwrap();
        assert_eq!(range, PixelRange { x_min: 0, x_max: 4, y_min: 3, y_max: 9 });
    }

    #[test]
    fn pixel_range_rejects_offscreen_and_nan() {
        let offscreen = BoundingBox::from_triangle(vector![-9.0, -9.0], vector![-1.0, -2.0], vector![-5.0, -1.5]);
        assert_eq!(offscreen.pixel_range(10, 10), None);
        let between_centers = BoundingBox::from_triangle(vector![1.2, 1.2], vector![1.8, 1.2], vector![1.5, 1.8]);
        assert_eq!(between_centers.pixel_range(10, 10), None);
        let nan = BoundingBox { min: vector![f32::NAN, 0.0], max: vector![f32::NAN, 3.0] };
        assert_eq!(nan.pixel_range(10, 10), None);
    }

    #[test]
    fn clip_rows_limits_to_band() {
        let range = PixelRange { x_min: 1, x_max: 5, y_min: 2, y_max: 9 };
        assert_eq!(range.clip_rows(4, 8), Some(PixelRange { x_min: 1, x_max: 5, y_min: 4, y_max: 7 }));
        assert_eq!(range.clip_rows(10, 16), None);
        assert_eq!(range.clip_rows(0, 2), None);
    }
}
