//! Square float heightfield with clamped sampling and bilinear resampling.

use serde::{Deserialize, Serialize};

/// A square grid of `f32` heights stored in row-major order.
///
/// Values are unbounded during synthesis; sampling outside the grid clamps
/// to the nearest edge pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightField {
    size: usize,
    data: Vec<f32>,
}

impl HeightField {
    /// Creates a field of side `size` filled with zeros.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    /// Creates a field of side `size` filled with `fill`.
    pub fn with_fill(size: usize, fill: f32) -> Self {
        Self {
            size,
            data: vec![fill; size * size],
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Height at `(x, y)`, clamped to the grid edge.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let n = self.size;
        let x = x.min(n - 1);
        let y = y.min(n - 1);
        self.data[y * n + x]
    }

    /// Height at signed `(x, y)`, clamped to the grid edge.
    pub fn get_clamped(&self, x: i32, y: i32) -> f32 {
        let x = (x.max(0) as usize).min(self.size - 1);
        let y = (y.max(0) as usize).min(self.size - 1);
        self.data[y * self.size + x]
    }

    /// Sets the height at `(x, y)`; out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.size && y < self.size {
            self.data[y * self.size + x] = value;
        }
    }

    /// Raw row-major height data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw row-major height data.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Bilinearly resamples the field to a new side length.
    ///
    /// Source coordinates are `i * (N-1) / (M-1)` in each axis, so the four
    /// corners are preserved exactly and resampling to the same size is the
    /// identity.
    pub fn resample_to(&self, new_size: usize) -> HeightField {
        if new_size == self.size {
            return self.clone();
        }

        let mut out = HeightField::new(new_size);
        let n = self.size;
        let m = new_size;
        let denom = (m - 1).max(1) as f32;

        for j in 0..m {
            let v = (j * (n - 1)) as f32 / denom;
            let y0 = v.floor() as usize;
            let y1 = (y0 + 1).min(n - 1);
            let fy = v - y0 as f32;

            for i in 0..m {
                let u = (i * (n - 1)) as f32 / denom;
                let x0 = u.floor() as usize;
                let x1 = (x0 + 1).min(n - 1);
                let fx = u - x0 as f32;

                let h00 = self.get(x0, y0);
                let h10 = self.get(x1, y0);
                let h01 = self.get(x0, y1);
                let h11 = self.get(x1, y1);

                let a = h00 * (1.0 - fx) + h10 * fx;
                let b = h01 * (1.0 - fx) + h11 * fx;
                out.set(i, j, a * (1.0 - fy) + b * fy);
            }
        }

        out
    }

    /// Rescales all heights into `[0, 1]`. A flat field is left unchanged.
    pub fn normalize(&mut self) {
        if self.data.is_empty() {
            return;
        }

        let (min, max) = self.height_range();
        let span = max - min;
        if span > 0.0 {
            for value in &mut self.data {
                *value = (*value - min) / span;
            }
        }
    }

    /// Returns `(min, max)` over all heights.
    pub fn height_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &h in &self.data {
            min = min.min(h);
            max = max.max(h);
        }
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_fill() {
        let hf = HeightField::new(8);
        assert_eq!(hf.size(), 8);
        assert!(hf.data().iter().all(|&h| h == 0.0));

        let hf = HeightField::with_fill(4, 0.5);
        assert!(hf.data().iter().all(|&h| h == 0.5));
    }

    #[test]
    fn test_get_clamps_to_edge() {
        let mut hf = HeightField::new(4);
        hf.set(3, 3, 2.0);
        hf.set(0, 0, -1.0);

        assert_eq!(hf.get(10, 10), 2.0);
        assert_eq!(hf.get_clamped(-5, -5), -1.0);
        assert_eq!(hf.get_clamped(7, 0), hf.get(3, 0));
    }

    #[test]
    fn test_set_out_of_range_is_ignored() {
        let mut hf = HeightField::new(4);
        hf.set(4, 0, 9.0);
        assert!(hf.data().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_resample_identity() {
        let mut hf = HeightField::new(16);
        for y in 0..16 {
            for x in 0..16 {
                hf.set(x, y, (x * 16 + y) as f32 * 0.01);
            }
        }
        assert_eq!(hf.resample_to(16), hf);
    }

    #[test]
    fn test_resample_preserves_corners() {
        let mut hf = HeightField::new(8);
        hf.set(0, 0, 1.0);
        hf.set(7, 0, 2.0);
        hf.set(0, 7, 3.0);
        hf.set(7, 7, 4.0);

        for &m in &[4usize, 15, 16, 33] {
            let out = hf.resample_to(m);
            assert_eq!(out.get(0, 0), 1.0);
            assert_eq!(out.get(m - 1, 0), 2.0);
            assert_eq!(out.get(0, m - 1), 3.0);
            assert_eq!(out.get(m - 1, m - 1), 4.0);
        }
    }

    #[test]
    fn test_resample_linear_ramp_stays_linear() {
        let n = 9;
        let mut hf = HeightField::new(n);
        for y in 0..n {
            for x in 0..n {
                hf.set(x, y, x as f32 / (n - 1) as f32);
            }
        }

        let out = hf.resample_to(17);
        for x in 0..17 {
            let expected = x as f32 / 16.0;
            assert!((out.get(x, 8) - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_normalize() {
        let mut hf = HeightField::new(2);
        hf.set(0, 0, -2.0);
        hf.set(1, 0, 0.0);
        hf.set(0, 1, 1.0);
        hf.set(1, 1, 2.0);

        hf.normalize();
        let (min, max) = hf.height_range();
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
        assert!((hf.get(1, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_flat_field_unchanged() {
        let mut hf = HeightField::with_fill(4, 0.7);
        hf.normalize();
        assert!(hf.data().iter().all(|&h| h == 0.7));
    }
}
