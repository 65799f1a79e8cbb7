use rayon::prelude::*;

use crate::domain::math::algebra::Vector;
use crate::domain::math::numeric::Val;

/// Running per-band maximum and sum over all recorded pixels; feeds the
/// white-balance normalization. Shared across render workers behind a
/// mutex.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PixelStats {
    max: Vector,
    sum: Vector,
}

impl PixelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: Vector) {
        self.max = self.max.component_max(&value);
        self.sum += value;
    }

    pub fn max(&self) -> Vector {
        self.max
    }

    pub fn average(&self, num_pixels: usize) -> Vector {
        self.sum / Val::from(num_pixels)
    }
}

/// The output surface: a per-pixel irradiance accumulator in row-major
/// order. Values are unbounded until `normalize` maps them into [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Vector>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vector::zero(); width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Vector {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: Vector) {
        self.pixels[y * self.width + x] = value;
    }

    /// Split the surface into `count` horizontal bands of rows, the
    /// last taking the remainder; each render worker owns one band
    /// exclusively.
    pub fn bands(&mut self, count: usize) -> Vec<FrameBand<'_>> {
        let rows_per_band = self.height / count;
        let mut bands = Vec::with_capacity(count);
        let mut rest = self.pixels.as_mut_slice();
        let mut first_row = 0;

        for band in 0..count {
            let rows = if band == count - 1 {
                self.height - first_row
            } else {
                rows_per_band
            };
            let (head, tail) = rest.split_at_mut(rows * self.width);
            bands.push(FrameBand {
                first_row,
                rows,
                width: self.width,
                pixels: head,
            });
            rest = tail;
            first_row += rows;
        }

        bands
    }

    /// White-balance normalization: optionally limit the maximum to
    /// `range_limit` times the average per band, then scale everything
    /// by the largest channel and clamp to [0, 1].
    pub fn normalize(&mut self, stats: &PixelStats, range_limit: Option<Val>) {
        let mut max = stats.max();
        if max.norm_squared() <= Val(0.0) {
            return;
        }

        if let Some(limit) = range_limit {
            let average = stats.average(self.width * self.height);
            max = max.component_min(&(average * limit));
        }

        let max_value = max.max_component();
        self.pixels.par_iter_mut().for_each(|pixel| {
            *pixel = Vector::new(
                (pixel.x() / max_value).min(Val(1.0)),
                (pixel.y() / max_value).min(Val(1.0)),
                (pixel.z() / max_value).min(Val(1.0)),
            );
        });
    }
}

/// A worker's exclusive horizontal slice of the frame.
#[derive(Debug)]
pub struct FrameBand<'a> {
    first_row: usize,
    rows: usize,
    width: usize,
    pixels: &'a mut [Vector],
}

impl FrameBand<'_> {
    #[inline]
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Write a pixel addressed by its global row.
    pub fn set_pixel(&mut self, x: usize, row: usize, value: Vector) {
        self.pixels[(row - self.first_row) * self.width + x] = value;
    }
}
