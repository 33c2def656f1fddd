//! Summed-area table over a cropped region of interest (§4.2).

use pupil_core::GrayImage;

/// A summed-area table: `sum(x, y)` is the cumulative intensity over
/// `[0, x] x [0, y]`.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    data: Vec<u64>,
    width: i32,
    height: i32,
}

impl IntegralImage {
    /// Builds the integral image of `roi`, using the four-term recurrence
    /// (row 0 / column 0 handled specially, as the regular recurrence would
    /// read one column/row out of bounds there).
    pub fn build(roi: &GrayImage) -> Self {
        let width = roi.width() as i32;
        let height = roi.height() as i32;
        let mut data = vec![0u64; (width as usize) * (height as usize)];

        for y in 0..height {
            for x in 0..width {
                let i = (width as usize) * (y as usize) + (x as usize);
                let val = roi.get(x, y).unwrap_or(0) as u64;
                data[i] = if x == 0 && y == 0 {
                    val
                } else if y == 0 {
                    val + data[i - 1]
                } else if x == 0 {
                    val + data[i - width as usize]
                } else {
                    val + data[i - 1] + data[i - width as usize] - data[i - width as usize - 1]
                };
            }
        }

        Self { data, width, height }
    }

    /// Value at `(x, y)`, or 0 if either coordinate is negative (the
    /// standard zero-padded boundary convention for a summed-area table).
    #[inline]
    fn at(&self, x: i32, y: i32) -> u64 {
        if x < 0 || y < 0 {
            return 0;
        }
        let (x, y) = (x.min(self.width - 1), y.min(self.height - 1));
        self.data[(self.width as usize) * (y as usize) + (x as usize)]
    }

    /// Sum of intensity over the rectangle `[x, x+w) x [y, y+h)`. Returns 0
    /// for a non-positive-area rectangle.
    pub fn sum_rect(&self, x: i32, y: i32, w: i32, h: i32) -> u64 {
        if w <= 0 || h <= 0 {
            return 0;
        }
        let (x1, y1) = (x + w - 1, y + h - 1);
        self.at(x1, y1) + self.at(x - 1, y - 1) - self.at(x1, y - 1) - self.at(x - 1, y1)
    }
}
