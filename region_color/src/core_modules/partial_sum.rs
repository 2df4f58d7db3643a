// THEORY:
// The aggregation layer turns matched pixels into one representative color. Each
// worker reduces its slice to a `PartialSum` of squared channel values; the
// orchestrator adds those up and takes the quadratic mean per channel.
//
// The quadratic (RMS) mean is the defined averaging rule of the engine. It is
// not the arithmetic mean: a pixel pair of 255 and 0 averages to ~180.3, not
// 127.5. Sums are integer so the reduction is exact, commutative and
// associative, and the order in which workers finish never changes the result.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Squared channel totals and matched-pixel count over some set of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialSum {
    pub sum_r2: u64,
    pub sum_g2: u64,
    pub sum_b2: u64,
    pub pixel_count: u64,
}

impl PartialSum {
    #[inline]
    pub fn push(&mut self, [r, g, b]: [u8; 3]) {
        self.sum_r2 += (r as u64) * (r as u64);
        self.sum_g2 += (g as u64) * (g as u64);
        self.sum_b2 += (b as u64) * (b as u64);
        self.pixel_count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count == 0
    }

    /// RMS per channel, or `None` when nothing was matched or the result is
    /// not a finite number.
    pub fn rms(&self) -> Option<Rgb> {
        if self.pixel_count == 0 {
            return None;
        }
        let count = self.pixel_count as f64;
        let rgb = Rgb {
            r: (self.sum_r2 as f64 / count).sqrt(),
            g: (self.sum_g2 as f64 / count).sqrt(),
            b: (self.sum_b2 as f64 / count).sqrt(),
        };
        rgb.is_finite().then_some(rgb)
    }
}

impl FromIterator<[u8; 3]> for PartialSum {
    fn from_iter<I: IntoIterator<Item = [u8; 3]>>(iter: I) -> Self {
        let mut sum = PartialSum::default();
        for rgb in iter {
            sum.push(rgb);
        }
        sum
    }
}

impl AddAssign for PartialSum {
    fn add_assign(&mut self, other: Self) {
        self.sum_r2 += other.sum_r2;
        self.sum_g2 += other.sum_g2;
        self.sum_b2 += other.sum_b2;
        self.pixel_count += other.pixel_count;
    }
}

impl Add for PartialSum {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl Sum for PartialSum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PartialSum::default(), Add::add)
    }
}

/// Channel values on the 0-255 scale, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Joins every partial sum into one RMS color. `None` means no result.
pub fn combine<I>(partials: I) -> Option<Rgb>
where
    I: IntoIterator<Item = PartialSum>,
{
    partials.into_iter().sum::<PartialSum>().rms()
}
