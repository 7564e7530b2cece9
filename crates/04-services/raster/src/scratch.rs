//! Per-rasterizer sample arena with explicit reset.

use crate::RasterError;

/// Default number of samples one triangle may emit.
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// One emitted pixel sample: screen position, depth and texel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub u: i32,
    pub v: i32,
}

impl Sample {
    pub const fn new(x: i32, y: i32, z: i32, u: i32, v: i32) -> Self {
        Self { x, y, z, u, v }
    }
}

/// Parallel sample columns plus a "matched" flag per sample.
///
/// Storage grows on demand up to `capacity`; pushing past it fails instead of
/// writing out of bounds. [`PixelScratch::reset`] empties the arena but keeps
/// its allocation for the next triangle.
#[derive(Debug)]
pub struct PixelScratch {
    xs: Vec<i32>,
    ys: Vec<i32>,
    zs: Vec<i32>,
    us: Vec<i32>,
    vs: Vec<i32>,
    matched: Vec<bool>,
    capacity: usize,
}

impl PixelScratch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xs: Vec::new(),
            ys: Vec::new(),
            zs: Vec::new(),
            us: Vec::new(),
            vs: Vec::new(),
            matched: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the next free slot; equal to the number of samples held.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Appends a sample and returns the updated counter.
    pub fn push(&mut self, sample: Sample) -> Result<usize, RasterError> {
        if self.len() >= self.capacity {
            return Err(RasterError::ScratchOverflow {
                capacity: self.capacity,
            });
        }
        self.xs.push(sample.x);
        self.ys.push(sample.y);
        self.zs.push(sample.z);
        self.us.push(sample.u);
        self.vs.push(sample.v);
        self.matched.push(false);
        Ok(self.len())
    }

    pub fn reset(&mut self) {
        self.xs.clear();
        self.ys.clear();
        self.zs.clear();
        self.us.clear();
        self.vs.clear();
        self.matched.clear();
    }

    pub fn get(&self, index: usize) -> Option<Sample> {
        (index < self.len()).then(|| Sample {
            x: self.xs[index],
            y: self.ys[index],
            z: self.zs[index],
            u: self.us[index],
            v: self.vs[index],
        })
    }

    pub fn x(&self, index: usize) -> i32 {
        self.xs[index]
    }

    pub fn is_matched(&self, index: usize) -> bool {
        self.matched[index]
    }

    pub fn mark_matched(&mut self, index: usize) {
        self.matched[index] = true;
    }

    /// First unmatched sample in `range` whose X equals `x`.
    pub fn find_unmatched_x(&self, range: std::ops::Range<usize>, x: i32) -> Option<usize> {
        range.into_iter().find(|&j| !self.matched[j] && self.xs[j] == x)
    }

    /// Applies `f` to the U and V column of every sample.
    pub fn map_texels(&mut self, f: impl Fn(i32) -> i32) {
        for u in &mut self.us {
            *u = f(*u);
        }
        for v in &mut self.vs {
            *v = f(*v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

impl Default for PixelScratch {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_fails_once_capacity_is_reached() {
        let mut scratch = PixelScratch::with_capacity(2);
        assert_eq!(scratch.push(Sample::default()).unwrap(), 1);
        assert_eq!(scratch.push(Sample::default()).unwrap(), 2);
        assert_eq!(
            scratch.push(Sample::default()).unwrap_err(),
            RasterError::ScratchOverflow { capacity: 2 }
        );
        assert_eq!(scratch.len(), 2);
    }

    #[test]
    fn reset_clears_samples_and_matches() {
        let mut scratch = PixelScratch::with_capacity(4);
        scratch.push(Sample::new(3, 0, 0, 0, 0)).unwrap();
        scratch.mark_matched(0);
        scratch.reset();
        assert!(scratch.is_empty());
        scratch.push(Sample::new(3, 0, 0, 0, 0)).unwrap();
        assert!(!scratch.is_matched(0));
        assert_eq!(scratch.find_unmatched_x(0..1, 3), Some(0));
    }
}
