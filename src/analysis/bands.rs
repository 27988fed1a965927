use super::descriptor::AudioDescriptor;
use super::error::{AnalysisError, Result};

/// Minimum band width in Hz.
const MIN_BAND_WIDTH_HZ: f64 = 100.0;

/// A contiguous run of buckets with a triangular weighting window.
#[derive(Clone, Debug)]
pub struct Band {
    min_index: usize,
    max_index: usize,
    coefficients: Vec<f64>,
}

impl Band {
    /// Build the band starting at `low_index`. `coverage` is the length of the
    /// coefficient table (one entry per bucket of the frame).
    fn new(descriptor: &AudioDescriptor, low_index: usize, coverage: usize) -> Self {
        let bucket_hz = descriptor.bucket_size_hz();
        let min_freq = low_index as f64 * bucket_hz;
        let max_freq = (min_freq + MIN_BAND_WIDTH_HZ).max(min_freq * 2f64.powf(2.0 / 3.0));
        let max_index = (max_freq / bucket_hz).ceil() as usize;

        let bucket_count = (max_index + 1 - low_index) as f64;
        let centre = (low_index + max_index) as f64 / 2.0;
        let coefficients = (0..coverage)
            .map(|i| {
                if i >= low_index && i <= max_index {
                    1.0 - 2.0 * (centre - i as f64).abs() / bucket_count
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            min_index: low_index,
            max_index,
            coefficients,
        }
    }

    pub fn min_index(&self) -> usize {
        self.min_index
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    pub fn bucket_count(&self) -> usize {
        self.max_index + 1 - self.min_index
    }

    /// Triangular window value at `index`; zero outside the band.
    pub fn coefficient(&self, index: usize) -> f64 {
        self.coefficients.get(index).copied().unwrap_or(0.0)
    }
}

/// Geometrically growing, half-overlapping bands covering the usable range.
#[derive(Clone, Debug)]
pub struct BandModel {
    bands: Vec<Band>,
}

impl BandModel {
    pub fn new(descriptor: &AudioDescriptor) -> Result<Self> {
        let coverage = descriptor.frame_size();
        let target = descriptor.max_freq_index();

        let mut bands = Vec::new();
        let mut band = Band::new(descriptor, descriptor.min_freq_index(), coverage);
        while band.max_index < target {
            // Buckets wider than 100 Hz give a band [0, 1] whose midpoint is 0 again.
            let next_low = ((band.min_index + band.max_index) / 2).max(band.min_index + 1);
            bands.push(band);
            band = Band::new(descriptor, next_low, coverage);
        }
        bands.push(band);

        if let Some(last) = bands.last() {
            if last.max_index >= coverage {
                return Err(AnalysisError::InvalidConfig(format!(
                    "top band reaches bucket {} but the frame only has {}",
                    last.max_index, coverage
                )));
            }
        }

        for (i, b) in bands.iter().enumerate() {
            log::debug!(
                "Band {:2}: buckets {:4}..={:4} ({:.0}-{:.0} Hz)",
                i,
                b.min_index,
                b.max_index,
                descriptor.bucket_to_hz(b.min_index),
                descriptor.bucket_to_hz(b.max_index)
            );
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::descriptor::FRAME_SIZE;

    fn model() -> (AudioDescriptor, BandModel) {
        let d = AudioDescriptor::new(44_100, FRAME_SIZE).unwrap();
        let m = BandModel::new(&d).unwrap();
        (d, m)
    }

    #[test]
    fn first_bands_at_cd_rate() {
        let (_, m) = model();
        let b = m.bands();
        assert_eq!((b[0].min_index(), b[0].max_index()), (2, 7));
        assert_eq!((b[1].min_index(), b[1].max_index()), (4, 9));
        assert_eq!((b[2].min_index(), b[2].max_index()), (6, 11));
        assert_eq!(b[0].bucket_count(), 6);
    }

    #[test]
    fn covers_usable_range_with_overlap() {
        let (d, m) = model();
        let b = m.bands();
        assert!(!b.is_empty());
        assert_eq!(b[0].min_index(), d.min_freq_index());
        assert!(b[b.len() - 1].max_index() >= d.max_freq_index());
        for pair in b.windows(2) {
            assert!(pair[1].min_index() > pair[0].min_index());
            assert!(pair[1].min_index() <= pair[0].max_index());
        }
        // Every band but the last stops short of the top bucket.
        for band in &b[..b.len() - 1] {
            assert!(band.max_index() < d.max_freq_index());
        }
    }

    #[test]
    fn triangular_window() {
        let (_, m) = model();
        let band = &m.bands()[3];
        let (lo, hi) = (band.min_index(), band.max_index());
        assert_eq!(band.coefficient(lo - 1), 0.0);
        assert_eq!(band.coefficient(hi + 1), 0.0);
        assert_eq!(band.coefficient(FRAME_SIZE + 10), 0.0);

        let n = band.bucket_count() as f64;
        let centre = (lo + hi) as f64 / 2.0;
        for i in lo..=hi {
            let c = band.coefficient(i);
            assert!(c > 0.0 && c <= 1.0);
            assert!((c - (1.0 - 2.0 * (centre - i as f64).abs() / n)).abs() < 1e-12);
        }
        // Symmetric about the centre.
        assert!((band.coefficient(lo) - band.coefficient(hi)).abs() < 1e-12);
    }

    #[test]
    fn coarse_buckets_still_cover_the_range() {
        for &(rate, size) in &[(96_000u32, 1024usize), (16_000, 256), (44_100, 256)] {
            let d = AudioDescriptor::new(rate, size).unwrap();
            let m = BandModel::new(&d).unwrap();
            let b = m.bands();
            assert_eq!(b[0].min_index(), 0);
            assert!(b[b.len() - 1].max_index() >= d.max_freq_index());
            for pair in b.windows(2) {
                assert!(pair[1].min_index() > pair[0].min_index());
                assert!(pair[1].min_index() <= pair[0].max_index());
            }
        }
    }

    #[test]
    fn upper_bands_grow_geometrically() {
        let (d, m) = model();
        let last = &m.bands()[m.len() - 1];
        let ratio = d.bucket_to_hz(last.max_index()) / d.bucket_to_hz(last.min_index());
        assert!(ratio >= 2f64.powf(2.0 / 3.0) - 0.05);
    }
}
