use super::error::{AnalysisError, Result};

/// Default analysis frame size. At 44.1 kHz this is ~46 ms of audio.
pub const FRAME_SIZE: usize = 2048;

/// Lowest F0 candidate considered (Hz).
pub const FREQ_MIN_HZ: f64 = 50.0;

/// Highest F0 candidate, and highest frequency treated as a possible
/// harmonic of a lower F0 (Hz).
pub const FREQ_MAX_HZ: f64 = 6000.0;

/// Per-run constants derived from the sample rate and frame size.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioDescriptor {
    sample_rate: u32,
    frame_size: usize,
    bucket_size_hz: f64,
    min_freq_index: usize,
    max_freq_index: usize,
}

impl AudioDescriptor {
    /// Bucket size is `sample_rate / frame_size`.
    pub fn new(sample_rate: u32, frame_size: usize) -> Result<Self> {
        if frame_size == 0 {
            return Err(AnalysisError::InvalidConfig("frame size must be non-zero".into()));
        }
        Self::with_bucket_size(sample_rate, frame_size, sample_rate as f64 / frame_size as f64)
    }

    /// Use an explicitly supplied FFT resolution instead of deriving it.
    pub fn with_bucket_size(sample_rate: u32, frame_size: usize, bucket_size_hz: f64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig("sample rate must be positive".into()));
        }
        if frame_size < 2 || !frame_size.is_power_of_two() {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame size {} is not a power of two",
                frame_size
            )));
        }
        if !bucket_size_hz.is_finite() || bucket_size_hz <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "bucket size {} Hz is not a positive number",
                bucket_size_hz
            )));
        }

        let min_freq_index = (FREQ_MIN_HZ / bucket_size_hz).floor() as usize;
        let max_freq_index = (FREQ_MAX_HZ / bucket_size_hz).ceil() as usize;

        if min_freq_index >= max_freq_index || max_freq_index > frame_size / 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "degenerate bucket range {}..={} for frame size {}",
                min_freq_index, max_freq_index, frame_size
            )));
        }

        Ok(Self {
            sample_rate,
            frame_size,
            bucket_size_hz,
            min_freq_index,
            max_freq_index,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn bucket_size_hz(&self) -> f64 {
        self.bucket_size_hz
    }

    /// Bucket holding `FREQ_MIN_HZ`.
    pub fn min_freq_index(&self) -> usize {
        self.min_freq_index
    }

    /// Bucket holding `FREQ_MAX_HZ`.
    pub fn max_freq_index(&self) -> usize {
        self.max_freq_index
    }

    /// Number of buckets in `[min_freq_index, max_freq_index]`.
    pub fn usable_buckets(&self) -> usize {
        self.max_freq_index + 1 - self.min_freq_index
    }

    pub fn bucket_to_hz(&self, index: usize) -> f64 {
        index as f64 * self.bucket_size_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_quality_indices() {
        let d = AudioDescriptor::new(44_100, FRAME_SIZE).unwrap();
        assert!((d.bucket_size_hz() - 21.533).abs() < 1e-3);
        assert_eq!(d.min_freq_index(), 2);
        assert_eq!(d.max_freq_index(), 279);
        assert_eq!(d.usable_buckets(), 278);
    }

    #[test]
    fn explicit_bucket_size() {
        // Integer resolution, as produced by truncating 44100 / 2048.
        let d = AudioDescriptor::with_bucket_size(44_100, FRAME_SIZE, 21.0).unwrap();
        assert_eq!(d.min_freq_index(), 2);
        assert_eq!(d.max_freq_index(), 286);
        assert_eq!(d.bucket_to_hz(10), 210.0);
    }

    #[test]
    fn invariants_hold_for_common_rates() {
        for &rate in &[16_000u32, 22_050, 32_000, 44_100, 48_000, 88_200, 96_000] {
            for &size in &[1024usize, 2048, 4096, 8192, 16384] {
                let bucket = rate as f64 / size as f64;
                let max_index = (FREQ_MAX_HZ / bucket).ceil() as usize;
                let fits = size >= 2 * max_index;
                match AudioDescriptor::new(rate, size) {
                    Ok(d) => {
                        assert!(d.min_freq_index() < d.max_freq_index());
                        assert!(d.max_freq_index() <= size / 2);
                    }
                    Err(_) => assert!(!fits, "{} Hz / {} should be valid", rate, size),
                }
            }
        }
    }

    #[test]
    fn coarse_buckets_start_at_zero() {
        let d = AudioDescriptor::new(96_000, 1024).unwrap();
        assert_eq!(d.min_freq_index(), 0);
        assert_eq!(d.max_freq_index(), 64);

        let d = AudioDescriptor::new(16_000, 256).unwrap();
        assert_eq!(d.min_freq_index(), 0);
        assert_eq!(d.max_freq_index(), 96);

        // 172 Hz buckets: 6 kHz lands at bucket 35, well below Nyquist.
        let d = AudioDescriptor::new(44_100, 256).unwrap();
        assert_eq!((d.min_freq_index(), d.max_freq_index()), (0, 35));
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(AudioDescriptor::new(0, FRAME_SIZE).is_err());
        assert!(AudioDescriptor::new(44_100, 0).is_err());
        assert!(AudioDescriptor::new(44_100, 1000).is_err());
        // 8 kHz / 256 puts 6 kHz above Nyquist bucket.
        assert!(AudioDescriptor::new(8_000, 256).is_err());
        assert!(AudioDescriptor::with_bucket_size(44_100, FRAME_SIZE, -1.0).is_err());
        assert!(AudioDescriptor::with_bucket_size(44_100, FRAME_SIZE, f64::NAN).is_err());
    }
}
