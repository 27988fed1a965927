use rustfft::num_complex::Complex;

use super::descriptor::AudioDescriptor;
use super::error::{AnalysisError, Result};

/// Spectral whitening after Klapuri (2005), eqs. 2-4.
///
/// Compresses the magnitude spectrum relative to the loudness of the usable
/// band, then removes a per-sub-band noise floor.
pub struct Whitener {
    descriptor: AudioDescriptor,
}

impl Whitener {
    pub fn new(descriptor: &AudioDescriptor) -> Self {
        Self {
            descriptor: descriptor.clone(),
        }
    }

    pub fn whiten(&self, spectrum: &[Complex<f64>]) -> Result<Vec<f64>> {
        let expected = self.descriptor.frame_size();
        if spectrum.len() != expected {
            return Err(AnalysisError::SpectrumLength {
                expected,
                actual: spectrum.len(),
            });
        }

        let mut whitened = self.warp_magnitudes(spectrum);
        self.remove_noise(&mut whitened);
        Ok(whitened)
    }

    /// Cube of the mean cube-root magnitude over the usable band.
    fn scaling_factor(&self, spectrum: &[Complex<f64>]) -> f64 {
        let lo = self.descriptor.min_freq_index();
        let hi = self.descriptor.max_freq_index();
        let mean = spectrum[lo..=hi].iter().map(|c| c.norm().cbrt()).sum::<f64>()
            / self.descriptor.usable_buckets() as f64;
        mean.powi(3)
    }

    fn warp_magnitudes(&self, spectrum: &[Complex<f64>]) -> Vec<f64> {
        let g = self.scaling_factor(spectrum);
        if g.is_nan() || g <= 0.0 {
            // Silent usable band.
            return vec![0.0; spectrum.len()];
        }
        spectrum.iter().map(|c| (c.norm() / g).ln_1p()).collect()
    }

    fn remove_noise(&self, whitened: &mut [f64]) {
        let lo = self.descriptor.min_freq_index();
        let hi = self.descriptor.max_freq_index();
        let population = self.descriptor.usable_buckets() as f64;

        let mut start = lo;
        while start <= hi {
            let end = sub_band_end(start).min(hi + 1);
            let sub_band = &mut whitened[start..end];
            // Divides by the whole usable population, not the sub-band width.
            let floor = sub_band.iter().sum::<f64>() / population;
            for v in sub_band.iter_mut() {
                *v = (*v - floor).max(0.0);
            }
            start = end;
        }
    }
}

/// Exclusive end of the noise sub-band starting at `start`.
fn sub_band_end(start: usize) -> usize {
    let geometric = (start as f64).powf(4.0 / 3.0).floor() as usize;
    geometric.max(start + 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::descriptor::FRAME_SIZE;

    fn descriptor() -> AudioDescriptor {
        AudioDescriptor::new(44_100, FRAME_SIZE).unwrap()
    }

    fn pseudo_random_spectrum(n: usize) -> Vec<Complex<f64>> {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let re = (state % 10_000) as f64 / 100.0 - 50.0;
                let im = ((state >> 20) % 10_000) as f64 / 100.0 - 50.0;
                Complex::new(re, im)
            })
            .collect()
    }

    #[test]
    fn sub_band_edges() {
        assert_eq!(sub_band_end(2), 7);
        assert_eq!(sub_band_end(7), 13);
        assert_eq!(sub_band_end(10), 21);
    }

    #[test]
    fn silence_whitens_to_zero() {
        let w = Whitener::new(&descriptor());
        let out = w.whiten(&vec![Complex::new(0.0, 0.0); FRAME_SIZE]).unwrap();
        assert_eq!(out.len(), FRAME_SIZE);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn output_is_non_negative() {
        let w = Whitener::new(&descriptor());
        let out = w.whiten(&pseudo_random_spectrum(FRAME_SIZE)).unwrap();
        assert!(out.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn buckets_outside_usable_band_keep_warped_value() {
        let d = descriptor();
        let w = Whitener::new(&d);
        let spectrum = pseudo_random_spectrum(FRAME_SIZE);
        let warped = w.warp_magnitudes(&spectrum);
        let out = w.whiten(&spectrum).unwrap();
        for i in (0..d.min_freq_index()).chain(d.max_freq_index() + 1..FRAME_SIZE) {
            assert_eq!(out[i], warped[i]);
        }
        for i in d.min_freq_index()..=d.max_freq_index() {
            assert!(out[i] <= warped[i]);
        }
    }

    #[test]
    fn flat_spectrum_warps_to_ln2() {
        let d = descriptor();
        let w = Whitener::new(&d);
        let warped = w.warp_magnitudes(&vec![Complex::new(3.0, 4.0); FRAME_SIZE]);
        for v in warped {
            assert!((v - std::f64::consts::LN_2).abs() < 1e-12);
        }
    }

    #[test]
    fn loudness_is_normalized() {
        let w = Whitener::new(&descriptor());
        let quiet = pseudo_random_spectrum(FRAME_SIZE);
        let loud: Vec<Complex<f64>> = quiet.iter().map(|c| c * 1000.0).collect();
        let a = w.whiten(&quiet).unwrap();
        let b = w.whiten(&loud).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let w = Whitener::new(&descriptor());
        assert!(matches!(
            w.whiten(&[Complex::new(1.0, 0.0); 16]),
            Err(AnalysisError::SpectrumLength { expected: FRAME_SIZE, actual: 16 })
        ));
    }
}
