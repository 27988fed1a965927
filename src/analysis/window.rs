use std::f64::consts::PI;

use super::error::{AnalysisError, Result};

/// Precomputed Hamming window, applied in place.
#[derive(Clone, Debug)]
pub struct HammingWindow {
    coefficients: Vec<f64>,
}

impl HammingWindow {
    pub fn new(size: usize) -> Self {
        let denom = size.saturating_sub(1).max(1) as f64;
        let coefficients = (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
            .collect();
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Multiply `samples` by the window. The buffer must match the window size.
    pub fn apply(&self, samples: &mut [f64]) -> Result<()> {
        if samples.len() != self.coefficients.len() {
            return Err(AnalysisError::FrameLength {
                expected: self.coefficients.len(),
                actual: samples.len(),
            });
        }
        for (s, &c) in samples.iter_mut().zip(self.coefficients()) {
            *s *= c;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_centre() {
        let w = HammingWindow::new(2049);
        let c = w.coefficients();
        assert!((c[0] - 0.08).abs() < 1e-12);
        assert!((c[2048] - 0.08).abs() < 1e-12);
        assert!((c[1024] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn symmetric() {
        let w = HammingWindow::new(64);
        let c = w.coefficients();
        for i in 0..32 {
            assert!((c[i] - c[63 - i]).abs() < 1e-12);
        }
    }

    #[test]
    fn divide_back_recovers_samples() {
        let w = HammingWindow::new(256);
        let samples: Vec<f64> = (0..256).map(|i| (i as f64 * 0.37).sin() * 3.0).collect();
        let mut buf = samples.clone();
        w.apply(&mut buf).unwrap();
        for ((windowed, &orig), &c) in buf.iter().zip(&samples).zip(w.coefficients()) {
            if c.abs() > 1e-9 {
                assert!((windowed / c - orig).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn rejects_wrong_length() {
        let w = HammingWindow::new(16);
        let mut buf = vec![1.0; 15];
        match w.apply(&mut buf) {
            Err(AnalysisError::FrameLength { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 15);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Input untouched on failure.
        assert!(buf.iter().all(|&s| s == 1.0));
    }
}
