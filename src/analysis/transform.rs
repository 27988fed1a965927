use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::error::Result;
use super::window::HammingWindow;

/// Hamming-windowed forward FFT over fixed-size frames.
///
/// The plan is built once; `Arc<dyn Fft>` is `Send + Sync`, so a single
/// transformer can be shared by parallel frame workers.
pub struct SpectralTransformer {
    window: HammingWindow,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralTransformer {
    pub fn new(frame_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            window: HammingWindow::new(frame_size),
            fft: planner.plan_fft_forward(frame_size),
        }
    }

    /// Window `frame` in place, then transform it. No output scaling is applied.
    pub fn transform(&self, frame: &mut [f64]) -> Result<Vec<Complex<f64>>> {
        self.window.apply(frame)?;

        let mut spectrum: Vec<Complex<f64>> = frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
        self.fft.process(&mut spectrum);
        Ok(spectrum)
    }
}
