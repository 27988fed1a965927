use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::descriptor::{AudioDescriptor, FRAME_SIZE};
use super::error::{self, AnalysisError};
use super::frame::{FrameAnalysis, RunSummary};
use super::klapuri::{FrameWeights, KlapuriWeightCalculator, WeightParams};
use super::sink::{deliver, AnalysisSink};
use super::transform::SpectralTransformer;
use super::whiten::Whitener;

/// How a waveform is sliced and weighted.
#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    pub frame_size: usize,
    /// Hop is `frame_size / hop_divisor`.
    pub hop_divisor: usize,
    /// Compute weights on every n-th frame.
    pub weight_interval: usize,
    /// Override the derived FFT resolution.
    pub bucket_size_hz: Option<f64>,
    pub weights: WeightParams,
    /// Frames analyzed in parallel before their results are handed on.
    pub batch_frames: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            hop_divisor: 8,
            weight_interval: 8,
            bucket_size_hz: None,
            weights: WeightParams::default(),
            batch_frames: 64,
        }
    }
}

impl AnalysisSettings {
    pub fn hop_size(&self) -> usize {
        self.frame_size / self.hop_divisor.max(1)
    }

    pub fn descriptor(&self, sample_rate: u32) -> error::Result<AudioDescriptor> {
        match self.bucket_size_hz {
            Some(hz) => AudioDescriptor::with_bucket_size(sample_rate, self.frame_size, hz),
            None => AudioDescriptor::new(sample_rate, self.frame_size),
        }
    }

    fn validate(&self) -> error::Result<()> {
        if self.hop_divisor == 0 || self.hop_divisor > self.frame_size {
            return Err(AnalysisError::InvalidConfig(format!(
                "hop divisor {} must be in 1..={}",
                self.hop_divisor, self.frame_size
            )));
        }
        if self.batch_frames == 0 {
            return Err(AnalysisError::InvalidConfig("batch size must be at least 1".into()));
        }
        if self.weight_interval == 0 {
            return Err(AnalysisError::InvalidConfig("weight interval must be at least 1".into()));
        }
        if self.weights.candidates_per_band == 0 {
            return Err(AnalysisError::InvalidConfig("candidates per band must be at least 1".into()));
        }
        Ok(())
    }

    fn wants_weights(&self, index: usize) -> bool {
        (index + 1) % self.weight_interval == 0
    }
}

/// One of each pipeline stage, built once per run and shared read-only.
pub struct FrameAnalyzer {
    descriptor: AudioDescriptor,
    transformer: SpectralTransformer,
    whitener: Whitener,
    calculator: KlapuriWeightCalculator,
}

impl FrameAnalyzer {
    pub fn new(descriptor: AudioDescriptor, params: WeightParams) -> error::Result<Self> {
        let calculator = KlapuriWeightCalculator::new(&descriptor, params)?;
        Ok(Self {
            transformer: SpectralTransformer::new(descriptor.frame_size()),
            whitener: Whitener::new(&descriptor),
            calculator,
            descriptor,
        })
    }

    pub fn descriptor(&self) -> &AudioDescriptor {
        &self.descriptor
    }

    pub fn calculator(&self) -> &KlapuriWeightCalculator {
        &self.calculator
    }

    /// Window, transform and whiten `frame`. The buffer is windowed in place.
    pub fn whiten_frame(&self, frame: &mut [f64]) -> error::Result<Vec<f64>> {
        let spectrum = self.transformer.transform(frame)?;
        self.whitener.whiten(&spectrum)
    }

    pub fn analyze_frame(
        &self,
        frame: &mut [f64],
        with_weights: bool,
    ) -> error::Result<(Vec<f64>, Option<FrameWeights>)> {
        let whitened = self.whiten_frame(frame)?;
        let weights = if with_weights {
            Some(self.calculator.calculate(&whitened)?)
        } else {
            None
        };
        Ok((whitened, weights))
    }
}

/// Start offsets of every full frame that ends before the last sample.
pub fn frame_offsets(total_samples: usize, frame_size: usize, hop: usize) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut pos = 0;
    while pos + frame_size < total_samples {
        offsets.push(pos);
        pos += hop;
    }
    offsets
}

/// Analyze a mono waveform frame by frame, streaming results into `sink`.
///
/// Frames are processed in parallel batches of `batch_frames`; each batch is
/// delivered in frame order and dropped before the next one starts.
pub fn analyze<S: AnalysisSink + ?Sized>(
    samples: &[f64],
    sample_rate: u32,
    settings: &AnalysisSettings,
    sink: &mut S,
) -> Result<RunSummary> {
    settings.validate()?;
    let descriptor = settings.descriptor(sample_rate)?;
    log::info!(
        "{} Hz audio, buckets: {:.2} Hz, candidates {}..={} ({:.0}-{:.0} Hz)",
        descriptor.sample_rate(),
        descriptor.bucket_size_hz(),
        descriptor.min_freq_index(),
        descriptor.max_freq_index(),
        descriptor.bucket_to_hz(descriptor.min_freq_index()),
        descriptor.bucket_to_hz(descriptor.max_freq_index())
    );

    let analyzer = FrameAnalyzer::new(descriptor, settings.weights.clone())?;
    let bands = analyzer.calculator().band_model().len();
    log::info!("Band model: {} bands", bands);

    let frame_size = settings.frame_size;
    let offsets = frame_offsets(samples.len(), frame_size, settings.hop_size());
    if offsets.is_empty() {
        log::warn!(
            "Audio is shorter than one {}-sample frame; nothing to analyze",
            frame_size
        );
    }
    log::info!(
        "Analyzing {} frames (hop {} samples, weights every {} frames)...",
        offsets.len(),
        settings.hop_size(),
        settings.weight_interval
    );

    let pb = ProgressBar::new(offsets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut frames = 0;
    let mut weighted_frames = 0;
    let mut peak_batch = 0;

    for (batch_idx, batch) in offsets.chunks(settings.batch_frames).enumerate() {
        let first = batch_idx * settings.batch_frames;
        let analyses = batch
            .par_iter()
            .enumerate()
            .map(|(i, &offset)| -> error::Result<FrameAnalysis> {
                let index = first + i;
                // Each worker owns its frame buffer.
                let mut frame = samples[offset..offset + frame_size].to_vec();
                let (whitened, weights) =
                    analyzer.analyze_frame(&mut frame, settings.wants_weights(index))?;
                pb.inc(1);
                Ok(FrameAnalysis {
                    index,
                    time: offset as f64 / sample_rate as f64,
                    whitened,
                    weights,
                })
            })
            .collect::<error::Result<Vec<_>>>()?;

        frames += analyses.len();
        weighted_frames += analyses.iter().filter(|f| f.weights.is_some()).count();
        peak_batch = peak_batch.max(analyses.len());
        deliver(&analyses, sink);
    }

    pb.finish_and_clear();

    Ok(RunSummary {
        descriptor: analyzer.descriptor().clone(),
        total_samples: samples.len(),
        duration: samples.len() as f64 / sample_rate as f64,
        frames,
        weighted_frames,
        bands,
        peak_batch,
    })
}
