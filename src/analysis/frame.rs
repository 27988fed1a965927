use super::descriptor::AudioDescriptor;
use super::klapuri::FrameWeights;

/// Output of one analysis step. Lives only until its batch is delivered.
#[derive(Clone, Debug)]
pub struct FrameAnalysis {
    /// Position in the hop sequence
    pub index: usize,
    /// Start of the frame in seconds
    pub time: f64,
    /// Whitened magnitude spectrum (frame_size elements, all >= 0)
    pub whitened: Vec<f64>,
    /// Band and global weights; only computed every `weight_interval` frames
    pub weights: Option<FrameWeights>,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub descriptor: AudioDescriptor,
    pub total_samples: usize,
    pub duration: f64,
    pub frames: usize,
    pub weighted_frames: usize,
    pub bands: usize,
    /// Largest number of frames held in memory at once
    pub peak_batch: usize,
}
