use super::frame::FrameAnalysis;
use super::klapuri::FrameWeights;

/// Consumer of analysis output. Calls arrive in frame order.
pub trait AnalysisSink {
    fn add_spectrum(&mut self, frame: usize, time: f64, whitened: &[f64]);
    fn add_weights(&mut self, frame: usize, time: f64, weights: &FrameWeights);
}

/// Feed frames to `sink` in order.
pub fn deliver<S: AnalysisSink + ?Sized>(frames: &[FrameAnalysis], sink: &mut S) {
    for frame in frames {
        sink.add_spectrum(frame.index, frame.time, &frame.whitened);
        if let Some(ref weights) = frame.weights {
            sink.add_weights(frame.index, frame.time, weights);
        }
    }
}
