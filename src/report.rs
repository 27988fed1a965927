//! Consumers of analysis output.
//!
//! A sink accepts whitened spectra and weight vectors in frame order. The
//! only sink shipped here summarises each weighted frame as its strongest
//! F0 candidates.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis::descriptor::AudioDescriptor;
use crate::analysis::klapuri::FrameWeights;
use crate::analysis::sink::AnalysisSink;
use crate::analysis::top_k::top_k;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Serialize)]
pub struct Candidate {
    pub bucket: usize,
    pub frequency_hz: f64,
    pub strength: f64,
    pub note: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct FrameReport {
    pub frame: usize,
    pub time: f64,
    /// Loudest whitened bucket in the usable range, in Hz
    pub spectral_peak_hz: Option<f64>,
    /// Band holding the largest local weight, counted from the lowest band
    pub strongest_band: Option<usize>,
    pub candidates: Vec<Candidate>,
}

pub struct PitchReport {
    descriptor: AudioDescriptor,
    top: usize,
    last_peak: Option<(usize, usize)>,
    spectra: usize,
    frames: Vec<FrameReport>,
}

impl PitchReport {
    pub fn new(descriptor: AudioDescriptor, top: usize) -> Self {
        Self {
            descriptor,
            top,
            last_peak: None,
            spectra: 0,
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[FrameReport] {
        &self.frames
    }

    pub fn spectra_seen(&self) -> usize {
        self.spectra
    }

    pub fn write<W: Write>(&self, format: OutputFormat, out: &mut W) -> Result<()> {
        for report in &self.frames {
            match format {
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(report)?)?,
                OutputFormat::Text => writeln!(out, "{}", format_text(report))?,
            }
        }
        Ok(())
    }
}

impl AnalysisSink for PitchReport {
    fn add_spectrum(&mut self, frame: usize, _time: f64, whitened: &[f64]) {
        self.spectra += 1;
        let lo = self.descriptor.min_freq_index();
        let hi = self.descriptor.max_freq_index().min(whitened.len().saturating_sub(1));
        let peak = whitened
            .get(lo..=hi)
            .and_then(|usable| top_k(usable, 1).entries().first().copied())
            .filter(|&(_, v)| v > 0.0)
            .map(|(i, _)| (frame, lo + i));
        self.last_peak = peak;
    }

    fn add_weights(&mut self, frame: usize, time: f64, weights: &FrameWeights) {
        let candidates = top_k(&weights.global, self.top)
            .entries()
            .iter()
            .filter(|&&(_, strength)| strength > 0.0)
            .map(|&(bucket, strength)| {
                let frequency_hz = self.descriptor.bucket_to_hz(bucket);
                Candidate {
                    bucket,
                    frequency_hz,
                    strength,
                    note: note_name(frequency_hz),
                }
            })
            .collect();

        let spectral_peak_hz = match self.last_peak {
            Some((f, bucket)) if f == frame => Some(self.descriptor.bucket_to_hz(bucket)),
            _ => None,
        };

        let strongest_band = weights
            .bands
            .iter()
            .map(|band| band.iter().copied().fold(0.0f64, f64::max))
            .enumerate()
            .filter(|&(_, peak)| peak > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, peak)| match best {
                Some((_, top)) if top >= peak => best,
                _ => Some((i, peak)),
            })
            .map(|(i, _)| i);

        self.frames.push(FrameReport {
            frame,
            time,
            spectral_peak_hz,
            strongest_band,
            candidates,
        });
    }
}

fn format_text(report: &FrameReport) -> String {
    let peak = report
        .spectral_peak_hz
        .map_or_else(|| "-".to_string(), |hz| format!("{:.1} Hz", hz));
    let band = report
        .strongest_band
        .map_or_else(|| "-".to_string(), |b| b.to_string());
    let mut line = format!(
        "{:9.3}s  frame {:6}  peak {:>10}  band {:>3}  |",
        report.time, report.frame, peak, band
    );
    if report.candidates.is_empty() {
        line.push_str("  (silent)");
    }
    for c in &report.candidates {
        line.push_str(&format!("  {:7.1} Hz {:<4} {:8.2}", c.frequency_hz, c.note, c.strength));
    }
    line
}

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Nearest equal-tempered note, e.g. "A4" for 440 Hz.
pub fn note_name(freq_hz: f64) -> String {
    if freq_hz <= 0.0 {
        return "-".to_string();
    }
    let midi = (69.0 + 12.0 * (freq_hz / 440.0).log2()).round() as i32;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    format!("{}{}", name, midi.div_euclid(12) - 1)
}
