use clap::Parser;
use std::path::PathBuf;

use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "f0scope", about = "Banded harmonic-summation F0 analysis (Klapuri 2005)")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG); multi-channel input is averaged to mono
    pub input: PathBuf,

    /// Config file (defaults to ./f0scope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Analysis frame size in samples (power of two)
    #[arg(long, default_value_t = 2048)]
    pub frame_size: usize,

    /// Hop between frames is frame_size / hop_divisor
    #[arg(long, default_value_t = 8)]
    pub hop_divisor: usize,

    /// Compute pitch weights on every n-th frame
    #[arg(long, default_value_t = 8)]
    pub weight_interval: usize,

    /// Frames analyzed in parallel before their results are reported
    #[arg(long, default_value_t = 64)]
    pub batch_frames: usize,

    /// FFT bucket size in Hz. Derived from sample rate and frame size when unset.
    #[arg(long)]
    pub bucket_size: Option<f64>,

    /// Number of F0 candidates reported per frame
    #[arg(long, default_value_t = 3)]
    pub top: usize,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
