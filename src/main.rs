mod analysis;
mod audio;
mod cli;
mod config;
mod report;

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::time::Instant;

use analysis::pipeline::{self, AnalysisSettings};
use cli::Cli;
use report::PitchReport;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect f0scope.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("f0scope.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("f0scope").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("f0scope").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut weights = analysis::klapuri::WeightParams::default();
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.frame_size == 2048 { cli.frame_size = cfg.analysis.frame_size; }
            if cli.hop_divisor == 8 { cli.hop_divisor = cfg.analysis.hop_divisor; }
            if cli.weight_interval == 8 { cli.weight_interval = cfg.analysis.weight_interval; }
            if cli.batch_frames == 64 { cli.batch_frames = cfg.analysis.batch_frames; }
            if cli.bucket_size.is_none() { cli.bucket_size = cfg.analysis.bucket_size_hz; }
            if cli.top == 3 { cli.top = cfg.output.top; }
            if cli.format == report::OutputFormat::Text { cli.format = cfg.output.format; }
            weights = cfg.weights.params();
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("f0scope - Klapuri F0 pitch-strength analysis");
    log::info!("Input: {}", cli.input.display());
    log::info!(
        "Frame: {} samples, hop 1/{}, weights every {} frames",
        cli.frame_size, cli.hop_divisor, cli.weight_interval
    );

    let started = Instant::now();

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = audio::decode::decode_audio(&cli.input)?;

    // 2. Analyze, streaming each batch of frames into the report
    let settings = AnalysisSettings {
        frame_size: cli.frame_size,
        hop_divisor: cli.hop_divisor,
        weight_interval: cli.weight_interval,
        bucket_size_hz: cli.bucket_size,
        batch_frames: cli.batch_frames,
        weights,
    };
    let descriptor = settings.descriptor(audio_data.sample_rate)?;
    let mut pitch_report = PitchReport::new(descriptor, cli.top);
    let summary = pipeline::analyze(
        &audio_data.samples,
        audio_data.sample_rate,
        &settings,
        &mut pitch_report,
    )?;

    // 3. Report
    log::debug!("At most {} frames held in memory at once", summary.peak_batch);
    log::info!(
        "Reporting {} weighted frames out of {} spectra",
        pitch_report.frames().len(),
        pitch_report.spectra_seen()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    pitch_report.write(cli.format, &mut out)?;
    out.flush()?;

    log::info!(
        "Analyzed {:.0}ms of audio ({} samples) in {}ms ({} frames, {} weighted, {} bands)",
        summary.duration * 1000.0,
        summary.total_samples,
        started.elapsed().as_millis(),
        summary.frames,
        summary.weighted_frames,
        summary.bands
    );
    Ok(())
}
