use serde::Deserialize;
use std::path::PathBuf;

use crate::analysis::descriptor::FRAME_SIZE;
use crate::analysis::klapuri::WeightParams;
use crate::report::OutputFormat;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,
    #[serde(default = "default_hop_divisor")]
    pub hop_divisor: usize,
    #[serde(default = "default_weight_interval")]
    pub weight_interval: usize,
    #[serde(default)]
    pub bucket_size_hz: Option<f64>,
    #[serde(default = "default_batch_frames")]
    pub batch_frames: usize,
}

#[derive(Debug, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_inharmonicity")]
    pub inharmonicity: f64,
    #[serde(default = "default_partial_weight")]
    pub partial_weight: f64,
    #[serde(default = "default_partial_floor")]
    pub partial_floor: f64,
    #[serde(default = "default_low_candidate_cutoff")]
    pub low_candidate_cutoff: usize,
    #[serde(default = "default_candidates_per_band")]
    pub candidates_per_band: usize,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: default_frame_size(),
            hop_divisor: default_hop_divisor(),
            weight_interval: default_weight_interval(),
            bucket_size_hz: None,
            batch_frames: default_batch_frames(),
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            inharmonicity: default_inharmonicity(),
            partial_weight: default_partial_weight(),
            partial_floor: default_partial_floor(),
            low_candidate_cutoff: default_low_candidate_cutoff(),
            candidates_per_band: default_candidates_per_band(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top: default_top(),
        }
    }
}

impl WeightsConfig {
    pub fn params(&self) -> WeightParams {
        WeightParams {
            inharmonicity: self.inharmonicity,
            partial_weight: self.partial_weight,
            partial_floor: self.partial_floor,
            low_candidate_cutoff: self.low_candidate_cutoff,
            candidates_per_band: self.candidates_per_band,
        }
    }
}

fn default_frame_size() -> usize { FRAME_SIZE }
fn default_hop_divisor() -> usize { 8 }
fn default_weight_interval() -> usize { 8 }
fn default_batch_frames() -> usize { 64 }
fn default_inharmonicity() -> f64 { WeightParams::default().inharmonicity }
fn default_partial_weight() -> f64 { WeightParams::default().partial_weight }
fn default_partial_floor() -> f64 { WeightParams::default().partial_floor }
fn default_low_candidate_cutoff() -> usize { WeightParams::default().low_candidate_cutoff }
fn default_candidates_per_band() -> usize { WeightParams::default().candidates_per_band }
fn default_top() -> usize { 3 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.analysis.frame_size, FRAME_SIZE);
        assert_eq!(cfg.analysis.hop_divisor, 8);
        assert_eq!(cfg.analysis.bucket_size_hz, None);
        assert_eq!(cfg.analysis.batch_frames, 64);
        assert_eq!(cfg.weights.params(), WeightParams::default());
        assert_eq!(cfg.output.format, OutputFormat::Text);
        assert_eq!(cfg.output.top, 3);
    }

    #[test]
    fn partial_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [analysis]
            frame_size = 4096
            bucket_size_hz = 21.0

            [weights]
            low_candidate_cutoff = 0

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.frame_size, 4096);
        assert_eq!(cfg.analysis.weight_interval, 8);
        assert_eq!(cfg.analysis.bucket_size_hz, Some(21.0));
        let params = cfg.weights.params();
        assert_eq!(params.low_candidate_cutoff, 0);
        assert_eq!(params.candidates_per_band, 3);
        assert_eq!(cfg.output.format, OutputFormat::Json);
    }

    #[test]
    fn partial_weighting_is_configurable() {
        let cfg: Config = toml::from_str(
            r#"
            [weights]
            partial_weight = 0.5
            partial_floor = 0.5
            "#,
        )
        .unwrap();
        let params = cfg.weights.params();
        assert_eq!(params.partial_weight, 0.5);
        assert_eq!(params.partial_floor, 0.5);
        assert_eq!(params.inharmonicity, WeightParams::default().inharmonicity);
        assert_eq!(params.low_candidate_cutoff, WeightParams::default().low_candidate_cutoff);
    }

    #[test]
    fn unreadable_config_is_none() {
        assert!(load_config(&PathBuf::from("/nonexistent/f0scope.toml")).is_none());
    }
}
