//! Banded harmonic-summation weights, after Klapuri (2005).
//!
//! Each band yields a local weight per candidate F0 bucket. The per-band
//! maxima are then pooled into a single global pitch-strength vector.

use std::collections::BTreeSet;

use super::bands::{Band, BandModel};
use super::descriptor::AudioDescriptor;
use super::error::{AnalysisError, Result};
use super::top_k::top_k;

/// Tunable constants of the weighting scheme.
///
/// `low_candidate_cutoff` and the lack of inharmonicity correction in the
/// global pooling are approximations, so they are exposed rather than fixed.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightParams {
    /// β in Klapuri eq. 5; widens the harmonic offset search with harmonic number.
    pub inharmonicity: f64,
    /// Numerator of the partial-count normalization `a / partials + b`.
    pub partial_weight: f64,
    /// Constant term of the partial-count normalization.
    pub partial_floor: f64,
    /// Candidates at or below this bucket never receive a global weight.
    pub low_candidate_cutoff: usize,
    /// How many local maxima each band contributes to the candidate set.
    pub candidates_per_band: usize,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            inharmonicity: 0.01,
            partial_weight: 0.75,
            partial_floor: 0.25,
            low_candidate_cutoff: 5,
            candidates_per_band: 3,
        }
    }
}

/// Weights for one frame.
#[derive(Clone, Debug)]
pub struct FrameWeights {
    /// One local weight vector per band, in band order.
    pub bands: Vec<Vec<f64>>,
    /// Pooled pitch strength per candidate bucket, `0..=max_freq_index`.
    pub global: Vec<f64>,
}

pub struct KlapuriWeightCalculator {
    descriptor: AudioDescriptor,
    model: BandModel,
    params: WeightParams,
}

impl KlapuriWeightCalculator {
    pub fn new(descriptor: &AudioDescriptor, params: WeightParams) -> Result<Self> {
        let model = BandModel::new(descriptor)?;
        Ok(Self {
            descriptor: descriptor.clone(),
            model,
            params,
        })
    }

    pub fn band_model(&self) -> &BandModel {
        &self.model
    }

    pub fn calculate(&self, whitened: &[f64]) -> Result<FrameWeights> {
        let bands = self.band_weight_matrix(whitened)?;
        let global = self.global_weights(&bands);
        Ok(FrameWeights { bands, global })
    }

    pub fn band_weight_matrix(&self, whitened: &[f64]) -> Result<Vec<Vec<f64>>> {
        let expected = self.descriptor.frame_size();
        if whitened.len() != expected {
            return Err(AnalysisError::SpectrumLength {
                expected,
                actual: whitened.len(),
            });
        }
        Ok(self
            .model
            .bands()
            .iter()
            .map(|band| self.band_weights(whitened, band))
            .collect())
    }

    /// Local weights for one band: the element-wise maximum of the
    /// multi-harmonic and single-harmonic passes.
    pub fn band_weights(&self, whitened: &[f64], band: &Band) -> Vec<f64> {
        let multi = self.multi_harmonic_weights(whitened, band);
        let single = self.single_harmonic_weights(whitened, band);
        multi.iter().zip(&single).map(|(&a, &b)| a.max(b)).collect()
    }

    fn weight_len(&self, band: &Band) -> usize {
        self.descriptor.max_freq_index().max(band.max_index()) + 1
    }

    /// Candidates with at least two harmonics inside the band.
    ///
    /// For each candidate period `f`, sums the windowed magnitudes at
    /// `min + offset, min + offset + f, ...` and keeps the best offset.
    pub fn multi_harmonic_weights(&self, whitened: &[f64], band: &Band) -> Vec<f64> {
        let lo = band.min_index();
        let hi = band.max_index();
        let mut weights = vec![0.0; self.weight_len(band)];

        // A zero period has no harmonics.
        let first = self.descriptor.min_freq_index().max(1);
        for f in first..band.bucket_count() {
            let (min_offset, max_offset) = self.offset_range(band, f);

            let mut best = 0.0f64;
            for offset in min_offset..=max_offset {
                let mut sum = 0.0;
                let mut partials = 0usize;
                for g in (lo + offset..=hi).step_by(f) {
                    sum += whitened[g] * band.coefficient(g);
                    partials += 1;
                }
                if partials == 0 {
                    continue;
                }
                sum *= self.params.partial_weight / partials as f64 + self.params.partial_floor;
                best = best.max(sum);
            }
            weights[f] = best;
        }

        weights
    }

    /// Admissible alignment offsets for candidate period `f` (eq. 5).
    fn offset_range(&self, band: &Band, f: usize) -> (usize, usize) {
        let lo = band.min_index();
        let hi = band.max_index();

        // First multiple of f at or above the band start.
        let min_offset = (lo + f - 1) / f * f - lo;
        let h = (hi / f) as f64;
        let delta = hi as f64 * ((1.0 + self.params.inharmonicity * (h * h - 1.0)).sqrt() - 1.0);
        let max_offset = (min_offset as f64 + delta) as usize;

        if max_offset > min_offset + f - 1 {
            // Spread exceeds a full period: search all of it.
            (0, f - 1)
        } else {
            (min_offset, max_offset)
        }
    }

    /// Candidates whose only harmonic inside the band is the `h`-th one.
    pub fn single_harmonic_weights(&self, whitened: &[f64], band: &Band) -> Vec<f64> {
        let lo = band.min_index();
        let hi = band.max_index();
        let reach = lo + band.bucket_count();
        let mut weights = vec![0.0; self.weight_len(band)];

        let mut h = 1usize;
        let mut k0 = (reach / 2).max(lo);
        let mut k1 = hi;
        while k0 <= k1 {
            for k in k0..=k1 {
                let n = (k as f64 / h as f64).round() as usize;
                let v = whitened[k] * band.coefficient(k);
                if v > weights[n] {
                    weights[n] = v;
                }
            }

            h += 1;
            k0 = (reach * h / (h + 1)).max(lo);
            // A band starting at bucket 0 has no lower neighbour, so no
            // candidate can place only its h-th (h >= 2) harmonic in it.
            k1 = match lo.checked_sub(1) {
                Some(below) => (below * h / (h - 1)).min(hi),
                None => break,
            };
        }

        weights
    }

    /// Pool band weights into one vector over `0..=max_freq_index`.
    ///
    /// The candidate set is the union of each band's top picks; a candidate's
    /// global weight sums its squared weight over every band.
    pub fn global_weights(&self, band_weights: &[Vec<f64>]) -> Vec<f64> {
        let max_index = self.descriptor.max_freq_index();

        let mut candidates = BTreeSet::new();
        for weights in band_weights {
            candidates.extend(top_k(weights, self.params.candidates_per_band).indices());
        }

        let mut global = vec![0.0; max_index + 1];
        for c in candidates
            .into_iter()
            .filter(|&c| c > self.params.low_candidate_cutoff && c <= max_index)
        {
            global[c] = band_weights
                .iter()
                .map(|w| w.get(c).map_or(0.0, |v| v * v))
                .sum();
        }
        global
    }
}
