// Copyright 2020 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Batched sequence scoring
//! Length-normalized likelihood of candidate continuations given a context,
//! computed by teacher forcing: the full context + candidate sequence is fed
//! to the model in one pass and the probability assigned to each actual
//! candidate token is read off the logits. Candidates of different lengths
//! share one fixed-width batch through end of sequence padding and a binary
//! mask, so padding positions contribute neither to the numerator nor to the
//! length used for normalization.

use crate::common::config::Config;
use crate::common::error::RustBeamError;
use crate::language_model::LanguageModel;
use serde::{Deserialize, Serialize};
use tch::{no_grad, Kind, Tensor};

/// # Configuration for batched sequence scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Maximum number of candidates scored in one forward pass (default: 10)
    pub batch_size: i64,
}

impl Default for ScoreConfig {
    fn default() -> ScoreConfig {
        ScoreConfig { batch_size: 10 }
    }
}

impl Config for ScoreConfig {}

impl ScoreConfig {
    pub fn validate(&self) {
        assert!(
            self.batch_size > 0i64,
            "batch_size must be strictly greater than 0"
        );
    }
}

/// # Teacher forcing sequence scorer
pub struct SequenceScorer<M>
where
    M: LanguageModel,
{
    model: M,
    config: ScoreConfig,
}

impl<M> SequenceScorer<M>
where
    M: LanguageModel,
{
    /// Build a new `SequenceScorer`. Panics if the configuration is invalid.
    pub fn new(model: M, config: ScoreConfig) -> SequenceScorer<M> {
        config.validate();
        SequenceScorer { model, config }
    }

    /// Scores candidate continuations of a context.
    ///
    /// # Arguments
    ///
    /// * `context` - Context text shared by all candidates.
    /// * `candidates` - Candidate continuation texts.
    ///
    /// # Returns
    ///
    /// * One length-normalized probability per candidate,
    ///   `exp(mean log P(token | prefix))` over the candidate's real tokens,
    ///   preserving the input order. Empty input yields an empty vector.
    ///
    /// The context must encode to at least one token: the logit positions read
    /// off the forward pass start at the last context token. A candidate that
    /// encodes to zero tokens has no positions to average over and scores as
    /// `NaN`.
    pub fn score<S>(&self, context: &str, candidates: &[S]) -> Result<Vec<f64>, RustBeamError>
    where
        S: AsRef<str>,
    {
        let mut probabilities = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(self.config.batch_size as usize) {
            probabilities.extend(self.score_batch(context, batch)?);
        }
        Ok(probabilities)
    }

    fn score_batch<S>(&self, context: &str, batch: &[S]) -> Result<Vec<f64>, RustBeamError>
    where
        S: AsRef<str>,
    {
        let eos_token_id = self.model.eos_token_id();
        let device = self.model.device();

        let context_ids = self.model.encode(context);
        if context_ids.is_empty() {
            return Err(RustBeamError::ValueError(
                "context must encode to at least one token".to_string(),
            ));
        }
        let context_length = context_ids.len() as i64;

        let encoded = batch
            .iter()
            .map(|candidate| self.model.encode(candidate.as_ref()))
            .collect::<Vec<Vec<i64>>>();
        let candidate_lengths = encoded
            .iter()
            .map(|token_ids| token_ids.len() as i64)
            .collect::<Vec<i64>>();
        let max_length = *candidate_lengths.iter().max().unwrap() as usize;

        let mut id_rows = Vec::with_capacity(encoded.len());
        let mut mask_rows = Vec::with_capacity(encoded.len());
        for token_ids in &encoded {
            let padding = max_length - token_ids.len();
            let mut row = context_ids.clone();
            row.extend_from_slice(token_ids);
            row.extend(std::iter::repeat(eos_token_id).take(padding));
            let mut mask = vec![1f32; token_ids.len()];
            mask.extend(std::iter::repeat(0f32).take(padding));
            id_rows.push(Tensor::from_slice(&row));
            mask_rows.push(Tensor::from_slice(&mask));
        }
        let input_ids = Tensor::stack(&id_rows, 0).to(device);
        let mask = Tensor::stack(&mask_rows, 0).to(device);
        let candidate_lengths = Tensor::from_slice(&candidate_lengths)
            .to_kind(Kind::Float)
            .to(device);

        let total_length = context_length + max_length as i64;
        let logits = no_grad(|| self.model.forward(&input_ids))?;
        // positions whose next token prediction targets the candidate tokens
        let candidate_logits = logits.slice(1, context_length - 1, total_length - 1, 1);
        // same two-step log(softmax) as the generator
        let log_probabilities = candidate_logits.softmax(-1, Kind::Float).log();

        let targets = input_ids
            .slice(1, context_length, total_length, 1)
            .unsqueeze(-1);
        let picked_log_probabilities = log_probabilities.gather(-1, &targets, false).squeeze_dim(-1);
        let average_log_probabilities = (picked_log_probabilities * mask).sum_dim_intlist(
            [-1i64].as_slice(),
            false,
            Kind::Float,
        ) / candidate_lengths;
        let probabilities = average_log_probabilities.exp();

        Ok((0..batch.len() as i64)
            .map(|index| probabilities.double_value(&[index]))
            .collect())
    }
}
