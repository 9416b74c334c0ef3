// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Beam search generation
//! Iterative expansion of a frontier of live hypotheses over a causal language
//! model. At every step the injected [`TokenPicker`] proposes candidate next
//! tokens per hypothesis; candidates are ranked on cumulative log-probability
//! and pruned to the beam width. Hypotheses reaching the end of sequence token
//! are collected into a deduplicated finished set scored with their
//! length-normalized probability. The last decoding step forces the end of
//! sequence token on every live hypothesis, bounding generation to at most
//! `max_steps` forward passes.

pub mod sampling;

use crate::common::config::Config;
use crate::common::error::RustBeamError;
use crate::language_model::{LanguageModel, TokenPicker};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use tch::{no_grad, Kind, Tensor};

/// # Configuration for beam search generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Number of beams, bounding both the live frontier size and the number of
    /// returned sequences (default: 10)
    pub num_beams: i64,
    /// Maximum number of decoding steps. The last step forces the end of
    /// sequence token on all live hypotheses (default: 30)
    pub max_steps: i64,
    /// Method label attached to every returned sequence (default: "GPT2")
    pub method_tag: String,
}

impl Default for GenerateConfig {
    fn default() -> GenerateConfig {
        GenerateConfig {
            num_beams: 10,
            max_steps: 30,
            method_tag: String::from("GPT2"),
        }
    }
}

impl Config for GenerateConfig {}

impl GenerateConfig {
    pub fn validate(&self) {
        assert!(
            self.num_beams > 0i64,
            "num_beams must be strictly greater than 0"
        );
        assert!(
            self.max_steps > 0i64,
            "max_steps must be strictly greater than 0"
        );
    }
}

/// Generated sequence with its method label and length-normalized probability.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedOutput {
    /// Method label, from `GenerateConfig::method_tag`
    pub method: String,
    /// Length-normalized probability, `exp(sum_logP / num_generated_tokens)`
    pub probability: f64,
    /// Decoded generated text (context excluded, trimmed)
    pub text: String,
}

/// Expansion option for one decoding step: a (hypothesis, picked token) pair
/// with the cumulative log-probability it would reach.
struct Candidate {
    sum_log_prob: f64,
    hypothesis_index: usize,
    token: i64,
}

/// Live hypothesis: context-prefixed token sequence and its cumulative
/// log-probability.
struct Hypothesis {
    tokens: Vec<i64>,
    sum_log_prob: f64,
}

/// # Beam search generator
/// Drives beam search decoding over a [`LanguageModel`] with a pluggable
/// [`TokenPicker`] policy.
///
/// Built from a model, a picking policy and a [`GenerateConfig`]; see the
/// crate documentation for a full example.
pub struct BeamSearchGenerator<M, P>
where
    M: LanguageModel,
    P: TokenPicker,
{
    model: M,
    picker: P,
    config: GenerateConfig,
}

impl<M, P> BeamSearchGenerator<M, P>
where
    M: LanguageModel,
    P: TokenPicker,
{
    /// Build a new `BeamSearchGenerator`. Panics if the configuration is
    /// invalid.
    pub fn new(model: M, picker: P, config: GenerateConfig) -> BeamSearchGenerator<M, P> {
        config.validate();
        BeamSearchGenerator {
            model,
            picker,
            config,
        }
    }

    /// Generates continuations for a context text.
    ///
    /// # Arguments
    ///
    /// * `context` - Prompt text, encoded with the model tokenizer and
    ///   prefixed to every hypothesis.
    ///
    /// # Returns
    ///
    /// * At most `num_beams` unique generated sequences, sorted by descending
    ///   length-normalized probability. May be empty if the picking policy
    ///   produces no candidates before any hypothesis finishes.
    pub fn generate(&self, context: &str) -> Result<Vec<GeneratedOutput>, RustBeamError> {
        let eos_token_id = self.model.eos_token_id();
        let device = self.model.device();
        let num_beams = self.config.num_beams as usize;

        let context_ids = self.model.encode(context);
        let context_length = context_ids.len();

        let mut frontier = vec![Hypothesis {
            tokens: context_ids,
            sum_log_prob: 0f64,
        }];
        let mut finished: Vec<(f64, Vec<i64>)> = Vec::new();
        let mut seen_sequences: HashSet<Vec<i64>> = HashSet::new();

        for step in 0..self.config.max_steps {
            let input_ids = Tensor::stack(
                &frontier
                    .iter()
                    .map(|hypothesis| Tensor::from_slice(&hypothesis.tokens))
                    .collect::<Vec<Tensor>>(),
                0,
            )
            .to(device);
            let logits = no_grad(|| self.model.forward(&input_ids))?;
            let next_token_logits = logits.select(1, -1);
            let probabilities = next_token_logits.softmax(-1, Kind::Float);
            // log of the softmax output rather than a fused log-softmax, the
            // same two-step form the scorer uses
            let log_probabilities = probabilities.log();

            let picked_tokens = if step == self.config.max_steps - 1 {
                Tensor::full(
                    &[frontier.len() as i64, 1],
                    eos_token_id,
                    (Kind::Int64, device),
                )
            } else {
                self.picker.pick_tokens(&probabilities)
            };

            let (num_hypotheses, num_picks) = picked_tokens.size2()?;
            let mut candidates = Vec::with_capacity((num_hypotheses * num_picks) as usize);
            for hypothesis_index in 0..num_hypotheses {
                for pick_index in 0..num_picks {
                    let token = picked_tokens.int64_value(&[hypothesis_index, pick_index]);
                    let sum_log_prob = frontier[hypothesis_index as usize].sum_log_prob
                        + log_probabilities.double_value(&[hypothesis_index, token]);
                    candidates.push(Candidate {
                        sum_log_prob,
                        hypothesis_index: hypothesis_index as usize,
                        token,
                    });
                }
            }
            if candidates.is_empty() {
                break;
            }
            candidates.sort_by_key(|candidate| Reverse(OrderedFloat(candidate.sum_log_prob)));
            candidates.truncate(num_beams);

            let mut next_frontier: Vec<Hypothesis> = Vec::with_capacity(num_beams);
            for candidate in candidates {
                let parent = &frontier[candidate.hypothesis_index];
                if candidate.token == eos_token_id {
                    // dedup on the raw generated token ids, not the decoded text
                    let generated = parent.tokens[context_length..].to_vec();
                    if !seen_sequences.contains(&generated) {
                        let probability =
                            (candidate.sum_log_prob / generated.len() as f64).exp();
                        finished.push((probability, generated.clone()));
                        seen_sequences.insert(generated);
                    }
                    // finished candidates never enter the next frontier
                    continue;
                }
                let mut tokens = parent.tokens.clone();
                tokens.push(candidate.token);
                next_frontier.push(Hypothesis {
                    tokens,
                    sum_log_prob: candidate.sum_log_prob,
                });
                if next_frontier.len() == num_beams {
                    break;
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }

        finished.sort_by_key(|(probability, _)| Reverse(OrderedFloat(*probability)));
        let mut outputs = Vec::with_capacity(num_beams.min(finished.len()));
        for (probability, token_ids) in finished {
            outputs.push(GeneratedOutput {
                method: self.config.method_tag.clone(),
                probability,
                text: self.model.decode(&token_ids).trim().to_string(),
            });
            if outputs.len() == num_beams {
                break;
            }
        }
        outputs.sort_by_key(|output| Reverse(OrderedFloat(output.probability)));
        Ok(outputs)
    }
}
