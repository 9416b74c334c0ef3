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

//! # Language model collaborator interfaces
//! The generation and scoring components do not load model weights or
//! implement a tokenizer themselves. Both are supplied by the caller through
//! the [`LanguageModel`] trait, and the per-step token selection rule through
//! the [`TokenPicker`] trait.

use crate::common::error::RustBeamError;
use tch::{Device, Tensor};

/// End of sequence token id for the reference GPT-2 vocabulary
/// (`<|endoftext|>`). Models with a different vocabulary override
/// [`LanguageModel::eos_token_id`].
pub const DEFAULT_EOS_TOKEN_ID: i64 = 50256;

/// # Pretrained causal language model and tokenizer provider
/// The end of sequence token doubles as the padding filler for batched
/// scoring, matching the GPT-2 convention.
pub trait LanguageModel {
    /// Converts a text into a sequence of vocabulary token ids.
    fn encode(&self, text: &str) -> Vec<i64>;

    /// Converts a sequence of token ids back into text. Not required to be an
    /// exact inverse of `encode`, only to round-trip readably.
    fn decode(&self, token_ids: &[i64]) -> String;

    /// Forward pass through the model.
    ///
    /// # Arguments
    ///
    /// * `input_ids` - Input tensor of shape (*batch size*, *sequence_length*).
    ///
    /// # Returns
    ///
    /// * `Tensor` of shape (*batch size*, *sequence_length*, *vocab_size*)
    ///   containing the next token logits for each position.
    fn forward(&self, input_ids: &Tensor) -> Result<Tensor, RustBeamError>;

    /// End of sequence token id, used both as generation terminator and as
    /// padding filler.
    fn eos_token_id(&self) -> i64 {
        DEFAULT_EOS_TOKEN_ID
    }

    /// Device the model expects its inputs on.
    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// # Per-step token picking policy
/// Injected into [`crate::BeamSearchGenerator`] to propose candidate next
/// tokens at each decoding step (greedy, top-k, nucleus sampling, ...).
pub trait TokenPicker {
    /// Proposes candidate next tokens given the next token probability
    /// distribution of each live hypothesis.
    ///
    /// # Arguments
    ///
    /// * `probabilities` - Tensor of shape (*num_hypotheses*, *vocab_size*)
    ///   holding a probability distribution per hypothesis.
    ///
    /// # Returns
    ///
    /// * Integer `Tensor` of shape (*num_hypotheses*, *k*) with `k` candidate
    ///   token ids per hypothesis.
    fn pick_tokens(&self, probabilities: &Tensor) -> Tensor;
}
