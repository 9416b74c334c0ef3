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

//! Token picking policies for beam search expansion.

use crate::language_model::TokenPicker;
use std::cmp::min;
use tch::Tensor;

/// Picks the single most probable next token for every hypothesis.
pub struct GreedyTokenPicker;

impl TokenPicker for GreedyTokenPicker {
    fn pick_tokens(&self, probabilities: &Tensor) -> Tensor {
        probabilities.argmax(-1, true)
    }
}

/// Picks the `top_k` most probable next tokens for every hypothesis, capped at
/// the vocabulary size.
pub struct TopKTokenPicker {
    top_k: i64,
}

impl TopKTokenPicker {
    /// Build a new `TopKTokenPicker`. Panics if `top_k` is not strictly
    /// positive.
    pub fn new(top_k: i64) -> TopKTokenPicker {
        assert!(top_k > 0i64, "top_k must be strictly greater than 0");
        TopKTokenPicker { top_k }
    }
}

impl TokenPicker for TopKTokenPicker {
    fn pick_tokens(&self, probabilities: &Tensor) -> Tensor {
        let vocab_size = *probabilities.size().last().unwrap();
        let (_, indices) = probabilities.topk(min(self.top_k, vocab_size), -1, true, true);
        indices
    }
}
