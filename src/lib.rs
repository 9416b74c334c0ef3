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

//! # Beam search decoding and sequence likelihood scoring
//!
//! This crate provides two components operating on top of a pretrained causal
//! language model:
//!
//! - [`BeamSearchGenerator`]: generates diverse continuations for a text prompt
//!   using beam search with a pluggable per-step token picking policy. Finished
//!   hypotheses are deduplicated on their raw token sequences and ranked by
//!   length-normalized probability.
//! - [`SequenceScorer`]: computes the length-normalized likelihood of candidate
//!   continuations given a context via masked teacher forcing, batched for
//!   efficiency.
//!
//! The model itself (weights, tokenizer, device placement) is supplied by the
//! caller through the [`LanguageModel`] trait, exposing `encode`, `decode` and a
//! batched `forward` pass returning next-token logits. Token picking policies
//! (greedy, top-k, ...) implement [`TokenPicker`].
//!
//! ```no_run
//! use rust_beam::{
//!     BeamSearchGenerator, GenerateConfig, LanguageModel, RustBeamError, TopKTokenPicker,
//! };
//! use tch::{Kind, Tensor};
//!
//! struct UniformModel;
//!
//! impl LanguageModel for UniformModel {
//!     fn encode(&self, text: &str) -> Vec<i64> {
//!         text.bytes().map(i64::from).collect()
//!     }
//!     fn decode(&self, token_ids: &[i64]) -> String {
//!         token_ids.iter().map(|id| *id as u8 as char).collect()
//!     }
//!     fn forward(&self, input_ids: &Tensor) -> Result<Tensor, RustBeamError> {
//!         let (batch_size, sequence_length) = input_ids.size2()?;
//!         Ok(Tensor::zeros(
//!             &[batch_size, sequence_length, 256],
//!             (Kind::Float, input_ids.device()),
//!         ))
//!     }
//!     fn eos_token_id(&self) -> i64 {
//!         0
//!     }
//! }
//!
//! fn main() -> Result<(), RustBeamError> {
//!     let generator = BeamSearchGenerator::new(
//!         UniformModel,
//!         TopKTokenPicker::new(5),
//!         GenerateConfig::default(),
//!     );
//!     for output in generator.generate("hello world")? {
//!         println!("{} {:.3}\t{}", output.method, output.probability, output.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod console;
pub mod generation;
pub mod language_model;
pub mod scoring;

pub use common::config::Config;
pub use common::error::RustBeamError;
pub use generation::sampling::{GreedyTokenPicker, TopKTokenPicker};
pub use generation::{BeamSearchGenerator, GenerateConfig, GeneratedOutput};
pub use language_model::{LanguageModel, TokenPicker, DEFAULT_EOS_TOKEN_ID};
pub use scoring::{ScoreConfig, SequenceScorer};
