//! Deterministic mock bigram language model shared by the integration tests.
//! Word-level vocabulary of four tokens; the next token distribution depends
//! only on the current token, so expected probabilities can be computed
//! analytically.

use rust_beam::{LanguageModel, RustBeamError};
use std::cell::Cell;
use std::rc::Rc;
use tch::{Device, Tensor};

pub const EOS: i64 = 0;
pub const WORLD: i64 = 2;
// renders the same surface text as WORLD under a different token id
pub const WORLD_ALIAS: i64 = 4;

const VOCAB: [&str; 5] = ["<|endoftext|>", "hello", "world", "again", "world"];
const VOCAB_SIZE: usize = 5;

// P(next | current), rows sum to 1. Zero entries turn into -inf logits.
const TRANSITIONS: [[f32; VOCAB_SIZE]; VOCAB_SIZE] = [
    [0.25, 0.25, 0.25, 0.25, 0.0], // after <|endoftext|> (also the padding filler)
    [0.1, 0.0, 0.9, 0.0, 0.0],     // after "hello"
    [0.6, 0.0, 0.0, 0.4, 0.0],     // after "world"
    [0.9, 0.0, 0.0, 0.1, 0.0],     // after "again"
    [0.6, 0.0, 0.0, 0.4, 0.0],     // after the "world" alias
];

pub struct BigramModel {
    forward_calls: Rc<Cell<usize>>,
}

impl BigramModel {
    pub fn new() -> BigramModel {
        BigramModel {
            forward_calls: Rc::new(Cell::new(0)),
        }
    }

    /// Handle onto the forward pass counter, usable after the model has been
    /// moved into a generator or scorer.
    pub fn forward_calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.forward_calls)
    }
}

impl LanguageModel for BigramModel {
    fn encode(&self, text: &str) -> Vec<i64> {
        text.split_whitespace()
            .filter_map(|word| VOCAB.iter().position(|entry| *entry == word))
            .map(|index| index as i64)
            .collect()
    }

    fn decode(&self, token_ids: &[i64]) -> String {
        token_ids
            .iter()
            .map(|id| VOCAB[*id as usize])
            .collect::<Vec<&str>>()
            .join(" ")
    }

    fn forward(&self, input_ids: &Tensor) -> Result<Tensor, RustBeamError> {
        self.forward_calls.set(self.forward_calls.get() + 1);
        let (batch_size, sequence_length) = input_ids.size2()?;
        let mut logits =
            Vec::with_capacity((batch_size * sequence_length) as usize * VOCAB_SIZE);
        for row in 0..batch_size {
            for position in 0..sequence_length {
                let token = input_ids.int64_value(&[row, position]) as usize;
                for weight in &TRANSITIONS[token] {
                    logits.push(weight.ln());
                }
            }
        }
        Ok(Tensor::from_slice(&logits).view([batch_size, sequence_length, VOCAB_SIZE as i64]))
    }

    fn eos_token_id(&self) -> i64 {
        EOS
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}
