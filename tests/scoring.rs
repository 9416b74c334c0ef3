mod common;

use common::BigramModel;
use rust_beam::{ScoreConfig, SequenceScorer};

#[test]
fn scores_match_analytic_bigram_probabilities() -> anyhow::Result<()> {
    let scorer = SequenceScorer::new(BigramModel::new(), ScoreConfig::default());

    let probabilities = scorer.score("hello", &["world", "world again", "world again again"])?;

    assert_eq!(probabilities.len(), 3);
    // P(world|hello) = 0.9 over 1 token
    assert!((probabilities[0] - 0.9).abs() < 1e-4);
    // P(world|hello) * P(again|world) = 0.36 over 2 tokens
    assert!((probabilities[1] - 0.36f64.sqrt()).abs() < 1e-4);
    // 0.036 over 3 tokens
    assert!((probabilities[2] - 0.036f64.cbrt()).abs() < 1e-4);
    Ok(())
}

#[test]
fn empty_candidate_list_returns_empty_result() -> anyhow::Result<()> {
    let model = BigramModel::new();
    let forward_calls = model.forward_calls();
    let scorer = SequenceScorer::new(model, ScoreConfig::default());

    let probabilities = scorer.score("hello", &Vec::<String>::new())?;

    assert!(probabilities.is_empty());
    assert_eq!(forward_calls.get(), 0);
    Ok(())
}

#[test]
fn empty_context_is_rejected() {
    let scorer = SequenceScorer::new(BigramModel::new(), ScoreConfig::default());

    let result = scorer.score("", &["world"]);

    assert!(result
        .unwrap_err()
        .to_string()
        .contains("context must encode to at least one token"));
}

#[test]
fn zero_token_candidate_scores_as_nan() -> anyhow::Result<()> {
    let scorer = SequenceScorer::new(BigramModel::new(), ScoreConfig::default());

    let probabilities = scorer.score("hello", &["world", ""])?;

    // no positions to average over: 0.0 / 0.0, without affecting neighbours
    assert_eq!(probabilities.len(), 2);
    assert!((probabilities[0] - 0.9).abs() < 1e-4);
    assert!(probabilities[1].is_nan());
    Ok(())
}

#[test]
fn padding_does_not_leak_into_shorter_candidates() -> anyhow::Result<()> {
    let scorer = SequenceScorer::new(BigramModel::new(), ScoreConfig::default());

    let alone = scorer.score("hello", &["world"])?;
    let batched = scorer.score("hello", &["world", "world again again"])?;

    // "world" is padded by two eos tokens when batched with the longer
    // candidate; the mask keeps its score unchanged
    assert!((alone[0] - batched[0]).abs() < 1e-6);
    Ok(())
}

#[test]
fn batch_size_does_not_change_results() -> anyhow::Result<()> {
    let candidates = ["world", "world again", "world again again", "again"];

    let mut results = Vec::new();
    for batch_size in &[1i64, 2, 3, 10] {
        let scorer = SequenceScorer::new(
            BigramModel::new(),
            ScoreConfig {
                batch_size: *batch_size,
            },
        );
        results.push(scorer.score("hello", &candidates)?);
    }

    for result in &results {
        assert_eq!(result.len(), candidates.len());
        for (value, reference) in result.iter().zip(results[0].iter()) {
            assert!((value - reference).abs() < 1e-6);
        }
    }
    // order preservation: first candidate is the most likely one
    assert!((results[0][0] - 0.9).abs() < 1e-4);
    // "again" is impossible after "hello" under the mock transitions
    assert_eq!(results[0][3], 0.0);
    Ok(())
}
