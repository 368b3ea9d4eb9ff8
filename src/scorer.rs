use anyhow::{ensure, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Calibrated scam-probability source for raw email text.
///
/// Scores near 0.0 are benign, near 1.0 scam-like. Implementations make no
/// other promise about how the score is produced.
pub trait TextScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<f64>;
}

/// Model artifact exported by the offline training step: the fitted
/// tf-idf vocabulary plus logistic regression weights.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorerArtifact {
    /// term -> column index, unigrams and bigrams
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    pub coef: Vec<f64>,
    pub intercept: f64,
    /// Tokens removed before n-gram assembly, if the vectorizer used any
    #[serde(default)]
    pub stop_words: Vec<String>,
}

/// Tf-idf + logistic regression evaluator over a trained artifact.
pub struct TfidfScorer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<f64>,
    intercept: f64,
    stop_words: HashSet<String>,
    token_pattern: Regex,
}

impl TfidfScorer {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {path}"))?;
        let artifact: ScorerArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model artifact: {path}"))?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ScorerArtifact) -> Result<Self> {
        ensure!(
            artifact.idf.len() == artifact.coef.len(),
            "Artifact idf/coef length mismatch: {} vs {}",
            artifact.idf.len(),
            artifact.coef.len()
        );
        for (term, &index) in &artifact.vocabulary {
            ensure!(
                index < artifact.idf.len(),
                "Vocabulary index {index} for term '{term}' out of range"
            );
        }

        // Same word pattern the vectorizer tokenized with
        let token_pattern = Regex::new(r"\b\w\w+\b")?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            coef: artifact.coef,
            intercept: artifact.intercept,
            stop_words: artifact.stop_words.into_iter().collect(),
            token_pattern,
        })
    }

    pub fn artifact_exists(path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_pattern
            .find_iter(&lowered)
            .map(|token| token.as_str().to_string())
            .filter(|token| !self.stop_words.contains(token))
            .collect()
    }

    /// Term counts over vocabulary columns, unigrams then bigrams.
    fn term_counts(&self, tokens: &[String]) -> HashMap<usize, f64> {
        let mut counts: HashMap<usize, f64> = HashMap::new();

        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token.as_str()) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if let Some(&index) = self.vocabulary.get(bigram.as_str()) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        counts
    }
}

impl TextScorer for TfidfScorer {
    fn score(&self, text: &str) -> Result<f64> {
        let tokens = self.tokenize(text);
        let counts = self.term_counts(&tokens);

        let mut weighted: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();

        let norm = weighted
            .iter()
            .map(|(_, value)| value * value)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0 {
            for (_, value) in weighted.iter_mut() {
                *value /= norm;
            }
        }

        let z = self.intercept
            + weighted
                .iter()
                .map(|(index, value)| value * self.coef[*index])
                .sum::<f64>();
        let probability = 1.0 / (1.0 + (-z).exp());

        Ok(probability.clamp(0.0, 1.0))
    }
}
