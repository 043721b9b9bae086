use std::collections::HashMap;

use tracing::info;

use crate::Corpus;

/// How many entries each ranked list in [`CorpusStats`] keeps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatsLimits {
    pub words: usize,
    pub edges: usize,
    pub bigrams: usize,
}

impl Default for StatsLimits {
    fn default() -> Self {
        Self {
            words: 20,
            edges: 5,
            bigrams: 10,
        }
    }
}

/// Descriptive statistics over the running text of a corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusStats {
    pub tokens: usize,
    pub vocabulary: usize,
    /// Mean token length in characters.
    pub average_length: f64,
    /// Shannon entropy of the character distribution, in bits per character.
    pub entropy: f64,
    pub top_words: Vec<(String, usize)>,
    pub top_starts: Vec<(char, usize)>,
    pub top_ends: Vec<(char, usize)>,
    /// Adjacent token pairs in running order.
    pub top_bigrams: Vec<((String, String), usize)>,
}

impl CorpusStats {
    pub fn compute(corpus: &Corpus, limits: StatsLimits) -> Self {
        let tokens = corpus.tokens();

        let mut words: HashMap<&str, usize> = HashMap::new();
        let mut chars: HashMap<char, usize> = HashMap::new();
        let mut starts: HashMap<char, usize> = HashMap::new();
        let mut ends: HashMap<char, usize> = HashMap::new();
        let mut bigrams: HashMap<(&str, &str), usize> = HashMap::new();
        let mut total_chars = 0usize;

        for token in tokens {
            *words.entry(token.as_str()).or_default() += 1;
            for c in token.chars() {
                *chars.entry(c).or_default() += 1;
                total_chars += 1;
            }
            if let Some(c) = token.chars().next() {
                *starts.entry(c).or_default() += 1;
            }
            if let Some(c) = token.chars().next_back() {
                *ends.entry(c).or_default() += 1;
            }
        }
        for pair in tokens.windows(2) {
            *bigrams
                .entry((pair[0].as_str(), pair[1].as_str()))
                .or_default() += 1;
        }

        let average_length = if tokens.is_empty() {
            0.0
        } else {
            total_chars as f64 / tokens.len() as f64
        };
        let entropy: f64 = chars
            .values()
            .map(|&count| {
                let p = count as f64 / total_chars as f64;
                -p * p.log2()
            })
            .sum();

        let stats = Self {
            tokens: tokens.len(),
            vocabulary: words.len(),
            average_length,
            entropy,
            top_words: most_common(words, limits.words)
                .into_iter()
                .map(|(w, n)| (w.to_string(), n))
                .collect(),
            top_starts: most_common(starts, limits.edges),
            top_ends: most_common(ends, limits.edges),
            top_bigrams: most_common(bigrams, limits.bigrams)
                .into_iter()
                .map(|((a, b), n)| ((a.to_string(), b.to_string()), n))
                .collect(),
        };
        info!(
            "computed statistics over {} tokens ({} distinct)",
            stats.tokens, stats.vocabulary
        );
        stats
    }
}

/// The `n` highest counts, ties broken by ascending key.
pub fn most_common<K: Ord>(counts: HashMap<K, usize>, n: usize) -> Vec<(K, usize)> {
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
