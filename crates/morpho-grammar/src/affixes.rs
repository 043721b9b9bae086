use std::collections::HashMap;
use std::fmt;

use morpho_lexicon::most_common;
use morpho_types::AffixInventory;
use tracing::info;

/// Which end of a word an affix candidate is cut from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    Start,
    End,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Start => write!(f, "prefix"),
            Position::End => write!(f, "suffix"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffixReportOptions {
    /// Affix lengths to report, each for both positions.
    pub lengths: Vec<usize>,
    pub top_affixes: usize,
    pub top_stems: usize,
    pub ngram_size: usize,
    pub top_ngrams: usize,
}

impl Default for AffixReportOptions {
    fn default() -> Self {
        Self {
            lengths: vec![1, 2],
            top_affixes: 5,
            top_stems: 3,
            ngram_size: 3,
            top_ngrams: 15,
        }
    }
}

/// A fixed-length word edge and the stems it leaves behind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffixCandidate {
    pub affix: String,
    pub count: usize,
    /// Whether the configured inventory already lists this affix.
    pub in_inventory: bool,
    pub distinct_stems: usize,
    pub top_stems: Vec<(String, usize)>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffixSection {
    pub position: Position,
    pub length: usize,
    pub candidates: Vec<AffixCandidate>,
}

/// Raw edge and n-gram frequencies for choosing an affix inventory.
///
/// Nothing here feeds the peeler: the report only shows what the corpus
/// looks like next to the inventory in use.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffixReport {
    pub sections: Vec<AffixSection>,
    pub ngram_size: usize,
    pub ngrams: Vec<(String, usize)>,
}

/// Build the report over every occurrence in `words`.
pub fn affix_report<'w, I>(
    words: I,
    inventory: &AffixInventory,
    options: &AffixReportOptions,
) -> AffixReport
where
    I: IntoIterator<Item = &'w str>,
{
    let words: Vec<&str> = words.into_iter().collect();
    let mut sections = Vec::with_capacity(options.lengths.len() * 2);
    for &length in &options.lengths {
        for position in [Position::Start, Position::End] {
            sections.push(AffixSection {
                position,
                length,
                candidates: edge_candidates(&words, position, length, inventory, options),
            });
        }
    }
    let ngrams = char_ngrams(&words, options.ngram_size, options.top_ngrams);
    info!(
        "affix report over {} tokens: {} sections, {} n-grams",
        words.len(),
        sections.len(),
        ngrams.len()
    );
    AffixReport {
        sections,
        ngram_size: options.ngram_size,
        ngrams,
    }
}

// Only words longer than the edge count, so a stem is never empty.
fn edge_candidates(
    words: &[&str],
    position: Position,
    length: usize,
    inventory: &AffixInventory,
    options: &AffixReportOptions,
) -> Vec<AffixCandidate> {
    if length == 0 {
        return Vec::new();
    }
    let mut edges: HashMap<&str, usize> = HashMap::new();
    let mut stems: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    for word in words {
        if word.len() <= length {
            continue;
        }
        let cut = match position {
            Position::Start => length,
            Position::End => word.len() - length,
        };
        let (Some(head), Some(tail)) = (word.get(..cut), word.get(cut..)) else {
            continue;
        };
        let (edge, stem) = match position {
            Position::Start => (head, tail),
            Position::End => (tail, head),
        };
        *edges.entry(edge).or_default() += 1;
        *stems.entry(edge).or_default().entry(stem).or_default() += 1;
    }

    let listed = match position {
        Position::Start => inventory.prefixes(),
        Position::End => inventory.suffixes(),
    };
    most_common(edges, options.top_affixes)
        .into_iter()
        .map(|(edge, count)| {
            let stem_counts = stems.remove(edge).unwrap_or_default();
            AffixCandidate {
                affix: edge.to_string(),
                count,
                in_inventory: listed.iter().any(|a| a == edge),
                distinct_stems: stem_counts.len(),
                top_stems: most_common(stem_counts, options.top_stems)
                    .into_iter()
                    .map(|(s, n)| (s.to_string(), n))
                    .collect(),
            }
        })
        .collect()
}

/// Most frequent character n-grams inside words.
pub fn char_ngrams(words: &[&str], n: usize, top: usize) -> Vec<(String, usize)> {
    if n == 0 {
        return Vec::new();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words {
        for start in 0..word.len().saturating_sub(n - 1) {
            if let Some(gram) = word.get(start..start + n) {
                *counts.entry(gram).or_default() += 1;
            }
        }
    }
    most_common(counts, top)
        .into_iter()
        .map(|(g, c)| (g.to_string(), c))
        .collect()
}
