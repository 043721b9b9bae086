use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::PathBuf;

use morpho_lexicon::{GrammarDir, LexiconFormat, StoreError};
use morpho_types::{CombinationRule, RuleKind, RuleSet, Segmentation};
use tracing::info;

use crate::GrammarError;
use crate::lexicon::Lexicons;
use crate::peel::Peeler;

pub const DEFAULT_MIN_RULE_FREQUENCY: u32 = 5;

/// Occurrence counts of prefix-root and root-suffix pairs in running text.
#[derive(Clone, Debug, Default)]
pub struct PairTally<'a> {
    prefix_root: HashMap<(&'a str, &'a str), u32>,
    root_suffix: HashMap<(&'a str, &'a str), u32>,
}

impl<'a> PairTally<'a> {
    // Only the root has to be a lexicon member; any peeled affix is trusted.
    fn record(mut self, seg: Segmentation<'a>, lexicons: &Lexicons) -> Self {
        if !lexicons.roots.contains(seg.root) {
            return self;
        }
        if let Some(p) = seg.prefix {
            *self.prefix_root.entry((p, seg.root)).or_insert(0) += 1;
        }
        if let Some(s) = seg.suffix {
            *self.root_suffix.entry((seg.root, s)).or_insert(0) += 1;
        }
        self
    }

    fn counts(&self, kind: RuleKind) -> &HashMap<(&'a str, &'a str), u32> {
        match kind {
            RuleKind::PrefixRoot => &self.prefix_root,
            RuleKind::RootSuffix => &self.root_suffix,
        }
    }

    pub fn count(&self, kind: RuleKind, left: &str, right: &str) -> u32 {
        self.counts(kind).get(&(left, right)).copied().unwrap_or(0)
    }

    /// Number of distinct pairs seen, before filtering.
    pub fn distinct(&self, kind: RuleKind) -> usize {
        self.counts(kind).len()
    }

    /// Pairs seen at least `min_frequency` times, most frequent first.
    pub fn filter(&self, kind: RuleKind, min_frequency: u32) -> Vec<CombinationRule> {
        let mut kept: Vec<CombinationRule> = self
            .counts(kind)
            .iter()
            .filter(|&(_, &count)| count >= min_frequency)
            .map(|(&(left, right), &frequency)| CombinationRule {
                kind,
                left: left.to_string(),
                right: right.to_string(),
                frequency,
            })
            .collect();
        kept.sort_by(|a, b| {
            (Reverse(a.frequency), &a.left, &a.right).cmp(&(
                Reverse(b.frequency),
                &b.left,
                &b.right,
            ))
        });
        kept
    }
}

/// Count pairs over every occurrence in `words`, repeats included.
pub fn tally_pairs<'k, 'p: 'k, 'w: 'k, I>(
    peeler: &'p Peeler,
    words: I,
    lexicons: &Lexicons,
) -> PairTally<'k>
where
    I: IntoIterator<Item = &'w str>,
{
    words.into_iter().fold(PairTally::default(), |tally, word| {
        tally.record(peeler.peel(word), lexicons)
    })
}

/// Frequency-filtered prefix-root and root-suffix rules.
#[derive(Clone, Debug, Default)]
pub struct RuleInduction {
    pub prefix_root: Vec<CombinationRule>,
    pub root_suffix: Vec<CombinationRule>,
    /// Distinct combinations seen per kind before filtering, in [`RuleKind::ALL`] order.
    pub candidates: [usize; 2],
}

impl RuleInduction {
    pub fn candidates(&self, kind: RuleKind) -> usize {
        match kind {
            RuleKind::PrefixRoot => self.candidates[0],
            RuleKind::RootSuffix => self.candidates[1],
        }
    }

    pub fn rules(&self, kind: RuleKind) -> &[CombinationRule] {
        match kind {
            RuleKind::PrefixRoot => &self.prefix_root,
            RuleKind::RootSuffix => &self.root_suffix,
        }
    }

    /// Write both rule files.
    pub fn save<F: LexiconFormat>(
        &self,
        dir: &GrammarDir<F>,
    ) -> Result<Vec<PathBuf>, StoreError> {
        RuleKind::ALL
            .iter()
            .map(|&kind| dir.save_rules(kind, self.rules(kind)))
            .collect()
    }

    pub fn to_rule_set(&self, kind: RuleKind) -> RuleSet {
        RuleSet::from_rules(kind, self.rules(kind))
    }
}

/// Induce combination rules from the full running text of a corpus.
///
/// Refuses to run unless all three lexicons have entries, since an absent
/// lexicon would silently produce an empty or misleading rule set.
pub fn induce_rules<'w, I>(
    peeler: &Peeler,
    words: I,
    lexicons: &Lexicons,
    min_rule_frequency: u32,
) -> Result<RuleInduction, GrammarError>
where
    I: IntoIterator<Item = &'w str>,
{
    lexicons.ensure_complete()?;

    let tally = tally_pairs(peeler, words, lexicons);
    let candidates = RuleKind::ALL.map(|kind| tally.distinct(kind));
    info!(
        "found {} unique prefix-root combinations, {} unique root-suffix combinations",
        candidates[0], candidates[1]
    );

    let induction = RuleInduction {
        prefix_root: tally.filter(RuleKind::PrefixRoot, min_rule_frequency),
        root_suffix: tally.filter(RuleKind::RootSuffix, min_rule_frequency),
        candidates,
    };
    info!(
        "kept {} prefix-root and {} root-suffix rules at frequency >= {}",
        induction.prefix_root.len(),
        induction.root_suffix.len(),
        min_rule_frequency
    );
    Ok(induction)
}
