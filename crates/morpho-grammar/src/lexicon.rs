use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use morpho_lexicon::{GrammarDir, LexiconFormat, StoreError};
use morpho_types::{Category, Morpheme, MorphemeSet, Segmentation};
use tracing::info;

use crate::GrammarError;
use crate::peel::Peeler;

pub const DEFAULT_MIN_FREQUENCY: u32 = 15;

/// Per-category morpheme counts, keyed by text.
#[derive(Clone, Debug, Default)]
pub struct MorphemeTally<'a> {
    prefixes: HashMap<&'a str, u32>,
    roots: HashMap<&'a str, u32>,
    suffixes: HashMap<&'a str, u32>,
}

impl<'a> MorphemeTally<'a> {
    fn record(mut self, seg: Segmentation<'a>) -> Self {
        if let Some(p) = seg.prefix {
            *self.prefixes.entry(p).or_insert(0) += 1;
        }
        *self.roots.entry(seg.root).or_insert(0) += 1;
        if let Some(s) = seg.suffix {
            *self.suffixes.entry(s).or_insert(0) += 1;
        }
        self
    }

    pub fn count(&self, category: Category, text: &str) -> u32 {
        self.counts(category).get(text).copied().unwrap_or(0)
    }

    /// Number of distinct candidates seen for a category, before filtering.
    pub fn distinct(&self, category: Category) -> usize {
        self.counts(category).len()
    }

    fn counts(&self, category: Category) -> &HashMap<&'a str, u32> {
        match category {
            Category::Prefix => &self.prefixes,
            Category::Root => &self.roots,
            Category::Suffix => &self.suffixes,
        }
    }

    /// Morphemes with at least `min_frequency` observations, most frequent first.
    pub fn filter(&self, category: Category, min_frequency: u32) -> Vec<Morpheme> {
        let mut kept: Vec<Morpheme> = self
            .counts(category)
            .iter()
            .filter(|&(_, &count)| count >= min_frequency)
            .map(|(&text, &frequency)| Morpheme {
                text: text.to_string(),
                category,
                frequency,
            })
            .collect();
        kept.sort_by(|a, b| {
            (Reverse(a.frequency), &a.text).cmp(&(Reverse(b.frequency), &b.text))
        });
        kept
    }
}

/// Tally morphemes over distinct words. Repeats in `words` are ignored.
pub fn tally_morphemes<'k, 'p: 'k, 'w: 'k, I>(peeler: &'p Peeler, words: I) -> MorphemeTally<'k>
where
    I: IntoIterator<Item = &'w str>,
{
    let unique: HashSet<&'w str> = words.into_iter().collect();
    unique
        .into_iter()
        .fold(MorphemeTally::default(), |tally, word| tally.record(peeler.peel(word)))
}

/// Frequency-filtered prefix, root and suffix lexicons.
#[derive(Clone, Debug, Default)]
pub struct LexiconBuild {
    pub prefixes: Vec<Morpheme>,
    pub roots: Vec<Morpheme>,
    pub suffixes: Vec<Morpheme>,
    /// Distinct candidates seen per category before filtering, in [`Category::ALL`] order.
    pub candidates: [usize; 3],
}

impl LexiconBuild {
    pub fn candidates(&self, category: Category) -> usize {
        match category {
            Category::Prefix => self.candidates[0],
            Category::Root => self.candidates[1],
            Category::Suffix => self.candidates[2],
        }
    }

    pub fn morphemes(&self, category: Category) -> &[Morpheme] {
        match category {
            Category::Prefix => &self.prefixes,
            Category::Root => &self.roots,
            Category::Suffix => &self.suffixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.roots.is_empty() && self.suffixes.is_empty()
    }

    /// Write all three lexicon files.
    pub fn save<F: LexiconFormat>(
        &self,
        dir: &GrammarDir<F>,
    ) -> Result<Vec<PathBuf>, StoreError> {
        Category::ALL
            .iter()
            .map(|&category| dir.save_morphemes(category, self.morphemes(category)))
            .collect()
    }

    pub fn to_lexicons(&self) -> Lexicons {
        Lexicons {
            prefixes: MorphemeSet::from_morphemes(Category::Prefix, &self.prefixes),
            roots: MorphemeSet::from_morphemes(Category::Root, &self.roots),
            suffixes: MorphemeSet::from_morphemes(Category::Suffix, &self.suffixes),
        }
    }
}

/// Build the three lexicons from the distinct words of a corpus.
///
/// Each distinct word counts once no matter how often it occurs. An empty
/// input yields empty lexicons.
pub fn build_lexicons<'w, I>(peeler: &Peeler, words: I, min_frequency: u32) -> LexiconBuild
where
    I: IntoIterator<Item = &'w str>,
{
    let tally = tally_morphemes(peeler, words);
    let candidates = Category::ALL.map(|category| tally.distinct(category));
    info!(
        "found {} unique prefixes, {} unique roots, {} unique suffixes",
        candidates[0], candidates[1], candidates[2]
    );

    let build = LexiconBuild {
        prefixes: tally.filter(Category::Prefix, min_frequency),
        roots: tally.filter(Category::Root, min_frequency),
        suffixes: tally.filter(Category::Suffix, min_frequency),
        candidates,
    };
    info!(
        "kept {} prefixes, {} roots, {} suffixes at frequency >= {}",
        build.prefixes.len(),
        build.roots.len(),
        build.suffixes.len(),
        min_frequency
    );
    build
}

/// The three morpheme lexicons as lookup sets.
#[derive(Clone, Debug, Default)]
pub struct Lexicons {
    pub prefixes: MorphemeSet,
    pub roots: MorphemeSet,
    pub suffixes: MorphemeSet,
}

impl Lexicons {
    /// Load all three lexicon files from `dir`.
    pub fn load<F: LexiconFormat>(dir: &GrammarDir<F>) -> Result<Self, GrammarError> {
        Ok(Self {
            prefixes: dir.load_morphemes(Category::Prefix)?,
            roots: dir.load_morphemes(Category::Root)?,
            suffixes: dir.load_morphemes(Category::Suffix)?,
        })
    }

    pub fn get(&self, category: Category) -> &MorphemeSet {
        match category {
            Category::Prefix => &self.prefixes,
            Category::Root => &self.roots,
            Category::Suffix => &self.suffixes,
        }
    }

    /// Fails with the first category whose lexicon has no entries.
    pub fn ensure_complete(&self) -> Result<(), GrammarError> {
        match Category::ALL.into_iter().find(|&c| self.get(c).is_empty()) {
            Some(category) => Err(GrammarError::EmptyLexicon(category)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morpho_types::AffixInventory;

    fn peeler() -> Peeler {
        Peeler::new(AffixInventory::new(["qo", "ch"], ["dy", "y"]))
    }

    #[test]
    fn counts_each_distinct_word_once() {
        let peeler = peeler();
        let words = ["qoked", "qoked", "qoked", "chedy", "qoal"];
        let tally = tally_morphemes(&peeler, words);
        assert_eq!(tally.count(Category::Prefix, "qo"), 2);
        assert_eq!(tally.count(Category::Root, "ked"), 1);
        assert_eq!(tally.count(Category::Suffix, "dy"), 1);
    }

    #[test]
    fn absent_affixes_contribute_nothing() {
        let peeler = peeler();
        let tally = tally_morphemes(&peeler, ["aiin", "okal"]);
        assert_eq!(tally.distinct(Category::Prefix), 0);
        assert_eq!(tally.distinct(Category::Suffix), 0);
        assert_eq!(tally.distinct(Category::Root), 2);
    }

    #[test]
    fn filters_by_threshold_and_sorts() {
        let peeler = peeler();
        let words = ["qoa", "qob", "qoc", "cha", "chb", "zzz"];
        let build = build_lexicons(&peeler, words, 2);
        assert_eq!(
            build
                .prefixes
                .iter()
                .map(|m| (m.text.as_str(), m.frequency))
                .collect::<Vec<_>>(),
            vec![("qo", 3), ("ch", 2)]
        );
        // roots a and b appear twice, c and zzz once
        assert_eq!(
            build.roots.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert!(build.suffixes.is_empty());
    }

    #[test]
    fn lowering_threshold_never_removes_morphemes() {
        let peeler = Peeler::default();
        let words = [
            "qokeedy", "qokedy", "chedy", "shedy", "daiin", "okaiin", "qokain", "chol", "chor",
            "shol", "otedy", "ol", "dar", "sheey",
        ];
        let mut previous: Option<LexiconBuild> = None;
        for threshold in (1..=4).rev() {
            let build = build_lexicons(&peeler, words, threshold);
            if let Some(prev) = &previous {
                for category in Category::ALL {
                    for m in prev.morphemes(category) {
                        assert!(
                            build.morphemes(category).iter().any(|n| n.text == m.text),
                            "{} vanished at threshold {threshold}",
                            m.text
                        );
                    }
                }
            }
            previous = Some(build);
        }
    }

    #[test]
    fn empty_input_gives_empty_lexicons() {
        let peeler = Peeler::default();
        let build = build_lexicons(&peeler, std::iter::empty(), DEFAULT_MIN_FREQUENCY);
        assert!(build.is_empty());
        assert!(matches!(
            build.to_lexicons().ensure_complete(),
            Err(GrammarError::EmptyLexicon(Category::Prefix))
        ));
    }
}
