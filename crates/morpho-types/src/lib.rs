//! Shared types for morphological grammar induction.
//!
//! A token is peeled into a [`Segmentation`] using an ordered
//! [`AffixInventory`]. Frequency-filtered [`Morpheme`]s and
//! [`CombinationRule`]s are the persisted outputs of the induction stages, and
//! [`MorphemeSet`] / [`RuleSet`] are their read-only, lookup-friendly forms.
//!
//! ```rust
//! use morpho_types::{AffixInventory, MorphemeSet};
//!
//! let inventory = AffixInventory::new(["qo", "ch"], ["dy", "y"]);
//! assert_eq!(inventory.prefixes()[0], "qo");
//!
//! let roots = MorphemeSet::from_entries([("ched", 40)]);
//! assert!(roots.contains("ched"));
//! ```

use std::collections::HashMap;
use std::fmt;

/// Default candidate prefixes, in match priority order.
pub const DEFAULT_PREFIXES: &[&str] = &["ch", "qo", "sh", "ok", "da", "o", "c", "q", "s", "d"];

/// Default candidate suffixes, in match priority order.
pub const DEFAULT_SUFFIXES: &[&str] = &["dy", "in", "ey", "ol", "ar", "y", "n", "l", "r", "m"];

/// Which slot of a word a morpheme fills.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Category {
    Prefix,
    Root,
    Suffix,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Prefix, Category::Root, Category::Suffix];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Prefix => "prefix",
            Category::Root => "root",
            Category::Suffix => "suffix",
        })
    }
}

/// Ordered candidate affixes. The first listed candidate that matches wins,
/// regardless of length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AffixInventory {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl AffixInventory {
    /// Build an inventory from candidates given in priority order.
    ///
    /// Empty candidates are dropped since they would match every word.
    pub fn new<P, S>(prefixes: P, suffixes: S) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
            suffixes: suffixes
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl Default for AffixInventory {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFIXES.iter().copied(),
            DEFAULT_SUFFIXES.iter().copied(),
        )
    }
}

/// A word split into at most one prefix, a root, and at most one suffix.
///
/// Affixes borrow from the inventory, the root from the word.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Segmentation<'a> {
    pub prefix: Option<&'a str>,
    pub root: &'a str,
    pub suffix: Option<&'a str>,
}

impl<'a> Segmentation<'a> {
    /// The whole word as a bare root.
    pub fn bare(word: &'a str) -> Self {
        Self {
            prefix: None,
            root: word,
            suffix: None,
        }
    }
}

impl fmt::Display for Segmentation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+[{}]+{}",
            self.prefix.unwrap_or("-"),
            self.root,
            self.suffix.unwrap_or("-")
        )
    }
}

/// A frequency-qualified morpheme of one category.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Morpheme {
    pub text: String,
    pub category: Category,
    pub frequency: u32,
}

/// The two kinds of attested combination.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RuleKind {
    PrefixRoot,
    RootSuffix,
}

impl RuleKind {
    pub const ALL: [RuleKind; 2] = [RuleKind::PrefixRoot, RuleKind::RootSuffix];
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleKind::PrefixRoot => "prefix-root",
            RuleKind::RootSuffix => "root-suffix",
        })
    }
}

/// An ordered `(left, right)` pair attested at least a threshold number of times.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CombinationRule {
    pub kind: RuleKind,
    pub left: String,
    pub right: String,
    pub frequency: u32,
}

/// Read-only lexicon of one category, keyed by morpheme text.
#[derive(Clone, Debug, Default)]
pub struct MorphemeSet {
    entries: HashMap<String, u32>,
}

impl MorphemeSet {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn from_morphemes(category: Category, morphemes: &[Morpheme]) -> Self {
        Self::from_entries(
            morphemes
                .iter()
                .filter(|m| m.category == category)
                .map(|m| (m.text.clone(), m.frequency)),
        )
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    pub fn frequency(&self, text: &str) -> Option<u32> {
        self.entries.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Read-only set of attested pairs of one kind.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    // left -> right -> frequency, so lookups can borrow `&str` keys.
    pairs: HashMap<String, HashMap<String, u32>>,
    len: usize,
}

impl RuleSet {
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = ((K, K), u32)>,
        K: Into<String>,
    {
        let mut pairs: HashMap<String, HashMap<String, u32>> = HashMap::new();
        let mut len = 0;
        for ((left, right), frequency) in entries {
            let slot = pairs.entry(left.into()).or_default();
            if slot.insert(right.into(), frequency).is_none() {
                len += 1;
            }
        }
        Self { pairs, len }
    }

    pub fn from_rules(kind: RuleKind, rules: &[CombinationRule]) -> Self {
        Self::from_entries(
            rules
                .iter()
                .filter(|r| r.kind == kind)
                .map(|r| ((r.left.clone(), r.right.clone()), r.frequency)),
        )
    }

    pub fn contains(&self, left: &str, right: &str) -> bool {
        self.frequency(left, right).is_some()
    }

    pub fn frequency(&self, left: &str, right: &str) -> Option<u32> {
        self.pairs.get(left)?.get(right).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u32)> + '_ {
        self.pairs.iter().flat_map(|(left, rights)| {
            rights
                .iter()
                .map(move |(right, v)| (left.as_str(), right.as_str(), *v))
        })
    }
}
