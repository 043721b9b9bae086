use std::fmt;

use morpho_lexicon::{GrammarDir, LexiconFormat, lexicon_file_name, rule_file_name};
use morpho_types::{Category, RuleKind, RuleSet, Segmentation};
use tracing::{debug, error, info};

use crate::GrammarError;
use crate::lexicon::Lexicons;
use crate::peel::Peeler;

/// Why a word was accepted or rejected. Only the first failing check is reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Reason {
    KnownRoot,
    PrefixSuffixOnly,
    UnknownRoot,
    UnknownPrefix,
    UnknownSuffix,
    UnattestedPrefixRootPair,
    UnattestedRootSuffixPair,
    FullGrammaticalMatch,
}

impl Reason {
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Reason::KnownRoot | Reason::PrefixSuffixOnly | Reason::FullGrammaticalMatch
        )
    }

    /// Stable snake_case identifier.
    pub fn code(self) -> &'static str {
        match self {
            Reason::KnownRoot => "known_root",
            Reason::PrefixSuffixOnly => "prefix_suffix_only",
            Reason::UnknownRoot => "unknown_root",
            Reason::UnknownPrefix => "unknown_prefix",
            Reason::UnknownSuffix => "unknown_suffix",
            Reason::UnattestedPrefixRootPair => "unattested_prefix_root_pair",
            Reason::UnattestedRootSuffixPair => "unattested_root_suffix_pair",
            Reason::FullGrammaticalMatch => "full_grammatical_match",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of validating one word, with the split that was checked.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verdict {
    pub word: String,
    pub accepted: bool,
    pub reason: Reason,
    pub prefix: Option<String>,
    pub root: String,
    pub suffix: Option<String>,
}

impl Verdict {
    fn new(word: &str, seg: Segmentation<'_>, reason: Reason) -> Self {
        Self {
            word: word.to_string(),
            accepted: reason.is_accepted(),
            reason,
            prefix: seg.prefix.map(str::to_string),
            root: seg.root.to_string(),
            suffix: seg.suffix.map(str::to_string),
        }
    }

    /// Human-readable explanation naming the offending part.
    pub fn message(&self) -> String {
        let prefix = self.prefix.as_deref().unwrap_or_default();
        let suffix = self.suffix.as_deref().unwrap_or_default();
        match self.reason {
            Reason::KnownRoot => "word is a known core root".to_string(),
            Reason::PrefixSuffixOnly => {
                format!("valid prefix-suffix structure ('{prefix}-{suffix}')")
            }
            Reason::UnknownRoot => format!("root '{}' not found in lexicon", self.root),
            Reason::UnknownPrefix => format!("prefix '{prefix}' not found in lexicon"),
            Reason::UnknownSuffix => format!("suffix '{suffix}' not found in lexicon"),
            Reason::UnattestedPrefixRootPair => {
                format!("combination rule '{prefix}-{}' not found", self.root)
            }
            Reason::UnattestedRootSuffixPair => {
                format!("combination rule '{}-{suffix}' not found", self.root)
            }
            Reason::FullGrammaticalMatch => "follows all induced grammatical rules".to_string(),
        }
    }
}

/// Lexicons plus both rule sets, all non-empty.
#[derive(Clone, Debug)]
pub struct Grammar {
    lexicons: Lexicons,
    prefix_root: RuleSet,
    root_suffix: RuleSet,
}

impl Grammar {
    /// Assemble a grammar; every lexicon and rule set must have entries.
    pub fn new(
        lexicons: Lexicons,
        prefix_root: RuleSet,
        root_suffix: RuleSet,
    ) -> Result<Self, GrammarError> {
        let mut missing: Vec<String> = Category::ALL
            .into_iter()
            .filter(|&c| lexicons.get(c).is_empty())
            .map(|c| format!("{c} lexicon"))
            .collect();
        if prefix_root.is_empty() {
            missing.push(format!("{} rules", RuleKind::PrefixRoot));
        }
        if root_suffix.is_empty() {
            missing.push(format!("{} rules", RuleKind::RootSuffix));
        }
        if !missing.is_empty() {
            return Err(GrammarError::NotReady { missing });
        }
        Ok(Self {
            lexicons,
            prefix_root,
            root_suffix,
        })
    }

    pub fn lexicons(&self) -> &Lexicons {
        &self.lexicons
    }

    fn check_structure(&self, seg: &Segmentation<'_>) -> Reason {
        let lex = &self.lexicons;
        if !lex.roots.contains(seg.root) {
            return Reason::UnknownRoot;
        }
        if let Some(p) = seg.prefix
            && !lex.prefixes.contains(p)
        {
            return Reason::UnknownPrefix;
        }
        if let Some(s) = seg.suffix
            && !lex.suffixes.contains(s)
        {
            return Reason::UnknownSuffix;
        }
        if let Some(p) = seg.prefix
            && !self.prefix_root.contains(p, seg.root)
        {
            return Reason::UnattestedPrefixRootPair;
        }
        if let Some(s) = seg.suffix
            && !self.root_suffix.contains(seg.root, s)
        {
            return Reason::UnattestedRootSuffixPair;
        }
        Reason::FullGrammaticalMatch
    }
}

/// Classifies words against an induced grammar.
///
/// A validator built from incomplete inputs stays in a not-ready state and
/// refuses every query rather than guessing.
#[derive(Clone, Debug)]
pub struct Validator {
    peeler: Peeler,
    grammar: Option<Grammar>,
    missing: Vec<String>,
}

impl Validator {
    pub fn new(peeler: Peeler, grammar: Grammar) -> Self {
        Self {
            peeler,
            grammar: Some(grammar),
            missing: Vec::new(),
        }
    }

    /// Load all five grammar files from `dir`.
    ///
    /// Never fails outright: each missing or empty file is logged by name and
    /// the validator comes back not ready.
    pub fn load<F: LexiconFormat>(peeler: Peeler, dir: &GrammarDir<F>) -> Self {
        let mut missing = Vec::new();

        let mut lexicons = Lexicons::default();
        for category in Category::ALL {
            let name = lexicon_file_name(category);
            match dir.load_morphemes(category) {
                Ok(set) if set.is_empty() => {
                    error!("lexicon file '{}' has no entries", dir.lexicon_path(category).display());
                    missing.push(name.to_string());
                }
                Ok(set) => match category {
                    Category::Prefix => lexicons.prefixes = set,
                    Category::Root => lexicons.roots = set,
                    Category::Suffix => lexicons.suffixes = set,
                },
                Err(err) => {
                    error!("{err}");
                    missing.push(name.to_string());
                }
            }
        }

        let mut rule_sets = Vec::with_capacity(2);
        for kind in RuleKind::ALL {
            let name = rule_file_name(kind);
            match dir.load_rules(kind) {
                Ok(set) if set.is_empty() => {
                    error!("rule file '{}' has no entries", dir.rules_path(kind).display());
                    missing.push(name.to_string());
                    rule_sets.push(set);
                }
                Ok(set) => rule_sets.push(set),
                Err(err) => {
                    error!("{err}");
                    missing.push(name.to_string());
                    rule_sets.push(RuleSet::default());
                }
            }
        }

        if !missing.is_empty() {
            error!("validator initialization failed; unavailable: {}", missing.join(", "));
            return Self {
                peeler,
                grammar: None,
                missing,
            };
        }

        let root_suffix = rule_sets.pop().unwrap_or_default();
        let prefix_root = rule_sets.pop().unwrap_or_default();
        match Grammar::new(lexicons, prefix_root, root_suffix) {
            Ok(grammar) => {
                info!("validator is ready");
                Self::new(peeler, grammar)
            }
            Err(err) => {
                error!("{err}");
                let missing = match err {
                    GrammarError::NotReady { missing } => missing,
                    other => vec![other.to_string()],
                };
                Self {
                    peeler,
                    grammar: None,
                    missing,
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.grammar.is_some()
    }

    /// Inputs that kept the validator from becoming ready.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn peeler(&self) -> &Peeler {
        &self.peeler
    }

    /// Decide whether `word` is grammatical.
    ///
    /// Checks run in a fixed order and the first decisive one wins:
    /// 1. the whole word is a known root (no peeling);
    /// 2. prefix and suffix with nothing between, both in their lexicons;
    /// 3. root, prefix and suffix lexicon membership, then the prefix-root and
    ///    root-suffix rules.
    pub fn is_valid(&self, word: &str) -> Result<Verdict, GrammarError> {
        let Some(grammar) = &self.grammar else {
            return Err(GrammarError::NotReady {
                missing: self.missing.clone(),
            });
        };
        let lex = grammar.lexicons();

        let verdict = if lex.roots.contains(word) {
            Verdict::new(word, Segmentation::bare(word), Reason::KnownRoot)
        } else {
            let seg = self.peeler.split(word);
            let reason = match (seg.prefix, seg.suffix) {
                (Some(p), Some(s))
                    if seg.root.is_empty()
                        && lex.prefixes.contains(p)
                        && lex.suffixes.contains(s) =>
                {
                    Reason::PrefixSuffixOnly
                }
                _ => grammar.check_structure(&seg),
            };
            Verdict::new(word, seg, reason)
        };

        debug!(
            "'{}' -> {} ({})",
            verdict.word,
            if verdict.accepted { "accepted" } else { "rejected" },
            verdict.message()
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morpho_types::{AffixInventory, MorphemeSet};

    fn grammar() -> Grammar {
        Grammar::new(
            Lexicons {
                prefixes: MorphemeSet::from_entries([("qo", 20), ("ch", 20)]),
                roots: MorphemeSet::from_entries([("ched", 30), ("ok", 30)]),
                suffixes: MorphemeSet::from_entries([("dy", 20), ("y", 20)]),
            },
            RuleSet::from_entries([(("qo", "ked"), 6)]),
            RuleSet::from_entries([(("ched", "y"), 6)]),
        )
        .unwrap()
    }

    fn validator(prefixes: &[&str], suffixes: &[&str]) -> Validator {
        let inventory = AffixInventory::new(prefixes.iter().copied(), suffixes.iter().copied());
        Validator::new(Peeler::new(inventory), grammar())
    }

    fn reason(v: &Validator, word: &str) -> Reason {
        v.is_valid(word).unwrap().reason
    }

    #[test]
    fn whole_word_root_is_accepted_before_peeling() {
        let v = validator(&["ch", "qo"], &["dy", "y"]);
        // Peeling "ched" would give ch + "ed", an unknown root.
        let verdict = v.is_valid("ched").unwrap();
        assert!(verdict.accepted);
        assert_eq!(verdict.reason, Reason::KnownRoot);
        assert_eq!(verdict.root, "ched");
        assert_eq!(verdict.prefix, None);
    }

    #[test]
    fn root_plus_attested_suffix_matches() {
        let v = validator(&["qo", "sh"], &["y", "dy"]);
        let verdict = v.is_valid("chedy").unwrap();
        assert_eq!(verdict.prefix, None);
        assert_eq!(verdict.root, "ched");
        assert_eq!(verdict.suffix.as_deref(), Some("y"));
        assert_eq!(verdict.reason, Reason::FullGrammaticalMatch);
        assert!(verdict.accepted);
    }

    #[test]
    fn unknown_root_is_reported_first() {
        let v = validator(&["qo", "sh"], &["y", "dy"]);
        assert_eq!(reason(&v, "qoked"), Reason::UnknownRoot);
        assert_eq!(reason(&v, "galaxy"), Reason::UnknownRoot);
    }

    #[test]
    fn unknown_affixes_are_rejected() {
        let v = validator(&["sh", "qo"], &["ol", "y"]);
        assert_eq!(reason(&v, "shok"), Reason::UnknownPrefix);
        assert_eq!(reason(&v, "okol"), Reason::UnknownSuffix);
        // Unknown prefix wins over unknown suffix.
        assert_eq!(reason(&v, "shokol"), Reason::UnknownPrefix);
    }

    #[test]
    fn unattested_pairs_are_rejected() {
        let v = validator(&["qo", "ch"], &["dy", "y"]);
        assert_eq!(reason(&v, "qook"), Reason::UnattestedPrefixRootPair);
        assert_eq!(reason(&v, "okdy"), Reason::UnattestedRootSuffixPair);
        // Prefix pair is checked before suffix pair.
        assert_eq!(reason(&v, "qookdy"), Reason::UnattestedPrefixRootPair);
    }

    #[test]
    fn pure_affix_word_accepts_on_lexicon_membership() {
        let v = validator(&["qo", "ch", "sh"], &["dy", "ol"]);
        let verdict = v.is_valid("qody").unwrap();
        assert_eq!(verdict.reason, Reason::PrefixSuffixOnly);
        assert_eq!(verdict.root, "");
        assert!(verdict.accepted);

        // "sh" is not a lexicon prefix: falls through to the structure check.
        assert_eq!(reason(&v, "shdy"), Reason::UnknownRoot);
        assert_eq!(reason(&v, "qool"), Reason::UnknownRoot);
    }

    #[test]
    fn verdicts_are_stable_across_calls() {
        let v = validator(&["ch", "qo", "sh"], &["dy", "y"]);
        for word in ["ched", "chedy", "qoked", "galaxy", "qody", "okdy"] {
            assert_eq!(v.is_valid(word).unwrap(), v.is_valid(word).unwrap());
        }
    }

    #[test]
    fn incomplete_grammar_is_not_ready() {
        let err = Grammar::new(
            Lexicons::default(),
            RuleSet::default(),
            RuleSet::from_entries([(("ched", "y"), 6)]),
        )
        .unwrap_err();
        match err {
            GrammarError::NotReady { missing } => {
                assert_eq!(missing.len(), 4);
                assert!(missing.contains(&"root lexicon".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn not_ready_validator_refuses_every_word() {
        let dir = tempfile::tempdir().unwrap();
        let v = Validator::load(Peeler::default(), &GrammarDir::new(dir.path()));
        assert!(!v.is_ready());
        assert_eq!(v.missing().len(), 5);
        for word in ["ched", "chedy", ""] {
            assert!(matches!(
                v.is_valid(word),
                Err(GrammarError::NotReady { .. })
            ));
        }
    }

    #[test]
    fn messages_name_the_offending_part() {
        let v = validator(&["qo", "sh"], &["y", "dy"]);
        let verdict = v.is_valid("qoked").unwrap();
        assert_eq!(verdict.message(), "root 'ked' not found in lexicon");
        assert_eq!(Reason::UnattestedRootSuffixPair.code(), "unattested_root_suffix_pair");
    }
}
