//! Morphological grammar induction and validation.
//!
//! The pipeline runs strictly downstream:
//! 1. [`Peeler`] strips at most one prefix and one suffix from each token,
//!    trying candidates in inventory order.
//! 2. [`build_lexicons`] peels every *distinct* word and keeps the prefixes,
//!    roots and suffixes seen at least `min_frequency` times.
//! 3. [`induce_rules`] peels every *occurrence* and keeps the prefix-root and
//!    root-suffix pairs (with a lexicon-valid root) seen at least
//!    `min_rule_frequency` times.
//! 4. [`Validator`] accepts or rejects arbitrary words against the lexicons and
//!    rules, reporting the first failing check.
//!
//! [`affix_report`] sits outside the pipeline: it ranks raw word edges and
//! character n-grams so an operator can judge an affix inventory.
//!
//! # Example
//! ```no_run
//! use morpho_grammar::{Peeler, Validator, build_lexicons, induce_rules};
//! use morpho_lexicon::{Corpus, GrammarDir, LoadMode};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let corpus = Corpus::load("corpus_clean.txt", LoadMode::Mmap)?;
//! let dir = GrammarDir::new("grammar");
//! let peeler = Peeler::default();
//!
//! let build = build_lexicons(&peeler, corpus.unique(), 15);
//! build.save(&dir)?;
//! let words = corpus.tokens().iter().map(String::as_str);
//! induce_rules(&peeler, words, &build.to_lexicons(), 5)?.save(&dir)?;
//!
//! let validator = Validator::load(peeler, &dir);
//! let verdict = validator.is_valid("chedy")?;
//! println!("{}: {} ({})", verdict.word, verdict.accepted, verdict.message());
//! # Ok(()) }
//! ```

mod affixes;
mod lexicon;
mod peel;
mod rules;
mod validate;

use morpho_lexicon::StoreError;
use morpho_types::Category;
use thiserror::Error;

pub use affixes::{
    AffixCandidate, AffixReport, AffixReportOptions, AffixSection, Position, affix_report,
    char_ngrams,
};
pub use lexicon::{
    DEFAULT_MIN_FREQUENCY, LexiconBuild, Lexicons, MorphemeTally, build_lexicons, tally_morphemes,
};
pub use peel::Peeler;
pub use rules::{DEFAULT_MIN_RULE_FREQUENCY, PairTally, RuleInduction, induce_rules, tally_pairs};
pub use validate::{Grammar, Reason, Validator, Verdict};

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("validator is not ready; unavailable inputs: {}", missing.join(", "))]
    NotReady { missing: Vec<String> },
    #[error("{0} lexicon is empty or was not loaded")]
    EmptyLexicon(Category),
    #[error(transparent)]
    Store(#[from] StoreError),
}
