//! Persistence for the morphological pipeline.
//!
//! Two concerns live here: reading a cleaned corpus into tokens ([`Corpus`],
//! with descriptive [`CorpusStats`]) and reading/writing the five lexicon and
//! rule files inside a grammar directory ([`GrammarDir`]). The on-disk text
//! format sits behind the [`LexiconFormat`] trait so the induction and
//! validation code only ever sees [`MorphemeSet`]s and [`RuleSet`]s.
//!
//! # Example
//! ```no_run
//! use morpho_lexicon::{Corpus, GrammarDir, LoadMode};
//! use morpho_types::Category;
//!
//! # fn main() -> Result<(), morpho_lexicon::StoreError> {
//! let corpus = Corpus::load("corpus_clean.txt", LoadMode::Mmap)?;
//! println!("{} tokens, {} distinct", corpus.len(), corpus.unique().len());
//!
//! let dir = GrammarDir::new("grammar");
//! let roots = dir.load_morphemes(Category::Root)?;
//! println!("{} roots", roots.len());
//! # Ok(()) }
//! ```

mod corpus;
mod format;
mod stats;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use morpho_types::{Category, CombinationRule, Morpheme, MorphemeSet, RuleKind, RuleSet};
use thiserror::Error;
use tracing::info;

pub use corpus::{Corpus, LoadMode, tokenize};
pub use format::{LexiconFormat, PlainText};
pub use stats::{CorpusStats, StatsLimits, most_common};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing required file: {}", path.display())]
    MissingInputFile { path: PathBuf },
    #[error("corpus {} contains no tokens", path.display())]
    EmptyCorpus { path: PathBuf },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File name of the lexicon for a category.
pub fn lexicon_file_name(category: Category) -> &'static str {
    match category {
        Category::Prefix => "prefixes.txt",
        Category::Root => "roots.txt",
        Category::Suffix => "suffixes.txt",
    }
}

/// File name of the rule set for a kind.
pub fn rule_file_name(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::PrefixRoot => "prefix_root_rules.txt",
        RuleKind::RootSuffix => "root_suffix_rules.txt",
    }
}

fn lexicon_title(category: Category) -> &'static str {
    match category {
        Category::Prefix => "Corpus Prefixes",
        Category::Root => "Corpus Core Roots",
        Category::Suffix => "Corpus Suffixes",
    }
}

fn rule_title(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::PrefixRoot => "Prefix-Root Combination Rules",
        RuleKind::RootSuffix => "Root-Suffix Combination Rules",
    }
}

/// A directory holding `prefixes.txt`, `roots.txt`, `suffixes.txt`,
/// `prefix_root_rules.txt` and `root_suffix_rules.txt`.
#[derive(Clone, Debug)]
pub struct GrammarDir<F = PlainText> {
    root: PathBuf,
    format: F,
}

impl GrammarDir<PlainText> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_format(root, PlainText)
    }
}

impl<F: LexiconFormat> GrammarDir<F> {
    pub fn with_format(root: impl Into<PathBuf>, format: F) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lexicon_path(&self, category: Category) -> PathBuf {
        self.root.join(lexicon_file_name(category))
    }

    pub fn rules_path(&self, kind: RuleKind) -> PathBuf {
        self.root.join(rule_file_name(kind))
    }

    /// Load one lexicon; a missing file is [`StoreError::MissingInputFile`].
    pub fn load_morphemes(&self, category: Category) -> Result<MorphemeSet, StoreError> {
        let path = self.lexicon_path(category);
        let text = read_required(&path)?;
        let set = self.format.read_morphemes(&text);
        info!(
            "lexicon {} loaded with {} morphemes",
            path.display(),
            set.len()
        );
        Ok(set)
    }

    /// Load one rule set; a missing file is [`StoreError::MissingInputFile`].
    pub fn load_rules(&self, kind: RuleKind) -> Result<RuleSet, StoreError> {
        let path = self.rules_path(kind);
        let text = read_required(&path)?;
        let set = self.format.read_rules(&text);
        info!("ruleset {} loaded with {} rules", path.display(), set.len());
        Ok(set)
    }

    /// Write the lexicon for `category`, creating the directory if needed.
    pub fn save_morphemes(
        &self,
        category: Category,
        morphemes: &[Morpheme],
    ) -> Result<PathBuf, StoreError> {
        let path = self.lexicon_path(category);
        write_file(&path, |out| {
            self.format
                .write_morphemes(out, lexicon_title(category), morphemes)
        })?;
        info!("lexicon saved to {}", path.display());
        Ok(path)
    }

    /// Write the rule set for `kind`, creating the directory if needed.
    pub fn save_rules(
        &self,
        kind: RuleKind,
        rules: &[CombinationRule],
    ) -> Result<PathBuf, StoreError> {
        let path = self.rules_path(kind);
        write_file(&path, |out| self.format.write_rules(out, rule_title(kind), rules))?;
        info!("grammar rules saved to {}", path.display());
        Ok(path)
    }
}

fn read_required(path: &Path) -> Result<String, StoreError> {
    if !path.is_file() {
        return Err(StoreError::MissingInputFile {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file<W>(path: &Path, write: W) -> Result<(), StoreError>
where
    W: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    write(&mut out).map_err(io_err)?;
    out.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_stable() {
        assert_eq!(lexicon_file_name(Category::Prefix), "prefixes.txt");
        assert_eq!(lexicon_file_name(Category::Root), "roots.txt");
        assert_eq!(lexicon_file_name(Category::Suffix), "suffixes.txt");
        assert_eq!(rule_file_name(RuleKind::PrefixRoot), "prefix_root_rules.txt");
        assert_eq!(rule_file_name(RuleKind::RootSuffix), "root_suffix_rules.txt");
    }

    #[test]
    fn missing_lexicon_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let grammar = GrammarDir::new(dir.path());
        let err = grammar.load_morphemes(Category::Suffix).unwrap_err();
        assert!(matches!(err, StoreError::MissingInputFile { .. }));
        assert!(err.to_string().contains("suffixes.txt"));
    }
}
