//! Plain-text lexicon and rule files.
//!
//! ```text
//! # Corpus Core Roots
//! # Morpheme | Frequency
//! ====================
//! ched       | 42
//! ```
//!
//! Rule files use `left-right` as the key. Readers skip lines that start with
//! `#` or carry no `|`, and take the trimmed text before the first `|`.

use std::cmp::Reverse;
use std::io::{self, Write};

use morpho_types::{CombinationRule, Morpheme, MorphemeSet, RuleSet};

/// Serializer/deserializer for persisted lexicons and rule sets.
pub trait LexiconFormat {
    fn write_morphemes(
        &self,
        out: &mut dyn Write,
        title: &str,
        morphemes: &[Morpheme],
    ) -> io::Result<()>;

    fn read_morphemes(&self, text: &str) -> MorphemeSet;

    fn write_rules(
        &self,
        out: &mut dyn Write,
        title: &str,
        rules: &[CombinationRule],
    ) -> io::Result<()>;

    fn read_rules(&self, text: &str) -> RuleSet;
}

/// The `text | frequency` format shared by every pipeline stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainText;

impl LexiconFormat for PlainText {
    fn write_morphemes(
        &self,
        out: &mut dyn Write,
        title: &str,
        morphemes: &[Morpheme],
    ) -> io::Result<()> {
        writeln!(out, "# {title}")?;
        writeln!(out, "# Morpheme | Frequency")?;
        writeln!(out, "{}", "=".repeat(20))?;
        let mut sorted: Vec<&Morpheme> = morphemes.iter().collect();
        sorted.sort_by(|a, b| {
            (Reverse(a.frequency), &a.text).cmp(&(Reverse(b.frequency), &b.text))
        });
        for m in sorted {
            writeln!(out, "{:<10} | {}", m.text, m.frequency)?;
        }
        Ok(())
    }

    fn read_morphemes(&self, text: &str) -> MorphemeSet {
        MorphemeSet::from_entries(data_lines(text))
    }

    fn write_rules(
        &self,
        out: &mut dyn Write,
        title: &str,
        rules: &[CombinationRule],
    ) -> io::Result<()> {
        writeln!(out, "# {title}")?;
        writeln!(out, "# Combination      | Frequency")?;
        writeln!(out, "{}", "=".repeat(28))?;
        let mut sorted: Vec<&CombinationRule> = rules.iter().collect();
        sorted.sort_by(|a, b| {
            (Reverse(a.frequency), &a.left, &a.right).cmp(&(
                Reverse(b.frequency),
                &b.left,
                &b.right,
            ))
        });
        for r in sorted {
            let combination = format!("{}-{}", r.left, r.right);
            writeln!(out, "{:<18} | {}", combination, r.frequency)?;
        }
        Ok(())
    }

    fn read_rules(&self, text: &str) -> RuleSet {
        let pairs = data_lines(text).filter_map(|(key, frequency)| {
            // A key with more or fewer than one '-' is ambiguous; skip it.
            let mut parts = key.split('-');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
                    Some(((left, right), frequency))
                }
                _ => None,
            }
        });
        RuleSet::from_entries(pairs)
    }
}

/// `(key, frequency)` for every data line with a non-blank key. Unparsable
/// frequencies read as 0.
fn data_lines(text: &str) -> impl Iterator<Item = (&str, u32)> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('|'))
        .map(|(key, count)| (key.trim(), count))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, count)| (key, count.trim().parse().unwrap_or(0)))
}
