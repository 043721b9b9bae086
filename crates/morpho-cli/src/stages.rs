use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use morpho_grammar::{
    AffixReport, LexiconBuild, Lexicons, Peeler, RuleInduction, Validator, Verdict,
    build_lexicons, induce_rules,
};
use morpho_lexicon::{Corpus, CorpusStats, GrammarDir, LoadMode};
use morpho_types::AffixInventory;
use serde::Serialize;
use tracing::info;

/// Words run by `validate --demo`: attested forms first, then invented ones.
pub const DEMO_WORDS: &[&str] = &[
    "chedy", "qokeedy", "daiin", "shey", "galaxy", "cheyqo", "qokain",
];

/// Build an inventory, replacing either default list when one is given.
pub fn inventory_from(
    prefixes: Option<Vec<String>>,
    suffixes: Option<Vec<String>>,
) -> AffixInventory {
    let defaults = AffixInventory::default();
    AffixInventory::new(
        prefixes.unwrap_or_else(|| defaults.prefixes().to_vec()),
        suffixes.unwrap_or_else(|| defaults.suffixes().to_vec()),
    )
}

pub fn parse_load_mode(raw: &str) -> Result<LoadMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Ok(LoadMode::Mmap),
        "owned" => Ok(LoadMode::Owned),
        other => Err(format!("unknown load mode '{other}' (expected mmap or owned)")),
    }
}

/// Load the corpus once so consecutive stages share it.
pub fn load_corpus(path: &Path, mode: LoadMode) -> Result<Corpus> {
    Corpus::load(path, mode).with_context(|| format!("cannot read corpus {}", path.display()))
}

/// Build the three lexicons from the distinct words of a corpus and write them.
pub fn run_lexicon_stage(
    peeler: &Peeler,
    corpus: &Corpus,
    dir: &GrammarDir,
    min_frequency: u32,
) -> Result<(LexiconBuild, Vec<PathBuf>)> {
    let start = Instant::now();
    let unique = corpus.unique();
    info!("analyzing {} unique words", unique.len());

    let build = build_lexicons(peeler, unique, min_frequency);
    let written = build.save(dir).context("writing lexicon files")?;
    info!("lexicon stage finished in {} ms", start.elapsed().as_millis());
    Ok((build, written))
}

/// Induce combination rules from the full running text and write them.
pub fn run_rules_stage(
    peeler: &Peeler,
    corpus: &Corpus,
    dir: &GrammarDir,
    min_rule_frequency: u32,
) -> Result<(RuleInduction, Vec<PathBuf>)> {
    let start = Instant::now();
    let lexicons = Lexicons::load(dir).context("rule stage halted; run the lexicon stage first")?;

    let words = corpus.tokens().iter().map(String::as_str);
    let induction = induce_rules(peeler, words, &lexicons, min_rule_frequency)
        .context("rule stage halted")?;
    let written = induction.save(dir).context("writing rule files")?;
    info!("rule stage finished in {} ms", start.elapsed().as_millis());
    Ok((induction, written))
}

/// Both stages over one loaded corpus; the rule stage reads back the
/// lexicon files the first stage wrote.
pub fn run_pipeline(
    peeler: &Peeler,
    corpus: &Corpus,
    dir: &GrammarDir,
    min_frequency: u32,
    min_rule_frequency: u32,
) -> Result<(LexiconBuild, RuleInduction)> {
    let (build, _) = run_lexicon_stage(peeler, corpus, dir, min_frequency)?;
    let (induction, _) = run_rules_stage(peeler, corpus, dir, min_rule_frequency)?;
    Ok((build, induction))
}

/// Text form of [`CorpusStats`].
pub fn render_stats(corpus: &Corpus, stats: &CorpusStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "corpus: {}", corpus.path().display());
    let _ = writeln!(out, "tokens: {}", stats.tokens);
    let _ = writeln!(out, "vocabulary: {}", stats.vocabulary);
    let _ = writeln!(out, "average length: {:.2}", stats.average_length);
    let _ = writeln!(out, "entropy: {:.4} bits/char", stats.entropy);
    let _ = writeln!(out, "top words:");
    for (word, count) in &stats.top_words {
        let _ = writeln!(out, "  {word:<15} | {count}");
    }
    let edges = |chars: &[(char, usize)]| {
        chars
            .iter()
            .map(|(c, n)| format!("{c} ({n})"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = writeln!(out, "starting characters: {}", edges(&stats.top_starts));
    let _ = writeln!(out, "ending characters: {}", edges(&stats.top_ends));
    let _ = writeln!(out, "top bigrams:");
    for ((a, b), count) in &stats.top_bigrams {
        let _ = writeln!(out, "  {a} {b}: {count}");
    }
    out
}

/// Text form of an [`AffixReport`]; affixes missing from the inventory are
/// flagged with `*`.
pub fn render_affix_report(report: &AffixReport) -> String {
    let mut out = String::new();
    for section in &report.sections {
        let _ = writeln!(out, "{}-character {}es:", section.length, section.position);
        for candidate in &section.candidates {
            let marker = if candidate.in_inventory { ' ' } else { '*' };
            let stems = candidate
                .top_stems
                .iter()
                .map(|(stem, n)| format!("{stem} ({n})"))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                " {marker}{:<6} | {:>6} | {} stems: {stems}",
                candidate.affix, candidate.count, candidate.distinct_stems
            );
        }
    }
    let _ = writeln!(out, "{}-grams:", report.ngram_size);
    for (gram, count) in &report.ngrams {
        let _ = writeln!(out, "  {gram:<6} | {count}");
    }
    out
}

/// Serializable form of a [`Verdict`].
#[derive(Clone, Debug, Serialize)]
pub struct WordReport {
    pub word: String,
    pub accepted: bool,
    pub reason: &'static str,
    pub message: String,
    pub prefix: Option<String>,
    pub root: String,
    pub suffix: Option<String>,
}

impl From<Verdict> for WordReport {
    fn from(verdict: Verdict) -> Self {
        Self {
            message: verdict.message(),
            reason: verdict.reason.code(),
            accepted: verdict.accepted,
            word: verdict.word,
            prefix: verdict.prefix,
            root: verdict.root,
            suffix: verdict.suffix,
        }
    }
}

impl WordReport {
    pub fn line(&self) -> String {
        let status = if self.accepted { "ACCEPTED" } else { "REJECTED" };
        format!("'{}' -> {}: {}.", self.word, status, self.message)
    }
}

/// Validate each word independently; fails only if the validator is not ready.
pub fn validate_words<'a, I>(validator: &Validator, words: I) -> Result<Vec<WordReport>>
where
    I: IntoIterator<Item = &'a str>,
{
    words
        .into_iter()
        .map(|word| {
            validator
                .is_valid(word)
                .map(WordReport::from)
                .context("cannot validate words")
        })
        .collect()
}
