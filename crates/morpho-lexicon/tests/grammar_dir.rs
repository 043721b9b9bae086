use std::io::{self, Write};

use morpho_lexicon::{GrammarDir, LexiconFormat, StoreError};
use morpho_types::{Category, CombinationRule, Morpheme, MorphemeSet, RuleKind, RuleSet};

fn roots() -> Vec<Morpheme> {
    vec![
        Morpheme {
            text: "ched".into(),
            category: Category::Root,
            frequency: 40,
        },
        Morpheme {
            text: "ok".into(),
            category: Category::Root,
            frequency: 18,
        },
    ]
}

#[test]
fn saves_into_missing_directory_and_loads_back() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = GrammarDir::new(tmp.path().join("nested").join("grammar"));

    let path = dir.save_morphemes(Category::Root, &roots()).unwrap();
    assert!(path.ends_with("roots.txt"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# Corpus Core Roots\n# Morpheme | Frequency\n"));

    let loaded = dir.load_morphemes(Category::Root).unwrap();
    assert_eq!(loaded.frequency("ok"), Some(18));

    dir.save_rules(
        RuleKind::PrefixRoot,
        &[CombinationRule {
            kind: RuleKind::PrefixRoot,
            left: "qo".into(),
            right: "ked".into(),
            frequency: 6,
        }],
    )
    .unwrap();
    let rules = dir.load_rules(RuleKind::PrefixRoot).unwrap();
    assert!(rules.contains("qo", "ked"));
    assert!(matches!(
        dir.load_rules(RuleKind::RootSuffix),
        Err(StoreError::MissingInputFile { .. })
    ));
}

/// Tab-separated variant, to show the directory is format-agnostic.
struct Tsv;

impl LexiconFormat for Tsv {
    fn write_morphemes(
        &self,
        out: &mut dyn Write,
        _title: &str,
        morphemes: &[Morpheme],
    ) -> io::Result<()> {
        for m in morphemes {
            writeln!(out, "{}\t{}", m.text, m.frequency)?;
        }
        Ok(())
    }

    fn read_morphemes(&self, text: &str) -> MorphemeSet {
        MorphemeSet::from_entries(text.lines().filter_map(|line| {
            let (key, count) = line.split_once('\t')?;
            Some((key, count.parse().ok()?))
        }))
    }

    fn write_rules(
        &self,
        out: &mut dyn Write,
        _title: &str,
        rules: &[CombinationRule],
    ) -> io::Result<()> {
        for r in rules {
            writeln!(out, "{}\t{}\t{}", r.left, r.right, r.frequency)?;
        }
        Ok(())
    }

    fn read_rules(&self, text: &str) -> RuleSet {
        RuleSet::from_entries(text.lines().filter_map(|line| {
            let mut parts = line.split('\t');
            let left = parts.next()?;
            let right = parts.next()?;
            Some(((left, right), parts.next()?.parse().ok()?))
        }))
    }
}

#[test]
fn custom_format_plugs_in() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = GrammarDir::with_format(tmp.path(), Tsv);
    dir.save_morphemes(Category::Root, &roots()).unwrap();
    let text = std::fs::read_to_string(dir.lexicon_path(Category::Root)).unwrap();
    assert_eq!(text, "ched\t40\nok\t18\n");
    assert_eq!(
        dir.load_morphemes(Category::Root).unwrap().frequency("ched"),
        Some(40)
    );
}
