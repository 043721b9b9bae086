use morpho_types::{AffixInventory, Segmentation};

/// Strips at most one prefix and one suffix from a word.
///
/// Candidates are tried in inventory order and the first match wins, so
/// `["o", "ok"]` peels `okal` as `o` + `kal` even though `ok` is longer.
#[derive(Clone, Debug, Default)]
pub struct Peeler {
    inventory: AffixInventory,
}

impl Peeler {
    pub fn new(inventory: AffixInventory) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &AffixInventory {
        &self.inventory
    }

    /// Peel `word`, falling back to the whole word as root when stripping
    /// would leave nothing behind. The returned root is never empty for a
    /// non-empty word.
    pub fn peel<'a>(&'a self, word: &'a str) -> Segmentation<'a> {
        let seg = self.split(word);
        if seg.root.is_empty() {
            Segmentation::bare(word)
        } else {
            seg
        }
    }

    /// Raw prefix/suffix removal without the empty-root fallback.
    ///
    /// The suffix is matched against what remains after the prefix is removed.
    pub fn split<'a>(&'a self, word: &'a str) -> Segmentation<'a> {
        let mut rest = word;

        let prefix = self
            .inventory
            .prefixes()
            .iter()
            .find(|p| rest.starts_with(p.as_str()))
            .map(String::as_str);
        if let Some(p) = prefix {
            rest = &rest[p.len()..];
        }

        let suffix = self
            .inventory
            .suffixes()
            .iter()
            .find(|s| rest.ends_with(s.as_str()))
            .map(String::as_str);
        if let Some(s) = suffix {
            rest = &rest[..rest.len() - s.len()];
        }

        Segmentation {
            prefix,
            root: rest,
            suffix,
        }
    }
}
