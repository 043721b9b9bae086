use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::info;

use crate::StoreError;

/// Strategy for reading a corpus file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file (fast, zero-copy while tokenising).
    Mmap,
    /// Read the file into an owned buffer (portable fallback).
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Running text of a cleaned corpus as lowercase alphabetic tokens.
#[derive(Clone, Debug)]
pub struct Corpus {
    path: PathBuf,
    tokens: Vec<String>,
}

impl Corpus {
    /// Load and tokenise a corpus file.
    ///
    /// Fails with [`StoreError::MissingInputFile`] if the file is absent and
    /// [`StoreError::EmptyCorpus`] if it yields no tokens.
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::MissingInputFile {
                path: path.to_path_buf(),
            });
        }
        let buffer = load_buffer(path, mode)?;
        let tokens = tokenize(buffer.as_slice());
        if tokens.is_empty() {
            return Err(StoreError::EmptyCorpus {
                path: path.to_path_buf(),
            });
        }
        info!(
            "corpus {} loaded with {} tokens",
            path.display(),
            tokens.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            tokens,
        })
    }

    /// Build a corpus from raw text; used where the text is already in memory.
    pub fn from_text(text: &str) -> Self {
        Self {
            path: PathBuf::new(),
            tokens: tokenize(text.as_bytes()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every token in order, repeats included.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Distinct tokens.
    pub fn unique(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn load_buffer(path: &Path, mode: LoadMode) -> Result<Buffer, StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    match mode {
        // Zero-length maps are rejected on some platforms.
        LoadMode::Mmap if len > 0 => unsafe { Mmap::map(&file) }
            .map(Buffer::Mmap)
            .map_err(io_err),
        _ => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).map_err(io_err)?;
            Ok(Buffer::Owned(buf))
        }
    }
}

/// Lowercase the input and collect maximal runs of `a..=z`.
pub fn tokenize(bytes: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for b in bytes {
        let lower = b.to_ascii_lowercase();
        if lower.is_ascii_lowercase() {
            current.push(lower as char);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
