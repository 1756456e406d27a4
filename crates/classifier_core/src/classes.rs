//! Class-name loading
//!
//! The CUB-200 class file lists one category per line in the form
//! `017.Cardinal` or `012.Yellow_headed_Blackbird`. The numeric prefix is
//! an index artifact of the dataset; the display name is the part after the
//! first dot, with underscores turned into spaces.

use anyhow::{Context, Result};
use std::path::Path;

/// Ordered, immutable list of category names
///
/// Index positions match the output logits of the specialist model.
#[derive(Debug, Clone)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    /// Load class names from a `classes.txt` file
    ///
    /// Blank lines and lines without a `.` separator are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read class file {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    /// Parse class names from file content
    pub fn parse(raw: &str) -> Self {
        let names = raw
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                line.split_once('.')
                    .map(|(_, name)| name.trim().replace('_', " "))
            })
            .collect();
        Self { names }
    }

    /// Class name at a logit index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of known categories
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over names in logit order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
