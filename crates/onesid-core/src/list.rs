//! Scratch list of process numbers collected by hand before pasting them elsewhere.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    #[error("Por favor, insira um número de processo.")]
    Empty,
    #[error("Este processo já foi adicionado.")]
    Duplicate,
    #[error("A lista está vazia.")]
    NothingToExport,
}

/// Ordered, duplicate-free list of process numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessList {
    items: Vec<String>,
}

impl ProcessList {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a trimmed entry; returns the new length.
    pub fn add(&mut self, raw: &str) -> Result<usize, ListError> {
        let entry = raw.trim();
        if entry.is_empty() {
            return Err(ListError::Empty);
        }
        if self.items.iter().any(|i| i == entry) {
            return Err(ListError::Duplicate);
        }
        self.items.push(entry.to_string());
        Ok(self.items.len())
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Newline-joined text for clipboard or file export.
    pub fn export_text(&self) -> Result<String, ListError> {
        if self.items.is_empty() {
            return Err(ListError::NothingToExport);
        }
        Ok(self.items.join("\n"))
    }
}
