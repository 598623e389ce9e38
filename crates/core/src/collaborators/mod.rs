//! Contracts for the external collaborators nodes delegate to.
//!
//! The engine never implements health-check algorithms, analysis logic,
//! alert parsing or delivery mechanics itself. It talks to them through the
//! traits in this module, which makes them swappable and easy to mock.

pub mod analysis;
pub mod channels;
pub mod checks;
pub mod ingestion;

pub use analysis::{AnalysisProvider, AnalysisRequest, ProviderError};
pub use channels::{ChannelError, LogChannel, NotificationChannel};
pub use checks::{CheckError, Checker};
pub use ingestion::{AlertIngestor, IngestError};

use std::sync::Arc;

/// Name-indexed collection of collaborators that keeps registration order.
pub struct NamedRegistry<T: ?Sized> {
    entries: Vec<(String, Arc<T>)>,
}

impl<T: ?Sized> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> NamedRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: impl Into<String>, item: Arc<T>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = item,
            None => self.entries.push((name, item)),
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, item: Arc<T>) -> Self {
        self.register(name, item);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, item)| Arc::clone(item))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<T>)> {
        self.entries.iter().map(|(n, item)| (n.as_str(), item))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
