//! Lazily resolved collaborators of a store

use crate::citation::{CitationProvider, NoCitations};
use crate::index::IndexListener;
use std::sync::{Arc, OnceLock};

type Resolver<T> = Box<dyn Fn() -> Arc<T> + Send + Sync>;

/// A collaborator resolved on first use and cached afterwards
struct Lazily<T: ?Sized> {
    resolve: Resolver<T>,
    cell: OnceLock<Arc<T>>,
}

impl<T: ?Sized> Lazily<T> {
    fn new(resolve: Resolver<T>) -> Self {
        Self {
            resolve,
            cell: OnceLock::new(),
        }
    }

    fn get(&self) -> Arc<T> {
        Arc::clone(self.cell.get_or_init(|| (self.resolve)()))
    }
}

/// The citation provider and optional index listener used by enriching
/// connections.
///
/// Both may be supplied as resolvers, so a store can be opened before the
/// services they come from exist. A resolver runs at most once, when the
/// first enriching connection is created.
pub struct Collaborators {
    citations: Lazily<dyn CitationProvider>,
    index: Option<Lazily<dyn IndexListener>>,
}

impl Collaborators {
    /// Resolve the citation provider on first use
    pub fn new<F>(citations: F) -> Self
    where
        F: Fn() -> Arc<dyn CitationProvider> + Send + Sync + 'static,
    {
        Self {
            citations: Lazily::new(Box::new(citations)),
            index: None,
        }
    }

    /// Use an already built citation provider
    pub fn with_citations(provider: Arc<dyn CitationProvider>) -> Self {
        Self::new(move || Arc::clone(&provider))
    }

    /// No derivations and no index
    pub fn none() -> Self {
        Self::with_citations(Arc::new(NoCitations))
    }

    /// Resolve the index listener on first use
    pub fn with_index_resolver<F>(mut self, listener: F) -> Self
    where
        F: Fn() -> Arc<dyn IndexListener> + Send + Sync + 'static,
    {
        self.index = Some(Lazily::new(Box::new(listener)));
        self
    }

    /// Use an already built index listener
    pub fn with_index_listener(self, listener: Arc<dyn IndexListener>) -> Self {
        self.with_index_resolver(move || Arc::clone(&listener))
    }

    pub(crate) fn citations(&self) -> Arc<dyn CitationProvider> {
        self.citations.get()
    }

    pub(crate) fn index_listener(&self) -> Option<Arc<dyn IndexListener>> {
        self.index.as_ref().map(Lazily::get)
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::none()
    }
}
