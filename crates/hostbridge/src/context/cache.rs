use std::{collections::HashMap, sync::OnceLock};

use parking_lot::Mutex;

use super::ContextId;

/// Names with a cached handle in every context.
///
/// These back the geometry and color conversions that run on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedName {
    X,
    Y,
    Dx,
    Dy,
    Value,
    ColorClass,
}

impl CachedName {
    pub const ALL: [Self; 6] = [
        Self::X,
        Self::Y,
        Self::Dx,
        Self::Dy,
        Self::Value,
        Self::ColorClass,
    ];

    /// Symbol looked up in the context's object graph.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Dx => "dx",
            Self::Dy => "dy",
            Self::Value => "_value",
            Self::ColorClass => "Color",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Object graph of one execution context, as seen by the handle cache.
pub trait ObjectGraph: Send + Sync + 'static {
    /// Resolves `name` into a raw handle. Called at most once per name and
    /// context.
    fn resolve(&self, name: CachedName) -> u64;
}

/// Handle into one context's object graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PersistentHandle {
    context: ContextId,
    raw: u64,
}

impl PersistentHandle {
    pub const fn context(self) -> ContextId {
        self.context
    }

    pub const fn raw(self) -> u64 {
        self.raw
    }
}

/// Lazily populated handles for the [`CachedName`] set.
///
/// Each entry is written once, on first access, and then stays fixed until
/// the cache is cleared at context teardown.
#[derive(Debug)]
pub struct PersistentHandleCache {
    context: ContextId,
    entries: [OnceLock<PersistentHandle>; CachedName::ALL.len()],
}

impl PersistentHandleCache {
    pub(crate) fn new(context: ContextId) -> Self {
        Self {
            context,
            entries: Default::default(),
        }
    }

    pub fn get_or_resolve(&self, name: CachedName, graph: &dyn ObjectGraph) -> PersistentHandle {
        *self.entries[name.index()].get_or_init(|| PersistentHandle {
            context: self.context,
            raw: graph.resolve(name),
        })
    }

    /// Returns the entry for `name` without resolving it.
    pub fn get(&self, name: CachedName) -> Option<PersistentHandle> {
        self.entries[name.index()].get().copied()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.get().is_some()).count()
    }

    pub(crate) fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.take();
        }
    }
}

/// [`ObjectGraph`] that interns each symbol into a stable id.
#[derive(Debug, Default)]
pub struct InternedGraph {
    symbols: Mutex<HashMap<&'static str, u64>>,
}

impl InternedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.lock().is_empty()
    }
}

impl ObjectGraph for InternedGraph {
    fn resolve(&self, name: CachedName) -> u64 {
        let mut symbols = self.symbols.lock();
        let next = symbols.len() as u64 + 1;
        *symbols.entry(name.symbol()).or_insert(next)
    }
}
