//! Per-context native state.
//!
//! An [`ExecutionContextState`] is created together with its script
//! execution context and torn down with it. It is bound to a thread by
//! [`ExecutionContextState::enter`]; [`ExecutionContextState::current`]
//! returns whatever the calling thread has entered most recently.

mod cache;
mod extension;
mod scope;

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::MappedMutexGuard;

pub use self::{
    cache::{CachedName, InternedGraph, ObjectGraph, PersistentHandle, PersistentHandleCache},
    extension::{PlatformExtension, SlotKind},
    scope::ContextScope,
};
use self::extension::ExtensionSlots;
use crate::{
    client::IsolateClient,
    error::{Error, Result},
};

/// Process-unique identity of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct ExecutionContextState {
    id: ContextId,
    parent: Option<ContextId>,
    client: Weak<dyn IsolateClient>,
    url: String,
    graph: Arc<dyn ObjectGraph>,
    cache: PersistentHandleCache,
    extensions: ExtensionSlots,
    entered: AtomicBool,
    activated: AtomicBool,
}

impl ExecutionContextState {
    /// Creates the state for a root context loaded from `url`.
    pub fn new_root(
        client: &Arc<dyn IsolateClient>,
        url: impl Into<String>,
        graph: Arc<dyn ObjectGraph>,
    ) -> Arc<Self> {
        let state = Arc::new(Self::new(None, Arc::downgrade(client), url.into(), graph));
        tracing::debug!(context = %state.id, url = %state.url, "created root context state");
        state
    }

    fn new(
        parent: Option<ContextId>,
        client: Weak<dyn IsolateClient>,
        url: String,
        graph: Arc<dyn ObjectGraph>,
    ) -> Self {
        let id = ContextId::next();
        Self {
            id,
            parent,
            client,
            url,
            graph,
            cache: PersistentHandleCache::new(id),
            extensions: ExtensionSlots::default(),
            entered: AtomicBool::new(false),
            activated: AtomicBool::new(false),
        }
    }

    /// Creates the state for a child context spawned from this one.
    ///
    /// The child shares this context's client and url but starts with an
    /// empty handle cache and no extensions, since object-graph handles are
    /// never valid across contexts. `graph` is the child's own object graph.
    /// The client is notified before the child is returned.
    pub fn create_child(&self, graph: Arc<dyn ObjectGraph>) -> Arc<Self> {
        let child = Arc::new(Self::new(
            Some(self.id),
            Weak::clone(&self.client),
            self.url.clone(),
            graph,
        ));
        tracing::debug!(
            context = %child.id,
            parent = %self.id,
            url = %child.url,
            "created child context state"
        );

        if let Some(client) = child.client() {
            client.on_secondary_context_created(&child);
        }
        child
    }

    /// Returns the state of the context the calling thread has entered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnbound`] if no context is entered on this
    /// thread.
    pub fn current() -> Result<Arc<Self>> {
        scope::current().ok_or(Error::ContextUnbound)
    }

    /// Number of contexts entered on the calling thread.
    pub fn entered_depth() -> usize {
        scope::depth()
    }

    /// Binds this context to the calling thread.
    ///
    /// The first successful entry runs the activation hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextBusy`] if the context is already entered.
    pub fn enter(self: &Arc<Self>) -> Result<ContextScope> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(Error::ContextBusy(self.id));
        }
        if !self.activated.swap(true, Ordering::AcqRel) {
            self.did_activate();
        }
        Ok(ContextScope::push(Arc::clone(self)))
    }

    pub(crate) fn release_entry(&self) {
        self.entered.store(false, Ordering::Release);
    }

    // Handles stay lazy; only the binding is recorded here.
    fn did_activate(&self) {
        tracing::debug!(context = %self.id, url = %self.url, "context activated");
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::Acquire)
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }

    pub const fn id(&self) -> ContextId {
        self.id
    }

    pub const fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The managing client, if it is still alive.
    pub fn client(&self) -> Option<Arc<dyn IsolateClient>> {
        self.client.upgrade()
    }

    pub fn shares_client_with(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.client, &other.client)
    }

    pub const fn handle_cache(&self) -> &PersistentHandleCache {
        &self.cache
    }

    pub fn handle(&self, name: CachedName) -> PersistentHandle {
        self.cache.get_or_resolve(name, self.graph.as_ref())
    }

    pub fn x_handle(&self) -> PersistentHandle {
        self.handle(CachedName::X)
    }

    pub fn y_handle(&self) -> PersistentHandle {
        self.handle(CachedName::Y)
    }

    pub fn dx_handle(&self) -> PersistentHandle {
        self.handle(CachedName::Dx)
    }

    pub fn dy_handle(&self) -> PersistentHandle {
        self.handle(CachedName::Dy)
    }

    pub fn value_handle(&self) -> PersistentHandle {
        self.handle(CachedName::Value)
    }

    pub fn color_class(&self) -> PersistentHandle {
        self.handle(CachedName::ColorClass)
    }

    /// Installs `value` in its slot, destroying the previous occupant first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotUnavailable`] if the slot's platform capability
    /// is not compiled in.
    pub fn set_extension<E: PlatformExtension>(&self, value: E) -> Result<()> {
        ExtensionSlots::check_available(E::SLOT)?;

        // The slot is unlocked while the old occupant drops so that its
        // destructor may inspect this state.
        let previous = self.extensions.take(E::SLOT);
        if previous.is_some() {
            tracing::debug!(context = %self.id, slot = %E::SLOT, "replacing platform extension");
        }
        drop(previous);

        self.extensions.install(E::SLOT, Box::new(value));
        Ok(())
    }

    /// Borrows the occupant of `E`'s slot, if one is installed.
    ///
    /// Only this slot stays locked while the guard is alive; the other
    /// slots can still be queried and replaced.
    pub fn extension<E: PlatformExtension>(&self) -> Option<MappedMutexGuard<'_, E>> {
        self.extensions.get::<E>()
    }

    /// Removes and returns the occupant of `E`'s slot.
    pub fn take_extension<E: PlatformExtension>(&self) -> Option<E> {
        self.extensions.take_as::<E>()
    }

    pub fn has_extension(&self, kind: SlotKind) -> bool {
        self.extensions.is_occupied(kind)
    }
}

impl Drop for ExecutionContextState {
    fn drop(&mut self) {
        tracing::debug!(context = %self.id, "tearing down context state");
        self.extensions.clear();
        self.cache.clear();
    }
}

impl fmt::Debug for ExecutionContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContextState")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("url", &self.url)
            .field("cache", &self.cache)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}
