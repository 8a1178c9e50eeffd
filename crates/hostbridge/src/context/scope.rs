use std::{cell::RefCell, marker::PhantomData, sync::Arc};

use super::ExecutionContextState;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Arc<ExecutionContextState>>> = const { RefCell::new(Vec::new()) };
}

pub(super) fn current() -> Option<Arc<ExecutionContextState>> {
    CONTEXT_STACK.with_borrow(|stack| stack.last().cloned())
}

pub(super) fn depth() -> usize {
    CONTEXT_STACK.with_borrow(Vec::len)
}

/// Binds a context to the calling thread until dropped.
///
/// Scopes nest: the most recently entered context is current, and dropping
/// its scope makes the previous one current again. Dropping an outer scope
/// first unbinds only its own context. A scope is tied to the thread that
/// created it.
#[must_use = "the context is unbound as soon as the scope is dropped"]
pub struct ContextScope {
    state: Arc<ExecutionContextState>,
    _not_send: PhantomData<*const ()>,
}

impl ContextScope {
    pub(super) fn push(state: Arc<ExecutionContextState>) -> Self {
        CONTEXT_STACK.with_borrow_mut(|stack| stack.push(Arc::clone(&state)));
        Self {
            state,
            _not_send: PhantomData,
        }
    }

    pub fn state(&self) -> &Arc<ExecutionContextState> {
        &self.state
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        // A context is entered at most once, so its position identifies it.
        let removed = CONTEXT_STACK.with_borrow_mut(|stack| {
            let position = stack.iter().rposition(|s| Arc::ptr_eq(s, &self.state))?;
            Some(stack.remove(position))
        });
        debug_assert!(removed.is_some(), "context scope missing from its thread");
        drop(removed);
        self.state.release_entry();
    }
}

impl std::fmt::Debug for ContextScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextScope")
            .field("context", &self.state.id())
            .finish()
    }
}
