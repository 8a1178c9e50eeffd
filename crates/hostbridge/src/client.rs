use std::sync::Arc;

use crate::context::ExecutionContextState;

/// Host-side capability notified about context creation.
///
/// The client is not owned by the contexts it manages and must outlive them;
/// contexts only keep a weak reference.
pub trait IsolateClient: Send + Sync + 'static {
    /// Called synchronously whenever a child context is created, before the
    /// child becomes runnable.
    ///
    /// Runs on the context-creation path, so implementations must not block
    /// indefinitely.
    fn on_secondary_context_created(&self, context: &Arc<ExecutionContextState>);
}

impl<T: IsolateClient + ?Sized> IsolateClient for Arc<T> {
    fn on_secondary_context_created(&self, context: &Arc<ExecutionContextState>) {
        (**self).on_secondary_context_created(context);
    }
}
