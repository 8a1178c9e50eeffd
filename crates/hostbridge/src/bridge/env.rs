use std::{
    cell::{Cell, RefCell},
    fmt,
    marker::PhantomData,
    sync::Arc,
};

use crate::TRACE_TARGET_BRIDGE;

/// Opaque reference to an object in the foreign environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRef(u64);

impl RawRef {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

/// Exception left pending by a foreign operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignException {
    class_name: String,
    message: String,
}

impl ForeignException {
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ForeignException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.class_name)
        } else {
            write!(f, "{}: {}", self.class_name, self.message)
        }
    }
}

/// Reflection-capable foreign object environment.
///
/// Operations never fail directly: failures leave an exception pending,
/// which the caller collects with [`ForeignEnv::take_pending_exception`].
/// Inputs are passed through unchecked.
pub trait ForeignEnv: Send + Sync + 'static {
    /// Converts a reflected field object into a field id.
    fn from_reflected_field(&self, field: RawRef) -> i64;

    /// Converts a reflected method object into a method id.
    fn from_reflected_method(&self, method: RawRef) -> i64;

    /// The application-wide context object.
    fn application_context(&self) -> RawRef;

    /// The class loader used to resolve application classes.
    fn class_loader(&self) -> RawRef;

    /// Promotes `local` to a reference that stays valid until
    /// [`ForeignEnv::delete_global_ref`].
    fn new_global_ref(&self, local: RawRef) -> RawRef;

    fn delete_global_ref(&self, global: RawRef);

    /// Returns and clears the pending exception, if any.
    fn take_pending_exception(&self) -> Option<ForeignException>;
}

thread_local! {
    // Attachments in the order they were made; the last one is in use.
    static ATTACHED_ENVS: RefCell<Vec<(u64, Arc<dyn ForeignEnv>)>> = const { RefCell::new(Vec::new()) };
    static NEXT_ATTACHMENT: Cell<u64> = const { Cell::new(0) };
    static CALLS_IN_FLIGHT: Cell<usize> = const { Cell::new(0) };
}

/// Attaches `env` to the calling thread so that bridge calls can run on it.
///
/// Attachments nest. Dropping the returned guard removes only this
/// attachment; the most recent one still alive stays in use.
pub fn attach_current_thread(env: Arc<dyn ForeignEnv>) -> ThreadAttachment {
    let token = NEXT_ATTACHMENT.get();
    NEXT_ATTACHMENT.set(token + 1);
    ATTACHED_ENVS.with_borrow_mut(|envs| envs.push((token, env)));
    tracing::debug!(target: TRACE_TARGET_BRIDGE, token, "attached foreign environment to thread");
    ThreadAttachment {
        token,
        _not_send: PhantomData,
    }
}

/// Whether the calling thread has a foreign environment attached.
pub fn is_thread_attached() -> bool {
    ATTACHED_ENVS.with_borrow(|envs| !envs.is_empty())
}

/// Number of bridge calls currently running on this thread.
pub fn calls_in_flight() -> usize {
    CALLS_IN_FLIGHT.get()
}

#[must_use = "the thread is detached as soon as the attachment is dropped"]
pub struct ThreadAttachment {
    token: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ThreadAttachment {
    fn drop(&mut self) {
        let detached = ATTACHED_ENVS.with_borrow_mut(|envs| {
            let position = envs.iter().rposition(|(token, _)| *token == self.token)?;
            Some(envs.remove(position))
        });
        drop(detached);
        tracing::debug!(
            target: TRACE_TARGET_BRIDGE,
            token = self.token,
            "detached foreign environment from thread"
        );
    }
}

impl fmt::Debug for ThreadAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadAttachment")
            .field("token", &self.token)
            .finish()
    }
}

/// Scoped acquisition of the thread's foreign environment for one bridge
/// call.
pub struct EnvScope {
    env: Arc<dyn ForeignEnv>,
    _not_send: PhantomData<*const ()>,
}

impl EnvScope {
    /// Acquires the environment attached to the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the thread was never attached with
    /// [`attach_current_thread`]. Bridging from an unprepared thread is a
    /// programming error, not a script-level condition.
    #[track_caller]
    pub fn acquire() -> Self {
        let Some(env) = ATTACHED_ENVS.with_borrow(|envs| envs.last().map(|(_, env)| Arc::clone(env)))
        else {
            panic!("bridge call on a thread with no attached foreign environment");
        };
        CALLS_IN_FLIGHT.set(CALLS_IN_FLIGHT.get() + 1);
        tracing::trace!(target: TRACE_TARGET_BRIDGE, "acquired foreign environment");
        Self {
            env,
            _not_send: PhantomData,
        }
    }

    pub fn env(&self) -> &Arc<dyn ForeignEnv> {
        &self.env
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        CALLS_IN_FLIGHT.set(CALLS_IN_FLIGHT.get().saturating_sub(1));
        tracing::trace!(target: TRACE_TARGET_BRIDGE, "released foreign environment");
    }
}
