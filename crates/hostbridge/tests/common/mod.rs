#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
};

use hostbridge::{
    CachedName, ContextId, ExecutionContextState, ForeignEnv, ForeignException, IsolateClient,
    ObjectGraph, RawRef,
};
use parking_lot::Mutex;

pub const APPLICATION_CONTEXT: RawRef = RawRef::from_raw(0xA0);
pub const CLASS_LOADER: RawRef = RawRef::from_raw(0xC0);
pub const NULL_REF: RawRef = RawRef::from_raw(0);

/// Foreign environment whose failures are scripted by the test.
#[derive(Default)]
pub struct ScriptedEnv {
    fields: Mutex<HashMap<RawRef, i64>>,
    methods: Mutex<HashMap<RawRef, i64>>,
    fail_next: Mutex<Option<ForeignException>>,
    fail_next_global_ref: Mutex<Option<ForeignException>>,
    pending: Mutex<Option<ForeignException>>,
    live_refs: AtomicI64,
}

impl ScriptedEnv {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_field(self: &Arc<Self>, field: RawRef, id: i64) -> Arc<Self> {
        self.fields.lock().insert(field, id);
        Arc::clone(self)
    }

    pub fn with_method(self: &Arc<Self>, method: RawRef, id: i64) -> Arc<Self> {
        self.methods.lock().insert(method, id);
        Arc::clone(self)
    }

    /// Makes the next foreign operation leave `exception` pending.
    pub fn fail_next(&self, exception: ForeignException) {
        *self.fail_next.lock() = Some(exception);
    }

    /// Makes the next reference promotion fail with `exception`.
    pub fn fail_next_global_ref(&self, exception: ForeignException) {
        *self.fail_next_global_ref.lock() = Some(exception);
    }

    pub fn live_refs(&self) -> i64 {
        self.live_refs.load(Ordering::SeqCst)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    fn scripted_failure(&self) -> bool {
        if let Some(exception) = self.fail_next.lock().take() {
            *self.pending.lock() = Some(exception);
            true
        } else {
            false
        }
    }

    fn raise(&self, class_name: &str, message: &str) {
        *self.pending.lock() = Some(ForeignException::new(class_name, message));
    }
}

impl ForeignEnv for ScriptedEnv {
    fn from_reflected_field(&self, field: RawRef) -> i64 {
        if self.scripted_failure() {
            return 0;
        }
        self.fields.lock().get(&field).copied().unwrap_or_else(|| {
            self.raise("java.lang.NoSuchFieldError", "no such field");
            0
        })
    }

    fn from_reflected_method(&self, method: RawRef) -> i64 {
        if self.scripted_failure() {
            return 0;
        }
        self.methods.lock().get(&method).copied().unwrap_or_else(|| {
            self.raise("java.lang.NoSuchMethodError", "no such method");
            0
        })
    }

    fn application_context(&self) -> RawRef {
        if self.scripted_failure() {
            return RawRef::from_raw(0);
        }
        APPLICATION_CONTEXT
    }

    fn class_loader(&self) -> RawRef {
        if self.scripted_failure() {
            return RawRef::from_raw(0);
        }
        CLASS_LOADER
    }

    fn new_global_ref(&self, local: RawRef) -> RawRef {
        if let Some(exception) = self.fail_next_global_ref.lock().take() {
            *self.pending.lock() = Some(exception);
            return NULL_REF;
        }
        self.live_refs.fetch_add(1, Ordering::SeqCst);
        local
    }

    fn delete_global_ref(&self, global: RawRef) {
        if global != NULL_REF {
            self.live_refs.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn take_pending_exception(&self) -> Option<ForeignException> {
        self.pending.lock().take()
    }
}

/// Client that records every child context it is told about.
#[derive(Default)]
pub struct RecordingClient {
    pub created: Mutex<Vec<ContextId>>,
}

impl IsolateClient for RecordingClient {
    fn on_secondary_context_created(&self, context: &Arc<ExecutionContextState>) {
        self.created.lock().push(context.id());
    }
}

/// Object graph that counts how often each name is resolved.
#[derive(Default)]
pub struct CountingGraph {
    calls: Mutex<HashMap<CachedName, usize>>,
    total: AtomicUsize,
}

impl CountingGraph {
    pub fn calls(&self, name: CachedName) -> usize {
        self.calls.lock().get(&name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl ObjectGraph for CountingGraph {
    fn resolve(&self, name: CachedName) -> u64 {
        *self.calls.lock().entry(name).or_default() += 1;
        self.total.fetch_add(1, Ordering::SeqCst) as u64 + 1
    }
}

/// Extension whose destruction is recorded in a shared log.
pub struct Tracked {
    pub name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Tracked {
    pub fn new(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.log.lock().push(self.name);
    }
}

impl hostbridge::PlatformExtension for Tracked {
    const SLOT: hostbridge::SlotKind = hostbridge::SlotKind::ResourceFacade;
}

pub fn new_root(
    client: &Arc<RecordingClient>,
    url: &str,
    graph: Arc<dyn ObjectGraph>,
) -> Arc<ExecutionContextState> {
    let client: Arc<dyn IsolateClient> = client.clone();
    ExecutionContextState::new_root(&client, url, graph)
}
