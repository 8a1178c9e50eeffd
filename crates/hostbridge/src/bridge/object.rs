use std::{collections::HashMap, fmt, sync::Arc};

use super::env::{ForeignEnv, RawRef};
use crate::context::{PlatformExtension, SlotKind};

struct ObjectRef {
    env: Arc<dyn ForeignEnv>,
    raw: RawRef,
}

impl Drop for ObjectRef {
    fn drop(&mut self) {
        self.env.delete_global_ref(self.raw);
    }
}

/// Shared handle to one foreign object.
///
/// Cloning shares the underlying reference. The foreign environment releases
/// the object only after the last clone is dropped, so the bridge and any
/// script-side wrapper can each hold it independently.
#[derive(Clone)]
pub struct NativeObjectHandle(Arc<ObjectRef>);

impl NativeObjectHandle {
    /// Wraps `raw`, obtained from `env`, in a handle that keeps it alive.
    ///
    /// Promotion can leave an exception pending in `env`. Bridge calls
    /// collect it before returning the handle.
    pub fn create(env: &Arc<dyn ForeignEnv>, raw: RawRef) -> Self {
        Self(Arc::new(ObjectRef {
            raw: env.new_global_ref(raw),
            env: Arc::clone(env),
        }))
    }

    /// The reference to pass to further bridge calls.
    pub fn raw(&self) -> RawRef {
        self.0.raw
    }

    pub fn env(&self) -> &Arc<dyn ForeignEnv> {
        &self.0.env
    }

    /// Number of live holders of this object.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NativeObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeObjectHandle")
            .field("raw", &self.0.raw)
            .field("holders", &self.holders())
            .finish()
    }
}

/// Opaque id through which script-side wrappers refer to a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handles held on behalf of script-side wrappers.
#[derive(Debug, Default)]
pub struct ObjectTable {
    next: u64,
    objects: HashMap<ObjectId, NativeObjectHandle>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, handle: NativeObjectHandle) -> ObjectId {
        self.next += 1;
        let id = ObjectId(self.next);
        self.objects.insert(id, handle);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&NativeObjectHandle> {
        self.objects.get(&id)
    }

    /// Drops the table's hold on `id`. The object itself lives on while
    /// other holders remain.
    pub fn remove(&mut self, id: ObjectId) -> Option<NativeObjectHandle> {
        self.objects.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Per-context record for the foreign environment, installed in the
/// [`SlotKind::EnvironmentAttachment`] slot.
#[derive(Debug, Default)]
pub struct EnvironmentAttachment {
    pub objects: ObjectTable,
}

impl PlatformExtension for EnvironmentAttachment {
    const SLOT: SlotKind = SlotKind::EnvironmentAttachment;
}
