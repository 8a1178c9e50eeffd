//! Native state and foreign-call bridging for embedded script execution
//! contexts.
//!
//! Each script execution context owns an [`ExecutionContextState`] that
//! carries its cached object-graph handles, its platform extensions and a
//! weak reference to the [`IsolateClient`] that manages it. Script code
//! reaches the foreign object environment through the entry points in
//! [`bridge`], which convert pending foreign exceptions into
//! [`ForeignCallException`] values.

pub mod bridge;
pub mod client;
pub mod context;
pub mod error;
pub mod surface;

/// Tracing target for bridge-call events.
pub const TRACE_TARGET_BRIDGE: &str = "hostbridge::bridge";

pub use bridge::{
    EnvScope, EnvironmentAttachment, FieldId, ForeignEnv, ForeignException, MethodId,
    NativeObjectHandle, ObjectId, ObjectTable, RawRef, ThreadAttachment, attach_current_thread,
};
pub use client::IsolateClient;
pub use context::{
    CachedName, ContextId, ContextScope, ExecutionContextState, InternedGraph, ObjectGraph,
    PersistentHandle, PersistentHandleCache, PlatformExtension, SlotKind,
};
pub use error::{Error, ForeignCallException, Result};
pub use surface::{HeadlessSurface, PresentationSurface, RenderContext, Size, ViewportMetrics};
