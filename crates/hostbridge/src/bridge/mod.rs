//! Synchronous calls from script code into the foreign object environment.
//!
//! A thread must be attached with [`attach_current_thread`] before it can
//! bridge. Every entry point in [`api`] acquires the attached environment
//! for the duration of the call, runs one foreign operation and turns a
//! pending foreign exception into a [`ForeignCallException`](crate::ForeignCallException).

pub mod api;
mod env;
mod object;

pub use self::{
    api::{FieldId, MethodId},
    env::{
        EnvScope, ForeignEnv, ForeignException, RawRef, ThreadAttachment, attach_current_thread,
        calls_in_flight, is_thread_attached,
    },
    object::{EnvironmentAttachment, NativeObjectHandle, ObjectId, ObjectTable},
};
