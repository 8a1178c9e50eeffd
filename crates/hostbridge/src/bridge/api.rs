use std::sync::Arc;

use super::{
    env::{EnvScope, ForeignEnv, ForeignException},
    object::NativeObjectHandle,
};
use crate::{TRACE_TARGET_BRIDGE, error::ForeignCallException};

/// Opaque id of a foreign field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId(i64);

impl FieldId {
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Opaque id of a foreign method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(i64);

impl MethodId {
    pub const fn get(self) -> i64 {
        self.0
    }
}

/// Runs one foreign operation on the calling thread's environment.
///
/// A pending exception after `op` becomes the error and `convert` is never
/// run. `convert` may itself call into the environment, so the check is
/// repeated after it and a value it produced is discarded on failure. The
/// environment scope is released on every path.
fn bridge_call<R, T>(
    name: &'static str,
    op: impl FnOnce(&dyn ForeignEnv) -> R,
    convert: impl FnOnce(&Arc<dyn ForeignEnv>, R) -> T,
) -> Result<T, ForeignCallException> {
    let scope = EnvScope::acquire();
    let raw = op(scope.env().as_ref());
    if let Some(exception) = scope.env().take_pending_exception() {
        drop(scope);
        return Err(raise(name, exception));
    }

    let value = convert(scope.env(), raw);
    if let Some(exception) = scope.env().take_pending_exception() {
        drop(value);
        drop(scope);
        return Err(raise(name, exception));
    }
    Ok(value)
}

fn raise(name: &'static str, exception: ForeignException) -> ForeignCallException {
    tracing::debug!(
        target: TRACE_TARGET_BRIDGE,
        call = name,
        %exception,
        "foreign exception raised into script"
    );
    ForeignCallException(exception)
}

/// Resolves a reflected field object into its field id.
///
/// # Errors
///
/// Returns the foreign exception raised by the lookup.
///
/// # Panics
///
/// Panics if the calling thread has no attached foreign environment.
pub fn from_reflected_field(field: &NativeObjectHandle) -> Result<FieldId, ForeignCallException> {
    bridge_call(
        "from_reflected_field",
        |env| env.from_reflected_field(field.raw()),
        |_, id| FieldId(id),
    )
}

/// Resolves a reflected method object into its method id.
///
/// # Errors
///
/// Returns the foreign exception raised by the lookup.
///
/// # Panics
///
/// Panics if the calling thread has no attached foreign environment.
pub fn from_reflected_method(
    method: &NativeObjectHandle,
) -> Result<MethodId, ForeignCallException> {
    bridge_call(
        "from_reflected_method",
        |env| env.from_reflected_method(method.raw()),
        |_, id| MethodId(id),
    )
}

/// Returns a handle to the application-wide context object.
///
/// # Errors
///
/// Returns the foreign exception raised while fetching it.
///
/// # Panics
///
/// Panics if the calling thread has no attached foreign environment.
pub fn application_context() -> Result<NativeObjectHandle, ForeignCallException> {
    bridge_call(
        "application_context",
        |env| env.application_context(),
        NativeObjectHandle::create,
    )
}

/// Returns a handle to the application class loader.
///
/// # Errors
///
/// Returns the foreign exception raised while fetching it.
///
/// # Panics
///
/// Panics if the calling thread has no attached foreign environment.
pub fn class_loader() -> Result<NativeObjectHandle, ForeignCallException> {
    bridge_call(
        "class_loader",
        |env| env.class_loader(),
        NativeObjectHandle::create,
    )
}
