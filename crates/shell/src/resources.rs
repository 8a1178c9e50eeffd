use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use hostbridge::{ExecutionContextState, IsolateClient, PlatformExtension, SlotKind};

/// Resource facade resolving `package:` imports against the package root.
#[derive(Debug, Clone)]
pub struct PackageResources {
    package_root: PathBuf,
}

impl PackageResources {
    pub fn new(package_root: impl Into<PathBuf>) -> Self {
        Self {
            package_root: package_root.into(),
        }
    }

    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// Maps `package:name/path` to `<root>/name/path`.
    pub fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let rest = uri.strip_prefix("package:")?;
        let (package, path) = rest.split_once('/')?;
        if package.is_empty() || path.is_empty() || path.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.package_root.join(package).join(path))
    }
}

impl PlatformExtension for PackageResources {
    const SLOT: SlotKind = SlotKind::ResourceFacade;
}

/// Gives every child context its own resource facade.
pub struct ShellClient {
    resources: PackageResources,
}

impl ShellClient {
    pub const fn new(resources: PackageResources) -> Self {
        Self { resources }
    }
}

impl IsolateClient for ShellClient {
    fn on_secondary_context_created(&self, context: &Arc<ExecutionContextState>) {
        tracing::info!(
            context = %context.id(),
            parent = ?context.parent(),
            url = context.url(),
            "Secondary context created"
        );
        if let Err(err) = context.set_extension(self.resources.clone()) {
            tracing::warn!(context = %context.id(), %err, "Failed to attach package resources");
        }
    }
}
