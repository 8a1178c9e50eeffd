#![warn(clippy::pedantic)]

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use hostbridge::{
    ExecutionContextState, HeadlessSurface, InternedGraph, IsolateClient, PresentationSurface,
    RenderContext,
};

use crate::{
    config::{Cli, ShellConfig},
    logging::init_tracing,
    resources::{PackageResources, ShellClient},
};

mod config;
mod logging;
mod resources;

const ROOT_RENDER_CONTEXT: RenderContext = RenderContext(1);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    let config = ShellConfig::resolve(cli)?;
    run(&config)
}

fn run(config: &ShellConfig) -> anyhow::Result<()> {
    let mut surface = HeadlessSurface::new(config.viewport.physical_size());
    if !surface.make_current(ROOT_RENDER_CONTEXT) {
        bail!("failed to make the presentation surface current");
    }

    let resources = PackageResources::new(&config.package_root);
    tracing::debug!(
        package_root = %resources.package_root().display(),
        "Package resources ready"
    );
    let client: Arc<dyn IsolateClient> = Arc::new(ShellClient::new(resources.clone()));
    let root =
        ExecutionContextState::new_root(&client, config.url.as_str(), Arc::new(InternedGraph::new()));
    root.set_extension(resources)
        .context("failed to attach package resources")?;

    let scope = root.enter().context("failed to enter root context")?;
    tracing::info!(
        context = %scope.state().id(),
        url = %config.url,
        surface = %surface.size(),
        device_pixel_ratio = config.viewport.device_pixel_ratio,
        "Viewport metrics forwarded to root context"
    );

    if config.non_interactive {
        tracing::info!("Non-interactive run; shutting down after setup");
    } else if surface.swap_buffers() {
        tracing::info!(
            entry = %config.entry.display(),
            "Presented initial frame; script execution is owned by the embedding runtime"
        );
    }

    drop(scope);
    drop(root);
    surface.destroy();
    Ok(())
}
