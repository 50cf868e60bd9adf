//! Bookshelf application library
//!
//! Wires the catalog modules into the kernel registry and runs the HTTP server.

#![recursion_limit = "256"]

pub mod modules;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Registry with every application module registered
pub fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Run the full lifecycle: init, start, serve until shutdown, stop.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    tracing::info!(
        env = ?settings.environment,
        modules = registry.module_count(),
        "bookshelf bootstrap starting"
    );

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings)
        .await
        .context("HTTP server exited with an error");

    registry.stop_modules().await?;
    served
}
