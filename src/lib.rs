//! # Appx
//!
//! Dependency-ordered component installation with a start/stop lifecycle.
//!
//! Applications are split into named components that declare which other
//! components they require. The registry installs them dependencies first,
//! starts long-running ones in that same order, stops them in reverse, and
//! cleans everything up in reverse install order.
//!
//! ## Features
//!
//! - **Dependency Resolution**: Recursive install with cycle detection and diamond dedup
//! - **Lifecycle Ledger**: Stop runs only for hooks that actually started
//! - **Decorators**: Wrap every component's behavior for logging, metrics and the like
//! - **Bounded Start/Stop**: Timeouts with cancellation passed down to hooks
//! - **Best-effort Cleanup**: Stop and uninstall errors are reported, never fatal
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use appx::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> appx::Result<()> {
//!     let mut registry = Registry::new();
//!
//!     // 1. A component with no dependencies
//!     registry.register(Component::new("db").behavior(
//!         Behavior::new()
//!             .with_instance(Arc::new(String::from("postgres://localhost")))
//!             .on_clean(|| async { Ok(()) }),
//!     ))?;
//!
//!     // 2. A component that requires it
//!     registry.register(Component::new("api").require(["db"]).behavior(
//!         Behavior::new()
//!             .on_init(|ctx: InitContext| async move {
//!                 let url = ctx.required_as::<String>("db").ok_or("db missing")?;
//!                 tracing::info!("api uses {}", url);
//!                 Ok(())
//!             })
//!             .on_start(|_ctx: Context| async { Ok(()) })
//!             .on_stop(|_ctx: Context| async { Ok(()) }),
//!     ))?;
//!
//!     // 3. Install, run until SIGINT/SIGTERM, clean up
//!     registry.install_all(&Context::new()).await?;
//!     registry.run().await?;
//!     registry.uninstall().await;
//!     Ok(())
//! }
//! ```

pub mod component;
pub mod config;
pub mod decorator;
pub mod error;
pub mod lifecycle;
pub mod registry;

// Re-export core types
pub use component::{Behavior, Component, InitContext, InstallState, Instance, Required, Service};
pub use config::ConfigStore;
pub use decorator::Decorator;
pub use error::{AppError, BoxError, Result};
pub use lifecycle::{Context, HookResult};
pub use registry::{Options, OptionsBuilder, Registry, global};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;

/// Prelude module for convenient imports
///
/// ```
/// use appx::prelude::*;
/// ```
pub mod prelude {
    pub use crate::component::{
        Behavior, Component, InitContext, InstallState, Instance, Required, Service,
    };
    pub use crate::config::ConfigStore;
    pub use crate::decorator::{self, Decorator};
    pub use crate::error::{AppError, BoxError, Result};
    pub use crate::lifecycle::{Context, HookResult, Signal, shutdown_signal};
    pub use crate::registry::{ErrorHandler, Options, OptionsBuilder, Registry};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
    pub use tokio::sync::RwLock;
}
