//! Lifecycle Module
//!
//! Start/stop hooks registered by installed components, and the context
//! handed to every hook.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Component Registration
//!    ↓
//! 2. Install (dependencies first)      ← init + validate, hooks appended
//!    ↓
//! 3. Start (insertion order)           ← Lifecycle Hook
//!    ↓
//! [Running...]
//!    ↓
//! 4. Shutdown Signal (SIGTERM/SIGINT)
//!    ↓
//! 5. Stop (reverse of started hooks)   ← Lifecycle Hook
//!    ↓
//! 6. Uninstall (reverse install order) ← clean
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use appx::lifecycle::{Context, Hook, Ledger};
//!
//! let ledger = Ledger::new();
//! ledger.append(Hook::new("server").on_start(|_ctx| async { Ok(()) }));
//!
//! let ctx = Context::new();
//! ledger.start(&ctx).await?;
//! for err in ledger.stop(&ctx).await {
//!     tracing::error!("{}", err);
//! }
//! ```

mod context;
mod ledger;
mod shutdown;

pub use context::Context;
pub use ledger::{Hook, Ledger};
pub use shutdown::{Signal, shutdown_signal};

use crate::error::BoxError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed, sendable future returned by hooks
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a single user-supplied hook
pub type HookResult = std::result::Result<(), BoxError>;

/// A start or stop callback
pub type HookFn = Arc<dyn Fn(Context) -> BoxFuture<'static, HookResult> + Send + Sync>;

/// The bounded phases run by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Start,
    Stop,
}
