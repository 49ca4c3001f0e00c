//! Process-wide default registry
//!
//! Nothing is created implicitly: call [`init`] once at startup, fetch the
//! registry with [`registry`] wherever it is needed, and [`teardown`] it
//! at exit. Tests should build their own [`Registry`] instead.

use super::{Options, Registry};
use std::sync::{Arc, Mutex, PoisonError};

/// The default registry, shared behind an async mutex
pub type SharedRegistry = Arc<tokio::sync::Mutex<Registry>>;

static DEFAULT: Mutex<Option<SharedRegistry>> = Mutex::new(None);

/// Create the default registry
///
/// Returns `false` and leaves the existing one alone if it was already
/// created.
pub fn init(options: Options) -> bool {
    let mut slot = DEFAULT.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return false;
    }
    *slot = Some(Arc::new(tokio::sync::Mutex::new(Registry::with_options(
        options,
    ))));
    tracing::debug!("Default registry created");
    true
}

/// The default registry, if [`init`] has been called
pub fn registry() -> Option<SharedRegistry> {
    DEFAULT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove the default registry and hand it back
///
/// Callers still holding a clone keep it alive; uninstall it before
/// dropping if components hold resources.
pub fn teardown() -> Option<SharedRegistry> {
    let registry = DEFAULT
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if registry.is_some() {
        tracing::debug!("Default registry torn down");
    }
    registry
}
