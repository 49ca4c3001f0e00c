//! Components
//!
//! A component is a named unit with a set of required component names and a
//! [`Behavior`] bundle. The registry installs components dependencies first
//! and uninstalls them in reverse.

mod behavior;
mod install;
mod service;

pub use behavior::{Behavior, CleanFn, InitContext, InitFn, Instance, Required, ValidateFn};
pub use service::Service;

pub(crate) use install::Installer;

use crate::decorator::Decorator;
use crate::error::{AppError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Index of a component inside its registry
pub(crate) type ComponentId = usize;

/// Install state of a component
///
/// ```text
/// Uninstalled → Installing → Installed
///      ↑            ↓            │
///      │          Failed         │
///      └─────── uninstall ───────┘
/// ```
///
/// Seeing `Installing` again during an install means a cycle. `Failed`
/// is terminal for that attempt; the next install retries from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum InstallState {
    #[default]
    Uninstalled,
    Installing,
    Installed,
    Failed,
}

/// A named, dependency-aware installable unit
///
/// # Example
///
/// ```rust,ignore
/// use appx::prelude::*;
///
/// let api = Component::new("api")
///     .require(["db", "cache"])
///     .behavior(Behavior::new().on_start(|_ctx| async { Ok(()) }));
/// registry.register(api)?;
/// ```
pub struct Component {
    name: String,
    required_names: BTreeSet<String>,
    resolved: Option<Vec<ComponentId>>,
    base: Behavior,
    active: Behavior,
    decorators: Vec<Decorator>,
    hooks_appended: bool,
    state: InstallState,
}

impl Component {
    /// Create a component with no dependencies and an empty behavior
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_names: BTreeSet::new(),
            resolved: None,
            base: Behavior::new(),
            active: Behavior::new(),
            decorators: Vec::new(),
            hooks_appended: false,
            state: InstallState::Uninstalled,
        }
    }

    /// Add names of components this one depends on
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the behavior bundle
    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.base = behavior;
        self
    }

    /// Use a shared [`Service`] as the behavior bundle
    pub fn service<T: Service>(self, service: Arc<RwLock<T>>) -> Self {
        self.behavior(Behavior::from_service(service))
    }

    /// Add a decorator applied to this component only
    ///
    /// Component decorators sit inside the registry-wide ones.
    pub fn decorate<F>(mut self, decorator: F) -> Self
    where
        F: Fn(Behavior) -> Behavior + Send + Sync + 'static,
    {
        self.decorators.push(Arc::new(decorator));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.required_names.iter().map(String::as_str)
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Instance exposed by the installed (decorated) behavior
    pub fn instance(&self) -> Option<&Instance> {
        self.active.instance.as_ref()
    }

    /// Run the clean step
    ///
    /// No-op unless the component is installed. When clean fails the
    /// component stays `Installed` so the caller can tell cleanup did not
    /// complete.
    pub async fn uninstall(&mut self) -> Result<()> {
        if self.state != InstallState::Installed {
            return Ok(());
        }

        if let Some(clean) = self.active.clean.clone() {
            tracing::debug!("Cleaning: {}", self.name);
            clean().await.map_err(|source| AppError::Cleanup {
                component: self.name.clone(),
                source,
            })?;
        }

        self.state = InstallState::Uninstalled;
        tracing::debug!("Uninstalled: {}", self.name);
        Ok(())
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("required_names", &self.required_names)
            .field("state", &self.state)
            .field("behavior", &self.base)
            .field("decorators", &self.decorators.len())
            .finish()
    }
}
