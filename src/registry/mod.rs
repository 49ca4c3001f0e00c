//! Registry
//!
//! Owns registered components, installs them in dependency order, and
//! drives the shared lifecycle ledger under start/stop timeouts.

pub mod global;
mod options;

pub use options::{
    DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT, ErrorHandler, Options, OptionsBuilder,
};

use crate::component::{Behavior, Component, ComponentId, InstallState, Installer, Instance};
use crate::decorator::Decorator;
use crate::error::{AppError, Result};
use crate::lifecycle::{Context, Ledger, Phase, Signal, shutdown_signal};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Container of registered components and their shared lifecycle
///
/// # Example
///
/// ```rust,ignore
/// use appx::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> appx::Result<()> {
///     let mut registry = Registry::new();
///     registry.register(Component::new("db").behavior(db_behavior()))?;
///     registry.register(Component::new("api").require(["db"]).behavior(api_behavior()))?;
///
///     let ctx = Context::new();
///     registry.install_all(&ctx).await?;
///
///     let signal = registry.run().await?;
///     tracing::info!("Stopped by {}", signal);
///
///     registry.uninstall().await;
///     Ok(())
/// }
/// ```
pub struct Registry {
    components: Vec<Component>,
    index: HashMap<String, ComponentId>,
    installed: Vec<ComponentId>,
    decorators: Vec<Decorator>,
    ledger: Ledger,
    options: Options,
    sealed: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            components: Vec::new(),
            index: HashMap::new(),
            installed: Vec::new(),
            decorators: Vec::new(),
            ledger: Ledger::new(),
            options,
            sealed: false,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// Register a component under its name
    pub fn register(&mut self, component: Component) -> Result<()> {
        let name = component.name();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }
        if self.index.contains_key(name) {
            return Err(AppError::DuplicateName {
                name: name.to_string(),
            });
        }

        tracing::debug!("Registered: {}", name);
        self.index.insert(name.to_string(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    /// Like [`register`](Self::register), but panics on error
    pub fn must_register(&mut self, component: Component) {
        if let Err(e) = self.register(component) {
            panic!("appx: {}", e);
        }
    }

    /// Add a decorator applied to every component
    ///
    /// # Panics
    ///
    /// Panics once any install has been attempted.
    pub fn use_decorator<F>(&mut self, decorator: F)
    where
        F: Fn(Behavior) -> Behavior + Send + Sync + 'static,
    {
        self.use_decorators([Arc::new(decorator) as Decorator]);
    }

    /// Add several decorators; the first one added is outermost
    ///
    /// # Panics
    ///
    /// Panics once any install has been attempted.
    pub fn use_decorators<I>(&mut self, decorators: I)
    where
        I: IntoIterator<Item = Decorator>,
    {
        if self.sealed {
            panic!("appx: all decorators must be added prior to installation");
        }
        self.decorators.extend(decorators);
    }

    /// Install every registered component
    pub async fn install_all(&mut self, ctx: &Context) -> Result<()> {
        self.install(ctx, std::iter::empty::<&str>()).await
    }

    /// Install the named components and, transitively, what they require
    ///
    /// No names means every registered component. On failure everything
    /// installed so far is uninstalled before the error is returned.
    pub async fn install<I, S>(&mut self, ctx: &Context, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sealed = true;

        let mut targets = Vec::new();
        for name in names {
            let name = name.as_ref();
            match self.index.get(name) {
                Some(id) => targets.push(*id),
                None => {
                    tracing::error!("Install failed: {} is not registered", name);
                    self.uninstall().await;
                    return Err(AppError::InstallFailed {
                        component: name.to_string(),
                        source: Box::new(AppError::UnknownComponent {
                            name: name.to_string(),
                        }),
                    });
                }
            }
        }
        if targets.is_empty() {
            targets = (0..self.components.len()).collect();
        }

        tracing::info!("Installing {} components...", targets.len());

        let failure = {
            let mut installer = Installer {
                components: &mut self.components,
                index: &self.index,
                ledger: &self.ledger,
                decorators: &self.decorators,
                configs: self.options.configs(),
                installed: &mut self.installed,
            };

            let mut failure = None;
            for id in targets {
                if let Err(e) = installer.install(id, ctx).await {
                    failure = Some((id, e));
                    break;
                }
            }
            failure
        };

        if let Some((id, source)) = failure {
            let component = self.components[id].name().to_string();
            tracing::error!("Install failed for {}: {}", component, source);
            self.uninstall().await;
            return Err(AppError::InstallFailed {
                component,
                source: Box::new(source),
            });
        }

        tracing::info!(
            "Install complete ({} components installed)",
            self.installed.len()
        );
        Ok(())
    }

    /// Uninstall installed components in reverse install order
    ///
    /// Cleanup errors go to the error handler; the walk always finishes.
    /// Components whose clean failed stay installed and are retried by the
    /// next call.
    pub async fn uninstall(&mut self) {
        tracing::info!("Uninstalling {} components...", self.installed.len());

        let handler = self.options.error_handler();
        for &id in self.installed.iter().rev() {
            if let Err(e) = self.components[id].uninstall().await {
                tracing::error!("Uninstall failed: {}", e);
                handler(e);
            }
        }

        let components = &self.components;
        self.installed
            .retain(|id| components[*id].state() == InstallState::Installed);

        tracing::info!(
            "Uninstall complete ({} components left installed)",
            self.installed.len()
        );
    }

    /// Run start hooks, bounded by the start timeout
    ///
    /// If a hook fails, the hooks that already started are stopped before
    /// the error is returned. On timeout the hook sequence is abandoned,
    /// not interrupted: its context is cancelled and it may still finish in
    /// the background.
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        let ledger = self.ledger.clone();
        let handler = self.options.error_handler();

        run_bounded(
            Phase::Start,
            self.options.start_timeout(),
            ctx,
            move |ctx| async move {
                if let Err(e) = ledger.start(&ctx).await {
                    tracing::warn!(
                        "Rolling back {} started hooks",
                        ledger.started_count()
                    );
                    for err in ledger.stop(&ctx).await {
                        handler(err);
                    }
                    return Err(e);
                }
                Ok(())
            },
        )
        .await
    }

    /// Run stop hooks, bounded by the stop timeout
    ///
    /// Never fails; every error, including a timeout, goes to the error
    /// handler.
    pub async fn stop(&self, ctx: &Context) {
        let ledger = self.ledger.clone();
        let handler = self.options.error_handler();
        let task_handler = Arc::clone(&handler);

        let result = run_bounded(
            Phase::Stop,
            self.options.stop_timeout(),
            ctx,
            move |ctx| async move {
                for err in ledger.stop(&ctx).await {
                    task_handler(err);
                }
                Ok::<_, AppError>(())
            },
        )
        .await;

        if let Err(e) = result {
            tracing::error!("Stop did not complete: {}", e);
            handler(e);
        }
    }

    /// Start, wait for SIGINT/SIGTERM, then stop
    pub async fn run(&self) -> Result<Signal> {
        let ctx = Context::new();
        self.start(&ctx).await?;
        tracing::info!("Running; waiting for shutdown signal");

        let signal = shutdown_signal().await;
        self.stop(&ctx).await;
        signal
    }

    /// Dependency graph of installed components: name -> required names
    pub fn graph(&self) -> BTreeMap<String, Vec<String>> {
        self.installed
            .iter()
            .map(|id| {
                let component = &self.components[*id];
                (
                    component.name().to_string(),
                    component.required_names().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    /// Names of installed components, in install order
    pub fn installed(&self) -> Vec<&str> {
        self.installed
            .iter()
            .map(|id| self.components[*id].name())
            .collect()
    }

    pub fn state_of(&self, name: &str) -> Option<InstallState> {
        self.component(name).map(Component::state)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|id| &self.components[*id])
    }

    /// Instance exposed by an installed component
    pub fn instance(&self, name: &str) -> Option<Instance> {
        self.component(name)?.instance().cloned()
    }

    pub fn instance_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.instance(name)?.downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Run `work` as a spawned task and race it against the deadline
///
/// The deadline is the tighter of `timeout` and the caller's own. Losing
/// the race cancels the task's context but does not abort the task.
async fn run_bounded<F, Fut>(
    phase: Phase,
    timeout: Duration,
    ctx: &Context,
    work: F,
) -> Result<()>
where
    F: FnOnce(Context) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let deadline = Instant::now() + timeout;
    let ctx = ctx.child_with_deadline(deadline);
    let deadline = ctx.deadline().unwrap_or(deadline);
    let budget = ctx.remaining().unwrap_or(timeout);

    tracing::info!("Running {} (timeout {:?})", phase, budget);
    let task = tokio::spawn(work(ctx.clone()));

    tokio::select! {
        biased;

        joined = task => match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("{} task failed: {}", phase, e);
                Err(AppError::Panicked { phase })
            }
        },
        _ = tokio::time::sleep_until(deadline) => {
            tracing::warn!("{} timed out after {:?}; abandoning hooks", phase, budget);
            ctx.cancel();
            Err(AppError::DeadlineExceeded {
                phase,
                timeout: budget,
            })
        },
        _ = ctx.cancelled() => {
            tracing::warn!("{} cancelled by caller", phase);
            Err(AppError::Cancelled { phase })
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::HookResult;

    #[test]
    fn test_register_rejects_empty_and_duplicate_names() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register(Component::new("")),
            Err(AppError::EmptyName)
        ));

        registry.register(Component::new("db")).unwrap();
        let err = registry.register(Component::new("db")).unwrap_err();
        assert!(matches!(err, AppError::DuplicateName { ref name } if name == "db"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("db"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_must_register_panics_on_duplicate() {
        let mut registry = Registry::new();
        registry.must_register(Component::new("db"));
        registry.must_register(Component::new("db"));
    }

    #[tokio::test]
    #[should_panic(expected = "prior to installation")]
    async fn test_decorators_frozen_after_install() {
        let mut registry = Registry::new();
        registry.register(Component::new("db")).unwrap();
        registry.install_all(&Context::new()).await.unwrap();
        registry.use_decorator(|behavior| behavior);
    }

    #[tokio::test]
    async fn test_install_unknown_name() {
        let mut registry = Registry::new();
        registry.register(Component::new("db")).unwrap();

        let err = registry
            .install(&Context::new(), ["cache"])
            .await
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            AppError::UnknownComponent { name } if name == "cache"
        ));
        assert_eq!(registry.state_of("db"), Some(InstallState::Uninstalled));
    }

    #[tokio::test]
    async fn test_graph_and_instances() {
        let mut registry = Registry::new();
        registry
            .register(
                Component::new("clock").behavior(Behavior::new().with_instance(Arc::new(7u32))),
            )
            .unwrap();
        registry
            .register(Component::new("api").require(["clock"]))
            .unwrap();
        registry.install(&Context::new(), ["api"]).await.unwrap();

        let graph = registry.graph();
        assert_eq!(graph["api"], vec!["clock".to_string()]);
        assert!(graph["clock"].is_empty());
        assert_eq!(registry.instance_as::<u32>("clock").as_deref(), Some(&7));
        assert!(registry.instance("api").is_none());
    }

    #[tokio::test]
    async fn test_run_bounded_caller_cancellation() {
        let ctx = Context::new();
        ctx.cancel();

        let err = run_bounded(Phase::Stop, Duration::from_secs(5), &ctx, |_| async {
            std::future::pending::<()>().await;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Cancelled { phase: Phase::Stop }));
    }

    #[tokio::test]
    async fn test_start_timeout_cancels_hook_context() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let tx = std::sync::Mutex::new(Some(tx));

        let mut registry = Registry::with_options(
            Options::builder()
                .start_timeout(Duration::from_millis(50))
                .build(),
        );
        registry
            .register(Component::new("slow").behavior(Behavior::new().on_start(
                move |ctx: Context| {
                    let tx = tx.lock().unwrap().take();
                    async move {
                        ctx.cancelled().await;
                        if let Some(tx) = tx {
                            let _ = tx.send(());
                        }
                        HookResult::Ok(())
                    }
                },
            )))
            .unwrap();
        registry.install_all(&Context::new()).await.unwrap();

        let err = registry.start(&Context::new()).await.unwrap_err();
        assert!(err.is_deadline_exceeded());
        rx.await.unwrap();
    }
}
