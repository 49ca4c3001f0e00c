//! Lifecycle Ledger
//!
//! Ordered start/stop hook pairs shared by every installed component.

use super::{BoxFuture, Context, HookFn, HookResult, Phase};
use crate::error::{AppError, Result};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A start/stop pair registered by one component
///
/// Either callback may be absent. If a hook's start never ran (because an
/// earlier start failed), its stop will not run either.
#[derive(Clone)]
pub struct Hook {
    name: String,
    on_start: Option<HookFn>,
    on_stop: Option<HookFn>,
}

impl Hook {
    /// Create an empty hook pair for the named component
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_start: None,
            on_stop: None,
        }
    }

    pub(crate) fn from_fns(
        name: impl Into<String>,
        on_start: Option<HookFn>,
        on_stop: Option<HookFn>,
    ) -> Self {
        Self {
            name: name.into(),
            on_start,
            on_stop,
        }
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_start = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.on_stop = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("on_start", &self.on_start.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .finish()
    }
}

/// Tracks registered hooks and how many of them have started
///
/// Hooks are appended during install, so insertion order is dependency
/// order. `stop` only ever touches the prefix that `start` got through.
///
/// Cloning shares the ledger. The bookkeeping lock is only held between
/// hook calls, never across one, so a stop can run while an abandoned
/// start is still stuck inside a hook.
///
/// # Example
///
/// ```rust,ignore
/// use appx::lifecycle::{Context, Hook, Ledger};
///
/// let ledger = Ledger::new();
/// ledger.append(Hook::new("db").on_start(|_| async { Ok(()) }));
/// ledger.append(Hook::new("api").on_stop(|_| async { Ok(()) }));
///
/// ledger.start(&Context::new()).await?;
/// let errors = ledger.stop(&Context::new()).await;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    state: Arc<Mutex<LedgerState>>,
}

#[derive(Debug, Default)]
struct LedgerState {
    hooks: Vec<Hook>,
    started: usize,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, hook: Hook) {
        self.state().hooks.push(hook);
    }

    /// Run start hooks in insertion order
    ///
    /// Returns on the first failure. The failing hook does not count as
    /// started. Hooks that already started are not run again. If a stop
    /// runs while a start hook is in flight, that hook is not counted and
    /// the start ends with [`AppError::Cancelled`].
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        tracing::info!("Running start hooks...");

        loop {
            let (index, hook) = {
                let state = self.state();
                let Some(hook) = state.hooks.get(state.started).cloned() else {
                    break;
                };
                (state.started, hook)
            };

            if let Some(on_start) = hook.on_start {
                tracing::debug!("Starting: {}", hook.name);
                if let Err(source) = on_start(ctx.clone()).await {
                    tracing::error!("Start failed for {}: {}", hook.name, source);
                    return Err(AppError::Start {
                        component: hook.name,
                        source,
                    });
                }
                tracing::debug!("Started: {}", hook.name);
            }

            let mut state = self.state();
            if state.started != index {
                tracing::warn!("Stopped while starting {}; start abandoned", hook.name);
                return Err(AppError::Cancelled {
                    phase: Phase::Start,
                });
            }
            state.started += 1;
        }

        tracing::info!("Start complete ({} hooks started)", self.started_count());
        Ok(())
    }

    /// Run stop hooks for every started hook, in reverse order
    ///
    /// Keeps going after failures and returns all of them. The started
    /// count drops with every hook visited, so a second call is a no-op.
    pub async fn stop(&self, ctx: &Context) -> Vec<AppError> {
        tracing::info!("Running stop hooks...");

        let mut errors = Vec::new();
        let mut visited = 0;
        loop {
            let hook = {
                let mut state = self.state();
                if state.started == 0 {
                    break;
                }
                state.started -= 1;
                state.hooks[state.started].clone()
            };
            visited += 1;

            let Some(on_stop) = hook.on_stop else {
                continue;
            };
            tracing::debug!("Stopping: {}", hook.name);
            if let Err(source) = on_stop(ctx.clone()).await {
                tracing::error!("Stop failed for {}: {}", hook.name, source);
                errors.push(AppError::Stop {
                    component: hook.name,
                    source,
                });
            }
        }

        tracing::info!(
            "Stop complete ({} hooks visited, {} failed)",
            visited,
            errors.len()
        );
        errors
    }

    /// Number of hooks whose start completed
    pub fn started_count(&self) -> usize {
        self.state().started
    }

    pub fn len(&self) -> usize {
        self.state().hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().hooks.is_empty()
    }
}
