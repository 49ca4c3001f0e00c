//! Service trait
//!
//! An object-style alternative to building a [`Behavior`] from closures.
//! Every method has a no-op default, so a type only overrides the steps it
//! cares about.

use super::{Behavior, InitContext, Instance};
use crate::lifecycle::{BoxFuture, Context, HookResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A long-lived module driven through install, start, stop and uninstall
///
/// # Example
///
/// ```rust,ignore
/// use appx::prelude::*;
///
/// struct Database {
///     pool: Option<Pool>,
/// }
///
/// #[async_trait]
/// impl Service for Database {
///     async fn init(&mut self, ctx: &InitContext) -> HookResult {
///         let config: DbConfig = ctx.config_as()?.unwrap_or_default();
///         self.pool = Some(Pool::connect(&config.url).await?);
///         Ok(())
///     }
///
///     async fn clean(&mut self) -> HookResult {
///         if let Some(pool) = self.pool.take() {
///             pool.close().await;
///         }
///         Ok(())
///     }
/// }
///
/// registry.register(Component::new("db").service(Arc::new(RwLock::new(Database { pool: None }))))?;
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Called once all required components are installed
    async fn init(&mut self, _ctx: &InitContext) -> HookResult {
        Ok(())
    }

    /// Called when the registry starts, dependencies first
    async fn start(&mut self, _ctx: &Context) -> HookResult {
        Ok(())
    }

    /// Called when the registry stops, dependents first
    async fn stop(&mut self, _ctx: &Context) -> HookResult {
        Ok(())
    }

    /// Called right after init; a failure aborts the install
    fn validate(&self) -> HookResult {
        Ok(())
    }

    /// Called on uninstall, in reverse install order
    async fn clean(&mut self) -> HookResult {
        Ok(())
    }
}

impl Behavior {
    /// Adapt a shared [`Service`] into a behavior bundle
    ///
    /// The exposed instance is the `Arc<RwLock<T>>` itself, so dependents
    /// downcast with `required_as::<RwLock<T>>(name)`.
    pub fn from_service<T: Service>(service: Arc<RwLock<T>>) -> Self {
        let mut behavior = Behavior::new();
        behavior.instance = Some(Arc::clone(&service) as Instance);

        let svc = Arc::clone(&service);
        behavior.init = Some(Arc::new(
            move |ctx: InitContext| -> BoxFuture<'static, HookResult> {
                let svc = Arc::clone(&svc);
                Box::pin(async move {
                    let mut guard = svc.write().await;
                    guard.init(&ctx).await
                })
            },
        ));

        let svc = Arc::clone(&service);
        behavior.start = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> {
                let svc = Arc::clone(&svc);
                Box::pin(async move {
                    let mut guard = svc.write().await;
                    guard.start(&ctx).await
                })
            },
        ));

        let svc = Arc::clone(&service);
        behavior.stop = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> {
                let svc = Arc::clone(&svc);
                Box::pin(async move {
                    let mut guard = svc.write().await;
                    guard.stop(&ctx).await
                })
            },
        ));

        let svc = Arc::clone(&service);
        behavior.validate = Some(Arc::new(move || -> HookResult {
            match svc.try_read() {
                Ok(guard) => guard.validate(),
                Err(_) => Err("service is locked during validation".into()),
            }
        }));

        behavior.clean = Some(Arc::new(move || -> BoxFuture<'static, HookResult> {
            let svc = Arc::clone(&service);
            Box::pin(async move {
                let mut guard = svc.write().await;
                guard.clean().await
            })
        }));

        behavior
    }
}
