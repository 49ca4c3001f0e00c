use crate::error::{AppError, Result};
use crate::lifecycle::{BoxFuture, Context, HookFn, HookResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// The value a component exposes to the components that require it
pub type Instance = Arc<dyn Any + Send + Sync>;

pub type InitFn = Arc<dyn Fn(InitContext) -> BoxFuture<'static, HookResult> + Send + Sync>;

pub type ValidateFn = Arc<dyn Fn() -> HookResult + Send + Sync>;

pub type CleanFn = Arc<dyn Fn() -> BoxFuture<'static, HookResult> + Send + Sync>;

/// The installable bundle behind a component
///
/// Every capability is optional. An absent capability is skipped; absent
/// start/stop still occupy a slot in the lifecycle ledger.
///
/// Fields are public so decorators can wrap them in place.
///
/// # Example
///
/// ```rust,ignore
/// use appx::prelude::*;
///
/// let pool = Arc::new(Pool::default());
/// let behavior = Behavior::new()
///     .with_instance(Arc::clone(&pool))
///     .on_init(move |ctx: InitContext| {
///         let pool = Arc::clone(&pool);
///         async move { pool.connect(ctx.config_as::<PoolConfig>()?).await }
///     })
///     .on_clean(|| async { Ok(()) });
/// ```
#[derive(Clone, Default)]
pub struct Behavior {
    name: String,
    pub instance: Option<Instance>,
    pub init: Option<InitFn>,
    pub start: Option<HookFn>,
    pub stop: Option<HookFn>,
    pub validate: Option<ValidateFn>,
    pub clean: Option<CleanFn>,
}

impl Behavior {
    /// Create a bundle with no capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the component this bundle is installed for
    ///
    /// Empty until the bundle reaches the decorator chain.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_instance<T: Any + Send + Sync>(mut self, instance: Arc<T>) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn on_init<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(InitContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.init = Some(Arc::new(
            move |ctx: InitContext| -> BoxFuture<'static, HookResult> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.start = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.stop = Some(Arc::new(
            move |ctx: Context| -> BoxFuture<'static, HookResult> { Box::pin(f(ctx)) },
        ));
        self
    }

    pub fn on_validate<F>(mut self, f: F) -> Self
    where
        F: Fn() -> HookResult + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn on_clean<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.clean = Some(Arc::new(move || -> BoxFuture<'static, HookResult> {
            Box::pin(f())
        }));
        self
    }

    /// Downcast the exposed instance
    pub fn instance_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone()?.downcast::<T>().ok()
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("instance", &self.instance.is_some())
            .field("init", &self.init.is_some())
            .field("start", &self.start.is_some())
            .field("stop", &self.stop.is_some())
            .field("validate", &self.validate.is_some())
            .field("clean", &self.clean.is_some())
            .finish()
    }
}

/// A resolved dependency, as seen by the component that requires it
#[derive(Clone, Debug)]
pub struct Required {
    name: String,
    instance: Option<Instance>,
}

impl Required {
    pub(crate) fn new(name: impl Into<String>, instance: Option<Instance>) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn instance_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instance.clone()?.downcast::<T>().ok()
    }
}

/// Everything a component's init hook gets to see
#[derive(Clone, Debug)]
pub struct InitContext {
    name: String,
    required: HashMap<String, Required>,
    config: Option<Value>,
    ctx: Context,
}

impl InitContext {
    pub(crate) fn new(
        name: impl Into<String>,
        required: HashMap<String, Required>,
        config: Option<Value>,
        ctx: Context,
    ) -> Self {
        Self {
            name: name.into(),
            required,
            config,
            ctx,
        }
    }

    /// Name of the component being initialized
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self, name: &str) -> Option<&Required> {
        self.required.get(name)
    }

    /// Shortcut for `required(name)` followed by a downcast
    pub fn required_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.required.get(name)?.instance_as::<T>()
    }

    pub fn required_all(&self) -> impl Iterator<Item = &Required> {
        self.required.values()
    }

    pub fn required_len(&self) -> usize {
        self.required.len()
    }

    /// Raw config for this component, if any was set
    pub fn config(&self) -> Option<&Value> {
        self.config.as_ref()
    }

    /// Deserialize this component's config
    ///
    /// Returns `Ok(None)` when no config was set.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(raw) = self.config.clone() else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|source| AppError::Config {
                component: self.name.clone(),
                source,
            })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct PoolConfig {
        url: String,
        size: usize,
    }

    fn init_context(config: Option<Value>) -> InitContext {
        let mut required = HashMap::new();
        required.insert(
            "clock".to_string(),
            Required::new("clock", Some(Arc::new(42u64) as Instance)),
        );
        InitContext::new("db", required, config, Context::new())
    }

    #[test]
    fn test_config_as_typed() {
        let ctx = init_context(Some(json!({"url": "postgres://db", "size": 8})));
        let config = ctx.config_as::<PoolConfig>().unwrap();
        assert_eq!(
            config,
            Some(PoolConfig {
                url: "postgres://db".to_string(),
                size: 8
            })
        );
    }

    #[test]
    fn test_config_as_absent_and_invalid() {
        assert!(init_context(None).config_as::<PoolConfig>().unwrap().is_none());

        let err = init_context(Some(json!({"url": 1})))
            .config_as::<PoolConfig>()
            .unwrap_err();
        assert!(matches!(err, AppError::Config { ref component, .. } if component == "db"));
    }

    #[test]
    fn test_required_downcast() {
        let ctx = init_context(None);
        assert_eq!(ctx.required_len(), 1);
        assert_eq!(ctx.required_as::<u64>("clock").as_deref(), Some(&42));
        assert!(ctx.required_as::<String>("clock").is_none());
        assert!(ctx.required("missing").is_none());
    }

    #[test]
    fn test_debug_shows_capabilities() {
        let behavior = Behavior::new()
            .with_instance(Arc::new("value"))
            .on_validate(|| Ok(()));
        let debug = format!("{:?}", behavior);
        assert!(debug.contains("instance: true"));
        assert!(debug.contains("validate: true"));
        assert!(debug.contains("init: false"));
        assert_eq!(behavior.instance_as::<&str>().as_deref(), Some(&"value"));
    }
}
