use super::Decorator;
use crate::component::{Behavior, InitContext};
use crate::lifecycle::{BoxFuture, Context, HookFn, HookResult};
use std::sync::Arc;
use std::time::Instant;

/// A decorator that logs each step of a component with its timing
pub fn logging() -> Decorator {
    Arc::new(|mut behavior: Behavior| {
        let name: Arc<str> = Arc::from(behavior.name());

        if let Some(inner) = behavior.init.take() {
            let name = Arc::clone(&name);
            behavior.init = Some(Arc::new(
                move |ctx: InitContext| -> BoxFuture<'static, HookResult> {
                    timed(Arc::clone(&name), "init", inner(ctx))
                },
            ));
        }
        behavior.start = behavior.start.take().map(|inner| wrap(&name, "start", inner));
        behavior.stop = behavior.stop.take().map(|inner| wrap(&name, "stop", inner));
        if let Some(inner) = behavior.clean.take() {
            let name = Arc::clone(&name);
            behavior.clean = Some(Arc::new(move || -> BoxFuture<'static, HookResult> {
                timed(Arc::clone(&name), "clean", inner())
            }));
        }

        behavior
    })
}

fn wrap(name: &Arc<str>, step: &'static str, inner: HookFn) -> HookFn {
    let name = Arc::clone(name);
    Arc::new(move |ctx: Context| -> BoxFuture<'static, HookResult> {
        timed(Arc::clone(&name), step, inner(ctx))
    })
}

fn timed(
    name: Arc<str>,
    step: &'static str,
    hook: BoxFuture<'static, HookResult>,
) -> BoxFuture<'static, HookResult> {
    Box::pin(async move {
        let start = Instant::now();
        tracing::debug!("--> {} {}", step, name);

        let result = hook.await;
        match &result {
            Ok(()) => tracing::debug!("<-- {} {} {:?}", step, name, start.elapsed()),
            Err(e) => tracing::warn!("<-- {} {} ERROR: {} {:?}", step, name, e, start.elapsed()),
        }
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_logging_preserves_results() {
        let base = Behavior::new()
            .named("db")
            .on_init(|_ctx| async { HookResult::Ok(()) })
            .on_start(|_ctx| async { HookResult::Err("port taken".into()) });

        let behavior = logging()(base);
        assert_eq!(behavior.name(), "db");
        assert!(behavior.stop.is_none());
        assert!(behavior.clean.is_none());

        let ctx = InitContext::new("db", HashMap::new(), None, Context::new());
        assert!((behavior.init.clone().unwrap())(ctx).await.is_ok());

        let err = (behavior.start.clone().unwrap())(Context::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "port taken");
    }
}
