//! Decorators
//!
//! A decorator wraps a component's [`Behavior`] to add cross-cutting
//! behavior (logging, metrics) without touching the component itself.

mod logging;

pub use logging::logging;

use crate::component::Behavior;
use std::sync::Arc;

/// A `Behavior -> Behavior` wrapper
pub type Decorator = Arc<dyn Fn(Behavior) -> Behavior + Send + Sync>;

/// Fold a chain of decorators around `base`
///
/// The first decorator in the chain ends up outermost: it runs first on
/// the way into a hook and last on the way out.
///
/// ```text
/// chain = [d0, d1, d2]
/// result = d0(d1(d2(base)))
/// ```
pub fn compose<'a, I>(chain: I, base: Behavior) -> Behavior
where
    I: IntoIterator<Item = &'a Decorator>,
    I::IntoIter: DoubleEndedIterator,
{
    chain
        .into_iter()
        .rev()
        .fold(base, |behavior, decorator| decorator(behavior))
}
