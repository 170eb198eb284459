//! Ordered fallback chains.
//!
//! Foreground changes and synthetic input are best-effort OS requests: no
//! single method works for every target application. A [`Chain`] holds an
//! ordered list of independent strategies sharing the [`Attempt`]
//! capability and runs them until one reports success.
//!
//! New strategies are added by pushing another [`Attempt`] onto the chain;
//! call sites only ever see [`Chain::run`].

use tracing::{debug, trace};

/// A single strategy in a fallback chain.
pub trait Attempt<C: ?Sized>: Send + Sync {
    /// Short stable name used in logs and returned by [`Chain::run`].
    fn name(&self) -> &'static str;

    /// Try the strategy once. Returns `true` when it believes it succeeded.
    fn attempt(&self, cx: &C) -> bool;
}

/// Boxed predicate type backing a [`Step`].
type StepFn<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// Closure-backed strategy.
pub struct Step<C: ?Sized> {
    /// Name reported in logs.
    name: &'static str,
    /// The strategy body.
    f: StepFn<C>,
}

impl<C: ?Sized> Step<C> {
    /// Wrap a closure as a named strategy.
    pub fn new<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            f: Box::new(f),
        }
    }
}

impl<C: ?Sized> Attempt<C> for Step<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, cx: &C) -> bool {
        (self.f)(cx)
    }
}

/// An ordered list of strategies executed with early exit.
pub struct Chain<C: ?Sized> {
    /// Label for log lines (e.g. `"focus"`, `"enter"`).
    label: &'static str,
    /// Strategies in priority order.
    steps: Vec<Box<dyn Attempt<C>>>,
}

impl<C: ?Sized> Chain<C> {
    /// Create an empty chain.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: Vec::new(),
        }
    }

    /// Append a strategy (builder style).
    #[must_use]
    pub fn with<A>(mut self, step: A) -> Self
    where
        A: Attempt<C> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Append a closure strategy (builder style).
    #[must_use]
    pub fn step<F>(self, name: &'static str, f: F) -> Self
    where
        C: 'static,
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        self.with(Step::new(name, f))
    }

    /// Number of strategies in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Strategy names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run strategies in order until one succeeds.
    ///
    /// Returns the name of the winning strategy, or `None` when every
    /// strategy failed.
    pub fn run(&self, cx: &C) -> Option<&'static str> {
        for step in &self.steps {
            let name = step.name();
            trace!(chain = self.label, step = name, "fallback_attempt");
            if step.attempt(cx) {
                debug!(chain = self.label, step = name, "fallback_succeeded");
                return Some(name);
            }
            debug!(chain = self.label, step = name, "fallback_step_failed");
        }
        debug!(chain = self.label, "fallback_exhausted");
        None
    }
}
