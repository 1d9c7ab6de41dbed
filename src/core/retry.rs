//! Bounded loops and ordered fallbacks.
//!
//! Every loop in the engine that talks to a live page is bounded by an attempt
//! count rather than a wall-clock deadline, so a static page can never spin
//! forever. [`retry`] is that loop; [`StrategyChain`] is the "try A, else B,
//! else C" cascade the extractors use.

use std::future::Future;
use tracing::debug;

/// Result of a bounded retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Success { value: T, attempts: u32 },
    ExhaustedRetries { attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. } | RetryOutcome::ExhaustedRetries { attempts } => {
                *attempts
            }
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            RetryOutcome::Success { value, .. } => Some(value),
            RetryOutcome::ExhaustedRetries { .. } => None,
        }
    }
}

/// Run `action` up to `max_attempts` times, stopping at the first `Some`.
///
/// `action` receives the 1-based attempt number.
pub async fn retry<T, F, Fut>(max_attempts: u32, mut action: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=max_attempts {
        if let Some(value) = action(attempt).await {
            return RetryOutcome::Success {
                value,
                attempts: attempt,
            };
        }
        debug!("retry: attempt {}/{} yielded nothing", attempt, max_attempts);
    }
    RetryOutcome::ExhaustedRetries {
        attempts: max_attempts,
    }
}

// ── Strategy chain ───────────────────────────────────────────────────────────

/// A single named heuristic. Returns `None` (or an empty list) when it does
/// not recognise the input.
pub type Strategy<I, O> = fn(&I) -> Option<Vec<O>>;

/// Ordered list of strategies tried until one yields a non-empty result.
pub struct StrategyChain<I, O> {
    label: &'static str,
    steps: Vec<(&'static str, Strategy<I, O>)>,
}

impl<I, O> StrategyChain<I, O> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            steps: Vec::new(),
        }
    }

    pub fn then(mut self, name: &'static str, strategy: Strategy<I, O>) -> Self {
        self.steps.push((name, strategy));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }

    /// Returns the winning strategy's name with its output, or `None` when
    /// every strategy came back empty.
    pub fn run(&self, input: &I) -> Option<(&'static str, Vec<O>)> {
        for (name, strategy) in &self.steps {
            match strategy(input) {
                Some(out) if !out.is_empty() => {
                    debug!("{}: strategy '{}' produced {} records", self.label, name, out.len());
                    return Some((*name, out));
                }
                _ => debug!("{}: strategy '{}' produced nothing", self.label, name),
            }
        }
        None
    }

    /// Like [`run`](Self::run) but collapses "nothing matched" into an empty list.
    pub fn run_or_empty(&self, input: &I) -> Vec<O> {
        self.run(input).map(|(_, out)| out).unwrap_or_default()
    }
}
