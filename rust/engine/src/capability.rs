// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered fallback over alternative ways of applying one effect.
//!
//! Engine builds differ in which setters, fields and batch APIs they expose.
//! An adapter lists every way it knows to apply an effect; the chain runs them
//! in order and stops at the first one that reports success.

use bimview_core::{Error, Result};

/// Most strategies any single effect may list.
pub const MAX_STRATEGIES: usize = 5;

type Strategy<'a, T> = (&'static str, Box<dyn FnOnce() -> Option<T> + 'a>);

/// Result of a successful chain run.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied<T> {
    pub value: T,
    /// Name of the strategy that worked.
    pub via: &'static str,
    /// Strategies tried before it.
    pub skipped: usize,
}

/// Builder for an ordered list of strategies for one effect.
///
/// ```rust
/// use bimview_engine::StrategyChain;
///
/// let applied = StrategyChain::new("visible")
///     .then("setVisible", || None)
///     .then("visible field", || Some(()))
///     .run()
///     .unwrap();
/// assert_eq!(applied.via, "visible field");
/// ```
pub struct StrategyChain<'a, T> {
    effect: &'static str,
    strategies: Vec<Strategy<'a, T>>,
}

impl<'a, T> StrategyChain<'a, T> {
    pub fn new(effect: &'static str) -> Self {
        Self {
            effect,
            strategies: Vec::with_capacity(MAX_STRATEGIES),
        }
    }

    /// Append a strategy. `None` means "not supported here, try the next one".
    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Option<T> + 'a,
    {
        debug_assert!(
            self.strategies.len() < MAX_STRATEGIES,
            "effect `{}` lists more than {} strategies",
            self.effect,
            MAX_STRATEGIES
        );
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// Append a strategy only when `condition` holds.
    pub fn then_if<F>(self, condition: bool, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Option<T> + 'a,
    {
        if condition {
            self.then(name, strategy)
        } else {
            self
        }
    }

    pub fn effect(&self) -> &'static str {
        self.effect
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order until one succeeds.
    pub fn run(self) -> Result<Applied<T>> {
        let effect = self.effect;
        for (skipped, (via, strategy)) in self.strategies.into_iter().enumerate() {
            if let Some(value) = strategy() {
                if skipped > 0 {
                    tracing::trace!(effect, via, skipped, "effect applied through fallback");
                }
                return Ok(Applied {
                    value,
                    via,
                    skipped,
                });
            }
        }
        Err(Error::CapabilityUnavailable { effect })
    }
}
