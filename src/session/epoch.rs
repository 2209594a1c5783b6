use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque generation token minted per consumer-initiated render.
///
/// Tokens are only compared for currency; they carry no meaning inside the
/// render pipeline itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderKey(u64);

/// Generation counter backing the stale-response guard.
///
/// A consumer that triggers renders from fast-changing state mints a key per
/// trigger, captures that key in the completion path, and applies the result
/// only if the key is still current when the render settles. This guards
/// application of results, not execution: a superseded render still runs to
/// completion server-side.
///
/// The check-then-apply sequence is not atomic; the guard assumes completions
/// are applied from a single consumer context, which the render client's
/// single-flight discipline already provides.
#[derive(Debug, Default)]
pub struct RenderEpoch {
    current: AtomicU64,
}

impl RenderEpoch {
    /// A fresh epoch with no keys minted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new key and make it the current one, superseding all earlier
    /// keys.
    pub fn mint(&self) -> RenderKey {
        RenderKey(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `key` is still the most recently minted key.
    pub fn is_current(&self, key: RenderKey) -> bool {
        self.current.load(Ordering::SeqCst) == key.0
    }

    /// Run `apply` only if `key` is still current, returning its result.
    ///
    /// A stale key is a normal outcome, not an error: the closure is simply
    /// never invoked and `None` is returned.
    pub fn apply_if_current<R>(&self, key: RenderKey, apply: impl FnOnce() -> R) -> Option<R> {
        if self.is_current(key) {
            Some(apply())
        } else {
            None
        }
    }
}
