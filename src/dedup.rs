use crate::catalog::Generation;
use parking_lot::Mutex;
use std::collections::HashSet;

#[derive(Debug, Default)]
struct Claims {
    generation: Generation,
    urls: HashSet<String>,
}

/// Manifest URLs already claimed for fetching in the current cycle.
///
/// Claims are tagged with the cycle that made them: a task from an older
/// cycle cannot claim a URL in the newer cycle's set.
#[derive(Debug, Default)]
pub struct DedupGuard {
    claims: Mutex<Claims>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the set for `generation`. A reset for an older generation
    /// than the current one is ignored.
    pub fn reset(&self, generation: Generation) {
        let mut claims = self.claims.lock();
        if generation < claims.generation {
            return;
        }
        claims.generation = generation;
        claims.urls.clear();
    }

    /// Returns `true` only for the first claim of `url` in `generation`.
    pub fn claim(&self, generation: Generation, url: &str) -> bool {
        let mut claims = self.claims.lock();
        if claims.generation != generation {
            return false;
        }
        claims.urls.insert(url.to_string())
    }

    pub fn claimed(&self) -> usize {
        self.claims.lock().urls.len()
    }
}
