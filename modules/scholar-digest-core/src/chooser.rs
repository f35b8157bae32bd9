use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform choice of an index in `0..len`. Injected into the pipeline so
/// tests can pin which query and which result get picked.
pub trait Chooser: Send + Sync {
    /// `len` is always at least 1.
    fn choose_index(&self, len: usize) -> usize;
}

/// Picks one element, or `None` for an empty slice.
pub fn choose<'a, T>(chooser: &dyn Chooser, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let idx = chooser.choose_index(items.len()).min(items.len() - 1);
    items.get(idx)
}

/// Thread-local RNG; the production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomChooser;

impl Chooser for RandomChooser {
    fn choose_index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Reproducible choices from a fixed seed.
#[derive(Debug)]
pub struct SeededChooser {
    rng: Mutex<StdRng>,
}

impl SeededChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Chooser for SeededChooser {
    fn choose_index(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..len),
            Err(poisoned) => poisoned.into_inner().random_range(0..len),
        }
    }
}

/// Always the same index, clamped to the slice.
#[derive(Debug, Clone, Copy)]
pub struct FixedChooser(pub usize);

impl Chooser for FixedChooser {
    fn choose_index(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}
