//! Collision-free section ids for container records

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Exclusive upper bound for generated ids.
pub const SECTION_ID_BOUND: i32 = i32::MAX;

/// Attempts per `next()` call before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

/// Hands out random section ids that are unique within one session.
///
/// Each unpack or repack creates its own allocator, so the used-set never
/// leaks between containers.
#[derive(Debug)]
pub struct SectionIdAllocator {
    used: HashSet<i32>,
    rng: StdRng,
    max_attempts: usize,
}

impl SectionIdAllocator {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic allocator for tests and reproducible repacks.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            used: HashSet::new(),
            rng,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Mark an id found in a container as taken. Returns `false` if it
    /// was already reserved.
    pub fn reserve(&mut self, id: i32) -> bool {
        self.used.insert(id)
    }

    pub fn is_used(&self, id: i32) -> bool {
        self.used.contains(&id)
    }

    /// Number of ids handed out or reserved.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Draw a fresh id in `[0, SECTION_ID_BOUND)`.
    pub fn next(&mut self) -> Result<i32> {
        for _ in 0..self.max_attempts {
            let candidate = self.rng.gen_range(0..SECTION_ID_BOUND);
            if self.used.insert(candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::AllocatorExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for SectionIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
