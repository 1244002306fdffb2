//! Generated element ids.
//!
//! Headings and block containers that lack an `id` receive one of the form
//! `<prefix>-<9 base36 chars>`. Ids never collide with an id already live in
//! the document.

use super::arena::Dom;

const ID_CHARS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Pseudo-random id source.
///
/// Seeded from the clock by default; tests pass a fixed seed to get
/// reproducible ids.
#[derive(Debug, Clone)]
pub struct IdMint {
    state: u64,
}

impl IdMint {
    pub fn new() -> Self {
        Self::with_seed(crate::util::time_seed_nanos())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn suffix(&mut self) -> String {
        (0..SUFFIX_LEN)
            .map(|_| ID_CHARS[((self.next_u64() >> 33) % 36) as usize] as char)
            .collect()
    }

    /// Mint an id with the given prefix that no live element uses yet.
    pub fn mint(&mut self, dom: &Dom, prefix: &str) -> String {
        loop {
            let candidate = format!("{prefix}-{}", self.suffix());
            if !dom.id_in_use(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for IdMint {
    fn default() -> Self {
        Self::new()
    }
}
