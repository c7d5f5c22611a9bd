//! Deterministic random streams segregated by simulation domain.
//!
//! A single user-visible seed fans out into independent streams so that,
//! for example, dungeon layout draws never perturb combat hit rolls. Only
//! the seed is persisted: a resumed save reproduces future randomness from
//! the point of resume, not individual mid-session draws.

use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    economy: RefCell<CountingRng<ChaCha20Rng>>,
    dungeon: RefCell<CountingRng<ChaCha20Rng>>,
    combat: RefCell<CountingRng<ChaCha20Rng>>,
    capture: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            economy: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"economy"))),
            dungeon: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"dungeon"))),
            combat: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"combat"))),
            capture: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"capture"))),
        }
    }

    /// Access the economy event RNG stream.
    #[must_use]
    pub fn economy(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.economy.borrow_mut()
    }

    /// Access the dungeon generation/walk RNG stream.
    #[must_use]
    pub fn dungeon(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.dungeon.borrow_mut()
    }

    /// Access the combat intent/hit-roll RNG stream.
    #[must_use]
    pub fn combat(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.combat.borrow_mut()
    }

    /// Access the capture-roll RNG stream.
    #[must_use]
    pub fn capture(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.capture.borrow_mut()
    }
}

/// Uniform draw of one slice element.
pub fn choice<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

/// Weighted draw over parallel weights via a cumulative scan.
///
/// Returns the index of the selected weight. A roll landing past the
/// cumulative total (possible with zero weights) falls back to the last
/// index, matching the reference selection behavior.
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[u32]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().map(|w| f64::from(*w)).sum();
    let roll = rng.gen_range(0.0..=total.max(f64::MIN_POSITIVE));
    let mut upto = 0.0;
    for (idx, weight) in weights.iter().enumerate() {
        upto += f64::from(*weight);
        if upto >= roll {
            return Some(idx);
        }
    }
    Some(weights.len() - 1)
}
