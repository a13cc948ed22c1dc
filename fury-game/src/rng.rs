//! Deterministic randomness shared by every subsystem.
//!
//! A single user seed fans out into named streams so that, for example, an
//! extra combat roll never shifts Dracula's later movement choices.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by rule domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    movement: RefCell<CountingRng<SmallRng>>,
    trail: RefCell<CountingRng<SmallRng>>,
    encounter: RefCell<CountingRng<SmallRng>>,
    combat: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            movement: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"movement"))),
            trail: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"trail"))),
            encounter: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"encounter"))),
            combat: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"combat"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used for Dracula's move, power and card choices.
    #[must_use]
    pub fn movement(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.movement.borrow_mut()
    }

    /// Stream used by the trail and catacomb fate policies.
    #[must_use]
    pub fn trail(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.trail.borrow_mut()
    }

    /// Stream used for pool shuffles, hand draws and discards.
    #[must_use]
    pub fn encounter(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.encounter.borrow_mut()
    }

    /// Stream used for combat dice and rail dice.
    #[must_use]
    pub fn combat(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.combat.borrow_mut()
    }

    /// Total draws across every stream.
    #[must_use]
    pub fn total_draws(&self) -> u64 {
        [&self.movement, &self.trail, &self.encounter, &self.combat]
            .iter()
            .map(|stream| stream.borrow().draws())
            .sum()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
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

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC accepts keys of any length; the fallback is unreachable in practice.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
