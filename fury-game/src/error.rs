//! Error taxonomy for the engine.
//!
//! Only configuration problems and broken invariants surface as errors.
//! Recoverable rule situations (an `Invalid` combat lookup, Dracula having
//! no legal move) are narrated and handled in place.
use thiserror::Error;

use crate::hunter::HunterId;
use crate::map::MapError;

#[derive(Debug, Error)]
pub enum GameError {
    /// The board failed structural validation; the game must not start.
    #[error("map configuration error: {0}")]
    Map(#[from] MapError),
    /// A draw was attempted against an empty pool.
    #[error("the {pool} pool is exhausted")]
    PoolExhausted { pool: &'static str },
    #[error("unknown hunter {0:?}")]
    UnknownHunter(HunterId),
    #[error("unknown location '{0}'")]
    UnknownLocation(String),
    /// Internal bookkeeping disagreed with the rules; the session must halt.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl GameError {
    /// Whether the session can continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Map(_) | Self::PoolExhausted { .. } | Self::Invariant(_)
        )
    }
}
