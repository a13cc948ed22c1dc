use anyhow::{Context, Result, bail};
use fury_game::{Game, GamePhase, HunterId, Victor};
use serde::{Deserialize, Serialize};

use crate::logic::policy::{HunterAction, HunterPolicy, HunterStrategy};

/// Commands a single hunter turn may take before the harness gives up.
const SETTLE_LIMIT: usize = 256;

/// Configuration for one automated game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub strategy: HunterStrategy,
    /// Dracula turns before the game is called unfinished.
    pub max_turns: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(strategy: HunterStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_turns: 300,
        }
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Outcome of one automated game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub seed: u64,
    pub strategy: HunterStrategy,
    pub victor: Option<Victor>,
    pub turns: u32,
    pub days: u32,
    pub vampires: u8,
    pub dracula_blood: u8,
    pub combats: u32,
    pub encounters: u32,
    /// First invariant violation observed, if any.
    pub failure: Option<String>,
    /// Last few narration entries, for failure context.
    pub tail: Vec<String>,
}

impl GameSummary {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Deterministic harness driving one [`Game`] through a [`HunterPolicy`].
pub struct SimulationSession {
    game: Game,
    policy: Box<dyn HunterPolicy + Send>,
    config: SimulationConfig,
    combats: u32,
    encounters: u32,
}

impl SimulationSession {
    /// # Errors
    ///
    /// Returns an error if the engine cannot set up a game.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let game = Game::new(config.seed)
            .with_context(|| format!("failed to start game for seed {}", config.seed))?;
        Ok(Self {
            game,
            policy: config.strategy.create_policy(config.seed),
            config,
            combats: 0,
            encounters: 0,
        })
    }

    /// Play until a victor emerges or the turn budget runs out.
    ///
    /// Engine errors and invariant violations stop the run and are recorded
    /// in the summary rather than returned.
    pub fn run(mut self) -> GameSummary {
        let failure = self.play().err().map(|err| format!("{err:#}"));
        if let Some(failure) = &failure {
            log::warn!("seed {} failed: {failure}", self.config.seed);
        }
        self.summarize(failure)
    }

    fn play(&mut self) -> Result<()> {
        while !self.game.is_over() && self.game.turn() < self.config.max_turns {
            if self.game.phase() == GamePhase::HunterTurns {
                self.hunter_round()?;
                if self.game.is_over() {
                    break;
                }
            }
            self.game.advance_phase()?;
            self.check()?;
        }
        Ok(())
    }

    fn hunter_round(&mut self) -> Result<()> {
        for idx in 0..4_u8 {
            let id = HunterId(idx);
            self.settle()?;
            if self.game.is_over() {
                return Ok(());
            }
            let plan = self.policy.plan_turn(&self.game, id);
            log::debug!(
                "{} policy: {id} plans {:?} ({})",
                self.policy.name(),
                plan.action,
                plan.rationale
            );
            if let Some(destination) = plan.destination {
                self.game.move_hunter(id, destination)?;
                self.check()?;
                self.settle()?;
                if self.game.is_over() {
                    return Ok(());
                }
            }
            match plan.action {
                HunterAction::Search => {
                    self.game.search(id)?;
                }
                HunterAction::Supply => {
                    self.game.supply(id)?;
                }
                HunterAction::Wait => {}
            }
            self.check()?;
        }
        self.settle()
    }

    /// Resolve pending combat and encounters until the hunters are free.
    fn settle(&mut self) -> Result<()> {
        for _ in 0..SETTLE_LIMIT {
            if self.game.is_over() {
                return Ok(());
            }
            if let Some(combat) = self.game.combat() {
                if combat.rounds() == 0 {
                    self.combats += 1;
                }
                let opponent = combat.opponent();
                let fighters = combat.hunters().to_vec();
                let submissions = fighters
                    .into_iter()
                    .map(|id| (id, self.policy.pick_item(&self.game, id, opponent)))
                    .collect();
                self.game.submit_combat_items(submissions)?;
            } else if let Some(queued) = self.game.pending_encounter().cloned() {
                let choice = self.policy.pick_choice(&self.game, &queued);
                let pending = self.game.pending_encounters();
                self.game.resolve_encounter(choice)?;
                if self.game.pending_encounters() < pending {
                    self.encounters += 1;
                }
            } else {
                return Ok(());
            }
            self.check()?;
        }
        bail!("hunter turn did not settle after {SETTLE_LIMIT} commands")
    }

    fn check(&self) -> Result<()> {
        self.game
            .check_invariants()
            .with_context(|| format!("after Dracula turn {}", self.game.turn()))
    }

    fn summarize(self, failure: Option<String>) -> GameSummary {
        let log = self.game.log();
        GameSummary {
            seed: self.config.seed,
            strategy: self.config.strategy,
            victor: self.game.victor(),
            turns: self.game.turn(),
            days: self.game.day(),
            vampires: self.game.vampires(),
            dracula_blood: self.game.dracula_blood(),
            combats: self.combats,
            encounters: self.encounters,
            failure,
            tail: log[log.len().saturating_sub(3)..].to_vec(),
        }
    }
}
