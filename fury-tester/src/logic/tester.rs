use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use fury_game::Victor;

use crate::logic::policy::HunterStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::simulation::{GameSummary, SimulationConfig, SimulationSession};

/// Aggregate of every game played from one seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedResult {
    pub seed: String,
    pub strategy: HunterStrategy,
    pub passed: bool,
    pub games_run: usize,
    pub hunter_wins: usize,
    pub dracula_wins: usize,
    pub unfinished: usize,
    pub failures: Vec<String>,
    pub average_turns: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
}

impl LogicTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Play `games` games for each seed, offsetting the seed per game.
    #[must_use]
    pub fn run_seeds(
        &self,
        seeds: &[SeedInfo],
        strategy: HunterStrategy,
        games: usize,
        max_turns: u32,
    ) -> Vec<SeedResult> {
        seeds
            .iter()
            .map(|info| {
                if self.verbose {
                    println!(
                        "🧪 Hunting with {} hunters (seed {})",
                        strategy.label().bright_white(),
                        info.label()
                    );
                }
                self.run_seed(info, strategy, games, max_turns)
            })
            .collect()
    }

    fn run_seed(
        &self,
        info: &SeedInfo,
        strategy: HunterStrategy,
        games: usize,
        max_turns: u32,
    ) -> SeedResult {
        let mut failures = Vec::new();
        let mut performance_data = Vec::with_capacity(games);
        let mut hunter_wins = 0;
        let mut dracula_wins = 0;
        let mut unfinished = 0;
        let mut total_turns = 0_u64;

        for i in 0..games {
            let game_seed = info
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let config = SimulationConfig::new(strategy, game_seed).with_max_turns(max_turns);
            let start_time = Instant::now();
            let summary = match SimulationSession::new(config) {
                Ok(session) => session.run(),
                Err(err) => {
                    failures.push(format!("Game {} (seed {game_seed}): {err:#}", i + 1));
                    continue;
                }
            };
            let duration = start_time.elapsed();
            performance_data.push(duration);
            total_turns += u64::from(summary.turns);

            match summary.victor {
                Some(Victor::Hunters) => hunter_wins += 1,
                Some(Victor::Dracula) => dracula_wins += 1,
                None => unfinished += 1,
            }

            if let Some(err) = &summary.failure {
                failures.push(describe_failure(i + 1, &summary, err));
                if self.verbose {
                    println!("  ❌ Game {}/{games} failed: {}", i + 1, err.red());
                }
            } else if self.verbose {
                println!(
                    "  ✅ Game {}/{games} ({duration:?}) turns:{} days:{} winner:{}",
                    i + 1,
                    summary.turns,
                    summary.days,
                    victor_label(summary.victor)
                );
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_turns = if performance_data.is_empty() {
            0.0
        } else {
            total_turns as f64 / performance_data.len() as f64
        };

        SeedResult {
            seed: info.label(),
            strategy,
            passed: failures.is_empty(),
            games_run: games,
            hunter_wins,
            dracula_wins,
            unfinished,
            failures,
            average_turns,
            average_duration,
            performance_data,
        }
    }
}

#[must_use]
pub const fn victor_label(victor: Option<Victor>) -> &'static str {
    match victor {
        Some(Victor::Hunters) => "hunters",
        Some(Victor::Dracula) => "dracula",
        None => "none",
    }
}

fn describe_failure(game: usize, summary: &GameSummary, err: &str) -> String {
    let context = if summary.tail.is_empty() {
        "no narration recorded".to_string()
    } else {
        summary.tail.join(" | ").replace('\n', " / ")
    };
    format!(
        "Game {game} (strategy {}, seed {}, turns {}, day {}, blood {}, vampires {}): {err} | {context}",
        summary.strategy.label(),
        summary.seed,
        summary.turns,
        summary.days,
        summary.dracula_blood,
        summary.vampires
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
