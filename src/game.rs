use crate::config::EngineConfig;
use crate::error::{MetricsError, Result};
use crate::ranking::{synthesize_ranks, RankMode};
use crate::types::{Coalition, GameRow, GameType, Player, MAX_PLAYER_ID};
use std::collections::{BTreeMap, BTreeSet};

/// One immutable game instance: players, worths, and an optional
/// coalition ranking (1 = best).
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub scenario_id: String,
    pub game_id: String,
    /// Iteration order for every per-player output.
    pub players: Vec<Player>,
    pub values: BTreeMap<Coalition, f64>,
    pub ranks: Option<BTreeMap<Coalition, u32>>,
    pub game_type: GameType,
}

impl Game {
    /// Worth of a coalition; missing coalitions are worth zero.
    pub fn value(&self, coalition: Coalition) -> f64 {
        self.values.get(&coalition).copied().unwrap_or(0.0)
    }

    pub fn rank(&self, coalition: Coalition) -> Option<u32> {
        self.ranks.as_ref()?.get(&coalition).copied()
    }

    pub fn n(&self) -> usize {
        self.players.len()
    }

    /// Bitmask of the full player slate.
    pub fn players_mask(&self) -> Coalition {
        self.players
            .iter()
            .fold(Coalition::EMPTY, |acc, &p| acc.with(p))
    }
}

/// Group validated rows into games, deriving players, synthesizing ranks
/// where configured, and classifying each game.
///
/// Games come back ordered by `(scenario_id, game_id)` so downstream
/// output never depends on input row order.
pub fn build_games(rows: &[GameRow], config: &EngineConfig) -> Result<Vec<Game>> {
    let override_mask = match &config.players {
        Some(players) => {
            let mut mask = Coalition::EMPTY;
            for &p in players {
                if p > MAX_PLAYER_ID {
                    return Err(MetricsError::CoalitionParse(
                        crate::types::CoalitionParseError(format!(
                            "player id {p} exceeds the supported maximum of {MAX_PLAYER_ID}"
                        )),
                    ));
                }
                mask = mask.with(p);
            }
            Some(mask)
        }
        None => None,
    };

    let mut grouped: BTreeMap<(String, String), Vec<&GameRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry((row.scenario_id.clone(), row.game_id.clone()))
            .or_default()
            .push(row);
    }

    let mut games = Vec::with_capacity(grouped.len());
    for ((scenario_id, game_id), group) in grouped {
        let mut seen: BTreeSet<Coalition> = BTreeSet::new();
        let mut values: BTreeMap<Coalition, f64> = BTreeMap::new();
        let mut ranks: BTreeMap<Coalition, u32> = BTreeMap::new();
        let mut observed = Coalition::EMPTY;

        for row in group {
            if !seen.insert(row.coalition) {
                return Err(MetricsError::DuplicateCoalition {
                    scenario_id,
                    game_id,
                    coalition: row.coalition,
                });
            }
            observed = observed.union(row.coalition);

            if let Some(mask) = override_mask {
                if !row.coalition.is_subset_of(mask) {
                    return Err(MetricsError::PlayerNotListed {
                        scenario_id,
                        game_id,
                        coalition: row.coalition,
                    });
                }
            }

            if let Some(v) = row.value {
                values.insert(row.coalition, v);
            }
            if let Some(r) = row.rank {
                if r == 0 {
                    return Err(MetricsError::InvalidRank {
                        scenario_id,
                        game_id,
                        coalition: row.coalition,
                    });
                }
                ranks.insert(row.coalition, r);
            }
        }

        if !values.is_empty() && !ranks.is_empty() {
            let value_keys: BTreeSet<&Coalition> = values.keys().collect();
            let rank_keys: BTreeSet<&Coalition> = ranks.keys().collect();
            if value_keys != rank_keys {
                return Err(MetricsError::RankValueMismatch {
                    scenario_id,
                    game_id,
                });
            }
        }

        if ranks.is_empty() && config.ranking.mode != RankMode::None {
            if values.is_empty() {
                return Err(MetricsError::InconsistentConfig(format!(
                    "rank synthesis requested but game ({scenario_id}, {game_id}) carries no values"
                )));
            }
            ranks = synthesize_ranks(
                &values,
                config.ranking.mode,
                config.ranking.bin_width,
                config.ranking.descending,
            )?;
        }

        let players: Vec<Player> = match &config.players {
            Some(list) => list.clone(),
            None => observed.members().collect(),
        };

        let game_type = match (values.is_empty(), ranks.is_empty()) {
            (false, true) => GameType::Tu,
            (true, false) => GameType::Ordinal,
            _ => GameType::Mixed,
        };

        games.push(Game {
            scenario_id,
            game_id,
            players,
            values,
            ranks: if ranks.is_empty() { None } else { Some(ranks) },
            game_type,
        });
    }

    Ok(games)
}
