use crate::combinatorics::{factorial, shapley_weight, subsets_of, PermutationSampler};
use crate::game::Game;
use crate::types::{Coalition, Player};
use std::collections::BTreeMap;

/// Exact Shapley value: for each player i, the weighted sum of marginal
/// contributions v(S ∪ {i}) − v(S) over all S ⊆ N∖{i}. Missing worths
/// default to zero. O(n · 2ⁿ).
pub fn shapley_exact(game: &Game) -> BTreeMap<Player, f64> {
    let n = game.n();
    let full = game.players_mask();
    let mut indices: BTreeMap<Player, f64> = BTreeMap::new();

    for &i in &game.players {
        let rest = full.mask() & !Coalition::singleton(i).mask();
        let mut phi = 0.0;
        for s in subsets_of(rest) {
            let weight = shapley_weight(s.len(), n);
            phi += weight * (game.value(s.with(i)) - game.value(s));
        }
        indices.insert(i, phi);
    }

    indices
}

/// Monte-Carlo Shapley estimate over `num_samples` uniform join orders.
/// Deterministic for a fixed `(game, num_samples, seed)`.
pub fn shapley_monte_carlo(game: &Game, num_samples: u32, seed: u64) -> BTreeMap<Player, f64> {
    let mut indices: BTreeMap<Player, f64> =
        game.players.iter().map(|&p| (p, 0.0)).collect();
    if game.players.is_empty() || num_samples == 0 {
        return indices;
    }

    let mut sampler = PermutationSampler::new(seed);
    let mut order: Vec<Player> = game.players.clone();

    for _ in 0..num_samples {
        sampler.shuffle(&mut order);
        let mut prefix = Coalition::EMPTY;
        let mut prev_value = game.value(prefix);
        for &i in &order {
            prefix = prefix.with(i);
            let current = game.value(prefix);
            if let Some(acc) = indices.get_mut(&i) {
                *acc += current - prev_value;
            }
            prev_value = current;
        }
    }

    for acc in indices.values_mut() {
        *acc /= f64::from(num_samples);
    }
    indices
}

/// Raw Banzhaf score: β_i = Σ_{S ⊆ N∖{i}} (v(S ∪ {i}) − v(S)).
pub fn banzhaf_raw(game: &Game) -> BTreeMap<Player, f64> {
    let full = game.players_mask();
    let mut raw: BTreeMap<Player, f64> = BTreeMap::new();

    for &i in &game.players {
        let rest = full.mask() & !Coalition::singleton(i).mask();
        let mut beta = 0.0;
        for s in subsets_of(rest) {
            beta += game.value(s.with(i)) - game.value(s);
        }
        raw.insert(i, beta);
    }

    raw
}

/// Banzhaf scores, optionally normalized by the total absolute score.
/// Returns `(scores, degenerate)`; `degenerate` is true when normalization
/// was requested but the divisor is zero, in which case the raw zeros are
/// kept and the caller should surface a warning.
pub fn banzhaf(game: &Game, normalize: bool) -> (BTreeMap<Player, f64>, bool) {
    let raw = banzhaf_raw(game);
    if !normalize {
        return (raw, false);
    }

    let total: f64 = raw.values().map(|b| b.abs()).sum();
    if total == 0.0 {
        return (raw, true);
    }
    (raw.into_iter().map(|(p, b)| (p, b / total)).collect(), false)
}

/// Shapley interaction index over a family of coalitions:
///
/// I_v(S) = Σ_{T ⊆ N∖S} ((n − t − s)! t! / (n − s + 1)!)
///          · Σ_{L ⊆ S} (−1)^{s−l} v(L ∪ T)
pub fn shapley_interaction(game: &Game, family: &[Coalition]) -> BTreeMap<Coalition, f64> {
    let n = game.n();
    let full = game.players_mask();
    let mut result = BTreeMap::new();

    for &coalition in family {
        let s = coalition.len();
        if s == 0 {
            result.insert(coalition, 0.0);
            continue;
        }

        let rest = full.mask() & !coalition.mask();
        let denom = factorial(n - s + 1);
        let mut outer = 0.0;
        for t in subsets_of(rest) {
            let inner = alternating_sum(game, coalition, t);
            let coeff = factorial(n - t.len() - s) * factorial(t.len()) / denom;
            outer += coeff * inner;
        }
        result.insert(coalition, outer);
    }

    result
}

/// Banzhaf interaction index:
///
/// I^B_v(S) = 2^{−(n−s)} · Σ_{T ⊆ N∖S} Σ_{L ⊆ S} (−1)^{s−l} v(L ∪ T)
pub fn banzhaf_interaction(game: &Game, family: &[Coalition]) -> BTreeMap<Coalition, f64> {
    let n = game.n();
    let full = game.players_mask();
    let mut result = BTreeMap::new();

    for &coalition in family {
        let s = coalition.len();
        if s == 0 {
            result.insert(coalition, 0.0);
            continue;
        }

        let rest = full.mask() & !coalition.mask();
        let mut total = 0.0;
        for t in subsets_of(rest) {
            total += alternating_sum(game, coalition, t);
        }
        result.insert(coalition, total / f64::powi(2.0, (n - s) as i32));
    }

    result
}

/// Σ_{L ⊆ S} (−1)^{|S|−|L|} v(L ∪ T)
fn alternating_sum(game: &Game, coalition: Coalition, t: Coalition) -> f64 {
    let s = coalition.len();
    let mut inner = 0.0;
    for l in subsets_of(coalition.mask()) {
        let sign = if (s - l.len()) % 2 == 1 { -1.0 } else { 1.0 };
        inner += sign * game.value(l.union(t));
    }
    inner
}

/// Synergy of each valued coalition: v(S) − Σ_{i ∈ S} v({i}).
pub fn synergy(game: &Game) -> BTreeMap<Coalition, f64> {
    let singles: BTreeMap<Player, f64> = game
        .players
        .iter()
        .map(|&p| (p, game.value(Coalition::singleton(p))))
        .collect();

    game.values
        .keys()
        .map(|&coalition| {
            if coalition.is_empty() {
                return (coalition, 0.0);
            }
            let singles_sum: f64 = coalition
                .members()
                .map(|p| singles.get(&p).copied().unwrap_or(0.0))
                .sum();
            (coalition, game.value(coalition) - singles_sum)
        })
        .collect()
}
