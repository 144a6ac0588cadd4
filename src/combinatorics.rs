use crate::types::{Coalition, Player};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Factorials cached as exact integers (21! overflows u64)
pub(crate) const FACTORIAL_LIMIT: usize = 21;
pub(crate) const FACTORIALS: [u64; FACTORIAL_LIMIT] = {
    let mut facts = [1u64; FACTORIAL_LIMIT];
    let mut i = 1;
    while i < FACTORIAL_LIMIT {
        facts[i] = facts[i - 1] * (i as u64);
        i += 1;
    }
    facts
};

pub(crate) fn factorial(n: usize) -> f64 {
    if n < FACTORIAL_LIMIT {
        FACTORIALS[n] as f64
    } else {
        // Stirling's approximation; unreachable under the player bound
        let n_f64 = n as f64;
        (2.0 * std::f64::consts::PI * n_f64).sqrt() * (n_f64 / std::f64::consts::E).powf(n_f64)
    }
}

/// Exact Shapley weight |S|! (n - |S| - 1)! / n!
pub(crate) fn shapley_weight(s_len: usize, n: usize) -> f64 {
    factorial(s_len) * factorial(n - s_len - 1) / factorial(n)
}

/// Iterator over every submask of `mask`, in ascending mask order.
///
/// Yields the empty mask first and `mask` itself last.
pub(crate) struct Submasks {
    mask: u32,
    next: Option<u32>,
}

impl Submasks {
    pub(crate) fn of(mask: u32) -> Self {
        Submasks {
            mask,
            next: Some(0),
        }
    }
}

impl Iterator for Submasks {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let current = self.next?;
        self.next = if current == self.mask {
            None
        } else {
            Some(current.wrapping_sub(self.mask) & self.mask)
        };
        Some(current)
    }
}

/// All subsets of `mask` as coalitions, ascending by mask.
pub(crate) fn subsets_of(mask: u32) -> impl Iterator<Item = Coalition> {
    Submasks::of(mask).map(Coalition::from_mask)
}

/// Full power set in lexicographic order by sorted player tuple,
/// e.g. for {0,1,2}: {}, {0}, {0,1}, {0,1,2}, {0,2}, {1}, {1,2}, {2}.
pub fn power_set_lex(players: &[Player]) -> Vec<Coalition> {
    fn extend(players: &[Player], start: usize, prefix: Coalition, out: &mut Vec<Coalition>) {
        out.push(prefix);
        for idx in start..players.len() {
            extend(players, idx + 1, prefix.with(players[idx]), out);
        }
    }

    let mut sorted: Vec<Player> = players.to_vec();
    sorted.sort_unstable();
    let mut out = Vec::with_capacity(1 << sorted.len().min(20));
    extend(&sorted, 0, Coalition::EMPTY, &mut out);
    out
}

/// Coalitions with `min_size ≤ |S| ≤ max_size`, in lexicographic order.
pub fn subsets_sized(players: &[Player], min_size: usize, max_size: usize) -> Vec<Coalition> {
    power_set_lex(players)
        .into_iter()
        .filter(|c| c.len() >= min_size && c.len() <= max_size)
        .collect()
}

/// FNV-1a fold of the game identity into a Monte-Carlo seed, so the same
/// `(game, num_samples, seed)` reproduces bitwise regardless of worker
/// count or row order.
pub fn derive_seed(scenario_id: &str, game_id: &str, num_samples: u32, base_seed: u64) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    let mut eat = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(PRIME);
        }
    };
    eat(scenario_id.as_bytes());
    eat(&[0]);
    eat(game_id.as_bytes());
    eat(&[0]);
    eat(&num_samples.to_le_bytes());
    hash ^ base_seed
}

/// Deterministic uniform permutation sampler over a fixed player slate.
pub struct PermutationSampler {
    rng: StdRng,
}

impl PermutationSampler {
    pub fn new(seed: u64) -> Self {
        PermutationSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn shuffle(&mut self, players: &mut [Player]) {
        players.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(5), 120.0);
        assert_eq!(factorial(12), 479001600.0);
    }

    #[test]
    fn test_shapley_weights_sum_to_one() {
        // Over all S ⊆ N∖{i} the weights must sum to 1.
        let n = 5;
        let rest_mask = (1u32 << n) - 2; // players 1..=4, i = 0
        let total: f64 = Submasks::of(rest_mask)
            .map(|s| shapley_weight(s.count_ones() as usize, n))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_submasks_enumerates_all_subsets() {
        let mask = 0b1011u32;
        let subsets: Vec<u32> = Submasks::of(mask).collect();
        assert_eq!(subsets.len(), 8);
        assert_eq!(subsets[0], 0);
        assert_eq!(*subsets.last().unwrap(), mask);
        for s in &subsets {
            assert_eq!(s & mask, *s);
        }
    }

    #[test]
    fn test_power_set_lex_order() {
        let coalitions = power_set_lex(&[0, 1, 2]);
        let rendered: Vec<String> = coalitions.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["{}", "{0}", "{0,1}", "{0,1,2}", "{0,2}", "{1}", "{1,2}", "{2}"]
        );
    }

    #[test]
    fn test_subsets_sized() {
        let pairs = subsets_sized(&[0, 1, 2], 2, 2);
        let rendered: Vec<String> = pairs.iter().map(|c| c.to_string()).collect();
        assert_eq!(rendered, vec!["{0,1}", "{0,2}", "{1,2}"]);
    }

    #[test]
    fn test_derive_seed_is_stable_and_sensitive() {
        let a = derive_seed("s0", "g0", 100, 0);
        let b = derive_seed("s0", "g0", 100, 0);
        assert_eq!(a, b);
        assert_ne!(a, derive_seed("s0", "g1", 100, 0));
        assert_ne!(a, derive_seed("s0", "g0", 101, 0));
        assert_ne!(a, derive_seed("s0", "g0", 100, 7));
    }

    #[test]
    fn test_permutation_sampler_reproducible() {
        let mut first = vec![0u8, 1, 2, 3, 4, 5];
        let mut second = first.clone();
        PermutationSampler::new(42).shuffle(&mut first);
        PermutationSampler::new(42).shuffle(&mut second);
        assert_eq!(first, second);
    }
}
