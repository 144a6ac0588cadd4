use crate::combinatorics::subsets_of;
use crate::error::{MetricsError, Result};
use crate::types::{Coalition, Player};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The quotient ranking Σ₁ ≻ … ≻ Σ_ℓ of ranked coalitions, stored as a
/// flat arena partitioned by layer offsets with a coalition → layer side
/// map. Layer 0 is the best.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotientRanking {
    arena: Vec<Coalition>,
    /// `offsets[k]..offsets[k + 1]` spans layer k; length is ℓ + 1.
    offsets: Vec<usize>,
    layer_of: BTreeMap<Coalition, usize>,
}

impl QuotientRanking {
    /// Group coalitions sharing a rank value into layers, best (smallest
    /// rank) first.
    pub fn from_ranks(ranks: &BTreeMap<Coalition, u32>) -> Result<Self> {
        let mut by_rank: BTreeMap<u32, Vec<Coalition>> = BTreeMap::new();
        for (&coalition, &rank) in ranks {
            by_rank.entry(rank).or_default().push(coalition);
        }

        let mut arena = Vec::with_capacity(ranks.len());
        let mut offsets = vec![0];
        let mut layer_of = BTreeMap::new();
        for (layer, (_, coalitions)) in by_rank.into_iter().enumerate() {
            if coalitions.is_empty() {
                return Err(MetricsError::Internal {
                    scenario_id: String::new(),
                    game_id: String::new(),
                    detail: format!("quotient layer {layer} has no members"),
                });
            }
            for coalition in coalitions {
                layer_of.insert(coalition, layer);
                arena.push(coalition);
            }
            offsets.push(arena.len());
        }

        Ok(QuotientRanking {
            arena,
            offsets,
            layer_of,
        })
    }

    pub fn layer_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn layer(&self, k: usize) -> &[Coalition] {
        &self.arena[self.offsets[k]..self.offsets[k + 1]]
    }

    pub fn layers(&self) -> impl Iterator<Item = &[Coalition]> {
        (0..self.layer_count()).map(|k| self.layer(k))
    }

    pub fn layer_of(&self, coalition: Coalition) -> Option<usize> {
        self.layer_of.get(&coalition).copied()
    }

    /// S ≻ T: both ranked and S sits in a strictly better layer.
    pub fn strict(&self, s: Coalition, t: Coalition) -> bool {
        matches!(self.compare(s, t), Some(Ordering::Less))
    }

    /// S ∼ T: both ranked in the same layer.
    pub fn indiff(&self, s: Coalition, t: Coalition) -> bool {
        matches!(self.compare(s, t), Some(Ordering::Equal))
    }

    /// `Less` means strictly preferred. `None` when either side is
    /// unranked.
    pub fn compare(&self, s: Coalition, t: Coalition) -> Option<Ordering> {
        Some(self.layer_of(s)?.cmp(&self.layer_of(t)?))
    }
}

/// Signed ordinal marginal m_i^S: +1 if S ∪ {i} ≻ S, −1 if S ≻ S ∪ {i},
/// 0 on indifference or when i ∈ S. `None` when either side is unranked.
pub fn ordinal_marginal(ranking: &QuotientRanking, i: Player, s: Coalition) -> Option<i8> {
    if s.contains(i) {
        return Some(0);
    }
    group_ordinal_marginal(ranking, Coalition::singleton(i), s)
}

/// Group variant m_T^S for a coalition T joining a disjoint reference S.
pub fn group_ordinal_marginal(
    ranking: &QuotientRanking,
    t: Coalition,
    s: Coalition,
) -> Option<i8> {
    match ranking.compare(s.union(t), s)? {
        Ordering::Less => Some(1),
        Ordering::Greater => Some(-1),
        Ordering::Equal => Some(0),
    }
}

/// Ordinal Banzhaf score s_i = u_i⁺ − u_i⁻ over all ranked reference sets
/// S ⊆ N∖{i}.
pub fn ordinal_banzhaf_scores(
    ranking: &QuotientRanking,
    players: &[Player],
    players_mask: Coalition,
) -> BTreeMap<Player, i64> {
    let mut scores = BTreeMap::new();
    for &i in players {
        let rest = players_mask.mask() & !Coalition::singleton(i).mask();
        let mut score = 0i64;
        for s in subsets_of(rest) {
            match ordinal_marginal(ranking, i, s) {
                Some(1) => score += 1,
                Some(-1) => score -= 1,
                _ => {}
            }
        }
        scores.insert(i, score);
    }
    scores
}

/// Group ordinal Banzhaf score s_T over ranked S ⊆ N∖T, per coalition of
/// the requested family.
pub fn group_ordinal_banzhaf_scores(
    ranking: &QuotientRanking,
    players_mask: Coalition,
    family: &[Coalition],
) -> BTreeMap<Coalition, i64> {
    let mut scores = BTreeMap::new();
    for &t in family {
        if t.is_empty() {
            scores.insert(t, 0);
            continue;
        }
        let rest = players_mask.mask() & !t.mask();
        let mut score = 0i64;
        for s in subsets_of(rest) {
            match group_ordinal_marginal(ranking, t, s) {
                Some(1) => score += 1,
                Some(-1) => score -= 1,
                _ => {}
            }
        }
        scores.insert(t, score);
    }
    scores
}

/// Lex-cel frequency vectors θ(i) = (i₁, …, i_ℓ), where i_k counts the
/// layer-k coalitions containing player i. Players compare by
/// lexicographic order on θ from the top layer down.
pub fn lex_cel_theta(
    ranking: &QuotientRanking,
    players: &[Player],
) -> BTreeMap<Player, Vec<u32>> {
    let layer_count = ranking.layer_count();
    let mut theta: BTreeMap<Player, Vec<u32>> = players
        .iter()
        .map(|&p| (p, vec![0; layer_count]))
        .collect();

    for (k, layer) in ranking.layers().enumerate() {
        for &coalition in layer {
            for p in coalition.members() {
                if let Some(counts) = theta.get_mut(&p) {
                    counts[k] += 1;
                }
            }
        }
    }

    theta
}

/// Group lex-cel vectors Θ(T) = (T₁, …, T_ℓ), where T_k counts the
/// layer-k coalitions that contain T.
pub fn group_lex_cel_theta(
    ranking: &QuotientRanking,
    family: &[Coalition],
) -> BTreeMap<Coalition, Vec<u32>> {
    let layer_count = ranking.layer_count();
    let mut theta: BTreeMap<Coalition, Vec<u32>> = family
        .iter()
        .map(|&t| (t, vec![0; layer_count]))
        .collect();

    for (k, layer) in ranking.layers().enumerate() {
        for &coalition in layer {
            for (&t, counts) in theta.iter_mut() {
                if t.is_subset_of(coalition) {
                    counts[k] += 1;
                }
            }
        }
    }

    theta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(pairs: &[(&str, u32)]) -> BTreeMap<Coalition, u32> {
        pairs
            .iter()
            .map(|(s, r)| (s.parse().unwrap(), *r))
            .collect()
    }

    fn parse(s: &str) -> Coalition {
        s.parse().unwrap()
    }

    #[test]
    fn test_quotient_layers_group_by_rank() {
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 1),
            ("{1}", 1),
            ("{2}", 2),
            ("{0,1}", 1),
            ("{0,2}", 2),
            ("{1,2}", 2),
            ("{0,1,2}", 1),
        ]))
        .unwrap();

        assert_eq!(ranking.layer_count(), 2);
        assert_eq!(ranking.layer(0).len(), 4);
        assert_eq!(ranking.layer(1).len(), 3);
        assert_eq!(ranking.layer_of(parse("{0,1}")), Some(0));
        assert_eq!(ranking.layer_of(parse("{2}")), Some(1));
        assert_eq!(ranking.layer_of(parse("{1,2,3}")), None);

        assert!(ranking.strict(parse("{0}"), parse("{2}")));
        assert!(!ranking.strict(parse("{2}"), parse("{0}")));
        assert!(ranking.indiff(parse("{0}"), parse("{1}")));
        assert_eq!(ranking.compare(parse("{0}"), parse("{1,2,3}")), None);
    }

    #[test]
    fn test_ordinal_marginal_signs() {
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 2),
            ("{1}", 3),
            ("{0,1}", 1),
        ]))
        .unwrap();

        // Joining 1 improves {0}; joining 0 improves {1}; member is 0.
        assert_eq!(ordinal_marginal(&ranking, 1, parse("{0}")), Some(1));
        assert_eq!(ordinal_marginal(&ranking, 0, parse("{1}")), Some(1));
        assert_eq!(ordinal_marginal(&ranking, 0, parse("{0}")), Some(0));
        // Unranked reference set.
        assert_eq!(ordinal_marginal(&ranking, 1, parse("{}")), None);
    }

    #[test]
    fn test_ordinal_banzhaf_scores() {
        // {0,1} best, then {0}, then {1}; player 0 never hurts.
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 2),
            ("{1}", 3),
            ("{0,1}", 1),
        ]))
        .unwrap();
        let scores = ordinal_banzhaf_scores(&ranking, &[0, 1], parse("{0,1}"));
        // Player 0: S = {1} gives +1; S = {} is unranked.
        assert_eq!(scores[&0], 1);
        assert_eq!(scores[&1], 1);
    }

    #[test]
    fn test_lex_cel_theta_counts_memberships_per_layer() {
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 1),
            ("{1}", 1),
            ("{2}", 2),
            ("{0,1}", 1),
            ("{0,2}", 2),
            ("{1,2}", 2),
            ("{0,1,2}", 1),
        ]))
        .unwrap();
        let theta = lex_cel_theta(&ranking, &[0, 1, 2]);
        assert_eq!(theta[&0], vec![3, 1]);
        assert_eq!(theta[&1], vec![3, 1]);
        assert_eq!(theta[&2], vec![1, 3]);
    }

    #[test]
    fn test_group_theta_and_inclusion_monotonicity() {
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 2),
            ("{1}", 2),
            ("{2}", 2),
            ("{0,1}", 1),
            ("{0,2}", 2),
            ("{1,2}", 3),
            ("{0,1,2}", 1),
        ]))
        .unwrap();
        let family = vec![parse("{0,1}"), parse("{0,1,2}")];
        let theta = group_lex_cel_theta(&ranking, &family);
        assert_eq!(theta[&parse("{0,1}")], vec![2, 0, 0]);
        assert_eq!(theta[&parse("{0,1,2}")], vec![1, 0, 0]);
        // T ⊆ T′ implies T_k ≥ T′_k layer by layer.
        for k in 0..ranking.layer_count() {
            assert!(theta[&parse("{0,1}")][k] >= theta[&parse("{0,1,2}")][k]);
        }
    }

    #[test]
    fn test_group_ordinal_banzhaf_symmetric_pairs() {
        // Pairs strictly better than singletons, grand better than pairs.
        let ranking = QuotientRanking::from_ranks(&ranks(&[
            ("{0}", 3),
            ("{1}", 3),
            ("{2}", 3),
            ("{0,1}", 2),
            ("{0,2}", 2),
            ("{1,2}", 2),
            ("{0,1,2}", 1),
        ]))
        .unwrap();
        let family = vec![parse("{0,1}"), parse("{0,2}"), parse("{1,2}")];
        let scores = group_ordinal_banzhaf_scores(&ranking, parse("{0,1,2}"), &family);
        assert_eq!(scores[&parse("{0,1}")], scores[&parse("{0,2}")]);
        assert_eq!(scores[&parse("{0,1}")], scores[&parse("{1,2}")]);
    }
}
