use crate::config::RuleKind;
use crate::ordinal::QuotientRanking;
use crate::types::{Coalition, Player};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A synergy-comparison rule: a named score per coalition plus a strict
/// preference test. Rank-valued rules prefer smaller scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SynergyRule {
    pub kind: RuleKind,
    scores: BTreeMap<Coalition, f64>,
}

impl SynergyRule {
    pub fn new(kind: RuleKind, scores: BTreeMap<Coalition, f64>) -> Self {
        SynergyRule { kind, scores }
    }

    pub fn score(&self, coalition: Coalition) -> Option<f64> {
        self.scores.get(&coalition).copied()
    }

    /// Strictly prefers `a` over `b`; `None` when either is unscored.
    pub fn strictly_prefers(&self, a: Coalition, b: Coalition) -> Option<bool> {
        let score_a = self.score(a)?;
        let score_b = self.score(b)?;
        Some(if self.kind.smaller_is_better() {
            score_a < score_b
        } else {
            score_a > score_b
        })
    }
}

/// Triggered/satisfied pair counts for one rule under one axiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxiomCounts {
    pub triggered: u64,
    pub satisfied: u64,
}

impl AxiomCounts {
    /// NaN when nothing triggered; callers surface that as a warning.
    pub fn satisfaction_rate(&self) -> f64 {
        if self.triggered == 0 {
            f64::NAN
        } else {
            self.satisfied as f64 / self.triggered as f64
        }
    }
}

fn two_player_coalitions(players: &[Player]) -> Vec<Coalition> {
    let mut pairs = Vec::new();
    for (idx, &i) in players.iter().enumerate() {
        for &j in &players[idx + 1..] {
            pairs.push(Coalition::singleton(i).with(j));
        }
    }
    pairs
}

fn sorted_pair(coalition: Coalition) -> (Player, Player) {
    let mut members = coalition.members();
    let first = members.next().unwrap_or(0);
    let second = members.next().unwrap_or(first);
    (first, second)
}

/// Swimmy antecedent over an ordered pair of two-player coalitions:
/// some assignment π of T's members makes each of S's members weakly
/// better singleton-wise while S ⪯ T as coalitions, with at least one of
/// the three comparisons strict. When it holds, T is the
/// stronger-synergy candidate and a rule satisfies the pair by strictly
/// preferring T over S.
fn swimmy_antecedent(ranking: &QuotientRanking, s: Coalition, t: Coalition) -> bool {
    let (s1, s2) = sorted_pair(s);
    let (t1, t2) = sorted_pair(t);

    for (t1p, t2p) in [(t1, t2), (t2, t1)] {
        let c1 = ranking.compare(Coalition::singleton(s1), Coalition::singleton(t1p));
        let c2 = ranking.compare(Coalition::singleton(s2), Coalition::singleton(t2p));
        let c_pair = ranking.compare(s, t);
        let (Some(c1), Some(c2), Some(c_pair)) = (c1, c2, c_pair) else {
            continue;
        };

        let ge1 = c1 != Ordering::Greater;
        let ge2 = c2 != Ordering::Greater;
        let s_weakly_below = c_pair != Ordering::Less;
        let strict = c1 == Ordering::Less || c2 == Ordering::Less || c_pair == Ordering::Greater;

        if ge1 && ge2 && s_weakly_below && strict {
            return true;
        }
    }
    false
}

/// Count Swimmy Axiom satisfaction per rule over every ordered pair of
/// distinct two-player coalitions whose antecedent holds.
pub fn evaluate_swimmy(
    ranking: &QuotientRanking,
    players: &[Player],
    rules: &[SynergyRule],
) -> BTreeMap<RuleKind, AxiomCounts> {
    let pairs = two_player_coalitions(players);
    let mut counts: BTreeMap<RuleKind, AxiomCounts> = rules
        .iter()
        .map(|rule| (rule.kind, AxiomCounts::default()))
        .collect();

    for &s in &pairs {
        for &t in &pairs {
            if s == t || !swimmy_antecedent(ranking, s, t) {
                continue;
            }
            for rule in rules {
                let Some(satisfied) = rule.strictly_prefers(t, s) else {
                    continue;
                };
                let entry = counts.entry(rule.kind).or_default();
                entry.triggered += 1;
                if satisfied {
                    entry.satisfied += 1;
                }
            }
        }
    }

    counts
}

/// Six-way synergy classification of a two-player coalition T = {i, j}
/// from the quotient ranking of {i}, {j} and {i, j}: 1 is
/// super-additive / synergistic, 6 anti-synergistic, 3 full indifference.
/// `None` when any of the three coalitions is unranked or no pattern
/// matches.
pub fn synergy_level(ranking: &QuotientRanking, pair: Coalition) -> Option<u8> {
    if pair.len() != 2 {
        return None;
    }
    let (i, j) = sorted_pair(pair);

    // All three must be ranked.
    ranking.layer_of(pair)?;
    ranking.layer_of(Coalition::singleton(i))?;
    ranking.layer_of(Coalition::singleton(j))?;

    let strict = |x: Coalition, y: Coalition| ranking.strict(x, y);
    let weak = |x: Coalition, y: Coalition| !ranking.strict(y, x);
    let sim = |x: Coalition, y: Coalition| ranking.indiff(x, y);

    let a = Coalition::singleton(i);
    let b = Coalition::singleton(j);

    if sim(pair, a) && sim(a, b) {
        return Some(3);
    }

    for (c1, c2) in [(a, b), (b, a)] {
        if strict(pair, c1) && weak(c1, c2) {
            return Some(1);
        }
        if sim(pair, c1) && strict(c1, c2) {
            return Some(2);
        }
        if strict(c1, pair) && strict(pair, c2) {
            return Some(4);
        }
        if strict(c1, pair) && sim(pair, c2) {
            return Some(5);
        }
        if weak(c1, c2) && strict(c2, pair) {
            return Some(6);
        }
    }

    None
}

/// Count Synergy–Anasy Distinction satisfaction per rule: for every
/// ordered pair (T, U) of classified two-player coalitions with
/// syn(T) < syn(U), a rule satisfies the pair by strictly preferring T.
pub fn evaluate_sada(
    ranking: &QuotientRanking,
    players: &[Player],
    rules: &[SynergyRule],
) -> BTreeMap<RuleKind, AxiomCounts> {
    let pairs = two_player_coalitions(players);
    let levels: BTreeMap<Coalition, u8> = pairs
        .iter()
        .filter_map(|&t| synergy_level(ranking, t).map(|level| (t, level)))
        .collect();

    let mut counts: BTreeMap<RuleKind, AxiomCounts> = rules
        .iter()
        .map(|rule| (rule.kind, AxiomCounts::default()))
        .collect();

    for (&t, &level_t) in &levels {
        for (&u, &level_u) in &levels {
            if t == u || level_t >= level_u {
                continue;
            }
            for rule in rules {
                let Some(satisfied) = rule.strictly_prefers(t, u) else {
                    continue;
                };
                let entry = counts.entry(rule.kind).or_default();
                entry.triggered += 1;
                if satisfied {
                    entry.satisfied += 1;
                }
            }
        }
    }

    counts
}
