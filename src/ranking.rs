use crate::error::{MetricsError, Result};
use crate::types::Coalition;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How coalition ranks are synthesized from numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    /// Dense-rank the raw values.
    #[default]
    Dense,
    /// Quantize values into `bin_width` buckets first, then dense-rank.
    Bin,
    /// Never synthesize; ranks must come with the input.
    None,
}

/// Dense ranking: the best key gets 1, ties share a rank, and the next
/// distinct score gets the next consecutive integer. `better_first` orders
/// scores best-to-worst.
pub(crate) fn dense_rank_by<K, V, F>(scores: &BTreeMap<K, V>, better_first: F) -> BTreeMap<K, u32>
where
    K: Ord + Clone,
    V: Clone,
    F: Fn(&V, &V) -> Ordering,
{
    let mut distinct: Vec<V> = scores.values().cloned().collect();
    distinct.sort_by(&better_first);
    distinct.dedup_by(|a, b| better_first(a, b) == Ordering::Equal);

    scores
        .iter()
        .map(|(key, score)| {
            let position = distinct
                .iter()
                .position(|v| better_first(v, score) == Ordering::Equal)
                .unwrap_or(0);
            (key.clone(), position as u32 + 1)
        })
        .collect()
}

/// Synthesize a dense coalition ranking from cardinal values.
///
/// `descending: true` means a larger value is better and receives the
/// smaller rank. In `bin` mode values are quantized by `floor(v / width)`
/// (`ceil` when descending) before ranking, collapsing near-ties.
pub(crate) fn synthesize_ranks(
    values: &BTreeMap<Coalition, f64>,
    mode: RankMode,
    bin_width: Option<f64>,
    descending: bool,
) -> Result<BTreeMap<Coalition, u32>> {
    match mode {
        RankMode::None => Ok(BTreeMap::new()),
        RankMode::Dense => {
            let better = |a: &f64, b: &f64| {
                if descending {
                    b.total_cmp(a)
                } else {
                    a.total_cmp(b)
                }
            };
            Ok(dense_rank_by(values, better))
        }
        RankMode::Bin => {
            let width = bin_width.ok_or_else(|| {
                MetricsError::InconsistentConfig(
                    "bin ranking requires a positive bin_width".to_string(),
                )
            })?;
            if width <= 0.0 {
                return Err(MetricsError::InconsistentConfig(
                    "bin ranking requires a positive bin_width".to_string(),
                ));
            }
            let buckets: BTreeMap<Coalition, i64> = values
                .iter()
                .map(|(&c, &v)| {
                    let scaled = v / width;
                    let bucket = if descending { scaled.ceil() } else { scaled.floor() };
                    (c, bucket as i64)
                })
                .collect();
            let better = |a: &i64, b: &i64| if descending { b.cmp(a) } else { a.cmp(b) };
            Ok(dense_rank_by(&buckets, better))
        }
    }
}
