use crate::error::{MetricsError, Result};
use crate::ranking::RankMode;
use crate::types::{Coalition, Player};
use derive_builder::Builder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::str::FromStr;

/// The contribution indices the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    ShapleyExact,
    ShapleyMc,
    Banzhaf,
    Synergy,
    ShapleyInteraction,
    BanzhafInteraction,
    OrdinalBanzhaf,
    LexCel,
    GroupOrdinalBanzhaf,
    GroupLexCel,
}

impl IndexKind {
    pub fn name(self) -> &'static str {
        match self {
            IndexKind::ShapleyExact => "shapley_exact",
            IndexKind::ShapleyMc => "shapley_mc",
            IndexKind::Banzhaf => "banzhaf",
            IndexKind::Synergy => "synergy",
            IndexKind::ShapleyInteraction => "shapley_interaction",
            IndexKind::BanzhafInteraction => "banzhaf_interaction",
            IndexKind::OrdinalBanzhaf => "ordinal_banzhaf",
            IndexKind::LexCel => "lex_cel",
            IndexKind::GroupOrdinalBanzhaf => "group_ordinal_banzhaf",
            IndexKind::GroupLexCel => "group_lex_cel",
        }
    }

    /// Whether computing this index enumerates a full power set (its own
    /// reference sets or the default subset family), which is what the
    /// player bound guards. Monte-Carlo Shapley, synergy, and player-level
    /// lex-cel stay linear in the ranked coalitions.
    pub fn requires_power_set(self) -> bool {
        matches!(
            self,
            IndexKind::ShapleyExact
                | IndexKind::Banzhaf
                | IndexKind::ShapleyInteraction
                | IndexKind::BanzhafInteraction
                | IndexKind::OrdinalBanzhaf
                | IndexKind::GroupOrdinalBanzhaf
                | IndexKind::GroupLexCel
        )
    }
}

impl FromStr for IndexKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shapley_exact" => Ok(IndexKind::ShapleyExact),
            "shapley_mc" => Ok(IndexKind::ShapleyMc),
            "banzhaf" => Ok(IndexKind::Banzhaf),
            "synergy" => Ok(IndexKind::Synergy),
            "shapley_interaction" => Ok(IndexKind::ShapleyInteraction),
            "banzhaf_interaction" => Ok(IndexKind::BanzhafInteraction),
            "ordinal_banzhaf" => Ok(IndexKind::OrdinalBanzhaf),
            "lex_cel" => Ok(IndexKind::LexCel),
            "group_ordinal_banzhaf" => Ok(IndexKind::GroupOrdinalBanzhaf),
            "group_lex_cel" => Ok(IndexKind::GroupLexCel),
            other => Err(MetricsError::UnknownIndex(other.to_string())),
        }
    }
}

/// Synergy-comparison rules usable by the axiom evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    ShapleyInteraction,
    BanzhafInteraction,
    GroupOrdinalBanzhafScore,
    GroupLexcelRank,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::ShapleyInteraction,
        RuleKind::BanzhafInteraction,
        RuleKind::GroupOrdinalBanzhafScore,
        RuleKind::GroupLexcelRank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::ShapleyInteraction => "shapley_interaction",
            RuleKind::BanzhafInteraction => "banzhaf_interaction",
            RuleKind::GroupOrdinalBanzhafScore => "group_ordinal_banzhaf_score",
            RuleKind::GroupLexcelRank => "group_lexcel_rank",
        }
    }

    /// Rank-valued rules prefer smaller scores; everything else prefers
    /// larger ones.
    pub fn smaller_is_better(self) -> bool {
        matches!(self, RuleKind::GroupLexcelRank)
    }

    /// The index whose output feeds this rule.
    pub fn source_index(self) -> IndexKind {
        match self {
            RuleKind::ShapleyInteraction => IndexKind::ShapleyInteraction,
            RuleKind::BanzhafInteraction => IndexKind::BanzhafInteraction,
            RuleKind::GroupOrdinalBanzhafScore => IndexKind::GroupOrdinalBanzhaf,
            RuleKind::GroupLexcelRank => IndexKind::GroupLexCel,
        }
    }
}

impl FromStr for RuleKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "shapley_interaction" => Ok(RuleKind::ShapleyInteraction),
            "banzhaf_interaction" => Ok(RuleKind::BanzhafInteraction),
            "group_ordinal_banzhaf_score" => Ok(RuleKind::GroupOrdinalBanzhafScore),
            "group_lexcel_rank" => Ok(RuleKind::GroupLexcelRank),
            other => Err(MetricsError::UnknownRule(other.to_string())),
        }
    }
}

/// Which indices run and their per-index options.
#[derive(Debug, Clone, PartialEq, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct IndicesConfig {
    pub enabled: BTreeSet<IndexKind>,
    /// Monte-Carlo sample count.
    pub num_samples: u32,
    /// Base seed folded into the per-game Monte-Carlo seed.
    pub seed: u64,
    /// Normalize Banzhaf by the total absolute score.
    pub normalize: bool,
    /// Override for the interaction / group index subset family.
    pub subsets: Option<Vec<Coalition>>,
}

impl Default for IndicesConfig {
    fn default() -> Self {
        IndicesConfig {
            enabled: [IndexKind::ShapleyExact, IndexKind::Banzhaf, IndexKind::Synergy]
                .into_iter()
                .collect(),
            num_samples: 1000,
            seed: 0,
            normalize: true,
            subsets: None,
        }
    }
}

/// Rank-synthesis options.
#[derive(Debug, Clone, PartialEq, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct RankingConfig {
    pub mode: RankMode,
    pub bin_width: Option<f64>,
    /// Larger value means better (smaller) rank.
    pub descending: bool,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            mode: RankMode::Dense,
            bin_width: None,
            descending: true,
        }
    }
}

/// One axiom evaluator's switch and rule filter. An empty rule list means
/// every rule whose source index is enabled.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct AxiomConfig {
    pub enabled: bool,
    pub rules: Vec<RuleKind>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct AxiomsConfig {
    pub swimmy: AxiomConfig,
    pub sada: AxiomConfig,
}

/// Everything the host passes to the engine.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Builder)]
#[builder(default)]
#[serde(default)]
pub struct EngineConfig {
    pub indices: IndicesConfig,
    pub ranking: RankingConfig,
    /// Explicit player slate; must be a superset of the observed players.
    pub players: Option<Vec<Player>>,
    pub axioms: AxiomsConfig,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Resolve an axiom's rule set against the enabled indices.
    pub(crate) fn resolved_rules(&self, axiom: &AxiomConfig) -> Vec<RuleKind> {
        let requested: Vec<RuleKind> = if axiom.rules.is_empty() {
            RuleKind::ALL.to_vec()
        } else {
            axiom.rules.clone()
        };
        requested
            .into_iter()
            .filter(|rule| self.indices.enabled.contains(&rule.source_index()))
            .collect()
    }

    /// Reject configurations that cannot run before any game is touched.
    pub fn validate(&self) -> Result<()> {
        if self.ranking.mode == RankMode::Bin {
            match self.ranking.bin_width {
                Some(width) if width > 0.0 => {}
                _ => {
                    return Err(MetricsError::InconsistentConfig(
                        "bin ranking requires a positive bin_width".to_string(),
                    ));
                }
            }
        }

        if self.indices.enabled.contains(&IndexKind::ShapleyMc) && self.indices.num_samples == 0 {
            return Err(MetricsError::InconsistentConfig(
                "shapley_mc requires num_samples > 0".to_string(),
            ));
        }

        if let Some(subsets) = &self.indices.subsets {
            if subsets.is_empty() {
                return Err(MetricsError::InconsistentConfig(
                    "subsets override must name at least one coalition".to_string(),
                ));
            }
        }

        for (name, axiom) in [("swimmy", &self.axioms.swimmy), ("sada", &self.axioms.sada)] {
            if axiom.enabled && self.resolved_rules(axiom).is_empty() {
                return Err(MetricsError::InconsistentConfig(format!(
                    "axiom {name} is enabled but none of its rules has an enabled source index"
                )));
            }
        }

        Ok(())
    }
}
