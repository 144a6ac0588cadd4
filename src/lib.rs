//! Contribution-metrics engine for cooperative games
//!
//! This library post-processes tabular cooperative-game data into per-player
//! and per-coalition contribution indices: cardinal (Shapley exact and
//! Monte-Carlo, Banzhaf, interaction indices, synergy), ordinal (ordinal
//! Banzhaf, lex-cel, and their coalition-level group variants over the
//! quotient ranking), and axiom-satisfaction summaries (Swimmy and the
//! Synergy–Anasy Distinction).

pub mod axioms;
pub mod cardinal;
pub mod combinatorics;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
#[cfg(feature = "csv")]
pub mod io;
pub mod ordinal;
pub mod ranking;
pub mod types;

// Re-export main types and functions
pub use config::{
    AxiomConfig, AxiomsConfig, EngineConfig, EngineConfigBuilder, IndexKind, IndicesConfig,
    RankingConfig, RuleKind,
};
pub use engine::{MetricsInput, MetricsOutput, PlayerSummary};
pub use error::{ErrorCategory, MetricsError, Result};
pub use game::Game;
pub use ordinal::QuotientRanking;
pub use ranking::RankMode;
pub use types::{
    AxiomRow, Coalition, CoalitionRow, GameDiagnostics, GameRow, GameType, IndividualRow, Player,
};
