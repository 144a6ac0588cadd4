use crate::config::EngineConfigBuilderError;
use crate::types::{Coalition, CoalitionParseError, MAX_PLAYERS};
use thiserror::Error;

/// Error types for the contribution-metrics engine
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Missing required column in the game table
    #[error("Missing required column `{0}` in the game table.")]
    MissingColumn(&'static str),

    /// Duplicate coalition row within one game
    #[error("Duplicate coalition {coalition} in game ({scenario_id}, {game_id}).")]
    DuplicateCoalition {
        scenario_id: String,
        game_id: String,
        coalition: Coalition,
    },

    /// Rank values must be positive integers
    #[error("Rank for coalition {coalition} in game ({scenario_id}, {game_id}) must be a positive integer.")]
    InvalidRank {
        scenario_id: String,
        game_id: String,
        coalition: Coalition,
    },

    /// Values and ranks must cover the same coalitions when both are given
    #[error("Values and ranks of game ({scenario_id}, {game_id}) describe different coalition sets.")]
    RankValueMismatch {
        scenario_id: String,
        game_id: String,
    },

    /// A coalition references a player outside the supplied player list
    #[error("Coalition {coalition} in game ({scenario_id}, {game_id}) is not covered by the configured player list.")]
    PlayerNotListed {
        scenario_id: String,
        game_id: String,
        coalition: Coalition,
    },

    /// Unparseable coalition literal
    #[error(transparent)]
    CoalitionParse(#[from] CoalitionParseError),

    /// Too many players for a power-set-exhaustive index
    #[error("Game ({scenario_id}, {game_id}) has {n} players; exhaustive indices support at most {MAX_PLAYERS}.")]
    GameSizeExceeded {
        scenario_id: String,
        game_id: String,
        n: usize,
    },

    /// Configuration that cannot be executed as requested
    #[error("Inconsistent configuration: {0}")]
    InconsistentConfig(String),

    /// Unknown index name in the configuration
    #[error("Unknown index name: {0}")]
    UnknownIndex(String),

    /// Unknown synergy-comparison rule name in the configuration
    #[error("Unknown synergy-comparison rule: {0}")]
    UnknownRule(String),

    /// Degenerate numerics; reported as a warning, never fatal
    #[error("Degenerate numerics in game ({scenario_id}, {game_id}): {detail}")]
    NumericDegenerate {
        scenario_id: String,
        game_id: String,
        detail: String,
    },

    /// Invariant violation; always fatal
    #[error("Internal invariant violated in game ({scenario_id}, {game_id}): {detail}")]
    Internal {
        scenario_id: String,
        game_id: String,
        detail: String,
    },

    #[error("Engine configuration build error: {0}")]
    ConfigBuild(#[from] EngineConfigBuilderError),

    /// Failure reading or writing a table
    #[cfg(feature = "csv")]
    #[error("Table I/O error: {0}")]
    Table(#[from] csv::Error),

    #[cfg(feature = "csv")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category; the host maps these to CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputSchema,
    GameSizeExceeded,
    InconsistentConfig,
    NumericDegenerate,
    Internal,
}

impl MetricsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MetricsError::MissingColumn(_)
            | MetricsError::DuplicateCoalition { .. }
            | MetricsError::InvalidRank { .. }
            | MetricsError::RankValueMismatch { .. }
            | MetricsError::PlayerNotListed { .. }
            | MetricsError::CoalitionParse(_) => ErrorCategory::InputSchema,
            MetricsError::GameSizeExceeded { .. } => ErrorCategory::GameSizeExceeded,
            MetricsError::InconsistentConfig(_)
            | MetricsError::UnknownIndex(_)
            | MetricsError::UnknownRule(_)
            | MetricsError::ConfigBuild(_) => ErrorCategory::InconsistentConfig,
            MetricsError::NumericDegenerate { .. } => ErrorCategory::NumericDegenerate,
            MetricsError::Internal { .. } => ErrorCategory::Internal,
            #[cfg(feature = "csv")]
            MetricsError::Table(_) | MetricsError::Io(_) => ErrorCategory::InputSchema,
        }
    }

    /// Attach game identity to errors raised from game-agnostic helpers.
    pub(crate) fn with_game(self, scenario_id: &str, game_id: &str) -> Self {
        match self {
            MetricsError::Internal { detail, .. } => MetricsError::Internal {
                scenario_id: scenario_id.to_string(),
                game_id: game_id.to_string(),
                detail,
            },
            other => other,
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, MetricsError>;
