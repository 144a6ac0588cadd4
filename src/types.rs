use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "csv")]
use tabled::Tabled;

/// Player identifier. Coalitions are bitmasks, so ids must stay below
/// [`MAX_PLAYER_ID`].
pub type Player = u8;

/// Largest admissible player id (bit index into a coalition mask).
pub const MAX_PLAYER_ID: Player = 31;

/// Hard bound on the player count for power-set-exhaustive indices.
pub const MAX_PLAYERS: usize = 12;

/// A set of players encoded as a bitmask; bit k is player k.
///
/// The external representation is the sorted brace-wrapped member list,
/// e.g. `{0,2,3}`. Ordering is lexicographic over the sorted member tuple,
/// so ordered maps keyed by `Coalition` iterate in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coalition(u32);

impl Coalition {
    pub const EMPTY: Coalition = Coalition(0);

    pub fn from_mask(mask: u32) -> Self {
        Coalition(mask)
    }

    pub fn singleton(player: Player) -> Self {
        Coalition(1 << player)
    }

    /// Build a coalition from explicit members. Fails on an id past the
    /// mask width.
    pub fn from_members(members: &[Player]) -> Result<Self, CoalitionParseError> {
        let mut mask = 0u32;
        for &p in members {
            if p > MAX_PLAYER_ID {
                return Err(CoalitionParseError(format!(
                    "player id {p} exceeds the supported maximum of {MAX_PLAYER_ID}"
                )));
            }
            mask |= 1 << p;
        }
        Ok(Coalition(mask))
    }

    pub fn mask(self) -> u32 {
        self.0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, player: Player) -> bool {
        self.0 & (1 << player) != 0
    }

    pub fn with(self, player: Player) -> Self {
        Coalition(self.0 | (1 << player))
    }

    pub fn union(self, other: Coalition) -> Self {
        Coalition(self.0 | other.0)
    }

    pub fn is_subset_of(self, other: Coalition) -> bool {
        self.0 & other.0 == self.0
    }

    /// Members in ascending order.
    pub fn members(self) -> impl Iterator<Item = Player> {
        let mask = self.0;
        (0..=MAX_PLAYER_ID).filter(move |&p| mask & (1 << p) != 0)
    }
}

impl Ord for Coalition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.members().cmp(other.members())
    }
}

impl PartialOrd for Coalition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Coalition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for p in self.members() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{p}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// Failure to parse a coalition literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalitionParseError(pub String);

impl Display for CoalitionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid coalition literal: {}", self.0)
    }
}

impl std::error::Error for CoalitionParseError {}

impl FromStr for Coalition {
    type Err = CoalitionParseError;

    /// Accepts `{0,2,3}`, `(0,2,3)`, `[0,2,3]`, a bare comma list, and the
    /// empty string for the empty coalition. Elements may be quoted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = if (trimmed.starts_with('{') && trimmed.ends_with('}'))
            || (trimmed.starts_with('(') && trimmed.ends_with(')'))
            || (trimmed.starts_with('[') && trimmed.ends_with(']'))
        {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };

        let mut members = Vec::new();
        for part in inner.split(',') {
            let part = part.trim().trim_matches('\'').trim_matches('"');
            if part.is_empty() {
                continue;
            }
            let id: Player = part
                .parse()
                .map_err(|_| CoalitionParseError(s.to_string()))?;
            members.push(id);
        }
        Coalition::from_members(&members).map_err(|_| CoalitionParseError(s.to_string()))
    }
}

impl Serialize for Coalition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coalition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoalitionVisitor;

        impl<'de> serde::de::Visitor<'de> for CoalitionVisitor {
            type Value = Coalition;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a coalition literal such as \"{0,1}\" or a list of player ids")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Coalition, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Coalition, A::Error> {
                let mut members = Vec::new();
                while let Some(id) = seq.next_element::<Player>()? {
                    members.push(id);
                }
                Coalition::from_members(&members).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(CoalitionVisitor)
    }
}

/// Whether a game carries cardinal worths, an ordinal ranking, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameType {
    Tu,
    Ordinal,
    Mixed,
}

/// One row of the input game table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRow {
    pub scenario_id: String,
    pub game_id: String,
    pub coalition: Coalition,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
}

impl GameRow {
    pub fn new(
        scenario_id: impl Into<String>,
        game_id: impl Into<String>,
        coalition: Coalition,
        value: Option<f64>,
        rank: Option<u32>,
    ) -> Self {
        GameRow {
            scenario_id: scenario_id.into(),
            game_id: game_id.into(),
            coalition,
            value,
            rank,
        }
    }
}

#[cfg(feature = "csv")]
fn display_opt<T: Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Per-player output row of the `individuals` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "csv", derive(Tabled))]
pub struct IndividualRow {
    pub scenario_id: String,
    pub game_id: String,
    pub player: Player,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub shapley: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub shapley_rank: Option<u32>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub banzhaf: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub banzhaf_rank: Option<u32>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub ordinal_banzhaf_score: Option<i64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub ordinal_banzhaf_rank: Option<u32>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub lex_cel_theta: Option<String>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub lex_cel_rank: Option<u32>,
}

/// Per-coalition output row of the `coalitions` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "csv", derive(Tabled))]
pub struct CoalitionRow {
    pub scenario_id: String,
    pub game_id: String,
    pub coalition: Coalition,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub value: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub synergy: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub shapley_interaction: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub banzhaf_interaction: Option<f64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub group_ordinal_banzhaf_score: Option<i64>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub group_lexcel_theta: Option<String>,
    #[cfg_attr(feature = "csv", tabled(display = "display_opt"))]
    pub group_lexcel_rank: Option<u32>,
}

/// One axiom-satisfaction summary row, keyed by game and rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "csv", derive(Tabled))]
pub struct AxiomRow {
    pub scenario_id: String,
    pub game_id: String,
    pub rule: String,
    pub triggered_pairs: u64,
    pub satisfied_pairs: u64,
    pub satisfaction_rate: f64,
}

/// Warnings collected while computing a single game.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameDiagnostics {
    pub scenario_id: String,
    pub game_id: String,
    pub warnings: Vec<String>,
}
