use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rotation::Context;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 7;

/// Stable identifier of a player on the roster
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a short random base-36 id
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Gender category used for the line ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "MM")]
    Man,
    #[serde(rename = "W", alias = "WM")]
    Woman,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::Man => "M",
            Gender::Woman => "W",
        }
    }

    /// Parses `M`/`W` as well as the `MM`/`WM` labels shown on the field
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "M" | "MM" => Some(Gender::Man),
            "W" | "WM" => Some(Gender::Woman),
            _ => None,
        }
    }

    /// Label as displayed to the team (`MM`/`WM`)
    pub fn label(self) -> &'static str {
        match self {
            Gender::Man => "MM",
            Gender::Woman => "WM",
        }
    }
}

/// Which position a player can cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Handler,
    Cutter,
    Both,
}

impl Position {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "handler" => Some(Position::Handler),
            "cutter" => Some(Position::Cutter),
            "both" => Some(Position::Both),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Handler => "handler",
            Position::Cutter => "cutter",
            Position::Both => "both",
        }
    }

    /// True when a player with this capability can fill `wanted`
    pub fn covers(self, wanted: Position) -> bool {
        self == wanted || self == Position::Both
    }
}

/// Offense/defense preference of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preference {
    #[serde(rename = "O")]
    Offense,
    #[serde(rename = "D")]
    Defense,
    #[serde(rename = "either")]
    Either,
}

impl Preference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "O" | "o" => Some(Preference::Offense),
            "D" | "d" => Some(Preference::Defense),
            v if v.eq_ignore_ascii_case("either") => Some(Preference::Either),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preference::Offense => "O",
            Preference::Defense => "D",
            Preference::Either => "either",
        }
    }

    /// Rank of this preference for a point played in `context`.
    /// Lower ranks are picked first.
    pub fn rank_for(self, context: Context) -> u8 {
        match (self, context) {
            (Preference::Offense, Context::Offense) | (Preference::Defense, Context::Defense) => 0,
            (Preference::Either, _) => 1,
            _ => 2,
        }
    }
}

/// A player on the roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub gender: Gender,
    pub position: Position,
    pub pref: Preference,
    pub available: bool,
    pub points_played: u32,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        gender: Gender,
        position: Position,
        pref: Preference,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            gender,
            position,
            pref,
            available: true,
            points_played: 0,
        }
    }
}

/// Partial update applied by `Roster::edit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerEdit {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub position: Option<Position>,
    pub pref: Option<Preference>,
}
