use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::roster::PlayerId;

/// Number of players on the field for a point
pub const LINE_SIZE: usize = 7;

/// Whether the team starts the point on offense or defense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Context {
    #[default]
    #[serde(rename = "O")]
    Offense,
    #[serde(rename = "D")]
    Defense,
}

impl Context {
    pub fn flip(self) -> Self {
        match self {
            Context::Offense => Context::Defense,
            Context::Defense => Context::Offense,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Context::Offense => "O",
            Context::Defense => "D",
        }
    }
}

impl FromStr for Context {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "O" | "o" => Ok(Context::Offense),
            "D" | "d" => Ok(Context::Defense),
            other => Err(format!("unknown context '{}', expected O or D", other)),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target head count per gender for a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub men: usize,
    pub women: usize,
}

impl Ratio {
    pub fn new(men: usize, women: usize) -> Self {
        Self { men, women }
    }
}

/// One of the two ratio labels a line can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RatioLabel {
    #[default]
    FourMenThreeWomen,
    ThreeMenFourWomen,
}

impl RatioLabel {
    pub fn flip(self) -> Self {
        match self {
            RatioLabel::FourMenThreeWomen => RatioLabel::ThreeMenFourWomen,
            RatioLabel::ThreeMenFourWomen => RatioLabel::FourMenThreeWomen,
        }
    }

    pub fn ratio(self) -> Ratio {
        match self {
            RatioLabel::FourMenThreeWomen => Ratio::new(4, 3),
            RatioLabel::ThreeMenFourWomen => Ratio::new(3, 4),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatioLabel::FourMenThreeWomen => "4M-3W",
            RatioLabel::ThreeMenFourWomen => "3M-4W",
        }
    }
}

impl FromStr for RatioLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "4M-3W" => Ok(RatioLabel::FourMenThreeWomen),
            "3M-4W" => Ok(RatioLabel::ThreeMenFourWomen),
            other => Err(format!("unknown ratio '{}', expected 4M-3W or 3M-4W", other)),
        }
    }
}

impl TryFrom<String> for RatioLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RatioLabel> for String {
    fn from(value: RatioLabel) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RatioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio choice for the next point: a fixed label or the auto alternation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RatioSelection {
    Fixed(RatioLabel),
    Auto,
}

impl Default for RatioSelection {
    fn default() -> Self {
        RatioSelection::Fixed(RatioLabel::default())
    }
}

impl FromStr for RatioSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(RatioSelection::Auto);
        }
        s.parse().map(RatioSelection::Fixed)
    }
}

impl TryFrom<String> for RatioSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RatioSelection> for String {
    fn from(value: RatioSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RatioSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioSelection::Fixed(label) => f.write_str(label.as_str()),
            RatioSelection::Auto => f.write_str("auto"),
        }
    }
}

/// A confirmed point. Never edited once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub line: Vec<PlayerId>,
    pub context: Context,
    pub ratio: RatioLabel,
}

/// Points played so far, oldest first.
///
/// Only appending and popping the newest entry are possible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Most recent entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(count)
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }
}

/// What the next point will be played with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationState {
    pub next_context: Context,
    #[serde(rename = "nextRatio")]
    pub next_ratio_selection: RatioSelection,
    /// Seed of the auto alternation; follows the last fixed ratio picked
    pub auto_base: RatioLabel,
}

impl RotationState {
    /// Records the user's ratio pick. A fixed pick also re-seeds auto mode.
    pub fn select_ratio(&mut self, selection: RatioSelection) {
        self.next_ratio_selection = selection;
        if let RatioSelection::Fixed(label) = selection {
            self.auto_base = label;
        }
    }
}

/// A proposed line that has not been played yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLine {
    players: Vec<PlayerId>,
    /// Ratio the line was built for, if it came from a suggestion
    pub target: Option<RatioLabel>,
}

impl CandidateLine {
    pub fn new(target: Option<RatioLabel>) -> Self {
        Self {
            players: Vec::new(),
            target,
        }
    }

    pub(crate) fn from_ids(players: Vec<PlayerId>, target: Option<RatioLabel>) -> Self {
        Self { players, target }
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= LINE_SIZE
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains(id)
    }

    pub(crate) fn players_mut(&mut self) -> &mut Vec<PlayerId> {
        &mut self.players
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_selection_parses_labels_and_auto() {
        assert_eq!(
            "3M-4W".parse::<RatioSelection>().unwrap(),
            RatioSelection::Fixed(RatioLabel::ThreeMenFourWomen)
        );
        assert_eq!("auto".parse::<RatioSelection>().unwrap(), RatioSelection::Auto);
        assert!("5M-2W".parse::<RatioSelection>().is_err());
    }

    #[test]
    fn rotation_state_serializes_with_stored_names() {
        let state = RotationState {
            next_context: Context::Defense,
            next_ratio_selection: RatioSelection::Auto,
            auto_base: RatioLabel::ThreeMenFourWomen,
        };
        let value = serde_json::to_value(state).unwrap();
        assert_eq!(value["nextContext"], "D");
        assert_eq!(value["nextRatio"], "auto");
        assert_eq!(value["autoBase"], "3M-4W");
    }

    #[test]
    fn fixed_pick_reseeds_auto_base() {
        let mut state = RotationState::default();
        state.select_ratio(RatioSelection::Fixed(RatioLabel::ThreeMenFourWomen));
        assert_eq!(state.auto_base, RatioLabel::ThreeMenFourWomen);

        state.select_ratio(RatioSelection::Auto);
        assert_eq!(state.next_ratio_selection, RatioSelection::Auto);
        assert_eq!(state.auto_base, RatioLabel::ThreeMenFourWomen);
    }
}
