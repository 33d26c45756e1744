use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::schema::{migrate, PersistedState, SCHEMA_VERSION};
use crate::error::{LineCallerError, Result};
use crate::roster::{Gender, Player, PlayerEdit, PlayerId, Position, Preference, Roster};
use crate::rotation::{
    self, resolve_ratio, CandidateLine, Context, History, HistoryEntry, PointCall, PoolFilter,
    RatioLabel, RatioSelection, RotationState, LINE_SIZE,
};

/// Everything that survives between sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub roster: Roster,
    pub history: History,
    pub rotation: RotationState,
    /// Front-end preferences, stored but never interpreted here
    pub ui: Option<Value>,
}

impl From<PersistedState> for AppState {
    fn from(stored: PersistedState) -> Self {
        Self {
            roster: stored.players,
            history: stored.history,
            rotation: stored.rotation,
            ui: stored.ui,
        }
    }
}

impl AppState {
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            schema_version: SCHEMA_VERSION,
            players: self.roster.clone(),
            history: self.history.clone(),
            rotation: self.rotation,
            ui: self.ui.clone(),
        }
    }
}

/// Head count of the line being built, for the "short line" warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    pub size: usize,
    pub men: usize,
    pub women: usize,
    pub target: Option<RatioLabel>,
    pub short: bool,
}

/// The application state plus the line currently being put together.
///
/// All mutation goes through `&mut self`, so there is one writer at a time.
/// Each method validates before touching anything.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: AppState,
    line: CandidateLine,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            line: CandidateLine::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn into_state(self) -> AppState {
        self.state
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn rotation(&self) -> &RotationState {
        &self.state.rotation
    }

    pub fn line(&self) -> &CandidateLine {
        &self.line
    }

    /// Players on the line in slot order
    pub fn line_players(&self) -> Vec<&Player> {
        self.line
            .players()
            .iter()
            .filter_map(|id| self.state.roster.get(id))
            .collect()
    }

    pub fn line_summary(&self) -> LineSummary {
        let players = self.line_players();
        let men = players.iter().filter(|p| p.gender == Gender::Man).count();
        LineSummary {
            size: players.len(),
            men,
            women: players.len() - men,
            target: self.line.target,
            short: players.len() < LINE_SIZE,
        }
    }

    // Roster

    pub fn add_player(
        &mut self,
        name: &str,
        gender: Gender,
        position: Position,
        pref: Preference,
    ) -> Result<PlayerId> {
        let id = self
            .state
            .roster
            .add(name, gender, position, pref, &mut rand::thread_rng())?;
        info!(player = %id, "player added");
        Ok(id)
    }

    pub fn edit_player(&mut self, id: &PlayerId, edit: PlayerEdit) -> Result<()> {
        self.state.roster.edit(id, edit)
    }

    pub fn set_available(&mut self, id: &PlayerId, available: bool) -> Result<()> {
        self.state.roster.set_available(id, available)
    }

    pub fn toggle_available(&mut self, id: &PlayerId) -> Result<bool> {
        self.state.roster.toggle_available(id)
    }

    /// Deletes a player and takes them off the line being built.
    /// Recorded points keep their id.
    pub fn delete_player(&mut self, id: &PlayerId) -> Result<Player> {
        let removed = self.state.roster.remove(id)?;
        self.line = rotation::remove(&self.line, id);
        info!(player = %id, "player deleted");
        Ok(removed)
    }

    // Rotation settings

    pub fn set_context(&mut self, context: Context) {
        self.state.rotation.next_context = context;
    }

    pub fn select_ratio(&mut self, selection: RatioSelection) {
        self.state.rotation.select_ratio(selection);
    }

    /// Ratio label the next point should be played with
    pub fn next_ratio(&self) -> RatioLabel {
        let rotation = &self.state.rotation;
        resolve_ratio(
            rotation.next_ratio_selection,
            self.state.history.len(),
            rotation.auto_base,
        )
    }

    // Line building

    /// Replaces the line with a fresh suggestion for the next point
    pub fn suggest(&mut self) -> &CandidateLine {
        let label = self.next_ratio();
        self.line = rotation::suggest_line(
            self.state.roster.players(),
            self.state.rotation.next_context,
            label,
        );
        &self.line
    }

    pub fn substitution_pool(&self, filter: &PoolFilter) -> Vec<&Player> {
        rotation::substitution_pool(self.state.roster.players(), &self.line, filter)
    }

    /// Swaps `incoming` in for `outgoing`, or appends it when `outgoing` is None
    pub fn substitute(
        &mut self,
        outgoing: Option<&PlayerId>,
        incoming: &PlayerId,
        filter: &PoolFilter,
    ) -> Result<&CandidateLine> {
        if !self.state.roster.contains(incoming) {
            return Err(LineCallerError::UnknownPlayer(incoming.clone()));
        }
        self.line = rotation::substitute(
            &self.line,
            outgoing,
            incoming,
            self.state.roster.players(),
            filter,
        )?;
        Ok(&self.line)
    }

    pub fn remove_from_line(&mut self, id: &PlayerId) -> &CandidateLine {
        self.line = rotation::remove(&self.line, id);
        &self.line
    }

    pub fn clear_line(&mut self) {
        self.line = CandidateLine::default();
    }

    // Ledger

    /// Records the current line as played now
    pub fn confirm(&mut self) -> Option<HistoryEntry> {
        self.confirm_at(Utc::now().timestamp_millis())
    }

    /// Records the current line as played at `timestamp` (epoch millis).
    ///
    /// In auto mode the point keeps the label the line was suggested for; a
    /// line built by hand gets the label auto mode gives this point.
    pub fn confirm_at(&mut self, timestamp: i64) -> Option<HistoryEntry> {
        let current = self.state.rotation;
        let ratio = match current.next_ratio_selection {
            RatioSelection::Fixed(label) => label,
            RatioSelection::Auto => self.line.target.unwrap_or_else(|| self.next_ratio()),
        };
        let call = PointCall {
            context: current.next_context,
            selection: current.next_ratio_selection,
            ratio,
        };

        let entry = rotation::confirm(
            &mut self.state.roster,
            &mut self.state.history,
            &mut self.state.rotation,
            &self.line,
            call,
            timestamp,
        )?;
        self.clear_line();
        Some(entry)
    }

    /// Takes back the last recorded point, if any
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        let entry = rotation::undo(&mut self.state.roster, &mut self.state.history)?;
        self.clear_line();
        Some(entry)
    }

    // Import / export

    pub fn export(&self) -> PersistedState {
        self.state.to_persisted()
    }

    /// Replaces the whole state with an imported document.
    /// On error nothing changes.
    pub fn import(&mut self, document: &Value) -> Result<()> {
        let imported = migrate(document, &mut rand::thread_rng())?;
        info!(
            players = imported.players.len(),
            points = imported.history.len(),
            "state imported"
        );
        self.state = AppState::from(imported);
        self.clear_line();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn team(men: usize, women: usize) -> Session {
        let mut session = Session::default();
        for i in 0..men {
            session
                .add_player(&format!("M{i}"), Gender::Man, Position::Both, Preference::Either)
                .unwrap();
        }
        for i in 0..women {
            session
                .add_player(&format!("W{i}"), Gender::Woman, Position::Both, Preference::Either)
                .unwrap();
        }
        session
    }

    #[test]
    fn suggest_uses_next_context_and_ratio() {
        let mut session = team(4, 3);
        let line = session.suggest().clone();
        assert_eq!(line.len(), 7);
        assert_eq!(line.target, Some(RatioLabel::FourMenThreeWomen));

        let summary = session.line_summary();
        assert_eq!((summary.men, summary.women), (4, 3));
        assert!(!summary.short);
    }

    #[test]
    fn auto_mode_advances_with_each_point() {
        let mut session = team(8, 8);
        session.select_ratio(RatioSelection::Auto);

        let mut labels = Vec::new();
        for t in 0..5 {
            let target = session.suggest().target;
            labels.push(target.unwrap());
            let entry = session.confirm_at(t).unwrap();
            assert_eq!(Some(entry.ratio), target);
        }
        use RatioLabel::{FourMenThreeWomen as F, ThreeMenFourWomen as T};
        assert_eq!(labels, vec![F, T, T, F, F]);
        assert_eq!(session.rotation().next_ratio_selection, RatioSelection::Auto);
    }

    #[test]
    fn fixed_pick_restarts_auto_sequence() {
        let mut session = team(8, 8);
        session.select_ratio(RatioSelection::Fixed(RatioLabel::ThreeMenFourWomen));
        session.select_ratio(RatioSelection::Auto);
        assert_eq!(session.next_ratio(), RatioLabel::ThreeMenFourWomen);
    }

    #[test]
    fn confirm_alternates_context_and_clears_line() {
        let mut session = team(4, 3);
        session.suggest();
        let first = session.confirm_at(1).unwrap();
        assert_eq!(first.context, Context::Offense);
        assert!(session.line().is_empty());

        session.suggest();
        let second = session.confirm_at(2).unwrap();
        assert_eq!(second.context, Context::Defense);
        assert_eq!(session.rotation().next_context, Context::Offense);
    }

    #[test]
    fn confirming_empty_line_changes_nothing() {
        let mut session = team(2, 2);
        assert!(session.confirm_at(1).is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.rotation().next_context, Context::Offense);
    }

    #[test]
    fn deleting_player_drops_them_from_line_only() {
        let mut session = team(4, 3);
        session.suggest();
        session.confirm_at(1).unwrap();
        let line = session.suggest().clone();
        let gone = line.players()[0].clone();

        session.delete_player(&gone).unwrap();
        assert!(!session.line().contains(&gone));
        assert_eq!(session.line().len(), 6);
        assert!(session.history().entries()[0].line.contains(&gone));
    }

    #[test]
    fn hand_built_line_can_be_confirmed() {
        let mut session = team(2, 0);
        let ids: Vec<PlayerId> = session.roster().players().iter().map(|p| p.id.clone()).collect();
        session.substitute(None, &ids[0], &PoolFilter::default()).unwrap();
        session.substitute(None, &ids[1], &PoolFilter::default()).unwrap();
        let summary = session.line_summary();
        assert!(summary.short);
        assert_eq!(summary.target, None);

        let entry = session.confirm_at(9).unwrap();
        assert_eq!(entry.ratio, RatioLabel::FourMenThreeWomen);
        assert!(session.roster().players().iter().all(|p| p.points_played == 1));
    }

    #[test]
    fn substitute_unknown_player_is_rejected() {
        let mut session = team(1, 0);
        let err = session
            .substitute(None, &PlayerId::new("nobody"), &PoolFilter::default())
            .unwrap_err();
        assert!(matches!(err, LineCallerError::UnknownPlayer(_)));
    }

    #[test]
    fn undo_clears_line_and_restores_counts() {
        let mut session = team(4, 3);
        session.suggest();
        session.confirm_at(1).unwrap();
        session.suggest();

        let removed = session.undo().unwrap();
        assert_eq!(removed.line.len(), 7);
        assert!(session.line().is_empty());
        assert!(session.roster().players().iter().all(|p| p.points_played == 0));
        assert!(session.undo().is_none());
    }

    #[test]
    fn failed_import_keeps_state() {
        let mut session = team(3, 3);
        session.suggest();
        let before = session.state().clone();

        let err = session.import(&json!({"players": "nope"})).unwrap_err();
        assert!(matches!(err, LineCallerError::MalformedImport(_)));
        assert_eq!(session.state(), &before);
        assert_eq!(session.line().len(), 6);
    }

    #[test]
    fn import_replaces_state_and_clears_line() {
        let mut session = team(3, 3);
        session.suggest();
        session
            .import(&json!({"players": [{"id": "z", "name": "Zed", "gender": "M"}]}))
            .unwrap();
        assert_eq!(session.roster().len(), 1);
        assert!(session.history().is_empty());
        assert!(session.line().is_empty());
        assert_eq!(session.rotation(), &RotationState::default());
    }

    #[test]
    fn export_then_import_round_trips() {
        let mut session = team(4, 4);
        session.select_ratio(RatioSelection::Auto);
        session.suggest();
        session.confirm_at(42).unwrap();

        let exported = serde_json::to_value(session.export()).unwrap();
        let mut other = Session::default();
        other.import(&exported).unwrap();
        assert_eq!(other.state(), session.state());
    }
}
