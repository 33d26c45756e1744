use std::fs;

use line_caller::roster::{Gender, Position, Preference};
use line_caller::rotation::{Context, RatioLabel, RatioSelection};
use line_caller::state::{AppState, Session, StateStore, SCHEMA_VERSION};
use serde_json::{json, Value};
use tempfile::tempdir;

#[test]
fn missing_file_loads_empty_state() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    assert_eq!(store.load(), AppState::default());
}

#[test]
fn saved_state_loads_back() {
    let dir = tempdir().unwrap();
    let store = StateStore::new(dir.path().join("nested").join("state.json"));

    let mut session = Session::default();
    for i in 0..4 {
        session
            .add_player(&format!("M{i}"), Gender::Man, Position::Handler, Preference::Offense)
            .unwrap();
        session
            .add_player(&format!("W{i}"), Gender::Woman, Position::Cutter, Preference::Defense)
            .unwrap();
    }
    session.select_ratio(RatioSelection::Fixed(RatioLabel::ThreeMenFourWomen));
    session.suggest();
    session.confirm_at(1_700_000_000_000).unwrap();
    store.save(session.state()).unwrap();

    let loaded = store.try_load().unwrap();
    assert_eq!(&loaded, session.state());
    assert_eq!(loaded.rotation.next_context, Context::Defense);
    assert_eq!(loaded.rotation.auto_base, RatioLabel::ThreeMenFourWomen);

    let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(raw["nextRatio"], "3M-4W");
    assert_eq!(raw["history"][0]["timestamp"], 1_700_000_000_000_i64);
    assert_eq!(raw["players"][0]["pref"], "O");
}

#[test]
fn legacy_document_without_version_is_migrated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let legacy = json!({
        "players": [
            {"id": "k2x9a1b", "name": "Robin", "gender": "W", "position": "handler", "pref": "O"},
            {"id": "p0q8z7y", "name": "Sam", "gender": "M", "position": "both", "pref": "either", "pointsPlayed": 3, "available": false}
        ],
        "history": [
            {"timestamp": 1, "line": ["p0q8z7y"], "context": "O", "ratio": "4M-3W"}
        ],
        "nextContext": "D",
        "nextRatio": "auto",
        "ui": {"rosterCollapsed": true}
    });
    fs::write(&path, legacy.to_string()).unwrap();

    let state = StateStore::new(&path).try_load().unwrap();
    assert_eq!(state.roster.len(), 2);
    assert_eq!(state.roster.players()[0].points_played, 0);
    assert!(state.roster.players()[0].available);
    assert!(!state.roster.players()[1].available);
    assert_eq!(state.rotation.next_ratio_selection, RatioSelection::Auto);
    assert_eq!(state.rotation.auto_base, RatioLabel::FourMenThreeWomen);
    assert_eq!(state.ui, Some(json!({"rosterCollapsed": true})));
}

#[test]
fn corrupt_file_starts_fresh() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(&path, "{ not json").unwrap();

    let store = StateStore::new(&path);
    assert!(store.try_load().is_err());
    assert_eq!(store.load(), AppState::default());
    assert!(!path.exists());
    assert_eq!(fs::read_to_string(dir.path().join("state.json.bad")).unwrap(), "{ not json");
}

#[test]
fn unreadable_file_survives_the_next_save() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let original = json!({
        "schemaVersion": 1,
        "players": [
            {"id": "a", "name": "Ana", "gender": "W", "pointsPlayed": 5},
            {"id": "b", "name": "Bo", "gender": "Q", "pointsPlayed": 4}
        ],
        "history": [{"timestamp": 1, "line": ["a", "b"], "context": "O", "ratio": "4M-3W"}]
    })
    .to_string();
    fs::write(&path, &original).unwrap();

    let store = StateStore::new(&path);
    let mut session = Session::new(store.load());
    assert!(session.roster().is_empty());
    session
        .add_player("Cy", Gender::Man, Position::Both, Preference::Either)
        .unwrap();
    store.save(session.state()).unwrap();

    assert_eq!(fs::read_to_string(store.rejected_path()).unwrap(), original);
    assert_eq!(store.try_load().unwrap().roster.len(), 1);
}

#[test]
fn blank_position_keeps_the_roster() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        json!({
            "schemaVersion": 1,
            "players": [
                {"id": "a", "name": "Ana", "gender": "W", "position": "", "pointsPlayed": 5},
                {"id": "b", "name": "Bo", "gender": "M", "position": "cutter", "pointsPlayed": 4.0}
            ],
            "history": [{"timestamp": 1, "line": ["a", "b"], "context": "O", "ratio": "4M-3W"}]
        })
        .to_string(),
    )
    .unwrap();

    let store = StateStore::new(&path);
    let state = store.load();
    assert_eq!(state.roster.len(), 2);
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.roster.players()[0].position, Position::Both);
    assert_eq!(state.roster.players()[0].points_played, 5);
    assert_eq!(state.roster.players()[1].points_played, 4);
    assert!(!store.rejected_path().exists());
}
