use tracing::{info, warn};

use super::types::{CandidateLine, Context, History, HistoryEntry, RatioLabel, RatioSelection, RotationState};
use crate::roster::Roster;

/// How a point was called: the side, the user's ratio selection and the
/// label that selection resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCall {
    pub context: Context,
    pub selection: RatioSelection,
    pub ratio: RatioLabel,
}

/// Records `line` as played.
///
/// Every player on the line gains one point played, a history entry is
/// appended and the next point switches sides. The ratio selection is kept
/// as is so auto mode keeps advancing. An empty line records nothing.
pub fn confirm(
    roster: &mut Roster,
    history: &mut History,
    rotation: &mut RotationState,
    line: &CandidateLine,
    call: PointCall,
    timestamp: i64,
) -> Option<HistoryEntry> {
    if line.is_empty() {
        return None;
    }

    for id in line.players() {
        match roster.get_mut(id) {
            Some(player) => player.points_played += 1,
            None => warn!(player = %id, "confirmed line names a player missing from the roster"),
        }
    }

    let entry = HistoryEntry {
        timestamp,
        line: line.players().to_vec(),
        context: call.context,
        ratio: call.ratio,
    };
    history.push(entry.clone());

    rotation.next_context = call.context.flip();
    rotation.next_ratio_selection = call.selection;

    info!(
        point = history.len(),
        context = %call.context,
        ratio = %call.ratio,
        players = entry.line.len(),
        "point confirmed"
    );
    Some(entry)
}

/// Removes the newest point and gives back the points it added.
///
/// Counters never drop below zero. The rotation state is left alone, so the
/// next point keeps the side chosen after the undone confirmation.
pub fn undo(roster: &mut Roster, history: &mut History) -> Option<HistoryEntry> {
    let entry = history.pop()?;
    for id in &entry.line {
        if let Some(player) = roster.get_mut(id) {
            player.points_played = player.points_played.saturating_sub(1);
        }
    }
    info!(remaining = history.len(), players = entry.line.len(), "point undone");
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Gender, PlayerId, Position, Preference};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster_of(count: usize) -> (Roster, Vec<PlayerId>) {
        let mut rng = StdRng::seed_from_u64(3);
        let mut roster = Roster::default();
        let ids = (0..count)
            .map(|i| {
                let gender = if i % 2 == 0 { Gender::Man } else { Gender::Woman };
                roster
                    .add(&format!("P{i}"), gender, Position::Both, Preference::Either, &mut rng)
                    .unwrap()
            })
            .collect();
        (roster, ids)
    }

    fn call(context: Context) -> PointCall {
        PointCall {
            context,
            selection: RatioSelection::Auto,
            ratio: RatioLabel::ThreeMenFourWomen,
        }
    }

    #[test]
    fn confirm_counts_players_and_flips_context() {
        let (mut roster, ids) = roster_of(9);
        let mut history = History::default();
        let mut rotation = RotationState::default();
        let line = CandidateLine::from_ids(ids[..7].to_vec(), None);

        let entry = confirm(&mut roster, &mut history, &mut rotation, &line, call(Context::Offense), 1_000)
            .unwrap();

        assert_eq!(entry.line, ids[..7].to_vec());
        assert_eq!(entry.context, Context::Offense);
        assert_eq!(entry.ratio, RatioLabel::ThreeMenFourWomen);
        assert_eq!(entry.timestamp, 1_000);
        assert_eq!(history.len(), 1);
        assert_eq!(rotation.next_context, Context::Defense);
        assert_eq!(rotation.next_ratio_selection, RatioSelection::Auto);

        for id in &ids[..7] {
            assert_eq!(roster.get(id).unwrap().points_played, 1);
        }
        for id in &ids[7..] {
            assert_eq!(roster.get(id).unwrap().points_played, 0);
        }
    }

    #[test]
    fn empty_line_is_a_no_op() {
        let (mut roster, _) = roster_of(3);
        let mut history = History::default();
        let mut rotation = RotationState::default();
        let before = rotation;

        let entry = confirm(
            &mut roster,
            &mut history,
            &mut rotation,
            &CandidateLine::default(),
            call(Context::Offense),
            0,
        );
        assert!(entry.is_none());
        assert!(history.is_empty());
        assert_eq!(rotation, before);
    }

    #[test]
    fn undo_on_empty_history_reports_nothing() {
        let (mut roster, _) = roster_of(2);
        let mut history = History::default();
        assert!(undo(&mut roster, &mut history).is_none());
    }

    #[test]
    fn undo_clamps_at_zero_and_keeps_rotation() {
        let (mut roster, ids) = roster_of(2);
        let mut history = History::default();
        let mut rotation = RotationState::default();
        let line = CandidateLine::from_ids(ids.clone(), None);
        confirm(&mut roster, &mut history, &mut rotation, &line, call(Context::Offense), 5).unwrap();

        roster.get_mut(&ids[0]).unwrap().points_played = 0;
        let removed = undo(&mut roster, &mut history).unwrap();

        assert_eq!(removed.line, ids);
        assert_eq!(roster.get(&ids[0]).unwrap().points_played, 0);
        assert_eq!(roster.get(&ids[1]).unwrap().points_played, 0);
        assert_eq!(rotation.next_context, Context::Defense);
    }

    #[test]
    fn undo_skips_deleted_players() {
        let (mut roster, ids) = roster_of(3);
        let mut history = History::default();
        let mut rotation = RotationState::default();
        let line = CandidateLine::from_ids(ids.clone(), None);
        confirm(&mut roster, &mut history, &mut rotation, &line, call(Context::Defense), 5).unwrap();

        roster.remove(&ids[1]).unwrap();
        undo(&mut roster, &mut history).unwrap();
        assert_eq!(roster.get(&ids[0]).unwrap().points_played, 0);
        assert_eq!(roster.len(), 2);
    }

    proptest! {
        #[test]
        fn undo_restores_counters_after_confirm(
            start in proptest::collection::vec(0u32..50, 10),
            picks in proptest::collection::btree_set(0usize..10, 1..=7),
        ) {
            let (mut roster, ids) = roster_of(10);
            for (id, points) in ids.iter().zip(&start) {
                roster.get_mut(id).unwrap().points_played = *points;
            }
            let mut history = History::default();
            let mut rotation = RotationState::default();
            let line = CandidateLine::from_ids(picks.iter().map(|&i| ids[i].clone()).collect(), None);

            confirm(&mut roster, &mut history, &mut rotation, &line, call(Context::Offense), 0).unwrap();
            for (i, id) in ids.iter().enumerate() {
                let expected = start[i] + u32::from(picks.contains(&i));
                prop_assert_eq!(roster.get(id).unwrap().points_played, expected);
            }

            undo(&mut roster, &mut history).unwrap();
            prop_assert!(history.is_empty());
            for (id, points) in ids.iter().zip(&start) {
                prop_assert_eq!(roster.get(id).unwrap().points_played, *points);
            }
        }
    }
}
