use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use super::types::{CandidateLine, Context, Ratio, RatioLabel, LINE_SIZE};
use crate::roster::{Gender, Player, PlayerId};

/// Ordering used to pick players for a point in `context`.
///
/// Players preferring `context` come first, then `either`, then the other
/// side. Within a rank the player with fewer points played goes first.
pub fn compare_for_context(context: Context) -> impl Fn(&&Player, &&Player) -> Ordering {
    move |a, b| {
        a.pref
            .rank_for(context)
            .cmp(&b.pref.rank_for(context))
            .then(a.points_played.cmp(&b.points_played))
    }
}

/// Picks up to seven available players for `ratio`.
///
/// Each gender pool contributes up to its target count. Any shortfall is
/// filled from every remaining available player, so the result only has
/// fewer than seven players when fewer than seven are available.
pub fn select_players(players: &[Player], context: Context, ratio: Ratio) -> Vec<PlayerId> {
    let cmp = compare_for_context(context);

    let available: Vec<&Player> = players.iter().filter(|p| p.available).collect();

    let mut men: Vec<&Player> = available
        .iter()
        .copied()
        .filter(|p| p.gender == Gender::Man)
        .collect();
    let mut women: Vec<&Player> = available
        .iter()
        .copied()
        .filter(|p| p.gender == Gender::Woman)
        .collect();
    men.sort_by(&cmp);
    women.sort_by(&cmp);

    let mut chosen: Vec<&Player> = Vec::with_capacity(LINE_SIZE);
    chosen.extend(men.iter().take(ratio.men.min(LINE_SIZE)));
    chosen.extend(women.iter().take(ratio.women.min(LINE_SIZE - chosen.len())));

    if chosen.len() < LINE_SIZE {
        let taken: HashSet<&PlayerId> = chosen.iter().map(|p| &p.id).collect();
        let mut rest: Vec<&Player> = available
            .iter()
            .copied()
            .filter(|p| !taken.contains(&p.id))
            .collect();
        rest.sort_by(&cmp);

        let missing = LINE_SIZE - chosen.len();
        debug!(missing, pool = rest.len(), "filling line beyond ratio targets");
        chosen.extend(rest.into_iter().take(missing));
    }

    chosen.into_iter().map(|p| p.id.clone()).collect()
}

/// Suggests a line for `label`, remembering the label on the line
pub fn suggest_line(players: &[Player], context: Context, label: RatioLabel) -> CandidateLine {
    let ids = select_players(players, context, label.ratio());
    debug!(context = %context, ratio = %label, size = ids.len(), "suggested line");
    CandidateLine::from_ids(ids, Some(label))
}
