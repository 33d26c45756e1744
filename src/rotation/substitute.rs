use serde::Deserialize;

use super::types::CandidateLine;
use crate::error::{LineCallerError, Result};
use crate::roster::{Gender, Player, PlayerId, Position};

/// Narrows the substitution pool shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PoolFilter {
    pub gender: Option<Gender>,
    /// Players listed as `both` always match a position filter
    pub position: Option<Position>,
}

impl PoolFilter {
    pub fn matches(&self, player: &Player) -> bool {
        self.gender.map_or(true, |g| player.gender == g)
            && self.position.map_or(true, |pos| player.position.covers(pos))
    }
}

/// Available players not on the line that pass `filter`, fewest points first
pub fn substitution_pool<'a>(
    players: &'a [Player],
    line: &CandidateLine,
    filter: &PoolFilter,
) -> Vec<&'a Player> {
    let mut pool: Vec<&Player> = players
        .iter()
        .filter(|p| p.available && !line.contains(&p.id) && filter.matches(p))
        .collect();
    pool.sort_by_key(|p| p.points_played);
    pool
}

/// Puts `incoming` on the line.
///
/// With `outgoing` set, `incoming` takes that player's slot. Without it,
/// `incoming` is appended, which fails once the line is full.
pub fn substitute(
    line: &CandidateLine,
    outgoing: Option<&PlayerId>,
    incoming: &PlayerId,
    players: &[Player],
    filter: &PoolFilter,
) -> Result<CandidateLine> {
    let eligible = substitution_pool(players, line, filter)
        .iter()
        .any(|p| p.id == *incoming);
    if !eligible {
        return Err(LineCallerError::NotEligible(incoming.clone()));
    }

    let mut next = line.clone();
    match outgoing {
        Some(out) => {
            let slot = next
                .players()
                .iter()
                .position(|id| id == out)
                .ok_or_else(|| LineCallerError::NotInLine(out.clone()))?;
            next.players_mut()[slot] = incoming.clone();
        }
        None => {
            if next.is_full() {
                return Err(LineCallerError::LineFull);
            }
            next.players_mut().push(incoming.clone());
        }
    }
    Ok(next)
}

/// Drops `id` from the line; the line may shrink below seven
pub fn remove(line: &CandidateLine, id: &PlayerId) -> CandidateLine {
    let mut next = line.clone();
    next.players_mut().retain(|p| p != id);
    next
}
