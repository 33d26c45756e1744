use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::{Gender, Player, PlayerEdit, PlayerId, Position, Preference};
use crate::error::{LineCallerError, Result};

/// The team roster, kept in insertion order.
///
/// Insertion order matters: the line selector breaks ranking ties by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn available(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.available)
    }

    /// Players sorted by name, for listing
    pub fn sorted_by_name(&self) -> Vec<&Player> {
        let mut sorted: Vec<&Player> = self.players.iter().collect();
        sorted.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        sorted
    }

    /// Adds a new available player with zero points played
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        gender: Gender,
        position: Position,
        pref: Preference,
        rng: &mut R,
    ) -> Result<PlayerId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LineCallerError::InvalidPlayer("name is required".to_string()));
        }

        let id = self.fresh_id(rng);
        self.players
            .push(Player::new(id.clone(), name, gender, position, pref));
        Ok(id)
    }

    /// Generates an id not yet used on this roster
    pub fn fresh_id<R: Rng + ?Sized>(&self, rng: &mut R) -> PlayerId {
        loop {
            let id = PlayerId::generate(rng);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Applies an edit. A blank name keeps the current name.
    pub fn edit(&mut self, id: &PlayerId, edit: PlayerEdit) -> Result<()> {
        let player = self
            .get_mut(id)
            .ok_or_else(|| LineCallerError::UnknownPlayer(id.clone()))?;

        if let Some(name) = edit.name {
            let name = name.trim();
            if !name.is_empty() {
                player.name = name.to_string();
            }
        }
        if let Some(gender) = edit.gender {
            player.gender = gender;
        }
        if let Some(position) = edit.position {
            player.position = position;
        }
        if let Some(pref) = edit.pref {
            player.pref = pref;
        }
        Ok(())
    }

    pub fn set_available(&mut self, id: &PlayerId, available: bool) -> Result<()> {
        let player = self
            .get_mut(id)
            .ok_or_else(|| LineCallerError::UnknownPlayer(id.clone()))?;
        player.available = available;
        Ok(())
    }

    /// Flips availability and returns the new value
    pub fn toggle_available(&mut self, id: &PlayerId) -> Result<bool> {
        let player = self
            .get_mut(id)
            .ok_or_else(|| LineCallerError::UnknownPlayer(id.clone()))?;
        player.available = !player.available;
        Ok(player.available)
    }

    pub fn remove(&mut self, id: &PlayerId) -> Result<Player> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| LineCallerError::UnknownPlayer(id.clone()))?;
        Ok(self.players.remove(index))
    }
}
