pub mod types;
pub mod registry;

pub use types::{Gender, Player, PlayerEdit, PlayerId, Position, Preference};
pub use registry::Roster;
