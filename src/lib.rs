//! Line calling for a seven-a-side mixed team.
//!
//! For every point the engine proposes seven players balanced by gender
//! ratio, offense/defense preference and how many points each player has
//! already played, then records who actually played so later suggestions
//! stay fair.
//!
//! The pieces, leaves first:
//!
//! - [`roster`]: players, their attributes and availability.
//! - [`rotation`]: the ratio schedule, the line selector, manual
//!   substitutions and the ledger of confirmed points.
//! - [`state`]: the owned [`Session`](state::Session), the stored schema and
//!   the JSON file store.
//! - [`web`]: a JSON API over one shared session.
//!
//! ```
//! use line_caller::roster::{Gender, Position, Preference};
//! use line_caller::state::Session;
//!
//! let mut session = Session::default();
//! for i in 0..4 {
//!     session.add_player(&format!("M{i}"), Gender::Man, Position::Both, Preference::Either).unwrap();
//!     session.add_player(&format!("W{i}"), Gender::Woman, Position::Both, Preference::Either).unwrap();
//! }
//! assert_eq!(session.suggest().len(), 7);
//! let point = session.confirm().unwrap();
//! assert_eq!(point.line.len(), 7);
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod roster;
pub mod rotation;
pub mod state;
pub mod web;

pub use error::{LineCallerError, Result};
