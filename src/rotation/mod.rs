pub mod types;
pub mod ratio;
pub mod selector;
pub mod substitute;
pub mod ledger;

pub use types::{
    CandidateLine, Context, History, HistoryEntry, Ratio, RatioLabel, RatioSelection,
    RotationState, LINE_SIZE,
};
pub use ratio::{auto_ratio, resolve_ratio};
pub use selector::{compare_for_context, select_players, suggest_line};
pub use substitute::{remove, substitute, substitution_pool, PoolFilter};
pub use ledger::{confirm, undo, PointCall};
