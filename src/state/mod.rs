pub mod schema;
pub mod session;
pub mod store;

pub use schema::{migrate, PersistedState, SCHEMA_VERSION};
pub use session::{AppState, LineSummary, Session};
pub use store::StateStore;
