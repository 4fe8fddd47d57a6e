mod sqlite_user_store;
mod user_store;

pub use sqlite_user_store::SqliteUserStore;
pub use user_store::{CreateUserOutcome, User, UserStore};
