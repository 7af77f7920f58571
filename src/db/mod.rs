pub mod notes;
pub mod pool;
pub mod schema;
pub mod users;

pub use notes::{NoteRepository, PgNoteRepository};
pub use pool::{create_pool, health_check, run_migrations};
pub use users::{PgUserRepository, UserRepository};
