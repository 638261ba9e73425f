//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods that
//! accept an executor as the first argument. Methods that participate in the
//! token-rotation transaction are generic over `PgExecutor` so they can run
//! against either the pool or an open transaction.

pub mod login_attempt_repo;
pub mod refresh_token_repo;
pub mod session_repo;
pub mod user_repo;

pub use login_attempt_repo::LoginAttemptRepo;
pub use refresh_token_repo::RefreshTokenRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
