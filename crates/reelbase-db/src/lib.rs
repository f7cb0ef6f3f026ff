pub mod pool;
pub mod repos;

// Re-export commonly used items
pub use pool::{create_pool, run_migrations};
pub use repos::movie::{MovieRepo, MovieRow};
pub use repos::permission::PermissionRepo;
pub use repos::role::RoleRepo;
pub use repos::user::{is_unique_violation, UserRepo, UserRow};
