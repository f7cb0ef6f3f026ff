pub mod movie;
pub mod permission;
pub mod role;
pub mod user;
