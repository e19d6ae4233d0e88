pub mod auth;
pub mod track_visit;

pub use auth::{require_auth, AuthUser};
pub use track_visit::{summarize_user_agent, track_visit};
