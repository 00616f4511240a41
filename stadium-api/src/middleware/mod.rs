pub mod auth;

pub use auth::{issue_token, require_user, Claims, CurrentUser};
