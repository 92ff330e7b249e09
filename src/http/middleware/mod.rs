//! Gateway middleware.

pub mod access_control;
pub mod remote_user;

pub use access_control::{access_control_middleware, AccessControlState};
pub use remote_user::{derive_remote_user, remote_user_middleware};
