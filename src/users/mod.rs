mod service;

pub use service::{NewUser, UserService, MIN_PASSWORD_LEN};
pub(crate) use service::check_password;
