pub mod dates;
pub mod persistence;
pub mod status;
pub mod users;

pub use dates::NormalizedDate;
pub use status::DocumentStatus;
pub use users::{DEFAULT_PASSWORD_ROUNDS, Role, Username, hash_password, verify_password};
