pub mod access;
pub mod credentials;
pub mod jwt;
pub mod password;

pub use access::{AdminUser, CurrentUser};
pub use credentials::CredentialStore;
pub use jwt::{extract_bearer_token, Claims, TokenError, TokenService};
pub use password::PasswordHasher2;
