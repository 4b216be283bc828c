mod crypto;
mod extractor;
mod session;

pub use crypto::{hash_password, verify_password};
pub use extractor::AuthUser;
pub use session::{token_from_cookie_header, SessionClaims, SessionManager, SESSION_COOKIE};
