//! Identity extraction and per-call authorization.
//!
//! A route resolves its caller with [`TokenService::identity_from_header`]
//! (a bad token simply yields no identity), then runs one of the named guard
//! chains through [`evaluate`] before touching a repository.
//!
//! ```ignore
//! use jobly::auth::{CallContext, ENSURE_CORRECT_USER_OR_ADMIN, evaluate};
//!
//! let identity = tokens.identity_from_header(headers.authorization());
//! evaluate(ENSURE_CORRECT_USER_OR_ADMIN, identity.as_ref(), &CallContext::for_target(&username))
//!     .into_result()?;
//! User::update(&client, &username, payload, &hasher).await?;
//! ```

mod guard;
mod token;

pub use guard::{
    CallContext, Decision, DenialKind, ENSURE_ADMIN, ENSURE_CORRECT_USER_OR_ADMIN,
    ENSURE_LOGGED_IN, Guard, admin_only, admin_or_self, authenticated, evaluate,
};
pub use token::{Claims, TokenService};

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Username the token was issued to.
    pub subject: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(subject: impl Into<String>, is_admin: bool) -> Self {
        Self {
            subject: subject.into(),
            is_admin,
        }
    }
}
