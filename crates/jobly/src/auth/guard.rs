use super::Identity;
use crate::error::{JoblyError, JoblyResult};

/// Why a guard refused the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// No verified identity.
    Unauthenticated,
    /// Identity present but not permitted.
    Forbidden,
}

/// Terminal state of a guard chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenialKind),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Map a denial onto the error taxonomy.
    pub fn into_result(self) -> JoblyResult<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(DenialKind::Unauthenticated) => {
                Err(JoblyError::Unauthenticated("login required".to_string()))
            }
            Decision::Denied(DenialKind::Forbidden) => {
                Err(JoblyError::Forbidden("not permitted".to_string()))
            }
        }
    }
}

/// Per-call facts a guard may consult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Username the call acts on, for routes scoped to one user.
    pub target: Option<String>,
}

impl CallContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

/// A single pass/fail check.
pub type Guard = fn(Option<&Identity>, &CallContext) -> Result<(), DenialKind>;

pub fn authenticated(identity: Option<&Identity>, _ctx: &CallContext) -> Result<(), DenialKind> {
    identity.map(|_| ()).ok_or(DenialKind::Unauthenticated)
}

pub fn admin_only(identity: Option<&Identity>, _ctx: &CallContext) -> Result<(), DenialKind> {
    match identity {
        Some(identity) if identity.is_admin => Ok(()),
        _ => Err(DenialKind::Forbidden),
    }
}

pub fn admin_or_self(identity: Option<&Identity>, ctx: &CallContext) -> Result<(), DenialKind> {
    let Some(identity) = identity else {
        return Err(DenialKind::Forbidden);
    };
    if identity.is_admin || ctx.target.as_deref() == Some(identity.subject.as_str()) {
        Ok(())
    } else {
        Err(DenialKind::Forbidden)
    }
}

pub const ENSURE_LOGGED_IN: &[Guard] = &[authenticated];
pub const ENSURE_ADMIN: &[Guard] = &[authenticated, admin_only];
pub const ENSURE_CORRECT_USER_OR_ADMIN: &[Guard] = &[authenticated, admin_or_self];

/// Run guards in order; the first failure decides.
pub fn evaluate(guards: &[Guard], identity: Option<&Identity>, ctx: &CallContext) -> Decision {
    for (position, guard) in guards.iter().enumerate() {
        if let Err(kind) = guard(identity, ctx) {
            tracing::info!(
                target: "jobly.auth",
                position,
                kind = ?kind,
                subject = identity.map(|i| i.subject.as_str()).unwrap_or("-"),
                target_user = ctx.target.as_deref().unwrap_or("-"),
                "call denied"
            );
            return Decision::Denied(kind);
        }
    }
    Decision::Allowed
}
