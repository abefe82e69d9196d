//! Security-provider contract
//!
//! Authorization rule evaluation is an external concern; the registry only
//! requires that exactly one provider be contributed across all modules.
//! The exactly-one rule is enforced at first query, not at registration,
//! because contributions may arrive in any order across modules.

/// Answers role membership questions for the current caller
pub trait SecurityProvider: Send + Sync {
    fn is_user_in_role(&self, role: &str) -> bool;
}

/// Provider for deployments that do not enforce roles
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllSecurityProvider;

impl SecurityProvider for AllowAllSecurityProvider {
    fn is_user_in_role(&self, _role: &str) -> bool {
        true
    }
}
