#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub role: String,
}

/// Who is operating the console, supplied by the hosting shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub principal: Option<Principal>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self { principal: Some(Principal { email: email.into(), role: role.into() }) }
    }

    /// Admin by role, or by an allow-listed email (case-insensitive).
    pub fn is_admin(&self, admin_emails: &[String]) -> bool {
        let Some(p) = &self.principal else { return false; };
        if p.role.trim().eq_ignore_ascii_case(ADMIN_ROLE) {
            return true;
        }
        let email = p.email.trim();
        !email.is_empty() && admin_emails.iter().any(|a| a.eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> Vec<String> {
        vec!["admin@gmail.com".to_string()]
    }

    #[test]
    fn role_or_allow_list_grants_access() {
        assert!(AuthContext::signed_in("x@y.io", "admin").is_admin(&allow()));
        assert!(AuthContext::signed_in("Admin@Gmail.com", "user").is_admin(&allow()));
        assert!(!AuthContext::signed_in("x@y.io", "user").is_admin(&allow()));
        assert!(!AuthContext::anonymous().is_admin(&allow()));
        assert!(!AuthContext::signed_in("", "user").is_admin(&[String::new()]));
    }
}
