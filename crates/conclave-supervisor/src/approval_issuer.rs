//! Supervisor-side approval token issuance, wrapping
//! `conclave_core::approval` with the shared secret and default TTL
//! (spec.md §4.9).

use conclave_core::approval::{generate_approval_token, IssuedApproval};
use conclave_core::ids::SessionId;
use serde_json::Value;

pub struct ApprovalIssuer {
    secret: String,
    ttl_sec: i64,
}

impl ApprovalIssuer {
    pub fn new(secret: impl Into<String>, ttl_sec: i64) -> Self {
        Self { secret: secret.into(), ttl_sec }
    }

    pub fn issue(&self, tool_name: &str, args: &Value, session_id: SessionId) -> IssuedApproval {
        generate_approval_token(
            &self.secret,
            tool_name,
            args,
            &session_id.to_string(),
            chrono::Utc::now().timestamp(),
            self.ttl_sec,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issues_a_token_expiring_ttl_seconds_from_now() {
        let issuer = ApprovalIssuer::new("secret", 300);
        let before = chrono::Utc::now().timestamp();
        let issued = issuer.issue("merge_pr", &json!({}), SessionId::new());
        assert!(issued.expires_at >= before + 300);
        assert!(issued.expires_at <= before + 301);
    }
}
