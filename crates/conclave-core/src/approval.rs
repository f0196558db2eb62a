//! Signed, expiring, single-purpose approval tokens for mutating tools
//! (spec.md §4.9), ported from
//! `original_source/GitHub-Multi-Agent/shared/approval.py`.
//!
//! A token binds `(tool_name, args, session_id, iat, exp)` under
//! HMAC-SHA256 and is valid only for the exact call it was issued for —
//! replaying it against different args or a different tool fails closed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApprovalPayload {
    tool_name: String,
    args: Value,
    session_id: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedApproval {
    pub approval_token: String,
    pub expires_at: i64,
}

/// Why a token failed validation — never includes the secret or the
/// computed signature, only which check tripped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("approval token expired")]
    Expired,
    #[error("tool mismatch")]
    ToolMismatch,
    #[error("session mismatch")]
    SessionMismatch,
    #[error("args mismatch")]
    ArgsMismatch,
}

fn canonical_json(payload: &ApprovalPayload) -> Vec<u8> {
    // serde_json::Value serializes object keys in sorted order (the
    // default `Map` backing is a `BTreeMap`), and `to_vec` emits no
    // whitespace — this matches Python's
    // `json.dumps(payload, sort_keys=True, separators=(",", ":"))`.
    serde_json::to_vec(payload).expect("approval payload is always serializable")
}

fn sign(secret: &str, payload_raw: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(payload_raw);
    hex::encode(mac.finalize().into_bytes())
}

/// Issue a token authorizing exactly `(tool_name, args, session_id)` for
/// `ttl_sec` seconds starting now.
pub fn generate_approval_token(
    secret: &str,
    tool_name: &str,
    args: &Value,
    session_id: &str,
    now_unix: i64,
    ttl_sec: i64,
) -> IssuedApproval {
    let expires_at = now_unix + ttl_sec;
    let payload = ApprovalPayload {
        tool_name: tool_name.to_string(),
        args: args.clone(),
        session_id: session_id.to_string(),
        iat: now_unix,
        exp: expires_at,
    };
    let payload_raw = canonical_json(&payload);
    let sig = sign(secret, &payload_raw);
    let token = format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload_raw), sig);
    IssuedApproval {
        approval_token: token,
        expires_at,
    }
}

/// Validate `token` against the exact call it is being presented for.
pub fn validate_approval_token(
    secret: &str,
    token: &str,
    expected_tool_name: &str,
    expected_args: &Value,
    expected_session_id: &str,
    now_unix: i64,
) -> Result<(), ApprovalError> {
    let (payload_b64, sig) = token.split_once('.').ok_or(ApprovalError::InvalidFormat)?;

    let payload_raw = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| ApprovalError::InvalidFormat)?;

    let expected_sig = sign(secret, &payload_raw);
    if sig.len() != expected_sig.len()
        || sig.as_bytes().ct_eq(expected_sig.as_bytes()).unwrap_u8() != 1
    {
        return Err(ApprovalError::InvalidSignature);
    }

    let payload: ApprovalPayload =
        serde_json::from_slice(&payload_raw).map_err(|_| ApprovalError::InvalidFormat)?;

    if payload.exp < now_unix {
        return Err(ApprovalError::Expired);
    }
    if payload.tool_name != expected_tool_name {
        return Err(ApprovalError::ToolMismatch);
    }
    if payload.session_id != expected_session_id {
        return Err(ApprovalError::SessionMismatch);
    }
    if &payload.args != expected_args {
        return Err(ApprovalError::ArgsMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_a_valid_token() {
        let args = json!({"branch": "main"});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 300);
        assert_eq!(issued.expires_at, 1_300);
        let result = validate_approval_token(SECRET, &issued.approval_token, "merge_pr", &args, "sess-1", 1_100);
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_expired_token() {
        let args = json!({});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 10);
        let result = validate_approval_token(SECRET, &issued.approval_token, "merge_pr", &args, "sess-1", 2_000);
        assert_eq!(result, Err(ApprovalError::Expired));
    }

    #[test]
    fn rejects_mismatched_args() {
        let args = json!({"branch": "main"});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 300);
        let tampered = json!({"branch": "evil"});
        let result = validate_approval_token(SECRET, &issued.approval_token, "merge_pr", &tampered, "sess-1", 1_100);
        assert_eq!(result, Err(ApprovalError::ArgsMismatch));
    }

    #[test]
    fn rejects_mismatched_tool_name() {
        let args = json!({});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 300);
        let result = validate_approval_token(SECRET, &issued.approval_token, "delete_repo", &args, "sess-1", 1_100);
        assert_eq!(result, Err(ApprovalError::ToolMismatch));
    }

    #[test]
    fn rejects_tampered_signature() {
        let args = json!({});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 300);
        let (payload, _sig) = issued.approval_token.split_once('.').unwrap();
        let forged = format!("{payload}.{}", "0".repeat(64));
        let result = validate_approval_token(SECRET, &forged, "merge_pr", &args, "sess-1", 1_100);
        assert_eq!(result, Err(ApprovalError::InvalidSignature));
    }

    #[test]
    fn rejects_malformed_token() {
        let args = json!({});
        let result = validate_approval_token(SECRET, "not-a-token", "merge_pr", &args, "sess-1", 1_100);
        assert_eq!(result, Err(ApprovalError::InvalidFormat));
    }

    #[test]
    fn different_secrets_do_not_validate() {
        let args = json!({});
        let issued = generate_approval_token(SECRET, "merge_pr", &args, "sess-1", 1_000, 300);
        let result = validate_approval_token("other-secret", &issued.approval_token, "merge_pr", &args, "sess-1", 1_100);
        assert_eq!(result, Err(ApprovalError::InvalidSignature));
    }
}
