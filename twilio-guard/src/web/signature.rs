//! Twilio webhook signature verification.
//!
//! Twilio signs each webhook with HMAC-SHA1 keyed by the account auth token.
//! The signed data is the full request URL followed by every POST parameter,
//! sorted by name, with each name immediately followed by its value. The
//! base64 digest arrives in the `X-Twilio-Signature` header.
//! Reference: https://www.twilio.com/docs/usage/security#validating-requests

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Verifies request signatures for a single auth token.
#[derive(Clone)]
pub struct RequestValidator {
    auth_token: String,
}

impl RequestValidator {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    /// Compute the base64 signature Twilio would send for `url` and `params`.
    ///
    /// Returns `None` only if the HMAC cannot be keyed.
    pub fn compute_signature(&self, url: &str, params: &[(String, String)]) -> Option<String> {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut mac = HmacSha1::new_from_slice(self.auth_token.as_bytes()).ok()?;
        mac.update(url.as_bytes());
        for (key, value) in sorted {
            mac.update(key.as_bytes());
            mac.update(value.as_bytes());
        }

        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Check `signature` against the one recomputed over `url` and `params`.
    ///
    /// `false` if the auth token or signature is empty, or on mismatch.
    pub fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        if self.auth_token.is_empty() || signature.is_empty() {
            warn!(
                has_auth_token = !self.auth_token.is_empty(),
                has_signature = !signature.is_empty(),
                "twilio_signature_missing_fields"
            );
            return false;
        }

        let expected = match self.compute_signature(url, params) {
            Some(s) => s,
            None => {
                warn!("twilio_signature_invalid_key");
                return false;
            }
        };

        let valid = constant_time_compare(&expected, signature);

        if !valid {
            warn!(
                url = %url,
                param_count = params.len(),
                "twilio_signature_mismatch"
            );
        }

        valid
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // Worked example from Twilio's security documentation.
    const DOC_TOKEN: &str = "12345";
    const DOC_URL: &str = "https://mycompany.com/myapp.php?foo=1&bar=2";
    const DOC_SIGNATURE: &str = "0/KCTR6DLpKmkAf8muzZqo1nDgQ=";

    fn doc_params() -> Vec<(String, String)> {
        params(&[
            ("CallSid", "CA1234567890ABCDE"),
            ("Caller", "+12349013030"),
            ("Digits", "1234"),
            ("From", "+12349013030"),
            ("To", "+18005551212"),
        ])
    }

    #[test]
    fn test_compute_signature_matches_documented_example() {
        let validator = RequestValidator::new(DOC_TOKEN);
        assert_eq!(
            validator.compute_signature(DOC_URL, &doc_params()).as_deref(),
            Some(DOC_SIGNATURE)
        );
    }

    #[test]
    fn test_validate_ignores_param_order() {
        let validator = RequestValidator::new(DOC_TOKEN);
        let mut shuffled = doc_params();
        shuffled.reverse();
        assert!(validator.validate(DOC_URL, &shuffled, DOC_SIGNATURE));
    }

    #[test]
    fn test_validate_rejects_tampered_params() {
        let validator = RequestValidator::new(DOC_TOKEN);
        let mut tampered = doc_params();
        tampered[2].1 = "9999".to_string();
        assert!(!validator.validate(DOC_URL, &tampered, DOC_SIGNATURE));
    }

    #[test]
    fn test_validate_rejects_other_url() {
        let validator = RequestValidator::new(DOC_TOKEN);
        assert!(!validator.validate(
            "https://mycompany.com/myapp.php",
            &doc_params(),
            DOC_SIGNATURE
        ));
    }

    #[test]
    fn test_validate_missing_fields() {
        assert!(!RequestValidator::new("").validate(DOC_URL, &doc_params(), DOC_SIGNATURE));
        assert!(!RequestValidator::new(DOC_TOKEN).validate(DOC_URL, &doc_params(), ""));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
