//! Optional bearer-token authentication (spec §4.C10 "optional bearer-token
//! auth").

/// Checks an `Authorization: Bearer <token>` header value against the
/// configured token. When auth is disabled this is never called; when no
/// token is configured, every request fails closed rather than being
/// silently accepted.
#[must_use]
pub fn check_bearer(header: Option<&str>, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|t| !t.is_empty()) else {
        return false;
    };
    let Some(header) = header else {
        return false;
    };
    let Some(token) = header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer ")) else {
        return false;
    };
    token == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_bearer_token() {
        assert!(check_bearer(Some("Bearer secret"), Some("secret")));
    }

    #[test]
    fn rejects_mismatched_token() {
        assert!(!check_bearer(Some("Bearer wrong"), Some("secret")));
    }

    #[test]
    fn rejects_missing_header() {
        assert!(!check_bearer(None, Some("secret")));
    }

    #[test]
    fn rejects_when_no_token_configured() {
        assert!(!check_bearer(Some("Bearer secret"), None));
    }

    #[test]
    fn rejects_malformed_scheme() {
        assert!(!check_bearer(Some("Basic secret"), Some("secret")));
    }
}
