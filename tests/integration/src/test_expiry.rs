//! Expiring signed URL integration tests.

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use signurl_core::{Algorithm, SignedUrlError, Signer, Verifier};

    use crate::{query_value, signing_config, split_url};

    fn sign_expiring(expires_at: chrono::DateTime<Utc>) -> (String, String) {
        let uri: http::Uri = "http://example.com/share?id=9".parse().unwrap();
        let signed = Signer::new(signing_config(Algorithm::Sha1))
            .sign_with_expiry(&http::Method::GET, &uri, b"", expires_at)
            .unwrap();
        split_url(&signed).unwrap()
    }

    #[test]
    fn test_should_accept_unexpired_url() {
        let (base, path) = sign_expiring(Utc::now() + Duration::hours(1));

        Verifier::new(signing_config(Algorithm::Sha1))
            .verify("GET", &base, &path, b"")
            .unwrap();
    }

    #[test]
    fn test_should_reject_expired_url() {
        let (base, path) = sign_expiring(Utc::now() - Duration::hours(1));

        let err = Verifier::new(signing_config(Algorithm::Sha1))
            .verify("GET", &base, &path, b"")
            .unwrap_err();
        assert!(matches!(err, SignedUrlError::Expired));
        assert_eq!(err.to_string(), "url signature has expired");
    }

    #[test]
    fn test_should_honor_expiry_boundary() {
        let expires_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let (base, path) = sign_expiring(expires_at);
        assert_eq!(query_value(&path, "expires"), Some("1700000000"));

        let verifier = Verifier::new(signing_config(Algorithm::Sha1));
        verifier
            .verify_at("GET", &base, &path, b"", expires_at)
            .unwrap();
        assert!(matches!(
            verifier.verify_at("GET", &base, &path, b"", expires_at + Duration::seconds(1)),
            Err(SignedUrlError::Expired)
        ));
    }

    #[test]
    fn test_should_reject_extended_expiry() {
        let expires_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let (base, path) = sign_expiring(expires_at);
        let extended = path.replace("expires=1700000000", "expires=1800000000");

        let err = Verifier::new(signing_config(Algorithm::Sha1))
            .verify_at("GET", &base, &extended, b"", expires_at)
            .unwrap_err();
        assert!(matches!(err, SignedUrlError::SignatureMismatch));
    }

    #[test]
    fn test_should_reject_non_integer_expiry() {
        let err = Verifier::new(signing_config(Algorithm::Sha1))
            .verify("GET", "http://example.com", "/?expires=tomorrow&signature=abc", b"")
            .unwrap_err();
        assert!(matches!(err, SignedUrlError::InvalidExpiry(_)));
        assert_eq!(err.to_string(), "expires value must be valid integer");
    }
}
