//! Tamper detection integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use signurl_core::{
        Algorithm, SignedUrlError, Signer, SigningConfig, StaticSecretProvider, Verifier,
    };

    use crate::{signing_config, split_url};

    fn signed_parts(method: &http::Method, url: &str, body: &[u8]) -> (String, String) {
        let uri: http::Uri = url.parse().unwrap();
        let signed = Signer::new(signing_config(Algorithm::Sha1))
            .sign(method, &uri, body)
            .unwrap();
        split_url(&signed).unwrap()
    }

    fn verify(method: &str, base: &str, path: &str, body: &[u8]) -> Result<(), SignedUrlError> {
        Verifier::new(signing_config(Algorithm::Sha1)).verify(method, base, path, body)
    }

    #[test]
    fn test_should_reject_modified_query_value() {
        let (base, path) = signed_parts(&http::Method::GET, "http://example.com/d?file=a.pdf", b"");
        let tampered = path.replace("file=a.pdf", "file=b.pdf");

        let err = verify("GET", &base, &tampered, b"").unwrap_err();
        assert!(matches!(err, SignedUrlError::SignatureMismatch));
    }

    #[test]
    fn test_should_reject_added_query_parameter() {
        let (base, path) = signed_parts(&http::Method::GET, "http://example.com/d?file=a.pdf", b"");
        let tampered = format!("{path}&admin=true");

        assert!(matches!(
            verify("GET", &base, &tampered, b""),
            Err(SignedUrlError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_should_reject_modified_path() {
        let (base, path) = signed_parts(&http::Method::GET, "http://example.com/d/a", b"");
        let tampered = path.replace("/d/a", "/d/b");

        assert!(matches!(
            verify("GET", &base, &tampered, b""),
            Err(SignedUrlError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_should_reject_modified_method() {
        let (base, path) = signed_parts(&http::Method::GET, "http://example.com/d", b"");

        assert!(matches!(
            verify("DELETE", &base, &path, b""),
            Err(SignedUrlError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_should_reject_modified_host() {
        let (_, path) = signed_parts(&http::Method::GET, "http://example.com/d", b"");

        assert!(matches!(
            verify("GET", "http://evil.example.com", &path, b""),
            Err(SignedUrlError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_should_reject_modified_body() {
        let (base, path) = signed_parts(&http::Method::POST, "http://example.com/p", b"original");

        assert!(matches!(
            verify("POST", &base, &path, b"forged"),
            Err(SignedUrlError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_should_reject_signature_from_other_secret() {
        let (base, path) = signed_parts(&http::Method::GET, "http://example.com/d", b"");
        let config = SigningConfig::builder()
            .secret_provider(Arc::new(StaticSecretProvider::new("another-secret")))
            .build();

        assert!(!Verifier::new(config).is_valid("GET", &base, &path, b""));
    }

    #[test]
    fn test_should_reject_signing_reserved_parameters() {
        let signer = Signer::new(signing_config(Algorithm::Sha1));
        for url in [
            "http://example.com/?signature=abc",
            "http://example.com/?privateKey=abc",
            "http://example.com/?bodyHash=abc",
        ] {
            let uri: http::Uri = url.parse().unwrap();
            let err = signer.sign(&http::Method::GET, &uri, b"").unwrap_err();
            assert!(
                matches!(err, SignedUrlError::ReservedParameter(_)),
                "{url}: {err}"
            );
        }
    }
}
