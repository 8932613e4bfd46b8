//! Sign-then-verify integration tests.

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use signurl_core::{Algorithm, Signer, Verifier};

    use crate::{query_value, signing_config, split_url};

    fn sign(algorithm: Algorithm, method: &http::Method, url: &str, body: &[u8]) -> String {
        let uri: http::Uri = url.parse().unwrap();
        Signer::new(signing_config(algorithm))
            .sign(method, &uri, body)
            .unwrap()
    }

    #[test]
    fn test_should_roundtrip_with_every_algorithm() {
        for algorithm in [Algorithm::Sha1, Algorithm::Sha256, Algorithm::Md5] {
            let signed = sign(
                algorithm,
                &http::Method::GET,
                "https://files.example.com/reports/q3?user=alice&format=pdf",
                b"",
            );
            let signature = query_value(&signed, "signature").unwrap();
            assert_eq!(signature.len(), algorithm.hex_len(), "{algorithm}");

            let (base, path) = split_url(&signed).unwrap();
            Verifier::new(signing_config(algorithm))
                .verify("GET", &base, &path, b"")
                .unwrap();
        }
    }

    #[test]
    fn test_should_roundtrip_with_body() {
        let body = br#"{"amount":42}"#;
        let signed = sign(
            Algorithm::Sha256,
            &http::Method::POST,
            "http://api.example.com/payments",
            body,
        );
        let (base, path) = split_url(&signed).unwrap();

        Verifier::new(signing_config(Algorithm::Sha256))
            .verify("POST", &base, &path, body)
            .unwrap();
    }

    #[test]
    fn test_should_verify_regardless_of_parameter_order() {
        let signed = sign(
            Algorithm::Sha1,
            &http::Method::GET,
            "http://example.com/list?b=2&a=1&a=0",
            b"",
        );
        let signature = query_value(&signed, "signature").unwrap();

        let verifier = Verifier::new(signing_config(Algorithm::Sha1));
        for path in [
            format!("/list?signature={signature}&a=0&a=1&b=2"),
            format!("/list?a=1&signature={signature}&b=2&a=0"),
        ] {
            verifier
                .verify("GET", "http://example.com", &path, b"")
                .unwrap();
        }
    }

    #[test]
    fn test_should_not_verify_with_other_algorithm() {
        let signed = sign(Algorithm::Sha1, &http::Method::GET, "http://example.com/", b"");
        let (base, path) = split_url(&signed).unwrap();

        let verifier = Verifier::new(signing_config(Algorithm::Sha256));
        assert!(!verifier.is_valid("GET", &base, &path, b""));
    }

    #[test]
    fn test_should_roundtrip_signed_request() {
        let body = b"payload".to_vec();
        let mut request = http::Request::builder()
            .method(http::Method::PUT)
            .uri("/upload?name=a.txt")
            .header(http::header::HOST, "storage.example.com")
            .body(Cursor::new(body.clone()))
            .unwrap();

        let signed = Signer::new(signing_config(Algorithm::Sha1))
            .sign_request(&mut request)
            .unwrap();
        assert!(signed.starts_with("http://storage.example.com/upload?name=a.txt&signature="));

        let (base, path) = split_url(&signed).unwrap();
        Verifier::new(signing_config(Algorithm::Sha1))
            .verify("PUT", &base, &path, &body)
            .unwrap();
    }
}
