// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `token.rs`

#[cfg(test)]
mod tests {
    use crate::config::ControllerConfig;
    use crate::token::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn exchanger_for(server: &MockServer) -> ClientCredentialsExchanger {
        let config = ControllerConfig {
            authority_host: server.uri(),
            token_request_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        ClientCredentialsExchanger::new(&config).unwrap()
    }

    // ========================================================================
    // Pure helpers
    // ========================================================================

    #[test]
    fn test_encode_form_contains_grant_fields() {
        let body = encode_form("client", "s3cr3t&=", "499b84ac-1321-427f-aa17-267ca6975798/.default");
        assert!(body.starts_with("grant_type=client_credentials&"));
        assert!(body.contains("client_id=client"));
        assert!(body.contains("client_secret=s3cr3t%26%3D"));
        assert!(body.contains("scope=499b84ac-1321-427f-aa17-267ca6975798%2F.default"));
    }

    #[test]
    fn test_validate_tenant() {
        assert!(validate_tenant("contoso.onmicrosoft.com").is_ok());
        assert!(validate_tenant("00000000-0000-0000-0000-000000000000").is_ok());
        for bad in ["", "a/b", "..", "a?b", "a#b", "a b"] {
            assert!(
                matches!(validate_tenant(bad), Err(TokenError::InvalidTenant { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_token_response_numeric_expiry() {
        let token =
            parse_token_response(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"tok123"}"#)
                .unwrap();
        assert_eq!(token.value, "tok123");
        assert_eq!(token.expires_in, Some(Duration::from_secs(3599)));
    }

    #[test]
    fn test_parse_token_response_string_expiry() {
        let token = parse_token_response(r#"{"expires_in":"3599","access_token":"tok123"}"#).unwrap();
        assert_eq!(token.expires_in, Some(Duration::from_secs(3599)));
    }

    #[test]
    fn test_parse_token_response_without_expiry() {
        let token = parse_token_response(r#"{"access_token":"tok123"}"#).unwrap();
        assert_eq!(token.expires_in, None);
    }

    #[test]
    fn test_parse_token_response_missing_token() {
        let err = parse_token_response(r#"{"error":"invalid_client"}"#).unwrap_err();
        assert!(matches!(err, TokenError::MissingAccessToken { .. }));

        let err = parse_token_response(r#"{"access_token":""}"#).unwrap_err();
        assert!(matches!(err, TokenError::MissingAccessToken { .. }));
    }

    #[test]
    fn test_missing_token_error_does_not_leak_secrets() {
        let err = parse_token_response(
            r#"{"access_token":{"value":"secret-value"},"refresh_token":"refresh-value"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TokenError::MissingAccessToken { .. }));

        let message = err.to_string();
        assert!(!message.contains("secret-value"));
        assert!(!message.contains("refresh-value"));
        assert!(message.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_token_response_not_json() {
        let err = parse_token_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, TokenError::Decode { .. }));

        let err = parse_token_response("[1,2]").unwrap_err();
        assert!(matches!(err, TokenError::Decode { .. }));
    }

    #[test]
    fn test_redact_body_hides_token() {
        let redacted = redact_body(r#"{"access_token":"tok123","expires_in":3599}"#);
        assert!(!redacted.contains("tok123"));
        assert!(redacted.contains("[REDACTED]"));
        assert!(redacted.contains("3599"));

        assert_eq!(redact_body("not json"), "not json");
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken {
            value: "tok123".into(),
            expires_in: None,
        };
        assert!(!format!("{token:?}").contains("tok123"));
    }

    // ========================================================================
    // HTTP exchange
    // ========================================================================

    #[tokio::test]
    async fn test_exchange_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("client_secret=s3cr3t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "tok123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger_for(&server)
            .exchange("tenant-1", "client", "s3cr3t")
            .await
            .unwrap();
        assert_eq!(token.value, "tok123");
        assert_eq!(token.expires_in, Some(Duration::from_secs(3599)));
    }

    #[tokio::test]
    async fn test_exchange_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let err = exchanger_for(&server)
            .exchange("tenant-1", "client", "wrong")
            .await
            .unwrap_err();
        match err {
            TokenError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid_client"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_body_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
            .mount(&server)
            .await;

        let err = exchanger_for(&server)
            .exchange("tenant-1", "client", "s3cr3t")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::MissingAccessToken { .. }));
    }

    #[tokio::test]
    async fn test_exchange_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "late"}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let err = exchanger_for(&server)
            .exchange("tenant-1", "client", "s3cr3t")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Request { .. }));
    }

    #[tokio::test]
    async fn test_exchange_rejects_bad_tenant_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = exchanger_for(&server)
            .exchange("../common", "client", "s3cr3t")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidTenant { .. }));
    }
}
