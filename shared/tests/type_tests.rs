/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `pagination.rs` and `server_config.rs`).
// ---------------------------------------------------------------------------
// JWT claims
// ---------------------------------------------------------------------------
#[cfg(test)]
mod jwt_tests {
    use shared::types::*;

    fn sample_claims() -> JwtClaims {
        JwtClaims {
            sub: "42".to_string(),
            iss: Some("gogear-api".to_string()),
            aud: Some(Audience::single("app")),
            iat: 1_700_000_000,
            exp: 9_999_999_999,
            nbf: None,
        }
    }

    #[test]
    fn claims_serialize_and_deserialize_roundtrip() {
        let c = sample_claims();
        let json = serde_json::to_string(&c).unwrap();
        let back: JwtClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn audience_is_written_as_a_list() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["aud"], serde_json::json!(["app"]));
    }

    #[test]
    fn audience_accepts_a_bare_string() {
        let c: JwtClaims =
            serde_json::from_str(r#"{"sub":"1","aud":"admin-app","iat":0,"exp":1}"#).unwrap();
        assert!(c.aud.unwrap().contains("admin-app"));
    }

    #[test]
    fn missing_optional_claims_are_omitted() {
        let mut c = sample_claims();
        c.iss = None;
        c.aud = None;
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("iss").is_none());
        assert!(json.get("aud").is_none());
        assert!(json.get("nbf").is_none());
        assert!(c.audiences().is_empty());
    }

    #[test]
    fn audiences_lists_every_entry() {
        let mut c = sample_claims();
        c.aud = Some(Audience::Many(vec!["app".into(), "admin-app".into()]));
        assert_eq!(c.audiences(), vec!["app", "admin-app"]);
    }
}

// ---------------------------------------------------------------------------
// Auth wire types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod auth_tests {
    use shared::types::*;

    #[test]
    fn id_token_wins_over_credential() {
        let req = GoogleCallbackRequest {
            id_token: Some("tok".into()),
            credential: Some("cred".into()),
            code: None,
        };
        assert_eq!(req.identity_token(), Some("tok"));
    }

    #[test]
    fn blank_id_token_falls_back_to_credential() {
        let req = GoogleCallbackRequest {
            id_token: Some("   ".into()),
            credential: Some("cred".into()),
            code: None,
        };
        assert_eq!(req.identity_token(), Some("cred"));
    }

    #[test]
    fn body_fields_take_priority_over_query_fields() {
        let body = GoogleCallbackRequest {
            code: Some("from-body".into()),
            ..Default::default()
        };
        let query = GoogleCallbackRequest {
            code: Some("from-query".into()),
            id_token: Some("query-token".into()),
            ..Default::default()
        };
        let merged = body.or(query);
        assert_eq!(merged.authorization_code(), Some("from-body"));
        assert_eq!(merged.identity_token(), Some("query-token"));
    }

    #[test]
    fn empty_json_body_deserializes() {
        let req: GoogleCallbackRequest = serde_json::from_str("{}").unwrap();
        assert!(req.identity_token().is_none());
        assert!(req.authorization_code().is_none());
    }

    #[test]
    fn envelope_omits_absent_state() {
        let env = TokenEnvelope {
            token_type: "Bearer".into(),
            access_token: "abc".into(),
            expires_at: 10,
            expires_in: 5,
            user: Some(TokenUser {
                id: Some(1),
                email: "a@b.c".into(),
                name: "A".into(),
                is_admin: false,
            }),
            state: None,
        };
        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("state").is_none());
        assert_eq!(json["user"]["email"], "a@b.c");
        assert_eq!(json["token_type"], "Bearer");
    }
}

// ---------------------------------------------------------------------------
// Error + health payloads
// ---------------------------------------------------------------------------

#[cfg(test)]
mod payload_tests {
    use shared::types::*;

    #[test]
    fn error_response_has_single_error_key() {
        let json = serde_json::to_value(ErrorResponse::new("token has expired")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "token has expired"}));
    }

    #[test]
    fn health_reports_ok() {
        let h = Health::ok("01.01.2026 10:00:00");
        assert_eq!(h.status, "ok");
        assert_eq!(h.name, "GoGear-api");
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

#[cfg(test)]
mod config_tests {
    use shared::config::load_config;
    use shared::types::ConfigError;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_loads() {
        let file = write_config(
            r#"
            [database]
            file = "gear.db"

            [server]
            port = 9090
            log_level = "debug"

            [auth]
            jwt_secret = "a-secret"
            jwt_issuer = "gogear-api"
            jwt_audience = "app"
            jwt_admin_audience = "admin-app"
            jwt_expiry_minutes = 15
            google_client_id = "client"
            google_redirect_url = "http://localhost/cb"
            "#,
        );
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.database.file, "gear.db");
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert_eq!(cfg.auth.jwt_admin_audience, "admin-app");
        assert_eq!(cfg.auth.expiry_minutes(), 15);
        assert!(cfg.auth.google_configured());
    }

    #[test]
    fn missing_auth_section_uses_defaults() {
        let file = write_config("[database]\nfile = \"gear.db\"\n");
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.auth.expiry_minutes(), 60);
        assert_eq!(cfg.server.port, 8081);
        assert!(!cfg.auth.google_configured());
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = write_config("   \n");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn empty_database_path_is_rejected() {
        let file = write_config("[database]\nfile = \"\"\n");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let file = write_config("[database]\nfile = \"g.db\"\n[server]\nlog_level = \"loud\"\n");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let file = write_config("[database\nfile = ");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

// ---------------------------------------------------------------------------
// Pagination properties
// ---------------------------------------------------------------------------

#[cfg(test)]
mod pagination_props {
    use proptest::prelude::*;
    use shared::types::pagination::{PageRequest, ResponsePayload};

    proptest! {
        #[test]
        fn accepted_requests_have_an_exact_offset(page in 1i64..=i64::MAX, limit in 1i64..=i64::MAX) {
            if let Ok(req) = PageRequest::new(page, limit) {
                prop_assert_eq!(Some(req.offset()), (page - 1).checked_mul(limit));
                prop_assert!(req.total_pages(i64::MAX) >= 1);
            }
        }

        #[test]
        fn total_pages_covers_every_item(total in 0i64..10_000, limit in 1i64..500) {
            let req = PageRequest::new(1, limit).unwrap();
            let pages = req.total_pages(total);
            prop_assert!(pages * limit >= total);
            prop_assert!(pages == 0 || (pages - 1) * limit < total);
        }

        #[test]
        fn next_link_only_before_last_page(total in 0i64..1_000, limit in 1i64..50, page in 1i64..40) {
            let req = PageRequest::new(page, limit).unwrap();
            let payload: ResponsePayload<()> = ResponsePayload::build(vec![], total, req, "/l", &[]);
            prop_assert_eq!(payload.next_page.is_some(), page < payload.total_pages);
            prop_assert_eq!(payload.prev_page.is_some(), page > 1);
        }
    }
}
