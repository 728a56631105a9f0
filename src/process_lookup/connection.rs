use reqwest::Url;
use tracing::error;

use super::error::LookupError;
use crate::db::entities::site_settings;
use crate::services::encryption_service::EncryptionService;

const LOOKUP_PATH: &str = "/marcha";

/// The two identifiers a public lookup is keyed by.
///
/// Values are forwarded exactly as received. Stripping masks down to digits
/// is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessQuery {
    pub numero_processo: String,
    pub cpf: String,
}

impl ProcessQuery {
    pub fn new(numero_processo: Option<String>, cpf: Option<String>) -> Result<Self, LookupError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(numero_processo), present(cpf)) {
            (Some(numero_processo), Some(cpf)) => Ok(Self { numero_processo, cpf }),
            _ => Err(LookupError::MissingFields),
        }
    }
}

/// Upstream connection parameters resolved from the site settings row.
#[derive(Debug, Clone)]
pub struct ApiConnection {
    base_url: Url,
    token: String,
}

impl ApiConnection {
    /// Resolves the connection from persisted settings. Url, token and port must all be present.
    pub fn from_settings(
        settings: Option<&site_settings::Model>,
        encryption: &EncryptionService,
    ) -> Result<Self, LookupError> {
        let settings = settings.ok_or(LookupError::NotConfigured)?;

        let (Some(api_url), Some(token_cipher), Some(port)) = (
            settings.api_url.as_deref().filter(|s| !s.trim().is_empty()),
            settings.api_token.as_deref().filter(|s| !s.is_empty()),
            settings.api_port,
        ) else {
            return Err(LookupError::NotConfigured);
        };

        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| LookupError::InvalidApiUrl(format!("port out of range: {port}")))?;

        let token = encryption.decrypt(token_cipher).map_err(|e| {
            error!(error = %e, "Stored API token could not be decrypted.");
            LookupError::Unexpected(format!("token decryption failed: {e}"))
        })?;

        Self::new(api_url, &token, port)
    }

    pub fn new(api_url: &str, token: &str, port: u16) -> Result<Self, LookupError> {
        let normalized = normalize_api_url(api_url);
        let mut base_url =
            Url::parse(&normalized).map_err(|e| LookupError::InvalidApiUrl(format!("{normalized}: {e}")))?;
        if base_url.host_str().is_none() {
            return Err(LookupError::InvalidApiUrl(normalized));
        }
        base_url
            .set_port(Some(port))
            .map_err(|_| LookupError::InvalidApiUrl(normalized.clone()))?;
        base_url.set_path(LOOKUP_PATH);
        base_url.set_query(None);

        Ok(Self {
            base_url,
            token: token.to_owned(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `{scheme}://{host}:{port}/marcha?num_seq=..&identificacao=..`
    pub fn lookup_url(&self, query: &ProcessQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("num_seq", &query.numero_processo)
            .append_pair("identificacao", &query.cpf);
        url
    }
}

/// Strips trailing slashes and defaults a schemeless host to `http://`.
pub fn normalize_api_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn query() -> ProcessQuery {
        ProcessQuery::new(Some("12345".into()), Some("11122233344".into())).unwrap()
    }

    fn settings(api_url: Option<&str>, api_token: Option<String>, api_port: Option<i32>) -> site_settings::Model {
        let now = Utc::now();
        site_settings::Model {
            id: site_settings::SITE_SETTINGS_ID,
            site_name: None,
            logo_url: None,
            primary_color: None,
            contact_email: None,
            smtp_host: None,
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            smtp_secure: false,
            api_url: api_url.map(str::to_owned),
            api_token,
            api_port,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_normalize_schemeless_with_trailing_slash() {
        assert_eq!(normalize_api_url("api.example.com/"), "http://api.example.com");
    }

    #[test]
    fn test_normalize_keeps_https() {
        assert_eq!(normalize_api_url("https://api.example.com"), "https://api.example.com");
        assert_eq!(normalize_api_url(" http://10.0.0.5// "), "http://10.0.0.5");
    }

    #[test]
    fn test_lookup_url_composition() {
        let conn = ApiConnection::new("api.example.com/", "t", 8080).unwrap();
        assert_eq!(
            conn.lookup_url(&query()).as_str(),
            "http://api.example.com:8080/marcha?num_seq=12345&identificacao=11122233344"
        );

        let conn = ApiConnection::new("https://api.example.com", "t", 8443).unwrap();
        assert_eq!(
            conn.lookup_url(&query()).as_str(),
            "https://api.example.com:8443/marcha?num_seq=12345&identificacao=11122233344"
        );
    }

    #[test]
    fn test_query_values_are_not_restripped() {
        let conn = ApiConnection::new("api.example.com", "t", 8080).unwrap();
        let masked = ProcessQuery::new(Some("12.345".into()), Some("111.222.333-44".into())).unwrap();
        let url = conn.lookup_url(&masked);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("num_seq".to_string(), "12.345".to_string()),
                ("identificacao".to_string(), "111.222.333-44".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(ProcessQuery::new(None, Some("1".into())), Err(LookupError::MissingFields)));
        assert!(matches!(ProcessQuery::new(Some("1".into()), Some("  ".into())), Err(LookupError::MissingFields)));
        assert!(ProcessQuery::new(Some("1".into()), Some("2".into())).is_ok());
    }

    #[test]
    fn test_from_settings_requires_all_three() {
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();
        let token = Some(encryption.encrypt("tok").unwrap());

        assert!(matches!(ApiConnection::from_settings(None, &encryption), Err(LookupError::NotConfigured)));
        for incomplete in [
            settings(None, token.clone(), Some(8080)),
            settings(Some("api.example.com"), None, Some(8080)),
            settings(Some("api.example.com"), token.clone(), None),
            settings(Some(""), token.clone(), Some(8080)),
        ] {
            assert!(matches!(
                ApiConnection::from_settings(Some(&incomplete), &encryption),
                Err(LookupError::NotConfigured)
            ));
        }

        let complete = settings(Some("api.example.com"), token, Some(8080));
        let conn = ApiConnection::from_settings(Some(&complete), &encryption).unwrap();
        assert_eq!(conn.token(), "tok");
    }

    #[test]
    fn test_from_settings_rejects_bad_port() {
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();
        let token = Some(encryption.encrypt("tok").unwrap());
        let bad = settings(Some("api.example.com"), token, Some(70000));
        assert!(matches!(
            ApiConnection::from_settings(Some(&bad), &encryption),
            Err(LookupError::InvalidApiUrl(_))
        ));
    }
}
