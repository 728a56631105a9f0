use axum::http::StatusCode;
use thiserror::Error;

/// Every way a process lookup (or connection test) can end other than success.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("numeroProcesso and cpf are required")]
    MissingFields,
    #[error("lookup API is not configured")]
    NotConfigured,
    #[error("lookup API url is invalid: {0}")]
    InvalidApiUrl(String),
    #[error("upstream returned 404")]
    ProcessNotFound,
    #[error("upstream rejected the bearer token")]
    InvalidToken,
    #[error("upstream returned status {0}")]
    UpstreamStatus(StatusCode),
    #[error("upstream did not answer in time")]
    Timeout,
    #[error("upstream refused the connection")]
    ConnectionRefused,
    #[error("upstream host could not be resolved")]
    HostNotFound,
    #[error("unexpected lookup failure: {0}")]
    Unexpected(String),
}

impl LookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MissingFields => StatusCode::BAD_REQUEST,
            LookupError::NotConfigured | LookupError::InvalidApiUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LookupError::ProcessNotFound => StatusCode::NOT_FOUND,
            LookupError::InvalidToken => StatusCode::UNAUTHORIZED,
            LookupError::UpstreamStatus(status) => *status,
            LookupError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            LookupError::ConnectionRefused | LookupError::HostNotFound => StatusCode::SERVICE_UNAVAILABLE,
            LookupError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the public client. Never carries internal details.
    pub fn client_message(&self) -> String {
        match self {
            LookupError::MissingFields => "Número do processo e CPF são obrigatórios.".to_string(),
            LookupError::NotConfigured => {
                "API de consulta não configurada. Informe URL, token e porta nas configurações do site.".to_string()
            }
            LookupError::InvalidApiUrl(_) => {
                "API de consulta configurada incorretamente. Verifique a URL e a porta nas configurações do site."
                    .to_string()
            }
            LookupError::ProcessNotFound => {
                "Processo não encontrado. Verifique o número do processo e o CPF informados.".to_string()
            }
            LookupError::InvalidToken => {
                "Token da API inválido. Verifique a configuração da API nas configurações do site.".to_string()
            }
            LookupError::UpstreamStatus(status) => {
                format!("Erro na consulta do processo (status={}).", status.as_u16())
            }
            LookupError::Timeout => "Tempo de consulta esgotado. Tente novamente.".to_string(),
            LookupError::ConnectionRefused => {
                "Serviço de consulta temporariamente indisponível. Tente novamente mais tarde.".to_string()
            }
            LookupError::HostNotFound => {
                "Não foi possível resolver o endereço da API de consulta. Tente novamente mais tarde.".to_string()
            }
            LookupError::Unexpected(_) => "Erro inesperado ao processar a consulta.".to_string(),
        }
    }
}

/// Classifies a transport failure from the HTTP client.
pub fn classify_transport_error(err: &reqwest::Error) -> LookupError {
    if err.is_timeout() {
        return LookupError::Timeout;
    }

    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
            match io_err.kind() {
                std::io::ErrorKind::ConnectionRefused => return LookupError::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return LookupError::Timeout,
                _ => {}
            }
        }
        // hyper-util's resolver reports "dns error: ..." wrapping std's "failed to lookup address information".
        let text = cause.to_string();
        if text.starts_with("dns error") || text.contains("failed to lookup address") {
            return LookupError::HostNotFound;
        }
        source = cause.source();
    }

    LookupError::Unexpected(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_taxonomy() {
        assert_eq!(LookupError::MissingFields.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(LookupError::NotConfigured.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(LookupError::ProcessNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(LookupError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            LookupError::UpstreamStatus(StatusCode::BAD_GATEWAY).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(LookupError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(LookupError::ConnectionRefused.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(LookupError::HostNotFound.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            LookupError::Unexpected("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert!(LookupError::ProcessNotFound.client_message().contains("não encontrado"));
        assert!(LookupError::InvalidToken.client_message().contains("Token da API"));
        assert!(
            LookupError::UpstreamStatus(StatusCode::IM_A_TEAPOT)
                .client_message()
                .contains("status=418")
        );
    }

    #[test]
    fn test_unexpected_message_hides_details() {
        let msg = LookupError::Unexpected("tls handshake eof at 10.0.0.3".into()).client_message();
        assert!(!msg.contains("10.0.0.3"));
    }
}
