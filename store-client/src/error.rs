use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `store-client`.
pub enum StoreClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Требуется вход (нет сохранённой сессии или сервер ответил 401/403).
    #[error("unauthorized")]
    Unauthorized,

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Некорректный запрос или отказ сервера (`success: false`).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Сервер вернул 5xx.
    #[error("server error: {0}")]
    Server(String),

    /// Ответ не удалось разобрать.
    #[error("decode error: {0}")]
    Decode(String),

    /// Форма не прошла локальную проверку и на сервер не отправлялась.
    #[error("validation error: {0}")]
    Validation(String),

    /// Ошибка локального хранилища сессии.
    #[error("storage error: {0}")]
    Storage(String),

    /// Для стороннего API не заданы ключи доступа.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Результат операций `store-client`.
pub type StoreClientResult<T> = Result<T, StoreClientError>;

impl StoreClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Self::Unauthorized
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            status if status.is_server_error() => {
                Self::Server(message.unwrap_or_else(|| format!("http status {status}")))
            }
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::InvalidRequest(message)
            }
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Http(err)
    }

    /// Строка статуса для экрана: то, что видит пользователь вместо данных.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(err) if err.is_timeout() => {
                "Сервер не отвечает, попробуйте позже".to_string()
            }
            Self::Http(_) => "Нет соединения с сервером".to_string(),
            Self::Unauthorized => "Требуется вход в аккаунт".to_string(),
            Self::NotFound => "Данные не найдены".to_string(),
            Self::InvalidRequest(message) | Self::Validation(message) => message.clone(),
            Self::Server(_) => "Ошибка сервера".to_string(),
            Self::Decode(_) => "Некорректный ответ сервера".to_string(),
            Self::Storage(_) => "Не удалось сохранить данные на устройстве".to_string(),
            Self::NotConfigured(service) => format!("Сервис недоступен: {service}"),
        }
    }
}

impl From<validator::ValidationErrors> for StoreClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                format!("{field}: {message}")
            })
            .collect();
        fields.sort();
        Self::Validation(fields.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn forbidden_maps_to_unauthorized() {
        let err = StoreClientError::from_http_status(StatusCode::FORBIDDEN, Some("no".into()));
        assert!(matches!(err, StoreClientError::Unauthorized));
    }

    #[test]
    fn server_errors_are_separated_from_bad_requests() {
        let err = StoreClientError::from_http_status(StatusCode::BAD_GATEWAY, None);
        assert!(matches!(err, StoreClientError::Server(_)));

        let err = StoreClientError::from_http_status(StatusCode::CONFLICT, Some("dup".into()));
        match err {
            StoreClientError::InvalidRequest(message) => assert_eq!(message, "dup"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn user_message_passes_server_text_through() {
        let err = StoreClientError::InvalidRequest("이미 존재하는 아이디입니다".to_string());
        assert_eq!(err.user_message(), "이미 존재하는 아이디입니다");
        assert_eq!(
            StoreClientError::Unauthorized.user_message(),
            "Требуется вход в аккаунт"
        );
    }
}
