//! Проверка регистрационного номера бизнеса через API налогового реестра.

use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};

use crate::error::{StoreClientError, StoreClientResult};
use crate::http_client::{HttpClient, HttpOptions, build_reqwest, join_url};
use crate::models::BusinessStatus;

const STATUS_PATH: &str = "/api/nts-businessman/v1/status";

#[derive(Serialize)]
struct ServiceKeyQuery<'a> {
    #[serde(rename = "serviceKey")]
    service_key: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusRequestDto<'a> {
    b_no: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct StatusResponseDto {
    #[serde(default)]
    data: Vec<StatusItemDto>,
}

#[derive(Debug, Deserialize)]
struct StatusItemDto {
    b_no: String,
    #[serde(default)]
    b_stt: String,
    #[serde(default)]
    b_stt_cd: String,
    #[serde(default)]
    tax_type: String,
    #[serde(default)]
    end_dt: String,
}

impl From<StatusItemDto> for BusinessStatus {
    fn from(value: StatusItemDto) -> Self {
        let closed_at = Some(value.end_dt.trim().to_string()).filter(|dt| !dt.is_empty());
        Self {
            business_number: value.b_no,
            status_code: value.b_stt_cd.trim().to_string(),
            status_text: value.b_stt,
            tax_type: value.tax_type,
            closed_at,
        }
    }
}

/// Приводит номер к виду `1234567890`: убирает дефисы и пробелы.
///
/// Возвращает [`StoreClientError::Validation`], если после этого остаётся не
/// ровно 10 цифр.
pub fn normalize_business_number(raw: &str) -> StoreClientResult<String> {
    let number: String = raw
        .chars()
        .filter(|ch| *ch != '-' && !ch.is_whitespace())
        .collect();

    if number.len() != 10 || !number.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(StoreClientError::Validation(
            "business_number: must be 10 digits".to_string(),
        ));
    }
    Ok(number)
}

#[derive(Debug, Clone)]
/// Клиент API статуса бизнеса.
pub struct BusinessRegistryClient {
    base_url: String,
    service_key: String,
    client: Client,
}

impl BusinessRegistryClient {
    /// Создаёт клиент. Пустой ключ даёт [`StoreClientError::NotConfigured`].
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        options: HttpOptions,
    ) -> StoreClientResult<Self> {
        let service_key = service_key.into();
        if service_key.trim().is_empty() {
            return Err(StoreClientError::NotConfigured("business registry"));
        }

        Ok(Self {
            base_url: base_url.into(),
            service_key,
            client: build_reqwest(options)?,
        })
    }

    /// Статус бизнеса по номеру. Некорректный номер отклоняется без запроса.
    pub async fn verify(&self, business_number: &str) -> StoreClientResult<BusinessStatus> {
        let number = normalize_business_number(business_number)?;

        let response = self
            .client
            .request(Method::POST, join_url(&self.base_url, STATUS_PATH))
            .query(&ServiceKeyQuery {
                service_key: &self.service_key,
            })
            .json(&StatusRequestDto { b_no: [number.as_str()] })
            .send()
            .await
            .map_err(StoreClientError::from_reqwest)?;
        tracing::debug!(status = %response.status(), "business registry response");
        if !response.status().is_success() {
            return Err(HttpClient::decode_error(response).await);
        }

        let dto = response
            .json::<StatusResponseDto>()
            .await
            .map_err(StoreClientError::from_reqwest)?;
        dto.data
            .into_iter()
            .next()
            .map(BusinessStatus::from)
            .ok_or_else(|| StoreClientError::Decode("registry returned no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BusinessState;

    #[test]
    fn normalize_strips_dashes_and_spaces() {
        let number = normalize_business_number(" 123-45-67890 ").expect("valid number");
        assert_eq!(number, "1234567890");
    }

    #[test]
    fn normalize_rejects_wrong_length_and_letters() {
        assert!(normalize_business_number("123-45-6789").is_err());
        assert!(normalize_business_number("123-45-6789a").is_err());
        assert!(normalize_business_number("").is_err());
    }

    #[test]
    fn unknown_number_maps_to_not_registered() {
        let raw = r#"{"data":[{"b_no":"1234567890","b_stt":"","b_stt_cd":"","tax_type":"국세청에 등록되지 않은 사업자등록번호입니다.","end_dt":""}]}"#;
        let dto: StatusResponseDto = serde_json::from_str(raw).expect("parse");
        let status = dto.data.into_iter().next().map(BusinessStatus::from).expect("item");
        assert_eq!(status.state(), BusinessState::NotRegistered);
        assert!(status.closed_at.is_none());
    }

    #[test]
    fn closed_business_keeps_end_date() {
        let raw = r#"{"data":[{"b_no":"1234567890","b_stt":"폐업자","b_stt_cd":"03","tax_type":"","end_dt":"20231231"}]}"#;
        let dto: StatusResponseDto = serde_json::from_str(raw).expect("parse");
        let status = dto.data.into_iter().next().map(BusinessStatus::from).expect("item");
        assert_eq!(status.state(), BusinessState::Closed);
        assert_eq!(status.closed_at.as_deref(), Some("20231231"));
        assert!(!status.is_active());
    }

    #[test]
    fn blank_service_key_is_not_configured() {
        let err = BusinessRegistryClient::new("https://api.example", " ", HttpOptions::default())
            .expect_err("must fail");
        assert!(matches!(err, StoreClientError::NotConfigured(_)));
    }
}
