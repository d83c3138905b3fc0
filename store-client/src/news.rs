//! Поиск новостей через внешний API (формат Naver Search).

use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};

use crate::error::{StoreClientError, StoreClientResult};
use crate::http_client::{HttpClient, HttpOptions, build_reqwest, join_url};
use crate::models::NewsArticle;

const CLIENT_ID_HEADER: &str = "X-Naver-Client-Id";
const CLIENT_SECRET_HEADER: &str = "X-Naver-Client-Secret";
const SEARCH_PATH: &str = "/v1/search/news.json";
const MAX_DISPLAY: u32 = 100;

#[derive(Serialize)]
struct NewsQuery<'a> {
    query: &'a str,
    display: u32,
    start: u32,
    sort: &'a str,
}

#[derive(Debug, Deserialize)]
struct NewsResponseDto {
    #[serde(default)]
    items: Vec<NewsItemDto>,
}

#[derive(Debug, Deserialize)]
struct NewsItemDto {
    title: String,
    #[serde(default)]
    originallink: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "pubDate")]
    pub_date: String,
}

impl From<NewsItemDto> for NewsArticle {
    fn from(value: NewsItemDto) -> Self {
        let link = if value.originallink.trim().is_empty() {
            value.link
        } else {
            value.originallink
        };
        Self {
            title: clean_markup(&value.title),
            link,
            description: clean_markup(&value.description),
            published_at: value.pub_date,
        }
    }
}

/// Убирает HTML-теги и раскрывает распространённые сущности.
pub fn clean_markup(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    // &amp; последним, иначе "&amp;quot;" раскроется дважды
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[derive(Debug, Clone)]
/// Клиент поиска новостей.
pub struct NewsClient {
    base_url: String,
    client_id: String,
    client_secret: String,
    client: Client,
}

impl NewsClient {
    /// Создаёт клиент. Пустые ключи дают [`StoreClientError::NotConfigured`].
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        options: HttpOptions,
    ) -> StoreClientResult<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(StoreClientError::NotConfigured("news search"));
        }

        Ok(Self {
            base_url: base_url.into(),
            client_id,
            client_secret,
            client: build_reqwest(options)?,
        })
    }

    /// Новости по запросу, свежие первыми. `display` ограничивается 1..=100,
    /// `start` считается с 1.
    pub async fn search(
        &self,
        query: &str,
        display: u32,
        start: u32,
    ) -> StoreClientResult<Vec<NewsArticle>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StoreClientError::Validation(
                "query: must not be empty".to_string(),
            ));
        }

        let params = NewsQuery {
            query,
            display: display.clamp(1, MAX_DISPLAY),
            start: start.max(1),
            sort: "date",
        };
        let response = self
            .client
            .request(Method::GET, join_url(&self.base_url, SEARCH_PATH))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .header(CLIENT_SECRET_HEADER, &self.client_secret)
            .query(&params)
            .send()
            .await
            .map_err(StoreClientError::from_reqwest)?;
        tracing::debug!(status = %response.status(), "news search response");
        if !response.status().is_success() {
            return Err(HttpClient::decode_error(response).await);
        }

        let dto = response
            .json::<NewsResponseDto>()
            .await
            .map_err(StoreClientError::from_reqwest)?;
        Ok(dto.items.into_iter().map(NewsArticle::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_markup_strips_tags_and_entities() {
        let raw = "<b>소상공인</b> 지원 &quot;확대&quot; &amp; 대출";
        assert_eq!(clean_markup(raw), "소상공인 지원 \"확대\" & 대출");
    }

    #[test]
    fn clean_markup_does_not_double_decode() {
        assert_eq!(clean_markup("&amp;quot;"), "&quot;");
    }

    #[test]
    fn article_prefers_original_link() {
        let dto = NewsItemDto {
            title: "<b>t</b>".to_string(),
            originallink: "https://origin.example/1".to_string(),
            link: "https://portal.example/1".to_string(),
            description: "d".to_string(),
            pub_date: "Mon, 20 May 2024 10:00:00 +0900".to_string(),
        };
        let article = NewsArticle::from(dto);
        assert_eq!(article.title, "t");
        assert_eq!(article.link, "https://origin.example/1");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = NewsClient::new("https://openapi.example", "", "secret", HttpOptions::default())
            .expect_err("must fail without id");
        assert!(matches!(err, StoreClientError::NotConfigured(_)));
    }
}
