//! Signed request plumbing shared by every endpoint.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::collection_prefix;
use crate::error::{ApiError, Result};
use crate::http_client::HttpUtils;
use crate::sign::CONTENT_TYPE;
use crate::types::{ApiResponse, ListParams};
use crate::utils::datetime::format_rfc3339;
use crate::utils::log_sanitizer::truncate_for_log;

use super::MyrasecClient;

/// Render query pairs as a URL query string (without `?`).
pub(crate) fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Pick the object out of a response body.
///
/// Write endpoints wrap the result in `targetObject: [obj]`, fetch endpoints
/// return the bare object.
pub(crate) fn extract_object<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: Value = HttpUtils::parse_json(body)?;
    let target = match value {
        Value::Object(mut map) => match map.remove("targetObject") {
            Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
            Some(Value::Object(obj)) => Value::Object(obj),
            _ => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(target).map_err(|e| ApiError::ParseError {
        detail: e.to_string(),
    })
}

impl MyrasecClient {
    /// `/{language}/rapi{path}[?query]`, the URI that is signed.
    fn request_uri(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("/{}/rapi{path}", self.language)
        } else {
            format!("/{}/rapi{path}?{query}", self.language)
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: Option<String>,
    ) -> Result<String> {
        let request_uri = self.request_uri(path, query);
        let url = format!("{}{request_uri}", self.base_url);
        let payload = body.unwrap_or_default();
        let date = format_rfc3339(&chrono::Utc::now());
        let authorization = self
            .signer
            .authorization(method.as_str(), &request_uri, &payload, &date)?;

        if !payload.is_empty() {
            log::debug!("[myrasec] Request Body: {}", truncate_for_log(&payload));
        }

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("Date", &date)
            .header("Content-Type", CONTENT_TYPE)
            .header("User-Agent", &self.user_agent)
            .header("Authorization", authorization);
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let (status, text) = HttpUtils::execute_request_with_retry(
            request,
            method.as_str(),
            &request_uri,
            self.max_retries,
        )
        .await?;
        HttpUtils::check_status(status, &text, path)?;
        Ok(text)
    }

    /// GET through the response cache.
    pub(crate) async fn get_text(&self, path: &str, query: &[(String, String)]) -> Result<String> {
        let query = encode_query(query);
        let key = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };

        if let Some(hit) = self.cache.get(&key).await {
            log::debug!("[myrasec] cache hit {key}");
            return Ok(hit);
        }

        let text = self.send(Method::GET, path, &query, None).await?;
        self.cache.put(key, text.clone()).await;
        Ok(text)
    }

    /// One page of a list endpoint.
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ListParams,
    ) -> Result<Vec<T>> {
        self.list_with_query(path, &params.to_query()).await
    }

    pub(crate) async fn list_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<T>> {
        let text = self.get_text(path, query).await?;
        let response: ApiResponse<T> = HttpUtils::parse_json(&text)?;
        Ok(response.list)
    }

    /// GET a single object.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.get_text(path, &[]).await?;
        extract_object(&text)
    }

    /// GET a single object as raw JSON.
    pub(crate) async fn fetch_value(&self, path: &str) -> Result<Value> {
        let text = self.get_text(path, &[]).await?;
        HttpUtils::parse_json(&text)
    }

    pub(crate) async fn write<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<String> {
        let payload = serde_json::to_string(body).map_err(|e| ApiError::SerializationError {
            detail: e.to_string(),
        })?;
        let text = self.send(method, path, "", Some(payload)).await?;
        self.cache.prune(collection_prefix(path)).await;
        Ok(text)
    }

    /// POST and return the created object.
    pub(crate) async fn create<T>(&self, path: &str, body: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        let text = self.write(Method::POST, path, body).await?;
        extract_object(&text)
    }

    /// PUT and return the updated object.
    pub(crate) async fn update<T>(&self, path: &str, body: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        let text = self.write(Method::PUT, path, body).await?;
        extract_object(&text)
    }

    /// DELETE with the object as body.
    pub(crate) async fn remove<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<()> {
        self.write(Method::DELETE, path, body).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tag;

    #[test]
    fn query_values_are_encoded() {
        let q = vec![
            ("page".to_string(), "1".to_string()),
            ("search".to_string(), "ALL:example.com".to_string()),
        ];
        assert_eq!(encode_query(&q), "page=1&search=ALL%3Aexample.com");
    }

    #[test]
    fn extract_from_target_object() {
        let tag: Tag =
            extract_object(r#"{"error":false,"targetObject":[{"id":4,"name":"t","type":"WAF"}]}"#)
                .unwrap();
        assert_eq!(tag.id, Some(4));
    }

    #[test]
    fn extract_bare_object() {
        let tag: Tag = extract_object(r#"{"id":5,"name":"t","type":"CACHE"}"#).unwrap();
        assert_eq!(tag.id, Some(5));
    }

    #[test]
    fn extract_reports_parse_error() {
        let result: Result<Tag> = extract_object(r#"{"targetObject":[{"id":"x"}]}"#);
        assert!(matches!(result, Err(ApiError::ParseError { .. })));
    }

    #[test]
    fn request_uri_has_language_prefix() {
        let client = MyrasecClient::builder("k", "s").language("de").build().unwrap();
        assert_eq!(client.request_uri("/domains", ""), "/de/rapi/domains");
        assert_eq!(
            client.request_uri("/domains", "page=2"),
            "/de/rapi/domains?page=2"
        );
    }
}
