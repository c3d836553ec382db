//! Request helpers shared by the REST providers.
//!
//! Bodies are read as text and decoded separately so a body that does not
//! match the expected shape surfaces as [`ProviderError::Parse`] rather than as
//! a transport error. Only the former is worth one more attempt.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use snafu::ResultExt;

use crate::providers::{
    ApiSnafu, InvalidBaseUrlSnafu, ParseSnafu, ProviderError, ProviderInitError, ReqwestSnafu,
};

/// Sends `request` and returns the body of a successful response.
///
/// Transport errors lose their URL: query strings may carry credentials.
pub(crate) async fn send_for_text(
    request: RequestBuilder,
    endpoint: &str,
) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(reqwest::Error::without_url)
        .context(ReqwestSnafu { endpoint })?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown API error".to_string());
        return ApiSnafu {
            endpoint,
            status: status.as_u16(),
            message,
        }
        .fail();
    }

    response
        .text()
        .await
        .map_err(reqwest::Error::without_url)
        .context(ReqwestSnafu { endpoint })
}

/// Decodes a JSON body into `T`, tagging failures with the endpoint.
pub(crate) fn decode_json<T: DeserializeOwned>(
    body: &str,
    endpoint: &str,
) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        ParseSnafu {
            endpoint,
            message: e.to_string(),
        }
        .build()
    })
}

/// GET `url` with `query` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ProviderError> {
    let body = send_for_text(client.get(url).query(query), url).await?;
    decode_json(&body, url)
}

/// Strips a trailing slash and rejects URLs reqwest would not accept.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ProviderInitError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return InvalidBaseUrlSnafu {
            url: raw,
            message: "expected an http(s) URL",
        }
        .fail();
    }
    reqwest::Url::parse(trimmed).map_err(|e| {
        InvalidBaseUrlSnafu {
            url: raw,
            message: e.to_string(),
        }
        .build()
    })?;
    Ok(trimmed.to_string())
}
