//! Response helpers shared by the provider clients.

use crate::error::ProviderError;

/// Return the response unchanged on 2xx, otherwise a
/// [`ProviderError::Api`] with the status and body text.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

/// Collect a successful response body as raw bytes.
pub(crate) async fn read_bytes(response: reqwest::Response) -> Result<Vec<u8>, ProviderError> {
    let response = ensure_success(response).await?;
    Ok(response.bytes().await?.to_vec())
}
