use crate::s3::S3;
use anyhow::Result;
use bytes::Bytes;
use reqwest::{
    Method, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::collections::BTreeMap;
use url::Url;

/// Send a signed request, the body is sent as is
///
/// # Errors
///
/// Will return `Err` if the headers are invalid or the request can not be sent
pub async fn request(
    s3: &S3,
    url: Url,
    method: Method,
    headers: &BTreeMap<String, String>,
    body: Option<Bytes>,
) -> Result<Response> {
    let headers = headers
        .iter()
        .map(|(k, v)| Ok((k.parse::<HeaderName>()?, v.parse::<HeaderValue>()?)))
        .collect::<Result<HeaderMap>>()?;

    log::debug!("{method} {url}");

    let mut request = s3.client().request(method, url).headers(headers);

    if let Some(timeout) = s3.timeout() {
        request = request.timeout(timeout);
    }

    if let Some(body) = body {
        request = request.body(body);
    }

    Ok(request.send().await?)
}
