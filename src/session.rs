use std::io::Read as _;

use anyhow::Context as _;
use flate2::read::MultiGzDecoder;
use reqwest::header::{CONTENT_ENCODING, COOKIE, HeaderMap, HeaderValue, USER_AGENT};

use crate::config::Cookies;

const USER_AGENT_VALUE: &str = concat!("course-subtitles/", env!("CARGO_PKG_VERSION"));

/// `name=value` pairs joined the way browsers send them.
pub fn cookie_header(cookies: &Cookies) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Blocking client that sends the session cookies with every request.
///
/// Cookie values are checked for header safety when loaded; whether the
/// session is still valid only shows later as a failed or empty progress page.
pub fn build_client(cookies: &Cookies) -> anyhow::Result<reqwest::blocking::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    if !cookies.is_empty() {
        let value = HeaderValue::from_str(&cookie_header(cookies))
            .context("cookie values must be valid header text")?;
        headers.insert(COOKIE, value);
    }
    tracing::debug!(cookies = cookies.len(), "building http session");

    reqwest::blocking::Client::builder()
        .default_headers(headers)
        .timeout(None)
        .build()
        .context("build http client")
}

pub fn is_gzip_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("gzip"))
}

/// Body of an HTML page as text.
///
/// The client does no transparent decoding, so a page sent with
/// `Content-Encoding: gzip` anyway is unpacked here.
pub fn read_text(response: reqwest::blocking::Response) -> anyhow::Result<String> {
    let gzip_encoded = is_gzip_encoded(response.headers());
    let body = response.bytes().context("read response body")?;
    if !gzip_encoded {
        return Ok(String::from_utf8_lossy(&body).into_owned());
    }

    let mut plain = Vec::new();
    MultiGzDecoder::new(body.as_ref())
        .read_to_end(&mut plain)
        .context("decompress gzip-encoded page")?;
    Ok(String::from_utf8_lossy(&plain).into_owned())
}
