//! Cookie attributes, `Set-Cookie` encoding and request cookie lookup

use http::header::{HeaderMap, HeaderValue, InvalidHeaderValue, COOKIE};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub use cookie::{Cookie, SameSite};

/// Cookie attributes supplied by the surrounding framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieOptions {
    /// `Path` attribute
    #[serde(default = "default_path")]
    pub path: Option<String>,

    /// `Domain` attribute
    #[serde(default)]
    pub domain: Option<String>,

    /// `HttpOnly` attribute
    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// `Secure` attribute
    #[serde(default)]
    pub secure: bool,

    /// `SameSite` attribute
    #[serde(default = "default_same_site", with = "same_site_serde")]
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: default_path(),
            domain: None,
            http_only: default_http_only(),
            secure: false,
            same_site: default_same_site(),
        }
    }
}

impl CookieOptions {
    /// Build a cookie carrying these attributes
    pub fn cookie<'c>(
        &self,
        name: impl Into<Cow<'c, str>>,
        value: impl Into<Cow<'c, str>>,
    ) -> Cookie<'c> {
        let mut builder = Cookie::build((name, value))
            .http_only(self.http_only)
            .secure(self.secure);
        if let Some(path) = &self.path {
            builder = builder.path(path.clone());
        }
        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        builder.build()
    }
}

fn default_path() -> Option<String> {
    Some("/".to_string())
}

fn default_http_only() -> bool {
    true
}

fn default_same_site() -> Option<SameSite> {
    Some(SameSite::Lax)
}

/// Encode `cookie` as a `Set-Cookie` header value
///
/// Name and value are percent-encoded, so a value cannot smuggle in extra
/// attributes.
pub fn set_cookie_header(cookie: &Cookie<'_>) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&cookie.encoded().to_string())
}

/// Find a cookie by name in request `Cookie` headers
///
/// Malformed pairs are skipped; the first cookie called `name` wins.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<Cookie<'static>> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse_encoded(value))
        .filter_map(|parsed| parsed.ok())
        .find(|cookie| cookie.name() == name)
        .map(Cookie::into_owned)
}

mod same_site_serde {
    use super::SameSite;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const VARIANTS: &[&str] = &["strict", "lax", "none"];

    pub(super) fn serialize<S: Serializer>(
        value: &Option<SameSite>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(SameSite::Strict) => serializer.serialize_some("strict"),
            Some(SameSite::Lax) => serializer.serialize_some("lax"),
            Some(SameSite::None) => serializer.serialize_some("none"),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<SameSite>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        match raw.to_ascii_lowercase().as_str() {
            "strict" => Ok(Some(SameSite::Strict)),
            "lax" => Ok(Some(SameSite::Lax)),
            "none" => Ok(Some(SameSite::None)),
            _ => Err(de::Error::unknown_variant(&raw, VARIANTS)),
        }
    }
}
