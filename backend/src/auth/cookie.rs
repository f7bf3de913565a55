//! Auth cookie handling
//!
//! Builds Set-Cookie header values and extracts cookies from requests.
//! All auth cookies are SameSite=Lax and Secure in production; only
//! `logged_in` is readable by scripts.

use axum::http::{header, HeaderMap, HeaderValue};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl CookieConfig {
    /// Standard auth cookie: httpOnly, Lax, Max-Age aligned to a token TTL
    pub fn auth(name: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            name: name.to_string(),
            secure,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(max_age_secs),
        }
    }

    /// Script-readable cookie (`logged_in`): same policy minus HttpOnly
    pub fn readable(name: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            http_only: false,
            ..Self::auth(name, max_age_secs, secure)
        }
    }

    /// Build Set-Cookie header value
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));

        if let Some(max_age) = self.max_age_secs {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }

        cookie
    }

    /// Build Set-Cookie header value that deletes the cookie
    pub fn build_delete_cookie(name: &str) -> String {
        format!("{}=; HttpOnly; Path=/; Max-Age=0", name)
    }
}

/// Extract a cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Append a Set-Cookie header to a response header map
pub fn append_set_cookie(headers: &mut HeaderMap, config: &CookieConfig, value: &str) {
    if let Ok(header_value) = HeaderValue::from_str(&config.build_set_cookie(value)) {
        headers.append(header::SET_COOKIE, header_value);
    }
}

/// Append a deletion Set-Cookie header to a response header map
pub fn append_delete_cookie(headers: &mut HeaderMap, name: &str) {
    if let Ok(header_value) = HeaderValue::from_str(&CookieConfig::build_delete_cookie(name)) {
        headers.append(header::SET_COOKIE, header_value);
    }
}
