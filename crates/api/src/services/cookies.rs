//! Session cookie helper.
//!
//! Builds, reads and clears the httpOnly access/refresh token cookies that
//! carry the identity provider's session between browser requests.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use domain::services::Session;

use crate::config::SessionConfig;

#[derive(Debug, Clone)]
pub struct CookieHelper {
    config: SessionConfig,
}

impl CookieHelper {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Extract a cookie value from request headers by name.
    ///
    /// Every `Cookie` header is searched; the first match wins.
    pub fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .map(str::trim)
            .find_map(|cookie| {
                let (cookie_name, cookie_value) = cookie.split_once('=')?;
                (cookie_name == name && !cookie_value.is_empty()).then_some(cookie_value)
            })
    }

    pub fn access_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        Self::extract_cookie(headers, &self.config.access_cookie)
    }

    pub fn refresh_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        Self::extract_cookie(headers, &self.config.refresh_cookie)
    }

    pub fn code_verifier<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        Self::extract_cookie(headers, &self.config.code_verifier_cookie)
    }

    /// Set-Cookie values for a freshly issued session.
    pub fn session_cookies(&self, session: &Session) -> Vec<String> {
        vec![
            self.build_cookie(&self.config.access_cookie, &session.access_token),
            self.build_cookie(&self.config.refresh_cookie, &session.refresh_token),
        ]
    }

    /// Set-Cookie values that remove the session.
    pub fn clear_cookies(&self) -> Vec<String> {
        vec![
            self.build_clear_cookie(&self.config.access_cookie),
            self.build_clear_cookie(&self.config.refresh_cookie),
        ]
    }

    pub fn clear_verifier_cookie(&self) -> String {
        self.build_clear_cookie(&self.config.code_verifier_cookie)
    }

    /// Appends each value as its own `Set-Cookie` header.
    pub fn append_all(headers: &mut HeaderMap, cookies: &[String]) {
        for cookie in cookies {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                headers.append(SET_COOKIE, value);
            }
        }
    }

    fn build_cookie(&self, name: &str, value: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            name, value, self.config.max_age_secs
        );
        self.push_attributes(&mut cookie);
        cookie
    }

    fn build_clear_cookie(&self, name: &str) -> String {
        let mut cookie = format!(
            "{}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly",
            name
        );
        self.push_attributes(&mut cookie);
        cookie
    }

    fn push_attributes(&self, cookie: &mut String) {
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.config.same_site));
        if !self.config.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.config.domain));
        }
    }
}
