use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

/// Value of a request cookie, if present.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

pub fn set(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, value, max_age_secs
    )
}

pub fn clear(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", name)
}

/// Appends `Set-Cookie` headers to an already built response.
pub fn with_cookies<I>(mut res: Response, cookies: I) -> Response
where
    I: IntoIterator<Item = String>,
{
    for c in cookies {
        match HeaderValue::from_str(&c) {
            Ok(v) => {
                res.headers_mut().append(header::SET_COOKIE, v);
            }
            Err(e) => tracing::warn!(error = %e, "dropping unencodable cookie"),
        }
    }
    res
}

/// 303 redirect that also sets the given cookies.
pub fn redirect<I>(to: &str, cookies: I) -> Response
where
    I: IntoIterator<Item = String>,
{
    with_cookies(Redirect::to(to).into_response(), cookies)
}
