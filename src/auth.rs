//! Caller identity. Authentication itself lives upstream; requests arrive
//! with an opaque `x-user-id` header that handlers resolve against the
//! `users` table before touching any user-owned data.

use axum::http::HeaderMap;

use crate::response::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

pub fn extract_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn require_user_id(headers: &HeaderMap) -> Result<String, AppError> {
    extract_user_id(headers)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid x-user-id header"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_trimmed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" user-1 "));
        assert_eq!(extract_user_id(&headers).as_deref(), Some("user-1"));
    }

    #[test]
    fn missing_or_blank_header_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_user_id(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_user_id(&headers), None);
        assert!(require_user_id(&headers).is_err());
    }
}
