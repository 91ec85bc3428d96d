//! Bearer-token extraction.
//!
//! The gateway does not issue or verify tokens; it forwards the caller's backend token. Expiry
//! is checked by the core client before each backend call.

/// Reasons an `Authorization` header cannot be used.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing Authorization header")]
    Missing,
    #[error("Authorization header must use the Bearer scheme")]
    WrongScheme,
    #[error("bearer token is empty")]
    Empty,
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim_start).ok_or(AuthError::Missing)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::WrongScheme)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::WrongScheme);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Empty);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(bearer_token(Some("bearer   tok ")), Ok("tok"));
    }

    #[test]
    fn rejects_other_headers() {
        assert_eq!(bearer_token(None), Err(AuthError::Missing));
        assert_eq!(bearer_token(Some("Basic dXNlcg==")), Err(AuthError::WrongScheme));
        assert_eq!(bearer_token(Some("Bearer")), Err(AuthError::WrongScheme));
        assert_eq!(bearer_token(Some("Bearer   ")), Err(AuthError::Empty));
    }
}
