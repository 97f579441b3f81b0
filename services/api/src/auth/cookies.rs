//! Session cookies carrying the token pair

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::models::user::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .build()
}

/// Add both token cookies
pub fn with_session(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure))
}

/// Expire both token cookies
pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
        }
    }

    #[test]
    fn session_cookies_are_locked_down() {
        let jar = with_session(CookieJar::new(), &pair(), true);

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "access");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Strict));
        assert_eq!(access.secure(), Some(true));

        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "refresh");
    }

    #[test]
    fn development_cookies_are_not_secure() {
        let jar = with_session(CookieJar::new(), &pair(), false);
        assert_eq!(jar.get(ACCESS_COOKIE).unwrap().secure(), Some(false));
    }

    #[test]
    fn clearing_removes_both() {
        let jar = without_session(with_session(CookieJar::new(), &pair(), false));
        assert!(jar.get(ACCESS_COOKIE).is_none());
        assert!(jar.get(REFRESH_COOKIE).is_none());
    }
}
