//! Defines functions for handling user authentication with cookies.
//!
//! A single private cookie holds a JSON [Token] with the user ID and the
//! session expiry. The cookie is encrypted and signed by the
//! [axum_extra::extract::PrivateCookieJar], so the client cannot read or
//! forge its contents.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{Error, auth::token::Token, user::UserID};

pub(crate) const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the initial expiry of the cookie to `duration` from the current time
/// in the timezone given by `local_offset`.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc().to_offset(local_offset) + duration;
    let token = Token {
        user_id,
        expires_at,
    };

    set_token_cookie(jar, token)
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the expiry of the auth cookie in `jar` to the latest of now plus
/// `duration` and the token's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - the errors of [get_token_from_cookies] if the token is missing, invalid or expired.
/// - [Error::InvalidDateFormat] if extending the expiry by `duration` would overflow the date time.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let now = OffsetDateTime::now_utc().to_offset(local_offset);
    let new_expiry = now.checked_add(duration).ok_or_else(|| {
        Error::InvalidDateFormat(
            "date time overflow while extending the cookie expiry".to_owned(),
            now.to_string(),
        )
    })?;

    let expires_at = max(token.expires_at, new_expiry);

    set_token_cookie(
        jar,
        Token {
            user_id: token.user_id,
            expires_at,
        },
    )
}

/// Get the auth token from the private cookie jar.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if the auth cookie is not in the cookie jar.
/// - [Error::InvalidCredentials] if the cookie contents cannot be parsed as a token.
/// - [Error::ExpiredAuthToken] if the token has passed its expiry time.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let token_cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    let token: Token = serde_json::from_str(token_cookie.value_trimmed())
        .map_err(|_| Error::InvalidCredentials)?;

    if token.expires_at < OffsetDateTime::now_utc() {
        return Err(Error::ExpiredAuthToken);
    }

    Ok(token)
}

fn set_token_cookie(jar: PrivateCookieJar, token: Token) -> Result<PrivateCookieJar, Error> {
    let expires_at = token.expires_at;
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Error,
        auth::cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_token_from_cookies},
        user::UserID,
    };

    use super::{extend_auth_cookie_duration_if_needed, invalidate_auth_cookie, set_auth_cookie};

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    /// Test helper macro to assert that two date times are within one second
    /// of each other. Used instead of a function so that the file and line
    /// number of the caller is included in the error message instead of the
    /// helper.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(1),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn can_set_cookie() {
        let jar = get_jar();
        let user_id = UserID::new(1);

        let jar = set_auth_cookie(jar, user_id, DEFAULT_COOKIE_DURATION, UtcOffset::UTC).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_eq!(token.user_id, user_id);
        assert_date_time_close!(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(5)
        );

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_date_time_close!(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::minutes(5)
        );
    }

    #[test]
    fn get_token_fails_with_empty_jar() {
        let jar = get_jar();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn get_token_fails_with_malformed_cookie() {
        let jar = get_jar().add(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build());

        assert_eq!(get_token_from_cookies(&jar), Err(Error::InvalidCredentials));
    }

    #[test]
    fn get_token_fails_with_expired_token() {
        let jar = get_jar();
        let jar = set_auth_cookie(
            jar,
            UserID::new(1),
            Duration::minutes(-5),
            UtcOffset::UTC,
        )
        .unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(Error::ExpiredAuthToken));
    }

    #[test]
    fn can_extend_cookie_duration() {
        let jar = get_jar();
        let jar =
            set_auth_cookie(jar, UserID::new(1), DEFAULT_COOKIE_DURATION, UtcOffset::UTC).unwrap();

        let jar =
            extend_auth_cookie_duration_if_needed(jar, Duration::minutes(10), UtcOffset::UTC)
                .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_date_time_close!(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(10)
        );
    }

    #[test]
    fn cookie_duration_does_not_shrink() {
        let jar =
            set_auth_cookie(get_jar(), UserID::new(1), DEFAULT_COOKIE_DURATION, UtcOffset::UTC)
                .unwrap();
        let want = get_token_from_cookies(&jar).unwrap().expires_at;

        // The initial cookie is set to expire in 5 minutes, so extending it by 5 seconds should not change the expiry.
        let jar =
            extend_auth_cookie_duration_if_needed(jar, Duration::seconds(5), UtcOffset::UTC)
                .unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_eq!(token.expires_at, want);
    }

    #[test]
    fn invalidate_auth_cookie_succeeds() {
        let user_id = UserID::new(1);
        let jar =
            set_auth_cookie(get_jar(), user_id, DEFAULT_COOKIE_DURATION, UtcOffset::UTC).unwrap();

        let jar = invalidate_auth_cookie(jar);
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials),
        );
    }
}
