use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, Expiration, SameSite};
use axum_macros::debug_middleware;
use threadlab_database::{
    common::BROWSER_ID_COOKIE,
    impls::ThreadlabContext,
    utils::generate_browser_id,
};
use time::{Duration, OffsetDateTime};

/// Random id of the browser which sent a request, see [BROWSER_ID_COOKIE].
#[derive(Clone, Debug, PartialEq)]
pub struct BrowserId(pub String);

/// Cookies which the reader keeps for the duration of a study.
pub fn build_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .same_site(SameSite::Lax)
        .path("/")
        .http_only(true)
        .secure(secure)
        .expires(Expiration::DateTime(
            OffsetDateTime::now_utc() + Duration::weeks(52),
        ))
        .build()
}

/// Makes the browser id available as request extension [BrowserId]. Browsers without id
/// cookie get a new one.
#[debug_middleware]
pub(super) async fn browser_id_middleware(
    State(context): State<ThreadlabContext>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let existing = jar
        .get(BROWSER_ID_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());
    let id = existing.clone().unwrap_or_else(generate_browser_id);
    request.extensions_mut().insert(BrowserId(id.clone()));
    let response = next.run(request).await;
    if existing.is_some() {
        return response;
    }
    let cookie = build_cookie(
        BROWSER_ID_COOKIE.to_string(),
        id,
        context.conf.options.secure_cookies,
    );
    (jar.add(cookie), response).into_response()
}
