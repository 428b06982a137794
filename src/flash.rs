use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

const COOKIE_NAME: &str = "flash_notice";

/// One-shot success notice carried from a mutation to the next listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    PostCreated,
    PostUpdated,
    PostTrashed,
}

impl Notice {
    fn key(self) -> &'static str {
        match self {
            Notice::PostCreated => "created",
            Notice::PostUpdated => "updated",
            Notice::PostTrashed => "trashed",
        }
    }

    fn from_key(key: &str) -> Option<Notice> {
        match key {
            "created" => Some(Notice::PostCreated),
            "updated" => Some(Notice::PostUpdated),
            "trashed" => Some(Notice::PostTrashed),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::PostCreated => "Post created successfully.",
            Notice::PostUpdated => "Post updated successfully!",
            Notice::PostTrashed => "Post moved to trash!",
        }
    }
}

/// `303 See Other` to `to`, setting the flash cookie.
pub fn redirect_with_notice(to: &str, notice: Notice) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age=60",
        COOKIE_NAME,
        notice.key()
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response()
}

/// Expires the flash cookie on `response`.
pub fn clear_notice(response: &mut Response) {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", COOKIE_NAME);
    if let Ok(value) = cookie.parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// The pending notice, if the request carries a flash cookie.
#[derive(Debug, Clone, Copy)]
pub struct Flash(pub Option<Notice>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let notice = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == COOKIE_NAME)
            .and_then(|(_, value)| Notice::from_key(value));
        Ok(Flash(notice))
    }
}
