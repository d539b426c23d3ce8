//! Mini-program card handlers, mounted under `/miniprogram`.
//!
//! ```text
//! GET  /miniprogram/login?js_code=...        -> "<session token>"
//! GET  /miniprogram/getid?session=...        -> 7
//! GET  /miniprogram/get?id=7                 -> {"id":7,"openid":"...","name":...}
//! POST /miniprogram/set?session=... name=... -> {"id":7,...}
//! GET  /miniprogram/getcode?id=7             -> image bytes
//! ```
//!
//! `/check`, `/add` and `/update` remain for older mini-program builds.

use actix_web::{HttpResponse, get, http::header, post, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{Error, ProfilePatch, SessionToken, UserId, UserRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation;

/// `?js_code=` from `wx.login()`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    pub js_code: String,
}

/// `?session=` token returned by `/login`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SessionQuery {
    pub session: String,
}

/// `?session=` on write endpoints, where the form may carry it instead.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OptionalSessionQuery {
    pub session: Option<String>,
}

/// `?id=` of a card.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    pub id: i32,
}

/// `?session=&id=` for the ownership-checked update.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OwnedCardQuery {
    pub session: String,
    pub id: i32,
}

/// Parameters of a card write: profile fields plus an optional session.
///
/// Read from both the query string and a url-encoded body; a field given in
/// the query wins over the same field in the body.
#[derive(Debug, Default, Deserialize)]
pub struct CardForm {
    pub session: Option<String>,
    #[serde(flatten)]
    pub patch: ProfilePatch,
}

impl CardForm {
    /// Overlay `self` (the query) on an optional body.
    fn merged_over(self, body: Option<web::Form<CardForm>>) -> Self {
        let Some(body) = body else {
            return self;
        };
        let CardForm { session, patch } = body.into_inner();
        Self {
            session: self.session.or(session),
            patch: self.patch.merged_over(patch),
        }
    }
}

fn card_id(raw: i32) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| Error::not_found(format!("card {raw} does not exist")))
}

fn session_from(session: Option<String>) -> Result<SessionToken, Error> {
    session
        .filter(|session| !session.trim().is_empty())
        .map(SessionToken::from)
        .ok_or_else(|| Error::invalid_request("session is required"))
}

/// Exchange a WeChat login code for a session token.
#[utoipa::path(
    get,
    path = "/miniprogram/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Session token", body = String),
        (status = 400, description = "Missing js_code", body = Error),
        (status = 403, description = "Exchange failed or carried no identity", body = Error)
    ),
    tags = ["cards"],
    operation_id = "login"
)]
#[get("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    query: web::Query<LoginQuery>,
) -> ApiResult<web::Json<String>> {
    let token = state.cards.login(&query.js_code).await?;
    Ok(web::Json(token.to_string()))
}

/// Id of the card bound to the session.
#[utoipa::path(
    get,
    path = "/miniprogram/getid",
    params(SessionQuery),
    responses(
        (status = 200, description = "Card id", body = i32),
        (status = 403, description = "Unknown session or no card yet", body = Error)
    ),
    tags = ["cards"],
    operation_id = "getId"
)]
#[get("/getid")]
pub async fn get_id(
    state: web::Data<HttpState>,
    query: web::Query<SessionQuery>,
) -> ApiResult<web::Json<i32>> {
    let token = SessionToken::from(query.into_inner().session);
    let id = state.cards.get_user_id(&token).await?;
    Ok(web::Json(id.get()))
}

/// Fetch a card by id.
#[utoipa::path(
    get,
    path = "/miniprogram/get",
    params(IdQuery),
    responses(
        (status = 200, description = "Card", body = UserRecord),
        (status = 403, description = "Unknown card", body = Error)
    ),
    tags = ["cards"],
    operation_id = "getCard"
)]
#[get("/get")]
pub async fn get_card(
    state: web::Data<HttpState>,
    query: web::Query<IdQuery>,
) -> ApiResult<web::Json<UserRecord>> {
    let record = state.cards.get_profile(card_id(query.id)?).await?;
    Ok(web::Json(record))
}

/// Older alias of `/get`.
#[utoipa::path(
    get,
    path = "/miniprogram/check",
    params(IdQuery),
    responses(
        (status = 200, description = "Card", body = UserRecord),
        (status = 403, description = "Unknown card", body = Error)
    ),
    tags = ["cards"],
    operation_id = "checkCard"
)]
#[get("/check")]
pub async fn check_card(
    state: web::Data<HttpState>,
    query: web::Query<IdQuery>,
) -> ApiResult<web::Json<UserRecord>> {
    let record = state.cards.get_profile(card_id(query.id)?).await?;
    Ok(web::Json(record))
}

/// Create or patch the caller's card. Absent fields keep their value.
///
/// Fields may come in the query string, a url-encoded body, or both.
#[utoipa::path(
    post,
    path = "/miniprogram/set",
    params(OptionalSessionQuery),
    request_body(content = ProfilePatch, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Stored card", body = UserRecord),
        (status = 400, description = "Missing session", body = Error),
        (status = 403, description = "Unknown session", body = Error)
    ),
    tags = ["cards"],
    operation_id = "setCard"
)]
#[post("/set")]
pub async fn set_card(
    state: web::Data<HttpState>,
    query: web::Query<CardForm>,
    form: Option<web::Form<CardForm>>,
) -> ApiResult<web::Json<UserRecord>> {
    let CardForm { session, patch } = query.into_inner().merged_over(form);
    let token = session_from(session)?;
    let record = state.cards.set_profile(&token, &patch).await?;
    Ok(web::Json(record))
}

/// Create the caller's card; rejected if one exists.
#[utoipa::path(
    post,
    path = "/miniprogram/add",
    params(OptionalSessionQuery),
    request_body(content = ProfilePatch, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Created card", body = UserRecord),
        (status = 400, description = "Missing session", body = Error),
        (status = 403, description = "Unknown session or card already exists", body = Error)
    ),
    tags = ["cards"],
    operation_id = "addCard"
)]
#[post("/add")]
pub async fn add_card(
    state: web::Data<HttpState>,
    query: web::Query<CardForm>,
    form: Option<web::Form<CardForm>>,
) -> ApiResult<web::Json<UserRecord>> {
    let CardForm { session, patch } = query.into_inner().merged_over(form);
    let token = session_from(session)?;
    let record = state.cards.create_profile(&token, &patch).await?;
    Ok(web::Json(record))
}

/// Patch card `id`, which the session must own.
#[utoipa::path(
    post,
    path = "/miniprogram/update",
    params(OwnedCardQuery),
    request_body(content = ProfilePatch, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Updated card", body = UserRecord),
        (status = 403, description = "Unknown session or card not owned", body = Error)
    ),
    tags = ["cards"],
    operation_id = "updateCard"
)]
#[post("/update")]
pub async fn update_card(
    state: web::Data<HttpState>,
    query: web::Query<OwnedCardQuery>,
    fields: web::Query<ProfilePatch>,
    form: Option<web::Form<ProfilePatch>>,
) -> ApiResult<web::Json<UserRecord>> {
    let OwnedCardQuery { session, id } = query.into_inner();
    let token = SessionToken::from(session);
    let body = form.map(web::Form::into_inner).unwrap_or_default();
    let patch = fields.into_inner().merged_over(body);
    let record = state
        .cards
        .update_profile(&token, card_id(id)?, &patch)
        .await?;
    Ok(web::Json(record))
}

/// Mini-program QR code opening card `id`.
#[utoipa::path(
    get,
    path = "/miniprogram/getcode",
    params(IdQuery),
    responses(
        (status = 200, description = "QR image", content_type = "image/jpeg", body = Vec<u8>),
        (status = 403, description = "Unknown card or WeChat failure", body = Error)
    ),
    tags = ["cards"],
    operation_id = "getCode"
)]
#[get("/getcode")]
pub async fn get_code(
    state: web::Data<HttpState>,
    query: web::Query<IdQuery>,
) -> ApiResult<HttpResponse> {
    let image = state.cards.get_qr_code(card_id(query.id)?).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, image.content_type))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .body(image.bytes))
}

/// Register the card handlers and extractor settings on a scope.
///
/// ```
/// use actix_web::{App, web};
/// use backend::inbound::http::cards;
///
/// let _app = App::new().service(web::scope("/miniprogram").configure(cards::configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::query_config())
        .app_data(validation::form_config())
        .service(login)
        .service(get_id)
        .service(get_card)
        .service(check_card)
        .service(set_card)
        .service(add_card)
        .service(update_card)
        .service(get_code);
}

#[cfg(test)]
#[path = "cards_tests.rs"]
mod tests;
