use actix_web::body::{BoxBody, MessageBody};
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{get, post, web, Error, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

use super::{add_log, views, HttpState};
use crate::infrastructure::config::AuthConfig;
use crate::infrastructure::security::{is_authenticated_marker, AUTHENTICATED_MARKER};

pub const LOGIN_PATH: &str = "/login";
const DEFAULT_COOKIE_NAME: &str = "auth-token";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

#[derive(Serialize)]
struct Unauthorized {
    error: &'static str,
}

pub fn is_public_path(path: &str) -> bool {
    path == LOGIN_PATH || path.starts_with("/static/")
}

fn cookie_name(req: &ServiceRequest) -> String {
    req.app_data::<web::Data<HttpState>>()
        .map(|state| state.auth.cookie_name.clone())
        .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string())
}

/// Pages redirect to the login form; `/api` callers get a 401.
pub async fn require_session(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let name = cookie_name(&req);
    let authenticated = req
        .cookie(&name)
        .map(|cookie| is_authenticated_marker(Some(cookie.value())))
        .unwrap_or(false);

    if authenticated || is_public_path(req.path()) {
        return Ok(next.call(req).await?.map_into_boxed_body());
    }

    let response = if req.path().starts_with("/api/") {
        HttpResponse::Unauthorized().json(Unauthorized {
            error: "Authentication required.",
        })
    } else {
        HttpResponse::Found()
            .insert_header((header::LOCATION, LOGIN_PATH))
            .finish()
    };
    Ok(req.into_response(response))
}

pub fn session_cookie(auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build(auth.cookie_name.clone(), AUTHENTICATED_MARKER)
        .path("/")
        .http_only(true)
        .secure(auth.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(auth.session_max_age_secs))
        .finish()
}

fn see_other(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((header::LOCATION, location));
    builder
}

#[get("/login")]
async fn login_form(data: web::Data<HttpState>, req: HttpRequest) -> HttpResponse {
    let signed_in = req
        .cookie(&data.auth.cookie_name)
        .map(|cookie| is_authenticated_marker(Some(cookie.value())))
        .unwrap_or(false);
    if signed_in {
        return see_other("/").finish();
    }

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(views::login_page(None))
}

#[post("/login")]
async fn login(data: web::Data<HttpState>, form: web::Form<LoginForm>) -> HttpResponse {
    match data.password_gate.verify(&form.password) {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Auth", "Login succeeded");
            see_other("/").cookie(session_cookie(&data.auth)).finish()
        }
        Err(err) => {
            add_log(&data.logs, "WARN", "Auth", &format!("Login rejected: {}", err));
            HttpResponse::build(err.status_code())
                .content_type("text/html; charset=utf-8")
                .body(views::login_page(Some(&err.user_message())))
        }
    }
}

#[post("/logout")]
async fn logout(data: web::Data<HttpState>) -> HttpResponse {
    let mut cookie = Cookie::build(data.auth.cookie_name.clone(), "")
        .path("/")
        .finish();
    cookie.make_removal();

    add_log(&data.logs, "INFO", "Auth", "Logged out");
    see_other(LOGIN_PATH).cookie(cookie).finish()
}
