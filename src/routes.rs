// src/routes.rs
use log::{error, info};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::config::AppConfig;
use crate::handlers;
use crate::handlers::error::{reject, ApiError};
use crate::services::auth::verify_token;
use crate::services::db::DocumentStore;
use crate::services::mailer::Mailer;
use crate::services::otp::OtpClient;

const JSON_BODY_LIMIT: u64 = 64 * 1024;
// Room for 5 files at 10MB plus multipart boundary overhead.
const MULTIPART_LIMIT: u64 = 60 * 1024 * 1024;

fn with_db(
    db: Arc<DocumentStore>,
) -> impl Filter<Extract = (Arc<DocumentStore>,), Error = Infallible> + Clone {
    warp::any().map(move || db.clone())
}

fn with_config(
    cfg: Arc<AppConfig>,
) -> impl Filter<Extract = (Arc<AppConfig>,), Error = Infallible> + Clone {
    warp::any().map(move || cfg.clone())
}

fn with_mailer(
    mailer: Arc<Mailer>,
) -> impl Filter<Extract = (Arc<Mailer>,), Error = Infallible> + Clone {
    warp::any().map(move || mailer.clone())
}

fn with_otp(
    otp: Arc<OtpClient>,
) -> impl Filter<Extract = (Arc<OtpClient>,), Error = Infallible> + Clone {
    warp::any().map(move || otp.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
{
    warp::body::content_length_limit(JSON_BODY_LIMIT).and(warp::body::json())
}

/// Extract the caller's user id from the `Authorization: Bearer` header.
/// Missing header is 401, bad or expired token 403.
fn authenticated(
    cfg: Arc<AppConfig>,
) -> impl Filter<Extract = (String,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization").and_then(move |header: Option<String>| {
        let cfg = cfg.clone();
        async move {
            let header = header
                .ok_or_else(|| reject(ApiError::unauthorized("Authorization token required")))?;
            let token = header.strip_prefix("Bearer ").unwrap_or(header.as_str());
            let claims = verify_token(token, &cfg.jwt_secret)
                .map_err(|_| reject(ApiError::forbidden("Invalid token")))?;
            Ok::<String, Rejection>(claims.sub)
        }
    })
}

// Recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, body) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            json!({ "success": false, "message": "Not Found" }),
        )
    } else if let Some(api_error) = err.find::<ApiError>() {
        let mut body = json!({ "success": false, "message": api_error.message });
        if !api_error.missing_fields.is_empty() {
            body["missingFields"] = json!(api_error.missing_fields);
        }
        (api_error.status(), body)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": e.to_string() }),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            json!({ "success": false, "message": "Payload too large" }),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "success": false, "message": "Method not allowed" }),
        )
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": false, "message": "Internal server error" }),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}

pub fn routes(
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
    mailer: Arc<Mailer>,
    otp: Arc<OtpClient>,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Infallible> + Clone {
    info!("Configuring routes...");

    let register = warp::path!("register")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db.clone()))
        .and_then(handlers::auth::register);

    let login = warp::path!("login")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db.clone()))
        .and(with_config(cfg.clone()))
        .and_then(handlers::auth::login);

    let get_user = warp::path!("user")
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::auth::get_user);

    let update_user = warp::path!("user")
        .and(warp::put())
        .and(authenticated(cfg.clone()))
        .and(json_body())
        .and(with_db(db.clone()))
        .and_then(handlers::auth::update_user);

    let request_reset = warp::path!("request-reset-password")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db.clone()))
        .and(with_mailer(mailer))
        .and_then(handlers::auth::request_reset_password);

    let reset_password = warp::path!("reset-password")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db.clone()))
        .and_then(handlers::auth::reset_password);

    let request_signup_otp = warp::path!("request-signup-otp")
        .and(warp::post())
        .and(json_body())
        .and(with_otp(otp.clone()))
        .and_then(handlers::otp::request_signup_otp);

    let signup = warp::path!("signup")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db.clone()))
        .and(with_config(cfg.clone()))
        .and(with_otp(otp))
        .and_then(handlers::otp::signup);

    let calculate_quote = warp::path!("calculate-solar-quote")
        .and(warp::post())
        .and(authenticated(cfg.clone()))
        .and(json_body())
        .and(with_db(db.clone()))
        .and(with_config(cfg.clone()))
        .and_then(handlers::quote::calculate_solar_quote);

    let quote_history = warp::path!("solar-quotes")
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::quote::get_solar_quotes);

    let apply_loan = warp::path!("loan")
        .and(warp::post())
        .and(authenticated(cfg.clone()))
        .and(json_body())
        .and(with_db(db.clone()))
        .and_then(handlers::loan::apply_loan);

    let loan_details = warp::path!("loan" / "details")
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::loan::get_loan_details);

    let update_loan = warp::path!("loan" / "details")
        .and(warp::put())
        .and(authenticated(cfg.clone()))
        .and(json_body())
        .and(with_db(db.clone()))
        .and_then(handlers::loan::update_loan_details);

    let loan_documents = warp::path!("loan" / "documents")
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::loan::get_loan_documents);

    let upload_loan_documents = warp::path!("loan" / "documents")
        .and(warp::post())
        .and(authenticated(cfg.clone()))
        .and(warp::multipart::form().max_length(MULTIPART_LIMIT))
        .and(with_db(db.clone()))
        .and(with_config(cfg.clone()))
        .and_then(handlers::loan::upload_loan_documents);

    let upload = warp::path!("upload")
        .and(warp::post())
        .and(authenticated(cfg.clone()))
        .and(warp::multipart::form().max_length(MULTIPART_LIMIT))
        .and(with_db(db.clone()))
        .and(with_config(cfg.clone()))
        .and_then(handlers::files::upload_files);

    let list_files = warp::path!("files")
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::files::list_files);

    let files_by_type = warp::path!("files" / "type" / String)
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::files::files_by_type);

    let files_by_document_type = warp::path!("files" / "document-type" / String)
        .and(warp::get())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::files::files_by_document_type);

    let delete_file = warp::path!("files" / String)
        .and(warp::delete())
        .and(authenticated(cfg.clone()))
        .and(with_db(db.clone()))
        .and_then(handlers::files::delete_file);

    let book_call = warp::path!("book-call")
        .and(warp::post())
        .and(json_body())
        .and(with_db(db))
        .and_then(handlers::call::book_call);

    let project_status = warp::path!("project-status")
        .and(warp::get())
        .and_then(handlers::project::get_project_status);

    let static_uploads = warp::path("uploads").and(warp::fs::dir(cfg.upload_dir.clone()));

    info!("All routes configured successfully.");

    register
        .or(login)
        .or(get_user)
        .or(update_user)
        .or(request_reset)
        .or(reset_password)
        .or(request_signup_otp)
        .or(signup)
        .or(calculate_quote)
        .or(quote_history)
        .or(apply_loan)
        .or(loan_details)
        .or(update_loan)
        .or(loan_documents)
        .or(upload_loan_documents)
        .or(upload)
        .or(list_files)
        .or(files_by_type)
        .or(files_by_document_type)
        .or(delete_file)
        .or(book_call)
        .or(project_status)
        .or(static_uploads)
        .recover(handle_rejection)
        .map(|reply| Reply::into_response(reply))
}
