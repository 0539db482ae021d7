//! Small response builders shared by handlers and `AppError`.

use actix_web::{
    http::{header, header::ContentType, StatusCode},
    HttpResponse,
};

/// A `200 OK` HTML page.
pub fn html(body: String) -> HttpResponse {
    html_with_status(StatusCode::OK, body)
}

pub fn html_with_status(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// A `303 See Other` redirect, so that a browser follows up form posts with a GET.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
