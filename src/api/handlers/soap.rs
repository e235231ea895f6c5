use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{incidents::IncidentService, soap::SoapService};

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// SOAP 1.1 endpoint. Faults are returned with HTTP 500.
pub async fn soap_endpoint(State(pool): State<SqlitePool>, body: String) -> Response {
    let (status, xml) = match SoapService::new(IncidentService::new(pool)).handle(&body).await {
        Ok(xml) => (StatusCode::OK, xml),
        Err(fault) => (StatusCode::INTERNAL_SERVER_ERROR, fault),
    };
    (status, [(header::CONTENT_TYPE, SOAP_CONTENT_TYPE)], xml).into_response()
}
