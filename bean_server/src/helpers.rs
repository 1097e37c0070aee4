use actix_web::{
    error::{JsonPayloadError, PathError},
    HttpRequest,
};
use log::debug;

use crate::errors::ServerError;

/// Renders JSON body errors the same way as every other error the server returns.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejected JSON body for {}. {err}", req.path());
    ServerError::InvalidRequestBody(err.to_string()).into()
}

/// Malformed ids in the path are reported as missing records.
pub fn path_error_handler(err: PathError, req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Invalid path parameter in {}. {err}", req.path());
    ServerError::NoRecordFound("Invalid resource id".into()).into()
}
