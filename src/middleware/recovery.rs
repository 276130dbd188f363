use std::any::Any;

use axum::{body::Body, http::Response, response::IntoResponse};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::error::ApiError;

/// Turns a handler panic into a logged 500.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicToInternalError;

impl ResponseForPanic for PanicToInternalError {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            *s
        } else {
            "unknown panic payload"
        };

        ApiError::Internal(format!("handler panicked: {detail}")).into_response()
    }
}

pub fn recovery_layer() -> CatchPanicLayer<PanicToInternalError> {
    CatchPanicLayer::custom(PanicToInternalError)
}
