//! Converts handler panics into 500 responses so a worker keeps serving.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use std::any::Any;
use std::future::{Ready, ready};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

use crate::error::AppError;

/// Panic recovery middleware factory.
pub struct PanicRecovery;

impl<S, B> Transform<S, ServiceRequest> for PanicRecovery
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PanicRecoveryMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PanicRecoveryMiddleware { service }))
    }
}

/// Panic recovery middleware service.
pub struct PanicRecoveryMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PanicRecoveryMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // The router needs sole ownership of the request, so keep only strings
        let method = req.method().to_string();
        let path = req.path().to_string();

        let fut = match catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                let err = panic_error(&method, &path, payload);
                return Box::pin(async move { Err(err) });
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(panic_error(&method, &path, payload)),
            }
        })
    }
}

fn panic_error(method: &str, path: &str, payload: Box<dyn Any + Send>) -> Error {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    error!(
        target: "api",
        method = %method,
        path = %path,
        "Handler panicked"
    );

    AppError::Internal(format!("panic: {}", detail)).into()
}
