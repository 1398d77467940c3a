//! Shared-secret authentication for the operator endpoints
//!
//! Requests must carry the configured token in the `X-Admin-Token` header.
//! Without a configured token the protected routes answer 404, as if they
//! did not exist.

use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use constant_time_eq::constant_time_eq;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::error::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Admin authentication middleware factory
#[derive(Clone)]
pub struct AdminAuth {
    token: Option<Arc<str>>,
}

impl AdminAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
            token: self.token.clone(),
        }))
    }
}

/// Admin authentication middleware service
pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
    token: Option<Arc<str>>,
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token = self.token.clone();

        Box::pin(async move {
            let Some(expected) = token else {
                return Ok(reject(req, ApiError::NotFound));
            };

            let provided = req
                .headers()
                .get(ADMIN_TOKEN_HEADER)
                .map(|value| value.as_bytes())
                .unwrap_or_default();

            if !constant_time_eq(provided, expected.as_bytes()) {
                warn!(path = %req.path(), "Rejected operator request with invalid admin token");
                return Ok(reject(req, ApiError::Unauthorized));
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

fn reject<B>(req: ServiceRequest, error: ApiError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(error.error_response()).map_into_right_body()
}
