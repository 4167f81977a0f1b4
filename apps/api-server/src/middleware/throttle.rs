//! Per-client request throttle middleware.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use futures::future::LocalBoxFuture;

use innerspell_infra::RequestThrottle;
use innerspell_shared::ErrorResponse;

/// Throttle middleware factory, keyed by the client's real IP.
pub struct ThrottleMiddleware {
    throttle: Arc<RequestThrottle>,
}

impl ThrottleMiddleware {
    pub fn new(throttle: Arc<RequestThrottle>) -> Self {
        Self { throttle }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ThrottleMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ThrottleMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ThrottleMiddlewareService {
            service,
            throttle: self.throttle.clone(),
        }))
    }
}

pub struct ThrottleMiddlewareService<S> {
    service: S,
    throttle: Arc<RequestThrottle>,
}

impl<S, B> Service<ServiceRequest> for ThrottleMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        if let Err(wait) = self.throttle.check(&client) {
            let retry_after = wait.as_secs().max(1);
            tracing::warn!(client = %client, retry_after, "Request throttled");

            let error = ErrorResponse::too_many_requests(format!(
                "Too many requests. Try again in {} seconds.",
                retry_after
            ));
            let response = HttpResponse::TooManyRequests()
                .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                .json(error);

            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);
            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test, web};
    use innerspell_infra::ThrottleConfig;

    #[actix_web::test]
    async fn test_throttle_rejects_after_burst() {
        let throttle = Arc::new(
            RequestThrottle::new(&ThrottleConfig {
                per_second: 1,
                burst: 2,
            })
            .unwrap(),
        );
        let app = test::init_service(
            App::new()
                .wrap(ThrottleMiddleware::new(throttle))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..2 {
            let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(header::RETRY_AFTER));
    }
}
