//! HTTPS enforcement - redirects plain-HTTP requests to their https:// URL.
//!
//! The effective scheme honours `Forwarded` / `X-Forwarded-Proto`, so the
//! check works behind a TLS-terminating proxy.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;

/// HTTPS enforcement middleware factory.
#[derive(Debug, Clone, Copy)]
pub struct HttpsRedirect {
    enabled: bool,
}

impl HttpsRedirect {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HttpsRedirect
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = HttpsRedirectService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HttpsRedirectService {
            service,
            enabled: self.enabled,
        }))
    }
}

pub struct HttpsRedirectService<S> {
    service: S,
    enabled: bool,
}

impl<S, B> Service<ServiceRequest> for HttpsRedirectService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secure_url = if self.enabled {
            let info = req.connection_info();
            (info.scheme() != "https").then(|| {
                let path_and_query = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                format!("https://{}{}", info.host(), path_and_query)
            })
        } else {
            None
        };

        if let Some(location) = secure_url {
            tracing::debug!(location = %location, "Redirecting to HTTPS");

            // 308 keeps the method and body on the retried request
            let response = HttpResponse::PermanentRedirect()
                .insert_header((header::LOCATION, location))
                .finish();
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
