//! Authorization gate and identity extractor.
//!
//! Reads pass through untouched. Writes must carry a valid bearer token; the
//! decoded [`Identity`] is stored in the request extensions for handlers.

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, StatusCode, header},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use tt_core::ports::{AuthError, TokenClaims, TokenService};
use tt_shared::ErrorResponse;

/// Authenticated caller of a write operation.
///
/// Use this in handlers behind the [`Authorization`] gate:
/// ```ignore
/// async fn create(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.subject)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the caller has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            subject: claims.subject,
            roles: claims.roles,
        }
    }
}

/// Error type for authorization failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authorization token has expired."),
            AuthError::InvalidToken(_) => ErrorResponse::new(401, "Invalid Token")
                .with_detail("The bearer token could not be verified."),
            AuthError::MissingAuth => ErrorResponse::new(401, "Authorization Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
        };

        let mut response = HttpResponse::build(self.status_code());
        if self.status_code() == StatusCode::UNAUTHORIZED {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(error)
    }
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or(AuthenticationError(AuthError::MissingAuth)),
        )
    }
}

/// Methods that never modify state and so need no authorization.
fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Validate the bearer token of a request and apply the role requirement.
fn authorize(
    req: &ServiceRequest,
    tokens: &dyn TokenService,
    write_role: Option<&str>,
) -> Result<Identity, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    // Parse "Bearer <token>"
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let identity = Identity::from(tokens.validate_token(token.trim())?);

    if let Some(role) = write_role
        && !identity.has_role(role)
    {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(identity)
}

/// Authorization gate middleware factory.
#[derive(Clone)]
pub struct Authorization {
    tokens: Arc<dyn TokenService>,
    write_role: Option<String>,
}

impl Authorization {
    pub fn new(tokens: Arc<dyn TokenService>, write_role: Option<String>) -> Self {
        Self { tokens, write_role }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorization
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthorizationService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthorizationService {
            service,
            tokens: self.tokens.clone(),
            write_role: self.write_role.clone(),
        }))
    }
}

pub struct AuthorizationService<S> {
    service: S,
    tokens: Arc<dyn TokenService>,
    write_role: Option<String>,
}

impl<S, B> Service<ServiceRequest> for AuthorizationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !is_safe(req.method()) {
            match authorize(&req, self.tokens.as_ref(), self.write_role.as_deref()) {
                Ok(identity) => {
                    tracing::debug!(subject = %identity.subject, "Write authorized");
                    req.extensions_mut().insert(identity);
                }
                Err(e) => {
                    tracing::warn!(
                        method = %req.method(),
                        path = %req.path(),
                        reason = %e,
                        "Write rejected by authorization gate"
                    );

                    let response =
                        actix_web::ResponseError::error_response(&AuthenticationError(e));
                    let (http_req, _payload) = req.into_parts();
                    let srv_response = ServiceResponse::new(http_req, response);

                    return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
