/// Access token gate for protected routes
///
/// Reads the token from the deployment's carrier, decodes it as an access
/// token and injects the claims into request extensions for handlers.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponseBuilder,
};
use futures::future::LocalBoxFuture;

use crate::auth::TokenAuthority;
use crate::error::{AppError, AuthError};

pub const DEFAULT_COOKIE_NAME: &str = "access_token";
const BEARER_PREFIX: &str = "Bearer ";

/// Where the access token travels, fixed per deployment
#[derive(Debug, Clone, PartialEq)]
pub enum TokenCarrier {
    /// `Authorization: Bearer <jwt>`
    Bearer,
    /// HttpOnly cookie; `max_age` in seconds
    Cookie { name: String, max_age: i64 },
}

impl TokenCarrier {
    /// Raw token from the request, `None` when absent or blank
    pub fn extract(&self, req: &ServiceRequest) -> Option<String> {
        let token = match self {
            TokenCarrier::Bearer => req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(bearer_token)
                .map(str::to_string),
            TokenCarrier::Cookie { name, .. } => req.cookie(name).map(|c| c.value().to_string()),
        };

        token.filter(|t| !t.is_empty())
    }

    /// Put a freshly issued access token on the login response
    pub fn attach(&self, response: &mut HttpResponseBuilder, access_token: &str) {
        match self {
            TokenCarrier::Bearer => {
                response.insert_header((header::AUTHORIZATION, format!("Bearer {}", access_token)));
            }
            TokenCarrier::Cookie { name, max_age } => {
                response.cookie(
                    Cookie::build(name.clone(), access_token.to_string())
                        .path("/")
                        .http_only(true)
                        .secure(true)
                        .same_site(SameSite::Strict)
                        .max_age(Duration::seconds(*max_age))
                        .finish(),
                );
            }
        }
    }

    /// Expired cookie telling the client to drop its access token
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let name = match self {
            TokenCarrier::Bearer => DEFAULT_COOKIE_NAME.to_string(),
            TokenCarrier::Cookie { name, .. } => name.clone(),
        };

        let mut cookie = Cookie::build(name, "")
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// Token part of an `Authorization` value; the scheme is case-insensitive
fn bearer_token(value: &str) -> Option<&str> {
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    value.get(BEARER_PREFIX.len()..).map(str::trim)
}

/// Middleware for routes that require an admin access token
pub struct AuthMiddleware {
    tokens: Arc<dyn TokenAuthority>,
    carrier: TokenCarrier,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<dyn TokenAuthority>, carrier: TokenCarrier) -> Self {
        Self { tokens, carrier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            carrier: self.carrier.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: Arc<dyn TokenAuthority>,
    carrier: TokenCarrier,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match self.carrier.extract(&req) {
            Some(token) => token,
            None => {
                tracing::warn!(path = %req.path(), "Missing access token");
                return reject(AuthError::MissingToken);
            }
        };

        match self.tokens.decode_access_token(&token) {
            Ok(claims) => {
                tracing::debug!(username = %claims.username, "Access token accepted");
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                tracing::warn!(path = %req.path(), error = %e, "Access token rejected");
                reject(AuthError::TokenInvalid)
            }
        }
    }
}

fn reject<B: 'static>(err: AuthError) -> LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>> {
    let err: Error = AppError::Auth(err).into();
    Box::pin(async move { Err(err) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;
    use actix_web::{web, App, HttpRequest, HttpResponse};

    use crate::auth::{JwtAuthority, KeyPair, TokenClaims, TokenPolicy};

    fn authority() -> Arc<dyn TokenAuthority> {
        Arc::new(JwtAuthority::new(
            KeyPair::from_secret(b"middleware-test-secret"),
            TokenPolicy::default(),
        ))
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<TokenClaims>() {
            Some(claims) => HttpResponse::Ok().body(claims.username.clone()),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    #[actix_web::test]
    async fn test_bearer_token_is_forwarded_with_claims() {
        let tokens = authority();
        let token_set = tokens.issue("admin").unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(tokens.clone(), TokenCarrier::Bearer))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_set.access_token)))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;

        assert_eq!(body, "admin");
    }

    #[actix_web::test]
    async fn test_missing_and_invalid_tokens_are_rejected() {
        let tokens = authority();
        let refresh_token = tokens.issue("admin").unwrap().refresh_token;
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(tokens, TokenCarrier::Bearer))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let headers = [
            None,
            Some("Bearer ".to_string()),
            Some("Bearer not-a-jwt".to_string()),
            Some(format!("Bearer {}", refresh_token)),
        ];
        for value in headers {
            let mut req = actix_test::TestRequest::get().uri("/");
            if let Some(value) = value {
                req = req.insert_header((header::AUTHORIZATION, value));
            }
            let err = actix_test::try_call_service(&app, req.to_request()).await.unwrap_err();
            assert_eq!(err.as_response_error().status_code().as_u16(), 401);
        }
    }

    #[actix_web::test]
    async fn test_cookie_carrier() {
        let tokens = authority();
        let token_set = tokens.issue("admin").unwrap();
        let carrier = TokenCarrier::Cookie {
            name: "access_token".to_string(),
            max_age: 60,
        };
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(tokens, carrier))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .cookie(Cookie::new("access_token", token_set.access_token.clone()))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "admin");

        // A bearer header does nothing in cookie mode
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token_set.access_token)))
            .to_request();
        assert!(actix_test::try_call_service(&app, req).await.is_err());
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("BEARER  abc.def.ghi "), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bear"), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[actix_web::test]
    async fn test_lowercase_scheme_is_accepted() {
        let tokens = authority();
        let token_set = tokens.issue("admin").unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(tokens, TokenCarrier::Bearer))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, format!("bearer {}", token_set.access_token)))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "admin");
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = TokenCarrier::Bearer.removal_cookie();

        assert_eq!(cookie.name(), DEFAULT_COOKIE_NAME);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
