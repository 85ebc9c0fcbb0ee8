/// Admin Routes
///
/// Registration, login and logout for the admins who manage user records.

use actix_web::{web, HttpResponse};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::middleware::TokenCarrier;
use crate::validators::AdminRequest;

/// POST /admin/register
///
/// # Errors
/// - 400: Validation errors, listed per field
/// - 409: Username already registered
/// - 500: Internal server error
pub async fn register(
    body: web::Json<AdminRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.validate()?;
    auth.register(&credentials).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Registered" })))
}

/// POST /admin/login
///
/// Returns the token pair in the body and the access token on the
/// configured carrier.
///
/// # Errors
/// - 400: Validation errors
/// - 401: Unknown username or wrong password, indistinguishable
pub async fn login(
    body: web::Json<AdminRequest>,
    auth: web::Data<AuthService>,
    carrier: web::Data<TokenCarrier>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.validate()?;
    let token_set = auth.login(&credentials).await?;

    let mut response = HttpResponse::Ok();
    carrier.attach(&mut response, &token_set.access_token);
    Ok(response.json(token_set))
}

/// POST /admin/logout
///
/// Tokens are stateless; logout only tells the client to drop its cookie.
pub async fn logout(carrier: web::Data<TokenCarrier>) -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(carrier.removal_cookie())
        .finish()
}
