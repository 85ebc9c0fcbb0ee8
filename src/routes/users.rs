use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::repositories::{UserQuery, UserRepository, UserSummary, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::validators::UserRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub account_number: Option<i64>,
    pub identity_number: Option<String>,
}

impl TryFrom<ListUsersParams> for UserQuery {
    type Error = AppError;

    fn try_from(params: ListUsersParams) -> Result<Self, Self::Error> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Client("page must be at least 1".to_string()));
        }

        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::Client(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(UserQuery {
            page,
            limit,
            account_number: params.account_number,
            identity_number: params.identity_number.filter(|id| !id.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UserIdParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

impl UserIdParams {
    fn parse(&self) -> Result<Uuid, AppError> {
        let raw = self
            .user_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Client("User id is required".to_string()))?;

        Uuid::parse_str(raw).map_err(|_| AppError::Client("User id must be a valid UUID".to_string()))
    }
}

/// GET /user
pub async fn get_users(
    params: web::Query<ListUsersParams>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let query = UserQuery::try_from(params.into_inner())?;
    let result: Vec<UserSummary> = users
        .list(&query)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Success",
        "result": result,
    })))
}

/// POST /user/create
pub async fn create_user(
    body: web::Json<UserRequest>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let new_user = body.validate()?;
    let record = users.create(&new_user).await?;

    tracing::info!(user_id = %record.id, "User created");
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Created" })))
}

/// PUT /user/update?userId=
pub async fn update_user(
    params: web::Query<UserIdParams>,
    body: web::Json<UserRequest>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = params.parse()?;
    let update = body.validate_partial()?;
    users.update(user_id, &update).await?;

    tracing::info!(user_id = %user_id, "User updated");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("User {} updated successfully", user_id),
    })))
}

/// DELETE /user/delete?userId=
pub async fn delete_user(
    params: web::Query<UserIdParams>,
    users: web::Data<dyn UserRepository>,
) -> Result<HttpResponse, AppError> {
    let user_id = params.parse()?;
    users.delete(user_id).await?;

    tracing::info!(user_id = %user_id, "User deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("User {} deleted successfully", user_id),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, limit: Option<u32>) -> ListUsersParams {
        ListUsersParams {
            page,
            limit,
            account_number: None,
            identity_number: None,
        }
    }

    #[test]
    fn test_list_defaults() {
        let query = UserQuery::try_from(params(None, None)).unwrap();
        assert_eq!(query, UserQuery::default());
    }

    #[test]
    fn test_list_bounds() {
        assert!(UserQuery::try_from(params(Some(0), None)).is_err());
        assert!(UserQuery::try_from(params(None, Some(0))).is_err());
        assert!(UserQuery::try_from(params(None, Some(101))).is_err());
        assert_eq!(UserQuery::try_from(params(Some(4), Some(100))).unwrap().offset(), 300);
    }

    #[test]
    fn test_user_id_parsing() {
        let missing = UserIdParams { user_id: None };
        assert!(matches!(missing.parse(), Err(AppError::Client(msg)) if msg == "User id is required"));

        let malformed = UserIdParams {
            user_id: Some("64b7f0c2e4b0a1a2b3c4d5e6".to_string()),
        };
        assert!(matches!(malformed.parse(), Err(AppError::Client(_))));

        let id = Uuid::new_v4();
        let valid = UserIdParams {
            user_id: Some(id.to_string()),
        };
        assert_eq!(valid.parse().unwrap(), id);
    }
}
