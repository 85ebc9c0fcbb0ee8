/// Request body validators
///
/// Each raw request type deserializes with every field optional, then
/// `validate()` turns it into a typed value or the complete list of failing
/// fields. Handlers never see a half-checked body.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AppError, ValidationError};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_IDENTITY_NUMBER_LENGTH: usize = 15;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
    ).unwrap();
}

/// Body of `/admin/register` and `/admin/login`
#[derive(Debug, Deserialize, Default)]
pub struct AdminRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Admin credentials that passed the length policy
#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminRequest {
    pub fn validate(&self) -> Result<AdminCredentials, AppError> {
        let mut issues = Vec::new();

        let username = min_length(&mut issues, "username", self.username.as_deref(), MIN_USERNAME_LENGTH)
            .map(str::to_string);
        // Passwords are not trimmed; whitespace is part of the secret
        let password = match self.password.as_deref() {
            None | Some("") => {
                issues.push(ValidationError::EmptyField("password".to_string()));
                None
            }
            Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
                issues.push(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
                None
            }
            Some(p) => Some(p.to_string()),
        };

        match (username, password) {
            (Some(username), Some(password)) if issues.is_empty() => {
                Ok(AdminCredentials { username, password })
            }
            _ => Err(AppError::Validation(issues)),
        }
    }
}

/// Body of `POST /user/create` and `PUT /user/update`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub user_name: Option<String>,
    pub account_number: Option<i64>,
    pub email_address: Option<String>,
    pub identity_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_name: String,
    pub account_number: i64,
    pub email_address: String,
    pub identity_number: String,
}

/// Partial update: `None` leaves the stored value untouched
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserUpdate {
    pub user_name: Option<String>,
    pub account_number: Option<i64>,
    pub email_address: Option<String>,
    pub identity_number: Option<String>,
}

impl UserRequest {
    /// Full validation; every field is required
    pub fn validate(&self) -> Result<NewUser, AppError> {
        let mut issues = Vec::new();

        let user_name = min_length(&mut issues, "userName", self.user_name.as_deref(), MIN_USERNAME_LENGTH);
        if self.account_number.is_none() {
            issues.push(ValidationError::EmptyField("accountNumber".to_string()));
        }
        let email_address = email(&mut issues, self.email_address.as_deref());
        let identity_number = min_length(
            &mut issues,
            "identityNumber",
            self.identity_number.as_deref(),
            MIN_IDENTITY_NUMBER_LENGTH,
        );

        match (user_name, self.account_number, email_address, identity_number) {
            (Some(user_name), Some(account_number), Some(email_address), Some(identity_number))
                if issues.is_empty() =>
            {
                Ok(NewUser {
                    user_name: user_name.to_string(),
                    account_number,
                    email_address: email_address.to_string(),
                    identity_number: identity_number.to_string(),
                })
            }
            _ => Err(AppError::Validation(issues)),
        }
    }

    /// Partial validation; only present fields are checked
    pub fn validate_partial(&self) -> Result<UserUpdate, AppError> {
        let mut issues = Vec::new();
        let mut update = UserUpdate {
            account_number: self.account_number,
            ..UserUpdate::default()
        };

        if self.user_name.is_some() {
            update.user_name = min_length(&mut issues, "userName", self.user_name.as_deref(), MIN_USERNAME_LENGTH)
                .map(str::to_string);
        }
        if self.email_address.is_some() {
            update.email_address = email(&mut issues, self.email_address.as_deref()).map(str::to_string);
        }
        if self.identity_number.is_some() {
            update.identity_number = min_length(
                &mut issues,
                "identityNumber",
                self.identity_number.as_deref(),
                MIN_IDENTITY_NUMBER_LENGTH,
            )
            .map(str::to_string);
        }

        if !issues.is_empty() {
            return Err(AppError::Validation(issues));
        }
        if update == UserUpdate::default() {
            return Err(ValidationError::NothingToUpdate.into());
        }
        Ok(update)
    }
}

fn min_length<'a>(
    issues: &mut Vec<ValidationError>,
    field: &str,
    value: Option<&'a str>,
    min: usize,
) -> Option<&'a str> {
    match value.map(str::trim) {
        None | Some("") => {
            issues.push(ValidationError::EmptyField(field.to_string()));
            None
        }
        Some(v) if v.chars().count() < min => {
            issues.push(ValidationError::TooShort(field.to_string(), min));
            None
        }
        Some(v) => Some(v),
    }
}

fn email<'a>(issues: &mut Vec<ValidationError>, value: Option<&'a str>) -> Option<&'a str> {
    match value.map(str::trim) {
        None | Some("") => {
            issues.push(ValidationError::EmptyField("emailAddress".to_string()));
            None
        }
        Some(v) if v.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(v) => {
            issues.push(ValidationError::InvalidFormat("emailAddress".to_string()));
            None
        }
        Some(v) => Some(v),
    }
}
