// Account request payloads and their validated forms

use crate::domain::validation::{trimmed, Validator};
use crate::errors::Result;
use serde::Deserialize;

const PASSWORD_MAX_LENGTH: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A registration that passed validation; the password is still plaintext
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl RegisterRequest {
    pub fn validate(self, password_min_length: usize) -> Result<NewUser> {
        let mut v = Validator::new();
        let user = NewUser {
            username: v.required("username", trimmed(self.username), 3..=50),
            email: v.email("email", trimmed(self.email)),
            password: v.required(
                "password",
                self.password,
                password_min_length..=PASSWORD_MAX_LENGTH,
            ),
            full_name: v.required("full_name", trimmed(self.full_name), 2..=100),
        };
        v.finish(user)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// Only presence is checked so login never leaks the password policy
    pub fn validate(self) -> Result<Credentials> {
        let mut v = Validator::new();
        let credentials = Credentials {
            username: v.required("username", trimmed(self.username), 1..=50),
            password: v.required("password", self.password, 1..=PASSWORD_MAX_LENGTH),
        };
        v.finish(credentials)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileUpdate> {
        let mut v = Validator::new();
        let update = ProfileUpdate {
            full_name: v.required("full_name", trimmed(self.full_name), 2..=100),
            email: v.email("email", trimmed(self.email)),
        };
        v.finish(update)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(self, password_min_length: usize) -> Result<PasswordChange> {
        let mut v = Validator::new();
        let change = PasswordChange {
            current_password: v.required(
                "current_password",
                self.current_password,
                1..=PASSWORD_MAX_LENGTH,
            ),
            new_password: v.required(
                "new_password",
                self.new_password,
                password_min_length..=PASSWORD_MAX_LENGTH,
            ),
        };
        v.finish(change)
    }
}
