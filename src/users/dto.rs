use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use super::repo_types::{Gender, Role};
use crate::{auth::password::MIN_PASSWORD_LEN, error::AppError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Body of `POST /api/auth/register` and `POST /api/users`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub role: Option<String>,
}

/// Create input that passed validation; the password is still plain text.
#[derive(Debug, Clone)]
pub struct ValidUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    pub role: Option<Role>,
}

/// Body of `PUT /api/users/:id`; every field optional. For the optional
/// profile fields an explicit `null` (or a blank string) clears the value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub birth_date: Option<Option<String>>,
    pub role: Option<String>,
}

/// Tells a missing key (`None`) apart from an explicit `null` (`Some(None)`).
fn present<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Update input that passed validation; `password` still plain text.
#[derive(Debug, Clone, Default)]
pub struct ValidUserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<Option<String>>,
    pub age: Option<Option<i32>>,
    pub gender: Option<Option<Gender>>,
    pub birth_date: Option<Option<String>>,
    pub role: Option<Role>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn check_email(raw: String) -> Result<String, AppError> {
    let email = normalize_email(&raw);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Please provide a valid email"));
    }
    Ok(email)
}

fn check_password(password: String) -> Result<String, AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(password)
}

fn check_age(age: Option<i32>) -> Result<Option<i32>, AppError> {
    match age {
        Some(a) if !(1..=120).contains(&a) => {
            Err(AppError::validation("Age must be between 1 and 120"))
        }
        other => Ok(other),
    }
}

fn parse_gender(raw: Option<String>) -> Result<Option<Gender>, AppError> {
    non_empty(raw)
        .map(|g| g.parse::<Gender>())
        .transpose()
        .map_err(|_| AppError::validation("Gender must be one of male, female, other"))
}

fn parse_role(raw: Option<String>) -> Result<Option<Role>, AppError> {
    non_empty(raw)
        .map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|_| AppError::validation("Role must be either admin or user"))
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<ValidUser, AppError> {
        let (Some(email), Some(password), Some(first_name), Some(last_name)) = (
            non_empty(self.email),
            self.password.filter(|p| !p.is_empty()),
            non_empty(self.first_name),
            non_empty(self.last_name),
        ) else {
            return Err(AppError::validation(
                "Please provide email, password, first name, and last name",
            ));
        };

        Ok(ValidUser {
            email: check_email(email)?,
            password: check_password(password)?,
            first_name,
            last_name,
            phone: non_empty(self.phone),
            age: check_age(self.age)?,
            gender: parse_gender(self.gender)?,
            birth_date: non_empty(self.birth_date),
            role: parse_role(self.role)?,
        })
    }
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<ValidUserUpdate, AppError> {
        Ok(ValidUserUpdate {
            email: non_empty(self.email).map(check_email).transpose()?,
            password: self
                .password
                .filter(|p| !p.is_empty())
                .map(check_password)
                .transpose()?,
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            phone: self.phone.map(non_empty),
            age: self.age.map(check_age).transpose()?,
            gender: self.gender.map(parse_gender).transpose()?,
            birth_date: self.birth_date.map(non_empty),
            role: parse_role(self.role)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            first_name: Some("Alan".into()),
            last_name: Some("Turing".into()),
            ..Default::default()
        }
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let valid = request("  Alan@Example.COM ", "enigma1").validate().unwrap();
        assert_eq!(valid.email, "alan@example.com");
        assert_eq!(valid.role, None);
    }

    #[test]
    fn short_password_is_rejected() {
        let err = request("a@b.com", "12345").validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("at least 6")));
        assert!(request("a@b.com", "123456").validate().is_ok());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut req = request("a@b.com", "secret1");
        req.last_name = Some("   ".into());
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
        assert!(CreateUserRequest::default().validate().is_err());
    }

    #[test]
    fn optional_fields_are_checked() {
        let mut req = request("a@b.com", "secret1");
        req.age = Some(0);
        assert!(req.validate().is_err());

        let mut req = request("a@b.com", "secret1");
        req.gender = Some("robot".into());
        assert!(req.validate().is_err());

        let mut req = request("a@b.com", "secret1");
        req.gender = Some(String::new());
        req.phone = Some(" ".into());
        let valid = req.validate().unwrap();
        assert_eq!(valid.gender, None);
        assert_eq!(valid.phone, None);
    }

    #[test]
    fn update_accepts_partial_fields() {
        let upd = UpdateUserRequest {
            first_name: Some("Ada".into()),
            role: Some("admin".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(upd.first_name.as_deref(), Some("Ada"));
        assert_eq!(upd.role, Some(Role::Admin));
        assert!(upd.email.is_none() && upd.password.is_none());

        let bad = UpdateUserRequest {
            password: Some("abc".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn update_tells_null_apart_from_missing() {
        let upd: UpdateUserRequest =
            serde_json::from_str(r#"{"phone": null, "age": null, "gender": ""}"#).unwrap();
        let upd = upd.validate().unwrap();
        assert_eq!(upd.phone, Some(None));
        assert_eq!(upd.age, Some(None));
        assert_eq!(upd.gender, Some(None));
        assert_eq!(upd.birth_date, None);

        let upd: UpdateUserRequest =
            serde_json::from_str(r#"{"age": 41, "birthDate": "1990-01-01"}"#).unwrap();
        let upd = upd.validate().unwrap();
        assert_eq!(upd.age, Some(Some(41)));
        assert_eq!(upd.birth_date, Some(Some("1990-01-01".into())));
        assert_eq!(upd.phone, None);

        let bad: UpdateUserRequest = serde_json::from_str(r#"{"age": 200}"#).unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.d"));
    }
}
