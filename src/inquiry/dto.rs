use std::collections::BTreeMap;

use serde::Deserialize;

use super::mailer::{OutboundMail, Template};
use crate::{error::AppError, users::dto::is_valid_email};

#[derive(Debug, Default, Deserialize)]
pub struct InquiryRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inquiry {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

fn min_len(value: Option<String>, min: usize, msg: &str) -> Result<String, AppError> {
    let v = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if v.chars().count() < min {
        return Err(AppError::validation(msg));
    }
    Ok(v)
}

impl InquiryRequest {
    pub fn validate(self) -> Result<Inquiry, AppError> {
        let name = min_len(self.name, 2, "Name must be at least 2 characters")?;
        let email = self.email.map(|e| e.trim().to_string()).unwrap_or_default();
        if !is_valid_email(&email) {
            return Err(AppError::validation("Invalid email address"));
        }
        Ok(Inquiry {
            name,
            email,
            phone: min_len(self.phone, 10, "Phone must be at least 10 digits")?,
            subject: min_len(self.subject, 5, "Subject must be at least 5 characters")?,
            message: min_len(self.message, 10, "Message must be at least 10 characters")?,
        })
    }
}

impl Inquiry {
    pub fn admin_notification(&self) -> OutboundMail {
        let params = BTreeMap::from([
            ("name", self.name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("title", self.subject.clone()),
            ("message", self.message.clone()),
        ]);
        OutboundMail {
            template: Template::AdminNotification,
            params,
        }
    }

    pub fn auto_reply(&self) -> OutboundMail {
        let params = BTreeMap::from([
            ("name", self.name.clone()),
            ("from_email", self.email.clone()),
            ("title", self.subject.clone()),
        ]);
        OutboundMail {
            template: Template::AutoReply,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> InquiryRequest {
        InquiryRequest {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            phone: Some("+44 20 7946 0958".into()),
            subject: Some("Bulk order".into()),
            message: Some("Do you ship to Lisbon?".into()),
        }
    }

    #[test]
    fn accepts_a_complete_inquiry() {
        let inquiry = valid().validate().unwrap();
        assert_eq!(inquiry.subject, "Bulk order");
    }

    #[test]
    fn enforces_minimum_lengths() {
        let mut r = valid();
        r.name = Some("A".into());
        assert!(r.validate().is_err());

        let mut r = valid();
        r.phone = Some("12345".into());
        assert!(r.validate().is_err());

        let mut r = valid();
        r.message = Some("hi".into());
        assert!(r.validate().is_err());

        let mut r = valid();
        r.email = Some("nope".into());
        assert!(r.validate().is_err());
    }

    #[test]
    fn auto_reply_only_carries_public_fields() {
        let mail = valid().validate().unwrap().auto_reply();
        assert_eq!(mail.template, Template::AutoReply);
        assert_eq!(mail.params["from_email"], "ada@example.com");
        assert!(!mail.params.contains_key("phone"));
    }
}
