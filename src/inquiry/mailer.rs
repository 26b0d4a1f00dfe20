use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::MailConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Sent to the site owner with the full inquiry.
    AdminNotification,
    /// Sent back to whoever filled in the form.
    AutoReply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub template: Template,
    pub params: BTreeMap<&'static str, String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutboundMail) -> anyhow::Result<()>;
}

/// EmailJS REST API (`/api/v1.0/email/send`).
pub struct EmailJsMailer {
    http: reqwest::Client,
    cfg: MailConfig,
}

#[derive(Serialize)]
struct EmailJsRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a BTreeMap<&'static str, String>,
}

impl EmailJsMailer {
    pub fn new(cfg: MailConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build http client")?;
        Ok(Self { http, cfg })
    }

    fn template_id(&self, template: Template) -> &str {
        match template {
            Template::AdminNotification => &self.cfg.admin_template_id,
            Template::AutoReply => &self.cfg.user_template_id,
        }
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send(&self, mail: OutboundMail) -> anyhow::Result<()> {
        let template_id = self.template_id(mail.template);
        let body = EmailJsRequest {
            service_id: &self.cfg.service_id,
            template_id,
            user_id: &self.cfg.public_key,
            access_token: self.cfg.private_key.as_deref(),
            template_params: &mail.params,
        };

        let res = self
            .http
            .post(&self.cfg.api_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("emailjs send {}", template_id))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("emailjs responded {}: {}", status, text);
        }
        debug!(template_id, "emailjs accepted message");
        Ok(())
    }
}
