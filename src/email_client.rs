use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{configuration::EmailSettings, domain::user_email::UserEmail};

const MESSAGE_STREAM: &str = "outbound";

// A transactional message. The html part is derived from the text when
// none is given
#[derive(Debug, Clone)]
pub struct EmailMessage<'a> {
    pub recipient: &'a UserEmail,
    pub subject: &'a str,
    pub text_body: &'a str,
    pub html_body: Option<&'a str>,
    pub tag: &'a str,
}

impl<'a> EmailMessage<'a> {
    pub fn plain(recipient: &'a UserEmail, subject: &'a str, text_body: &'a str, tag: &'a str) -> Self {
        Self { recipient, subject, text_body, html_body: None, tag }
    }

    pub fn with_html(mut self, html_body: &'a str) -> Self {
        self.html_body = Some(html_body);
        self
    }
}

// Plain text lines become a single html paragraph
pub fn text_to_html(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("<p>{}</p>", escaped.replace('\n', "<br>"))
}

#[derive(Clone, Debug)]
pub struct EmailClient {
    http_client: Client,
    api_uri: String,
    sender: UserEmail,
    server_token: SecretString,
}

impl EmailClient {
    pub fn new(settings: &EmailSettings) -> Result<EmailClient, anyhow::Error> {
        let sender = settings.sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email in configuration")?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to build email http client")?;

        Ok(Self {
            http_client,
            api_uri: settings.api_uri.trim_end_matches('/').to_string(),
            sender,
            server_token: settings.authorization_token.clone(),
        })
    }

    #[tracing::instrument(
        "Sending transactional email",
        skip(self, message),
        fields(tag = %message.tag)
    )]
    pub async fn send(&self, message: &EmailMessage<'_>) -> Result<(), reqwest::Error> {
        let html_body = match message.html_body {
            Some(html) => html.to_string(),
            None => text_to_html(message.text_body),
        };

        let body = PostmarkEmail {
            from: self.sender.as_ref(),
            to: message.recipient.as_ref(),
            subject: message.subject,
            html_body: &html_body,
            text_body: message.text_body,
            tag: message.tag,
            message_stream: MESSAGE_STREAM,
        };

        self.http_client
            .post(format!("{}/email", self.api_uri))
            .header("X-Postmark-Server-Token", self.server_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    tag: &'a str,
    message_stream: &'a str,
}
