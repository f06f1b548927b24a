//! Outbound email notifications.
//!
//! Dispatch is best-effort: assignment succeeds whether or not the email
//! goes out. Callers use [`Notifier::notify_assignment`], which logs
//! failures and never propagates them.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use civitas_common::{Complaint, Config, DirectoryUser};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notifications are not configured")]
    Disabled,

    #[error("mail request failed: {0}")]
    Request(String),

    #[error("mail provider rejected the message: {0}")]
    Provider(String),
}

/// Mail provider settings (Mailgun-style HTTP API).
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub frontend_url: String,
}

impl NotifyConfig {
    /// Extract the mail settings from the application config.
    /// `None` when MAIL_API_URL is unset — notifications disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_url = config.mail_api_url.clone()?;
        Some(Self {
            api_url,
            api_key: config.mail_api_key.clone().unwrap_or_default(),
            from: config.mail_from.clone(),
            frontend_url: config.frontend_url.clone(),
        })
    }
}

/// Email client for assignment notices.
#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    config: Option<NotifyConfig>,
}

impl Notifier {
    pub fn new(config: Option<NotifyConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Tell the assignee about a complaint that just landed on their desk.
    /// Logs the outcome either way; the caller's write is already committed.
    pub async fn notify_assignment(
        &self,
        complaint: &Complaint,
        assignee: &DirectoryUser,
        assigned_by: &str,
    ) {
        match self.send_assignment(complaint, assignee, assigned_by).await {
            Ok(()) => {
                info!(complaint_id = %complaint.id, to = %assignee.email, "Assignment email sent");
            }
            Err(NotifyError::Disabled) => {
                info!(complaint_id = %complaint.id, "Notifications disabled, skipping assignment email");
            }
            Err(e) => {
                warn!(complaint_id = %complaint.id, to = %assignee.email, error = %e, "Failed to send assignment email");
            }
        }
    }

    async fn send_assignment(
        &self,
        complaint: &Complaint,
        assignee: &DirectoryUser,
        assigned_by: &str,
    ) -> Result<(), NotifyError> {
        let config = self.config.as_ref().ok_or(NotifyError::Disabled)?;

        let subject = format!(
            "New Complaint Assigned: #{} - {}",
            short_id(complaint.id),
            complaint.sub_type
        );
        let body = assignment_body(complaint, assignee, assigned_by, &config.frontend_url);

        let response = self
            .http
            .post(format!("{}/messages", config.api_url.trim_end_matches('/')))
            .basic_auth("api", Some(&config.api_key))
            .form(&[
                ("from", config.from.as_str()),
                ("to", assignee.email.as_str()),
                ("subject", subject.as_str()),
                ("html", body.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let detail = response.text().await.unwrap_or_default();
            Err(NotifyError::Provider(detail))
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn assignment_body(
    complaint: &Complaint,
    assignee: &DirectoryUser,
    assigned_by: &str,
    frontend_url: &str,
) -> String {
    format!(
        "<p>Dear {},</p>\
         <p>A new complaint has been assigned to your department/organization:</p>\
         <p><strong>Complaint ID:</strong> {}</p>\
         <p><strong>Category:</strong> {}</p>\
         <p><strong>Issue:</strong> {}</p>\
         <p><strong>Description:</strong> {}</p>\
         <p><strong>Location:</strong> {}</p>\
         <p><strong>Severity:</strong> {}</p>\
         <p><a href=\"{}/dashboard/complaint/{}\">View complaint details</a></p>\
         <p>Assigned by: {}</p>",
        assignee.name,
        complaint.id,
        complaint.category,
        complaint.sub_type,
        complaint.description,
        complaint.address,
        complaint.severity,
        frontend_url,
        complaint.id,
        assigned_by,
    )
}
