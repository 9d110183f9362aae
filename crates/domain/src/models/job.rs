//! Background job payloads and queue bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named queue drained by the worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    Email,
    Slack,
    Files,
    Maintenance,
}

impl Queue {
    pub const ALL: [Queue; 4] = [Queue::Email, Queue::Slack, Queue::Files, Queue::Maintenance];

    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::Email => "email",
            Queue::Slack => "slack",
            Queue::Files => "files",
            Queue::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Queue::Email),
            "slack" => Some(Queue::Slack),
            "files" => Some(Queue::Files),
            "maintenance" => Some(Queue::Maintenance),
            _ => None,
        }
    }
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transactional email content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum EmailTemplate {
    EmailVerification {
        token: String,
    },
    PasswordReset {
        token: String,
    },
    ContactRequest {
        professional_name: String,
        requester_name: String,
        requester_email: String,
        requester_phone: Option<String>,
        message: String,
    },
    ProfessionalVerified,
    ProfessionalRejected {
        reason: String,
    },
    CertificationReviewed {
        title: String,
        approved: bool,
        reason: Option<String>,
    },
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::EmailVerification { .. } => "email_verification",
            EmailTemplate::PasswordReset { .. } => "password_reset",
            EmailTemplate::ContactRequest { .. } => "contact_request",
            EmailTemplate::ProfessionalVerified => "professional_verified",
            EmailTemplate::ProfessionalRejected { .. } => "professional_rejected",
            EmailTemplate::CertificationReviewed { .. } => "certification_reviewed",
        }
    }
}

/// Work item stored as JSONB in the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    SendEmail {
        to: String,
        to_name: Option<String>,
        template: EmailTemplate,
    },
    SlackAlert {
        text: String,
    },
    ProcessImage {
        path: String,
        max_dimension: u32,
        thumbnail_dimension: u32,
    },
    CheckFileSize {
        path: String,
        max_bytes: u64,
        professional_id: Uuid,
    },
    PurgeExpiredTokens,
    PruneCompletedJobs {
        older_than_days: i64,
    },
    ReleaseStaleJobs {
        older_than_secs: i64,
    },
}

impl JobPayload {
    /// Queue this payload is routed to.
    pub fn queue(&self) -> Queue {
        match self {
            JobPayload::SendEmail { .. } => Queue::Email,
            JobPayload::SlackAlert { .. } => Queue::Slack,
            JobPayload::ProcessImage { .. } | JobPayload::CheckFileSize { .. } => Queue::Files,
            JobPayload::PurgeExpiredTokens
            | JobPayload::PruneCompletedJobs { .. }
            | JobPayload::ReleaseStaleJobs { .. } => Queue::Maintenance,
        }
    }

    /// Short identifier stored in the `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::SendEmail { .. } => "send_email",
            JobPayload::SlackAlert { .. } => "slack_alert",
            JobPayload::ProcessImage { .. } => "process_image",
            JobPayload::CheckFileSize { .. } => "check_file_size",
            JobPayload::PurgeExpiredTokens => "purge_expired_tokens",
            JobPayload::PruneCompletedJobs { .. } => "prune_completed_jobs",
            JobPayload::ReleaseStaleJobs { .. } => "release_stale_jobs",
        }
    }

    pub fn email(to: impl Into<String>, to_name: Option<String>, template: EmailTemplate) -> Self {
        JobPayload::SendEmail {
            to: to.into(),
            to_name,
            template,
        }
    }

    pub fn slack(text: impl Into<String>) -> Self {
        JobPayload::SlackAlert { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

/// A claimed or stored job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub queue: Queue,
    pub kind: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn decode(&self) -> Result<JobPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    /// `attempts` is incremented when the job is claimed.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

/// Count of jobs per queue and status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobStats {
    pub queue: String,
    pub status: String,
    pub count: i64,
}

/// Delay before the next attempt: `base * 2^(attempt - 1)`, capped at `max`.
pub fn backoff_secs(attempt: i32, base: u64, max: u64) -> u64 {
    let exponent = attempt.saturating_sub(1).clamp(0, 32) as u32;
    base.saturating_mul(2u64.saturating_pow(exponent)).min(max)
}
