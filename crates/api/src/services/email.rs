//! Transactional email: template rendering and delivery.
//!
//! Providers:
//! - `console`: logs the message (development)
//! - `smtp`: delivers through an SMTP relay with lettre

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EmailConfig;
use domain::models::EmailTemplate;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
}

enum Transport {
    Disabled,
    Console,
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
}

pub struct EmailService {
    config: EmailConfig,
    transport: Transport,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let transport = if !config.enabled {
            Transport::Disabled
        } else {
            match config.provider.as_str() {
                "console" => Transport::Console,
                "smtp" => Transport::Smtp(build_smtp_transport(&config)?),
                other => {
                    return Err(EmailError::NotConfigured(format!(
                        "unknown email provider '{other}'"
                    )))
                }
            }
        };

        Ok(Self { config, transport })
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.transport, Transport::Disabled)
    }

    /// Renders a template for one recipient.
    pub fn render(&self, to: &str, to_name: Option<&str>, template: &EmailTemplate) -> EmailMessage {
        let base = self.config.base_url.trim_end_matches('/');
        let greeting = match to_name {
            Some(name) => format!("Hola {name},"),
            None => "Hola,".to_string(),
        };

        let (subject, body) = match template {
            EmailTemplate::EmailVerification { token } => (
                "Confirmá tu correo en Ceres en Red".to_string(),
                format!(
                    "Para activar tu cuenta confirmá tu correo en el siguiente enlace:\n\n\
                     {base}/verificar-email?token={token}\n\n\
                     El enlace vence en 48 horas."
                ),
            ),
            EmailTemplate::PasswordReset { token } => (
                "Restablecé tu contraseña de Ceres en Red".to_string(),
                format!(
                    "Recibimos un pedido para restablecer tu contraseña:\n\n\
                     {base}/restablecer-password?token={token}\n\n\
                     El enlace vence en 1 hora. Si no lo pediste, ignorá este mensaje."
                ),
            ),
            EmailTemplate::ContactRequest {
                professional_name,
                requester_name,
                requester_email,
                requester_phone,
                message,
            } => (
                format!("Nueva consulta de {requester_name}"),
                format!(
                    "{professional_name}, recibiste una consulta en Ceres en Red.\n\n\
                     Nombre: {requester_name}\n\
                     Email: {requester_email}\n\
                     Teléfono: {}\n\n\
                     {message}\n\n\
                     Respondé desde tu panel: {base}/panel/consultas",
                    requester_phone.as_deref().unwrap_or("-")
                ),
            ),
            EmailTemplate::ProfessionalVerified => (
                "Tu perfil fue verificado".to_string(),
                format!(
                    "Tu perfil profesional ya es visible en las búsquedas de Ceres en Red.\n\n\
                     Revisalo en {base}/panel"
                ),
            ),
            EmailTemplate::ProfessionalRejected { reason } => (
                "Tu perfil necesita cambios".to_string(),
                format!(
                    "No pudimos verificar tu perfil profesional.\n\n\
                     Motivo: {reason}\n\n\
                     Podés corregirlo desde {base}/panel"
                ),
            ),
            EmailTemplate::CertificationReviewed {
                title,
                approved,
                reason,
            } => {
                if *approved {
                    (
                        format!("Certificación aprobada: {title}"),
                        format!("Tu certificación \"{title}\" fue aprobada y ya aparece en tu perfil."),
                    )
                } else {
                    (
                        format!("Certificación rechazada: {title}"),
                        format!(
                            "Tu certificación \"{title}\" fue rechazada.\n\nMotivo: {}",
                            reason.as_deref().unwrap_or("sin especificar")
                        ),
                    )
                }
            }
        };

        EmailMessage {
            to: to.to_string(),
            to_name: to_name.map(str::to_string),
            subject,
            body_text: format!("{greeting}\n\n{body}\n\nEquipo de Ceres en Red"),
        }
    }

    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match &self.transport {
            Transport::Disabled => {
                debug!(to = %message.to, subject = %message.subject, "Email disabled, skipping send");
                Ok(())
            }
            Transport::Console => {
                info!(
                    to = %message.to,
                    subject = %message.subject,
                    body = %message.body_text,
                    "Email (console provider)"
                );
                Ok(())
            }
            Transport::Smtp(transport) => {
                let email = self.build_message(&message)?;
                transport
                    .send(email)
                    .await
                    .map_err(|e| EmailError::SendFailed(e.to_string()))?;
                info!(to = %message.to, subject = %message.subject, "Email sent via SMTP");
                Ok(())
            }
        }
    }

    pub async fn send_template(
        &self,
        to: &str,
        to_name: Option<&str>,
        template: &EmailTemplate,
    ) -> Result<(), EmailError> {
        self.send(self.render(to, to_name, template)).await
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, EmailError> {
        let from = mailbox(Some(&self.config.sender_name), &self.config.sender_email)?;
        let to = mailbox(message.to_name.as_deref(), &message.to)?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body_text.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, EmailError> {
    let address = address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

fn build_smtp_transport(
    config: &EmailConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    if config.smtp_host.is_empty() {
        return Err(EmailError::NotConfigured("email.smtp_host is empty".to_string()));
    }

    let builder = if config.smtp_use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::NotConfigured(e.to_string()))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let mut builder = builder.port(config.smtp_port);
    if !config.smtp_username.is_empty() {
        builder = builder.credentials(Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        ));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            base_url: "https://ceresenred.gob.ar/".to_string(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_verification_link_uses_base_url() {
        let service = EmailService::new(config()).unwrap();
        let message = service.render(
            "vecina@example.com",
            Some("Marta"),
            &EmailTemplate::EmailVerification {
                token: "abc123".into(),
            },
        );
        assert!(message.body_text.starts_with("Hola Marta,"));
        assert!(message
            .body_text
            .contains("https://ceresenred.gob.ar/verificar-email?token=abc123"));
    }

    #[test]
    fn test_contact_request_template() {
        let service = EmailService::new(config()).unwrap();
        let message = service.render(
            "plomero@example.com",
            None,
            &EmailTemplate::ContactRequest {
                professional_name: "Juan".into(),
                requester_name: "Ana".into(),
                requester_email: "ana@example.com".into(),
                requester_phone: None,
                message: "Necesito destapar una cañería".into(),
            },
        );
        assert_eq!(message.subject, "Nueva consulta de Ana");
        assert!(message.body_text.contains("Teléfono: -"));
        assert!(message.body_text.contains("ana@example.com"));
    }

    #[test]
    fn test_rejected_certification_includes_reason() {
        let service = EmailService::new(config()).unwrap();
        let message = service.render(
            "gasista@example.com",
            None,
            &EmailTemplate::CertificationReviewed {
                title: "Matrícula".into(),
                approved: false,
                reason: Some("Documento ilegible".into()),
            },
        );
        assert!(message.subject.contains("rechazada"));
        assert!(message.body_text.contains("Documento ilegible"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut cfg = config();
        cfg.provider = "pigeon".into();
        assert!(matches!(
            EmailService::new(cfg),
            Err(EmailError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_smtp_requires_host() {
        let mut cfg = config();
        cfg.provider = "smtp".into();
        assert!(EmailService::new(cfg).is_err());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let mut cfg = config();
        cfg.enabled = false;
        let service = EmailService::new(cfg).unwrap();
        assert!(!service.is_enabled());
        service
            .send_template("a@b.com", None, &EmailTemplate::ProfessionalVerified)
            .await
            .unwrap();
    }

    #[test]
    fn test_mailbox_rejects_bad_address() {
        assert!(matches!(
            mailbox(None, "not-an-address"),
            Err(EmailError::InvalidAddress(_))
        ));
        assert!(mailbox(Some("Ceres"), "no-responder@ceresenred.gob.ar").is_ok());
    }
}
