use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::Config;

pub mod templates;

use templates::InvitationEmailContent;

#[derive(Debug, Error)]
pub enum MailError {
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error(transparent)]
    Address(#[from] lettre::address::AddressError),
    #[error(transparent)]
    Message(#[from] lettre::error::Error),
}

/// Outbound SMTP transport plus the configured sender address.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(c: &Config) -> Result<Mailer, MailError> {
        let mut builder = if c.mail_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&c.mail_host)?.port(c.mail_port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&c.mail_host).port(c.mail_port)
        };

        if let (Some(user), Some(pass)) = (&c.mail_username, &c.mail_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Mailer {
            transport: builder.build(),
            from: c.mail_from.parse()?,
        })
    }

    pub async fn send(
        &self,
        to: &str,
        content: InvitationEmailContent,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(content.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(content.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(content.html),
                    ),
            )?;

        self.transport.send(message).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mailer_builds_from_default_config() {
        let mailer = Mailer::from_config(&Config::default());
        assert!(mailer.is_ok());
    }

    #[tokio::test]
    async fn mailer_rejects_unparsable_sender() {
        let mut config = Config::default();
        config.mail_from = "not an address".to_string();

        assert!(matches!(
            Mailer::from_config(&config),
            Err(MailError::Address(_))
        ));
    }
}
