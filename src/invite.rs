//! Signed classroom invitations: token issuance/verification, invite links
//! and the e-mail delivery front.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::mail::templates::InvitationEmailContent;
use crate::mail::Mailer;
use crate::resp::util::date_time_as_unix_seconds;
use crate::role::ClassRole;
use crate::security::Security;

/// Invitation intent, signed into a time-limited token.
///
/// Tokens are never persisted; validity is carried entirely by the
/// signature and the expiration claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteClaims {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub class_id: Uuid,
    pub is_student: bool,
}

impl InviteClaims {
    pub fn new(class_id: Uuid, is_student: bool, ttl: Duration) -> InviteClaims {
        let now = Utc::now();
        InviteClaims {
            iat: now,
            exp: now + ttl,
            class_id,
            is_student,
        }
    }
}

pub fn issue_invite_token(
    claims: &InviteClaims,
    security: &Security,
) -> Result<String, jsonwebtoken::errors::Error> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(&security.jwt_secret);

    encode(&header, claims, &key)
}

/// Decodes and validates an invite token.
///
/// `None` covers every unusable token: malformed, expired or carrying a bad
/// signature. Callers can't and shouldn't distinguish the cause.
pub fn verify_invite_token(token: impl AsRef<str>, security: &Security) -> Option<InviteClaims> {
    decode::<InviteClaims>(
        token.as_ref(),
        &DecodingKey::from_secret(&security.jwt_secret),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn invite_link(config: &Config, token: impl AsRef<str>) -> String {
    format!(
        "{}:{}/invite/{}",
        config.client_host,
        config.client_port,
        token.as_ref()
    )
}

pub fn create_invite_link(
    config: &Config,
    security: &Security,
    class_id: Uuid,
    is_student: bool,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = InviteClaims::new(
        class_id,
        is_student,
        Duration::hours(config.invite_token_ttl_hours),
    );

    Ok(invite_link(config, issue_invite_token(&claims, security)?))
}

/// Delivers a classroom invitation by e-mail.
///
/// Returns `true` only when the message was handed off; any failure along
/// the way is logged for operators and reported as `false`. Delivery is
/// independent of whether the recipient ever redeems the invite, and its
/// outcome never affects classroom state.
pub async fn send_class_invite(
    mailer: &Mailer,
    security: &Security,
    config: &Config,
    class_id: Uuid,
    classroom_name: impl AsRef<str>,
    email: impl AsRef<str>,
    is_student: bool,
) -> bool {
    let link = match create_invite_link(config, security, class_id, is_student) {
        Ok(it) => it,
        Err(e) => {
            tracing::error!("unable to sign invite token: {}", e);
            return false;
        }
    };

    let content = InvitationEmailContent::new(
        classroom_name.as_ref(),
        ClassRole::invited(is_student),
        &link,
    );

    match mailer.send(email.as_ref(), content).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("unable to deliver classroom invitation: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_security() -> Security {
        Security {
            jwt_secret: b"invite-test-secret".to_vec(),
        }
    }

    #[test]
    fn invite_token_round_trip() {
        let security = example_security();
        let class_id = Uuid::new_v4();

        for is_student in [true, false] {
            let claims = InviteClaims::new(class_id, is_student, Duration::hours(24));
            let token = issue_invite_token(&claims, &security).expect("signable claims");

            let decoded = verify_invite_token(&token, &security).expect("valid before expiry");

            assert_eq!(decoded.class_id, class_id);
            assert_eq!(decoded.is_student, is_student);
        }
    }

    #[test]
    fn expired_invite_token_is_unusable() {
        let security = example_security();

        // Past the decoder's default leeway.
        let claims = InviteClaims::new(Uuid::new_v4(), true, Duration::seconds(-120));
        let token = issue_invite_token(&claims, &security).expect("signable claims");

        assert!(verify_invite_token(&token, &security).is_none());
    }

    #[test]
    fn malformed_invite_token_is_unusable() {
        let security = example_security();

        assert!(verify_invite_token("not-a-token", &security).is_none());
        assert!(verify_invite_token("", &security).is_none());
    }

    #[test]
    fn foreign_signature_is_unusable() {
        let security = example_security();
        let other = Security {
            jwt_secret: b"some-other-secret".to_vec(),
        };

        let claims = InviteClaims::new(Uuid::new_v4(), false, Duration::hours(1));
        let token = issue_invite_token(&claims, &other).expect("signable claims");

        assert!(verify_invite_token(&token, &security).is_none());
    }

    #[test]
    fn invite_link_points_at_client() {
        let config = Config::default();
        let link = invite_link(&config, "TOKEN");

        assert_eq!(
            link,
            format!(
                "{}:{}/invite/TOKEN",
                config.client_host, config.client_port
            )
        );
    }
}
