//! Email one-time-code sign-in.

use std::time::Duration;

use rand::Rng;
use tokio_rusqlite::Connection;

use crate::db::{self, CodeCheck};
use crate::error::AuthError;
use crate::mail::{render_otp_email, Mailer};
use crate::types::SessionUser;

/// How long an emailed code stays valid.
pub const OTP_TTL: Duration = Duration::from_secs(5 * 60);
/// Lifetime of a session created by a successful sign-in.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const OTP_DIGITS: usize = 6;

/// Sign-in flow over the local store and a [`Mailer`].
pub struct OtpAuth<M> {
    conn: Connection,
    mailer: M,
}

impl<M: Mailer> OtpAuth<M> {
    pub fn new(conn: Connection, mailer: M) -> Self {
        Self { conn, mailer }
    }

    /// Stores a fresh code for `email` and mails it. A previous code is replaced.
    pub async fn send_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        let code = generate_code();
        let expires_at = db::now_secs() + OTP_TTL.as_secs() as i64;

        db::store_verification_code(&self.conn, &email, &code, expires_at).await?;
        self.mailer.deliver(render_otp_email(&email, &code))?;
        tracing::info!(email = %email, "verification code sent");
        Ok(())
    }

    /// Exchanges a mailed code for a session, creating the user on first sign-in.
    pub async fn sign_in_otp(&self, email: &str, otp: &str) -> Result<SessionUser, AuthError> {
        let email = normalize_email(email)?;
        let otp = otp.trim();
        if otp.len() != OTP_DIGITS || !otp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidCode);
        }

        match db::consume_verification_code(&self.conn, &email, otp).await? {
            CodeCheck::Valid => {}
            CodeCheck::Invalid => return Err(AuthError::InvalidCode),
            CodeCheck::Expired => return Err(AuthError::CodeExpired),
            CodeCheck::TooManyAttempts => {
                tracing::warn!(email = %email, "verification code locked out");
                return Err(AuthError::TooManyAttempts);
            }
        }

        let user = db::find_or_create_user(&self.conn, &email).await?;
        let session = db::create_session(&self.conn, &user, SESSION_TTL).await?;
        tracing::info!(user = %user.id, "signed in");
        Ok(session)
    }

    /// Ends the session behind `token`.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        db::delete_session(&self.conn, token).await?;
        tracing::info!("signed out");
        Ok(())
    }
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Trims and lowercases `email`, rejecting anything that is not `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidEmail);
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "ana", "@example.com", "ana@", "ana@example", "ana@.com", "a b@c.de", "a@b@c.de"] {
            assert!(
                matches!(normalize_email(bad), Err(AuthError::InvalidEmail)),
                "{bad:?} should be rejected"
            );
        }
    }
}
