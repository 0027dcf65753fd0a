//! Outgoing mail for sign-in codes.
//!
//! Delivery happens on a dedicated thread that owns the outbox directory. The
//! async side only pushes [`OutgoingMail`] onto a crossbeam channel and never
//! blocks on file I/O.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

/// Sender address used when the config does not override it.
pub const DEFAULT_FROM: &str = "Recipo <noreply@recipo.local>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail worker has shut down")]
    WorkerGone,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Something that accepts mail for delivery.
pub trait Mailer: Send + Sync {
    fn deliver(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

/// Handle to the mail worker. Dropping every clone stops the worker.
#[derive(Debug, Clone)]
pub struct Outbox {
    from: String,
    tx: Sender<OutgoingMail>,
}

impl Mailer for Outbox {
    fn deliver(&self, mut mail: OutgoingMail) -> Result<(), MailError> {
        if mail.from.is_empty() {
            mail.from = self.from.clone();
        }
        self.tx.send(mail).map_err(|_| MailError::WorkerGone)
    }
}

/// Starts the mail worker thread writing one `.eml` file per message into `dir`.
///
/// The directory is created on the worker thread; if that fails the worker logs
/// and exits, and later deliveries return [`MailError::WorkerGone`].
pub fn spawn_mail_worker(dir: PathBuf, from: impl Into<String>) -> (Outbox, JoinHandle<()>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = std::thread::spawn(move || mail_worker_loop(dir, rx));
    (Outbox { from: from.into(), tx }, handle)
}

fn mail_worker_loop(dir: PathBuf, rx: Receiver<OutgoingMail>) {
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::error!(dir = %dir.display(), error = %e, "cannot create outbox");
        return;
    }

    for mail in rx {
        match write_eml(&dir, &mail) {
            Ok(path) => tracing::info!(to = %mail.to, path = %path.display(), "mail written"),
            Err(e) => tracing::error!(to = %mail.to, error = %e, "mail delivery failed"),
        }
    }
    tracing::debug!("mail worker stopped");
}

fn write_eml(dir: &Path, mail: &OutgoingMail) -> Result<PathBuf, MailError> {
    let path = dir.join(format!("{}.eml", uuid::Uuid::new_v4()));
    let text = format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
        mail.from, mail.to, mail.subject, mail.body
    );
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Builds the sign-in code message for `to`.
pub fn render_otp_email(to: &str, code: &str) -> OutgoingMail {
    OutgoingMail {
        from: String::new(),
        to: to.to_owned(),
        subject: "Your Recipo Verification Code".to_owned(),
        body: format!(
            "Your verification code is: {code}\n\n\
             This code will expire in 5 minutes.\n\n\
             If you didn't request this code, you can safely ignore this email."
        ),
    }
}
