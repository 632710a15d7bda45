//! Bounded interactive authentication.
//!
//! The session performs one username+password attempt at a time; the retry
//! policy around it lives here, with an explicit attempt limit instead of
//! looping forever on bad credentials.

use anyhow::{Context, Result, bail};
use mirror_core::{AuthOutcome, Session};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::warn;

use crate::prompt::Credentials;

/// Run the credential retry loop until the server accepts or the attempt
/// limit is reached.
///
/// `ask` supplies one set of credentials per attempt — interactively in
/// production, scripted in tests. A rejection logs the catalog message and
/// asks again; after `max_attempts` rejected attempts the loop gives up
/// with an error. Exchange-level failures abort immediately.
pub async fn login<S, F, Fut>(
    session: &mut Session<S>,
    max_attempts: u32,
    mut ask: F,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Credentials>>,
{
    let mut attempts = 0;
    loop {
        let credentials = ask().await?;
        let outcome = session
            .authenticate(&credentials.username, &credentials.password)
            .await
            .context("authentication exchange failed")?;
        match outcome {
            AuthOutcome::Accepted => return Ok(()),
            AuthOutcome::UserRejected(code) | AuthOutcome::PasswordRejected(code) => {
                warn!("{}", code.message());
            }
        }
        attempts += 1;
        if attempts >= max_attempts {
            bail!("authentication failed after {} attempts", attempts);
        }
    }
}
