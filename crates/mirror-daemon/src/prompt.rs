//! Interactive credential prompting.
//!
//! Console I/O is blocking, so the prompts run on the blocking thread pool.
//! This is the whole of the client's interactive surface; the retry policy
//! around it lives in `main`.

use anyhow::{Context, Result};
use std::io::{self, Write};
use tokio::task;

/// Username and password for one authentication attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Prompt for a username and password on the console.
pub async fn read_credentials() -> Result<Credentials> {
    task::spawn_blocking(|| {
        let username = prompt("Username: ")?;
        let password = prompt("Password: ")?;
        Ok(Credentials { username, password })
    })
    .await
    .context("prompt task failed")?
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
