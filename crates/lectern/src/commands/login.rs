//! The `login` command: full authorization-code flow.

use anyhow::{Context as _, Result};
use console::style;
use tokio_util::sync::CancellationToken;

use super::Context;

pub async fn run(ctx: &Context, cancel: &CancellationToken) -> Result<()> {
    let auth = ctx.authenticator();

    let attempt = auth.begin_login().context("starting login")?;

    println!("Opening your browser for Google sign-in…");
    println!();
    println!("If the browser does not open, visit:");
    println!("  {}", style(&attempt.consent_url).cyan().underlined());
    println!();

    if let Err(e) = open_browser(&attempt.consent_url) {
        tracing::debug!(error = %e, "Could not open browser");
    }

    println!("Waiting for the sign-in to complete (Ctrl-C to abort)…");
    let code = auth
        .await_callback(&attempt, cancel)
        .await
        .context("waiting for the OAuth callback")?;

    auth.exchange_code(&code)
        .await
        .context("exchanging the authorization code")?;

    println!("{}", style("Signed in.").green().bold());
    Ok(())
}

/// Open the default browser on the consent URL, best effort.
fn open_browser(url: &str) -> std::io::Result<()> {
    use std::process::Command;

    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    };
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/c", "start", url]);
        cmd
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };

    cmd.spawn().map(|_| ())
}
