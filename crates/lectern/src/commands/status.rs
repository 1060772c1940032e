//! The `status` command: current authentication state.

use anyhow::{Context as _, Result};
use console::style;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let auth = ctx.authenticator();
    let status = auth.status().await.context("reading the credential")?;

    if ctx.json_output {
        let value = match &status {
            Some(s) => serde_json::json!({
                "authenticated": true,
                "expires_at": s.expires_at.to_rfc3339(),
                "expires_in_secs": s.expires_in_secs,
                "expired": s.is_expired,
                "refreshable": s.is_refreshable,
                "scopes": s.scopes,
            }),
            None => serde_json::json!({ "authenticated": false }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match status {
        None => {
            println!("{}", style("Not signed in.").yellow());
            println!("Run 'lectern login' to authenticate.");
        }
        Some(s) => {
            if s.is_expired {
                if s.is_refreshable {
                    println!(
                        "{}",
                        style("Signed in (token expired, will refresh on next use).").yellow()
                    );
                } else {
                    println!(
                        "{}",
                        style("Session expired. Run 'lectern login' again.").red()
                    );
                }
            } else {
                let hours = s.expires_in_secs / 3600;
                let minutes = (s.expires_in_secs % 3600) / 60;
                println!(
                    "{} token valid for {}h {}m",
                    style("Signed in.").green(),
                    hours,
                    minutes
                );
            }
            if !s.scopes.is_empty() {
                println!("Scopes:");
                for scope in &s.scopes {
                    println!("  {}", scope);
                }
            }
        }
    }

    Ok(())
}
