//! The `logout` command.

use anyhow::{Context as _, Result};
use console::style;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let auth = ctx.authenticator();
    auth.logout().await.context("deleting the credential")?;
    println!("{}", style("Signed out.").green());
    Ok(())
}
