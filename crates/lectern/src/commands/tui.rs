//! The default interactive interface.

use anyhow::Result;
use console::style;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let client = ctx.client().await?;

    if !client.auth().is_authenticated().await {
        eprintln!("{}", style("Not signed in.").yellow());
        eprintln!("Run 'lectern login' first.");
        std::process::exit(1);
    }

    lectern_tui::run(client).await
}
