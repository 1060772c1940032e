//! The `cache` command: inspect and clear the response cache.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::style;

use lectern_cache::ResponseCache;

use super::Context;

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show cache statistics
    Stats,
    /// Remove all cached responses
    Clear,
}

pub async fn run(ctx: &Context, args: &CacheArgs) -> Result<()> {
    let dir = ctx.config.cache.effective_directory();
    let cache = ResponseCache::open(&dir)
        .await
        .with_context(|| format!("opening response cache at {}", dir.display()))?;

    match args.command {
        CacheCommand::Stats => {
            let stats = cache.stats().await;
            if ctx.json_output {
                let value = serde_json::json!({
                    "total": stats.total,
                    "valid": stats.valid,
                    "expired": stats.expired,
                    "size_bytes": stats.size_bytes,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Cache directory: {}", dir.display());
                println!("Entries:         {}", stats.total);
                println!("  valid:         {}", stats.valid);
                println!("  expired:       {}", stats.expired);
                println!("Payload bytes:   {}", stats.size_bytes);
            }
        }
        CacheCommand::Clear => {
            cache.clear().await.context("clearing the cache")?;
            println!("{}", style("Cache cleared.").green());
        }
    }

    Ok(())
}
