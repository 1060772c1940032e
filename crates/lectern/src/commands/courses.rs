//! The `courses` command: plain (non-interactive) course listing.

use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

use super::Context;

pub async fn run(ctx: &Context, cancel: &CancellationToken) -> Result<()> {
    let client = ctx.client().await?;

    let courses = match client.courses().list(cancel).await {
        Ok(courses) => courses,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            eprintln!("{}", style(e.suggestion()).dim());
            std::process::exit(1);
        }
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&courses)?);
        return Ok(());
    }

    if courses.is_empty() {
        println!("No courses.");
        return Ok(());
    }

    for course in &courses {
        let mut line = format!("{}  {}", style(&course.id).dim(), course.name);
        if !course.section.is_empty() {
            line.push_str(&format!("  ({})", course.section));
        }
        if course.course_state != "ACTIVE" {
            line.push_str(&format!("  [{}]", course.course_state));
        }
        println!("{}", line);
    }

    Ok(())
}
