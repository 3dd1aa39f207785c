//! Courses command implementation

use colored::Colorize;

use super::Context;
use crate::error::Result;

/// List configured courses with their page ids and enabled state
pub fn run_courses(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    if config.courses.is_empty() {
        println!("{} No courses configured.", "=>".blue().bold());
        return Ok(());
    }

    println!("{} Configured courses:", "=>".blue().bold());
    for course in &config.courses {
        let marker = if course.enabled {
            "+".green()
        } else {
            "-".dimmed()
        };
        let title = course.title.as_deref().unwrap_or("");
        let state = if course.enabled { "" } else { " (disabled)" };
        println!(
            "   {} {} {} {}{}",
            marker,
            course.slug.cyan(),
            course.page_id,
            title,
            state
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use tempfile::TempDir;

    #[test]
    fn lists_configured_courses() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());

        assert!(run_courses(&ctx).is_ok());
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(dir.path());
        ctx.config = Some("absent.toml".into());

        assert!(run_courses(&ctx).is_err());
    }
}
