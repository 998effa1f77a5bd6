//! Offline consistency check for story definitions.
//!
//! Prints every issue found and exits non-zero if any of them is an error.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use story_graph::{CheckerConfig, ConsistencyChecker, IssueSeverity, StoryDefinition, StoryGraph};

/// Check a story definition for authoring defects.
#[derive(Debug, Parser)]
#[command(name = "storycheck")]
struct Args {
    /// Story definition to check (`.json` or `.toml`).
    path: PathBuf,

    /// Maximum number of (segment, variables) states to explore.
    #[arg(long, default_value_t = CheckerConfig::default().max_states)]
    max_states: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let definition = StoryDefinition::from_path(&args.path)
        .with_context(|| format!("loading story definition {}", args.path.display()))?;

    let config = CheckerConfig {
        max_states: args.max_states,
    };
    let report = ConsistencyChecker::new(config).check(&definition);

    for issue in &report.issues {
        let level = match issue.severity() {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        println!("{level}: {issue}");
    }

    println!(
        "{} segment(s), {} state(s) explored{}, {} error(s), {} warning(s)",
        definition.segments.len(),
        report.explored_states,
        if report.truncated { " (truncated)" } else { "" },
        report.errors().count(),
        report.warnings().count(),
    );

    if report.has_errors() {
        std::process::exit(1);
    }

    StoryGraph::load(&definition).context("story definition failed to load")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_max_states_defaults_to_checker_bound() {
        let args = Args::try_parse_from(["storycheck", "crypt.toml"]).unwrap();
        assert_eq!(args.path, PathBuf::from("crypt.toml"));
        assert_eq!(args.max_states, 10_000);

        let args = Args::try_parse_from(["storycheck", "crypt.json", "--max-states", "50"]).unwrap();
        assert_eq!(args.max_states, 50);

        assert!(Args::try_parse_from(["storycheck"]).is_err());
        assert!(Args::try_parse_from(["storycheck", "crypt.json", "--verbose"]).is_err());
    }
}
