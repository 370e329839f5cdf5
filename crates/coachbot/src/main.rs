// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coachbot - a daily coaching post for Slack with feedback and topic votes.
//!
//! This is the binary entry point: scheduled runs (`run`, or `topic` then
//! `post`), the interactive gateway (`serve`), and ledger inspection commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod context;
mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use crate::context::RunContext;

/// Coachbot - daily coaching posts with feedback and next-topic polls.
#[derive(Parser, Debug)]
#[command(name = "coachbot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Ledger scope selection shared by the inspection commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ScopeArgs {
    /// Job name. Omit for the legacy shared ledger.
    #[arg(long)]
    pub job: Option<String>,
    /// Channel id. Defaults to the job's configured channel.
    #[arg(long)]
    pub channel: Option<String>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive Slack interactive actions over HTTP, or Socket Mode with `--socket`.
    Serve {
        /// Connect to Slack Socket Mode (needs slack.app_token) instead of listening.
        #[arg(long)]
        socket: bool,
    },
    /// Select today's topic, generate a tip for it and post it.
    Run {
        #[arg(long)]
        job: String,
        /// Override today's date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Print today's topic for a job; prints nothing when already sent today.
    Topic {
        #[arg(long)]
        job: String,
        /// Override today's date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Post content with vote controls, then mark the job as sent for today.
    Post {
        #[arg(long)]
        job: String,
        #[arg(long)]
        topic: String,
        /// Read the body from this file instead of stdin.
        #[arg(long)]
        content_file: Option<PathBuf>,
        /// Override today's date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,
    },
    /// Record a vote payload read as JSON from stdin.
    Vote,
    /// Print thumbs-up/down counts for a message.
    Feedback {
        #[arg(long)]
        message_id: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print per-candidate nomination counts for a message.
    Poll {
        #[arg(long)]
        message_id: String,
        /// Candidate topics, comma separated.
        #[arg(long, value_delimiter = ',')]
        candidates: Vec<String>,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print the winning next topic for a send date.
    Winner {
        #[arg(long)]
        date: String,
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match coachbot_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            coachbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Config) => commands::print_config(&config),
        Some(command) => {
            let ctx = RunContext::prepare(config);
            run(&ctx, command).await
        }
        None => {
            println!("coachbot: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(ctx: &RunContext, command: Commands) -> Result<(), coachbot_core::CoachError> {
    match command {
        Commands::Serve { socket: false } => serve::run_serve(ctx).await,
        Commands::Serve { socket: true } => serve::run_socket_mode(ctx).await,
        Commands::Run { job, date } => {
            let generator = ctx.generator()?;
            let publisher = ctx.publisher()?;
            commands::run(ctx, &generator, &publisher, &job, date.as_deref()).await
        }
        Commands::Topic { job, date } => commands::topic(ctx, &job, date.as_deref()),
        Commands::Post {
            job,
            topic,
            content_file,
            date,
        } => {
            let content = commands::read_content(content_file.as_deref())?;
            let publisher = ctx.publisher()?;
            commands::post(ctx, &publisher, &job, &topic, &content, date.as_deref()).await
        }
        Commands::Vote => {
            let payload = commands::read_vote(std::io::stdin().lock())?;
            commands::vote(ctx, &payload)
        }
        Commands::Feedback { message_id, scope } => commands::feedback(ctx, &message_id, &scope),
        Commands::Poll {
            message_id,
            candidates,
            scope,
        } => commands::poll(ctx, &message_id, &candidates, &scope),
        Commands::Winner { date, scope } => commands::winner(ctx, &date, &scope),
        Commands::Config => commands::print_config(&ctx.config),
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coachbot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_post_arguments() {
        let cli = Cli::try_parse_from([
            "coachbot", "--config", "/tmp/c.toml", "post", "--job", "postgres", "--topic",
            "indexes", "--content-file", "tip.md",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.toml")));
        match cli.command {
            Some(Commands::Post {
                job,
                topic,
                content_file,
                date,
            }) => {
                assert_eq!(job, "postgres");
                assert_eq!(topic, "indexes");
                assert_eq!(content_file, Some(PathBuf::from("tip.md")));
                assert!(date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_splits_poll_candidates() {
        let cli = Cli::try_parse_from([
            "coachbot", "poll", "--message-id", "m1", "--candidates", "wal,vacuum", "--job",
            "postgres",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Poll {
                candidates, scope, ..
            }) => {
                assert_eq!(candidates, vec!["wal", "vacuum"]);
                assert_eq!(scope.job.as_deref(), Some("postgres"));
                assert!(scope.channel.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_serve_socket_flag() {
        let cli = Cli::try_parse_from(["coachbot", "serve", "--socket"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { socket: true })));

        let cli = Cli::try_parse_from(["coachbot", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { socket: false })));
    }

    #[test]
    fn cli_parses_run_arguments() {
        let cli = Cli::try_parse_from(["coachbot", "run", "--job", "postgres", "--date", "2026-02-07"])
            .unwrap();
        match cli.command {
            Some(Commands::Run { job, date }) => {
                assert_eq!(job, "postgres");
                assert_eq!(date.as_deref(), Some("2026-02-07"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn topic_requires_job() {
        assert!(Cli::try_parse_from(["coachbot", "topic"]).is_err());
    }
}
