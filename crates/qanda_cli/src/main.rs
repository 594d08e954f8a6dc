//! Command-line entry point for the Q&A core.
//!
//! # Responsibility
//! - Verify `qanda_core` linkage and database bootstrap from a terminal.
//! - Print the home feed or the top users of the configured database.
//!
//! Configuration comes from `QANDA_*` environment variables.

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use qanda_core::db::open_db;
use qanda_core::{
    init_logging, CoreConfig, ProfileService, QuestionService, SqliteQuestionRepository,
    SqliteUserRepository,
};
use std::error::Error;
use std::process::ExitCode;

/// qanda - inspect a Q&A board database
#[derive(Debug, Parser)]
#[command(name = "qanda")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Defaults to `ping`
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Check core linkage and print the core version
    Ping,

    /// Print one page of the home feed
    Feed {
        /// Feed ordering
        #[arg(value_enum, default_value_t = FeedSort::Top)]
        sort: FeedSort,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Print the highest scoring users
    TopUsers {
        /// Number of users to print
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FeedSort {
    /// Highest question score first
    Top,
    /// Highest answer score first
    Answered,
    /// Most recently asked first
    Newest,
}

impl FeedSort {
    fn as_query(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Answered => "answered",
            Self::Newest => "newest",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Command::Ping)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    if command == Command::Ping {
        println!("qanda_core ping={}", qanda_core::ping());
        println!("qanda_core version={}", qanda_core::core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }
    let mut conn = open_db(&config.db_path)?;

    match command {
        Command::Ping => {}
        Command::Feed { sort, page } => {
            let service = QuestionService::new(SqliteQuestionRepository::try_new(&mut conn)?);
            let feed = service.home_feed(Some(sort.as_query()), page, Some(config.page_size))?;
            println!("sort={:?} page={}", feed.sort, feed.page);
            for question in &feed.items {
                println!(
                    "{:>5} {:>5} {:>6}  {}  [{}]",
                    question.score,
                    question.answer_score,
                    question.viewed,
                    question.title,
                    question.tags.join(", ")
                );
            }
        }
        Command::TopUsers { limit } => {
            let service = ProfileService::new(SqliteUserRepository::try_new(&conn)?);
            for profile in service.top_users(limit)? {
                println!("{:>5}  {}", profile.score, profile.username);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, FeedSort};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_subcommand_falls_back_to_ping() {
        let cli = Cli::try_parse_from(["qanda"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn feed_parses_sort_and_page() {
        let cli = Cli::try_parse_from(["qanda", "feed", "answered", "--page", "3"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Feed {
                sort: FeedSort::Answered,
                page: 3,
            })
        );

        let cli = Cli::try_parse_from(["qanda", "feed"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Feed {
                sort: FeedSort::Top,
                page: 1,
            })
        );
    }

    #[test]
    fn unknown_flags_and_sort_values_are_rejected() {
        assert!(Cli::try_parse_from(["qanda", "feed", "--bogus"]).is_err());
        assert!(Cli::try_parse_from(["qanda", "feed", "popular"]).is_err());
        assert!(Cli::try_parse_from(["qanda", "frobnicate"]).is_err());
    }

    #[test]
    fn top_users_limit_defaults_to_five() {
        let cli = Cli::try_parse_from(["qanda", "top-users"]).unwrap();
        assert_eq!(cli.command, Some(Command::TopUsers { limit: 5 }));
    }
}
