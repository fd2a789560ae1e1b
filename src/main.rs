use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod ai;
mod azure;
mod cli;
mod clipboard;
mod commands;
mod ext;
mod gitio;
mod model;
mod process;
mod ui;
mod util;

use crate::cli::{normalize, Cli};

fn init_tracing() {
  let filter = EnvFilter::try_from_env("YITPUSH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn main() -> ExitCode {
  init_tracing();

  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) => {
      let _ = err.print();
      return match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
      };
    }
  };

  // Phase 1: packaging output, before any banner
  if cli.gen_man {
    return match util::render_man_page::<Cli>() {
      Ok(page) => {
        print!("{}", page);
        ExitCode::SUCCESS
      }
      Err(err) => {
        ui::error(&format!("{:#}", err));
        ExitCode::FAILURE
      }
    };
  }

  println!("{}\n", "🚀 YitPush - AI-Powered Git Commit Tool".bold().bright_blue());

  if cli.command.is_none() {
    let _ = Cli::command().print_help();
    println!();
    return ExitCode::SUCCESS;
  }

  // Phase 2: normalize, then hand off to the command handler
  let result = normalize(cli).and_then(|cfg| commands::dispatch(&cfg));

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::debug!(error = ?err, "command failed");
      match err.downcast_ref::<ui::Cancelled>() {
        Some(cancelled) => ui::warn(&cancelled.to_string()),
        None => ui::error(&format!("{:#}", err)),
      }
      ExitCode::FAILURE
    }
  }
}
