use std::process::ExitCode;

use clap::Parser;

use ytfetch::cli::Cli;
use ytfetch::config::{AppConfig, ConfigError};
use ytfetch::downloader::Target;
use ytfetch::logging;

const EXIT_EXHAUSTED: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(mut config) => {
            config.apply(cli.overrides());
            config
        }
        Err(e) => {
            logging::init_logging_stderr(cli.verbose);
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    logging::init_logging(cli.verbose, config.log_file.as_deref());

    let target = Target::new(&cli.url, cli.quality, cli.subtitles);

    tokio::select! {
        result = ytfetch::run(&config, &target) => match result {
            Ok(session) if session.is_success() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(EXIT_EXHAUSTED),
            Err(e) => {
                tracing::error!("{:#}", e);
                if e.downcast_ref::<ConfigError>().is_some() {
                    ExitCode::from(EXIT_CONFIG)
                } else {
                    ExitCode::from(EXIT_EXHAUSTED)
                }
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, stopping download");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
