pub mod editor;
pub mod shell;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::Result;
use tokio::{
	io::{AsyncBufReadExt, BufReader},
	time::{self, MissedTickBehavior},
};

use qsn_service::Session;

use crate::{editor::TerminalEditor, shell::Flow};

#[derive(Debug, Parser)]
#[command(
	version = qsn_cli::VERSION,
	rename_all = "kebab",
	styles = qsn_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> Result<()> {
	let config = qsn_config::load(&args.config)?;

	qsn_cli::init_tracing(&config.service.log_level);

	let autostart = config.service.autostart;
	let mut ticker = time::interval(config.queue.poll_interval());
	let editor = Arc::new(TerminalEditor::new(args.config.clone()));
	let mut session = Session::new(config, editor);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	if autostart {
		tracing::info!("Autostarting.");

		if let Err(err) = session.start() {
			tracing::warn!(error = %err, "Autostart failed.");
		}
	}

	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	loop {
		tokio::select! {
			_ = ticker.tick() => session.tick().await,
			line = lines.next_line() => {
				let Some(line) = line? else {
					break;
				};

				match shell::execute(&mut session, &line) {
					Ok(Flow::Continue) => {},
					Ok(Flow::Quit) => break,
					Err(err) => eprintln!("{err}"),
				}
			},
		}
	}

	if session.is_busy() {
		tracing::info!("Waiting for queued operations before exit.");

		session.run_until_idle().await;
	}

	Ok(())
}
