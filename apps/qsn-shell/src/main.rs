use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = qsn_shell::Args::parse();

	qsn_shell::run(args).await
}
