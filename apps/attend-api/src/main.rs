use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = attend_api::Args::parse();

	attend_api::run(args).await
}
