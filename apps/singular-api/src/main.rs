use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = singular_api::Args::parse();

	singular_api::run(args).await
}
