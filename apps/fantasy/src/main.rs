use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = fantasy::Args::parse();
	fantasy::run(args).await
}
