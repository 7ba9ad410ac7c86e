use clap::Parser;
use helpdesk_cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    helpdesk_cli::init_tracing();
    helpdesk_cli::run(cli).await
}
