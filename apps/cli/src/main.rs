use clap::Parser;
use lumo::MediaLibrary;
use lumo_cli::{Cli, execute, init_logging, load};

#[lumo_runtime::main(memory_efficient)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load(&cli)?;
    let _log = init_logging(&cfg.logging)?;

    let library = MediaLibrary::from_config(&cfg)?;
    execute(&library, cli.command).await
}
