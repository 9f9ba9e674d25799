mod cli;
mod paths;
mod run;
mod settings;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(args)) => run::print_config(&args),
        Some(Command::Render(args)) => run::run(args),
        None => run::run(cli.run),
    }
}
