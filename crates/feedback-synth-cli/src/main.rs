use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = feedback_synth_cli::Cli::parse();
    feedback_synth_cli::run_cli(cli)
}
