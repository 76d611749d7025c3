use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = ctxgrab::cli::Cli::parse();
    ctxgrab::init(cli.verbose);
    ctxgrab::cli::run(cli)
}
