use curveadj_schema::args::{clap::Parser, Args, Command};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Daemon => curveadj_daemon::run(),
        Command::Cli(cli_args) => curveadj_cli::run(cli_args),
    }
}
