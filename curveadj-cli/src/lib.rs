mod subcommands;

use crate::subcommands::{apply, info, reapply, status};
use anyhow::{Context, Result};
use curveadj_client::DaemonClient;
use curveadj_schema::args::cli::{CliArgs, CliCommand};

pub fn run(args: CliArgs) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not initialize tokio runtime")?;
    rt.block_on(async move {
        let client = match &args.tcp_address {
            Some(address) => DaemonClient::connect_tcp(address.as_str()).await?,
            None => DaemonClient::connect().await?,
        };

        match args.subcommand {
            CliCommand::Status => status(&client).await,
            CliCommand::Info => info(&client).await,
            CliCommand::Set(offsets) => apply(&client, offsets.into(), false).await,
            CliCommand::Resync(offsets) => apply(&client, offsets.into(), true).await,
            CliCommand::Reapply => reapply(&client).await,
        }
    })
}
