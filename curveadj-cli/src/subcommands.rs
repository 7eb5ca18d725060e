use anyhow::{bail, Result};
use curveadj_client::DaemonClient;
use curveadj_schema::{ApplyResponse, ConfigurationFields};

pub async fn status(client: &DaemonClient) -> Result<()> {
    let active = client.active_state().await?.state;
    println!(
        "CPU offset: {} ({}, {})",
        active.cpu_offset(),
        active.cpu_value(),
        enabled_label(active.apply_cpu_offset())
    );
    println!(
        "GPU offset: {} ({}, {})",
        active.gpu_offset(),
        active.gpu_value(),
        enabled_label(active.apply_gpu_offset())
    );
    Ok(())
}

pub async fn info(client: &DaemonClient) -> Result<()> {
    let info = client.daemon_info().await?;
    println!("Daemon version: {}", info.version);
    if let Some(commit) = info.commit {
        println!("Commit: {commit}");
    }
    println!("Tool path: {}", info.tool_path);
    println!("Tool timeout: {}ms", info.timeout_ms);
    Ok(())
}

pub async fn apply(client: &DaemonClient, fields: ConfigurationFields, full: bool) -> Result<()> {
    let response = if full {
        client.apply_full_configuration(fields).await?
    } else {
        client.set_configuration(fields).await?
    };
    print_apply_response(&response)
}

pub async fn reapply(client: &DaemonClient) -> Result<()> {
    let response = client.reapply().await?;
    print_apply_response(&response)
}

fn print_apply_response(response: &ApplyResponse) -> Result<()> {
    let Some(details) = &response.details else {
        println!("Nothing to apply");
        return Ok(());
    };

    println!("Command: {}", details.command_line());
    println!("Finished at {}", details.formatted_timestamp());
    if !details.stdout.trim().is_empty() {
        println!("stdout: {}", details.stdout.trim_end());
    }
    if !details.stderr.trim().is_empty() {
        println!("stderr: {}", details.stderr.trim_end());
    }

    if !response.committed {
        bail!(
            "ryzenadj {}, active offsets are still CPU {} / GPU {}",
            details.status,
            response.cpu_offset,
            response.gpu_offset
        );
    }

    println!(
        "Applied CPU {} ({}), GPU {} ({})",
        response.cpu_offset,
        enabled_label(response.apply_cpu_offset),
        response.gpu_offset,
        enabled_label(response.apply_gpu_offset)
    );
    Ok(())
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
