use std::{path::Path, sync::Arc};

use servercontrol::{
    cli::AnsiStyles,
    config::{ServerControlConfig, SETTINGS_SUBDIR},
    orchestration::{InstanceView, LifecyclePhase, Orchestrator, ProvisionRequest},
    runtime::DockerRuntime,
    server,
    settings::FileSettingsStore,
    ServerControlResult,
};

//--------------------------------------------------------------------------------------------------
// Functions: Handlers
//--------------------------------------------------------------------------------------------------

pub async fn serve_subcommand(
    home_dir: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> ServerControlResult<()> {
    let orchestrator = load_orchestrator(home_dir).await?;
    let config = orchestrator.config();
    let addr = format!(
        "{}:{}",
        host.unwrap_or_else(|| config.get_host().clone()),
        port.unwrap_or(*config.get_port())
    );

    server::serve(Arc::new(orchestrator), &addr).await
}

pub async fn list_subcommand(home_dir: &Path) -> ServerControlResult<()> {
    let orchestrator = load_orchestrator(home_dir).await?;
    let instances = orchestrator.list_instances(None).await?;

    if instances.is_empty() {
        println!("no instances");
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<14}{:<34}{:<12}{:<18}{}",
            "ID", "NAME", "STATUS", "ADDRESS", "IMAGE"
        )
        .header()
    );
    for instance in &instances {
        print_instance_row(instance);
    }

    Ok(())
}

pub async fn create_subcommand(
    home_dir: &Path,
    name: String,
    password: Option<String>,
    players: u32,
    description: Option<String>,
    retry: bool,
) -> ServerControlResult<()> {
    let orchestrator = load_orchestrator(home_dir).await?;
    let request = ProvisionRequest::builder()
        .server_name(name)
        .server_password(password.unwrap_or_default())
        .max_players(players)
        .description(description.unwrap_or_default())
        .retry_on_conflict(retry)
        .build();

    let instance = orchestrator.provision(request).await?;
    println!(
        "created {} ({}) on port {}, query port {}",
        instance.name.as_str().literal(),
        instance.id,
        instance.port,
        instance.query_port
    );

    Ok(())
}

pub async fn start_subcommand(home_dir: &Path, id: &str) -> ServerControlResult<()> {
    load_orchestrator(home_dir).await?.start(id).await?;
    println!("started {}", id.literal());
    Ok(())
}

pub async fn stop_subcommand(home_dir: &Path, id: &str) -> ServerControlResult<()> {
    load_orchestrator(home_dir).await?.stop(id).await?;
    println!("stopped {}", id.literal());
    Ok(())
}

pub async fn rm_subcommand(home_dir: &Path, id: &str) -> ServerControlResult<()> {
    load_orchestrator(home_dir).await?.delete(id).await?;
    println!("deleted {}", id.literal());
    Ok(())
}

pub async fn logs_subcommand(home_dir: &Path, id: &str) -> ServerControlResult<()> {
    let logs = load_orchestrator(home_dir).await?.logs(id).await?;
    println!("{logs}");
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

async fn load_orchestrator(home_dir: &Path) -> ServerControlResult<Orchestrator> {
    let config = ServerControlConfig::load(home_dir).await?;
    let runtime = DockerRuntime::connect(config.get_docker_socket().as_deref())?;
    let settings = FileSettingsStore::new(home_dir.join(SETTINGS_SUBDIR));
    let data_dir = config.resolve_data_dir(home_dir);

    Ok(Orchestrator::new(
        Arc::new(runtime),
        Arc::new(settings),
        config,
        data_dir,
    ))
}

fn print_instance_row(instance: &InstanceView) {
    let status = match instance.detail_status {
        LifecyclePhase::Running => instance.detail_status.as_str().valid(),
        LifecyclePhase::Stopped => instance.detail_status.as_str().error(),
        _ => instance.detail_status.as_str().placeholder(),
    };
    let address = match instance.game_port {
        Some(port) => format!("{}:{}", instance.public_ip, port),
        None => "-".to_string(),
    };

    // Pad before styling so escape codes do not skew the columns
    let padding = " ".repeat(12usize.saturating_sub(instance.detail_status.as_str().len()));
    println!(
        "{:<14}{:<34}{}{}{:<18}{}",
        instance.id, instance.name, status, padding, address, instance.image
    );
}
