use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use proxysql_admin::config::Config;
use proxysql_admin::core::{HostOpt, HostQuery, HostStatus, RUNTIME_TABLE};
use proxysql_admin::ProxySql;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "proxysql-admin")]
#[command(about = "Manage ProxySQL backend servers through the admin interface")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/proxysql-admin.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every host in the staged (or runtime) table
    List {
        /// Read runtime_mysql_servers instead of mysql_servers
        #[arg(long)]
        runtime: bool,
    },
    /// List hosts matching the given fields
    Find(HostArgs),
    /// Add one host to the staged table
    Add(HostArgs),
    /// Remove hosts matching the given fields
    Remove(HostArgs),
    /// Set the weight of every host matching the given fields
    SetWeight {
        #[command(flatten)]
        filter: HostArgs,
        /// Weight to set on every matching host
        #[arg(long)]
        new_weight: u32,
    },
    /// Remove every staged host
    Clear,
    /// Save staged hosts to disk and load them to runtime
    Persist,
    /// Add the hosts listed in the configuration file
    Apply {
        /// Clear the staged table first
        #[arg(long)]
        replace: bool,
        /// Leave the changes staged
        #[arg(long)]
        no_persist: bool,
    },
    /// Check the admin interface is reachable
    Ping,
    /// Generate an example configuration file
    Config {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate the configuration file
    Validate,
    /// Show version information
    Version,
}

/// Host fields shared by the filtering and adding commands
#[derive(Args)]
struct HostArgs {
    /// Read from runtime_mysql_servers
    #[arg(long)]
    runtime: bool,
    #[arg(long)]
    hostgroup_id: Option<u32>,
    #[arg(long)]
    hostname: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    gtid_port: Option<u16>,
    /// ONLINE, OFFLINE_SOFT, OFFLINE_HARD or SHUNNED
    #[arg(long)]
    status: Option<HostStatus>,
    #[arg(long)]
    weight: Option<u32>,
    #[arg(long)]
    compression: Option<u32>,
    #[arg(long)]
    max_connections: Option<u32>,
    #[arg(long)]
    max_replication_lag: Option<u32>,
    #[arg(long)]
    use_ssl: Option<bool>,
    #[arg(long)]
    max_latency_ms: Option<u32>,
    #[arg(long)]
    comment: Option<String>,
}

impl HostArgs {
    fn to_opts(&self) -> Vec<HostOpt> {
        let mut opts = Vec::new();
        if self.runtime {
            opts.push(HostOpt::table(RUNTIME_TABLE));
        }
        if let Some(v) = self.hostgroup_id {
            opts.push(HostOpt::HostgroupId(v));
        }
        if let Some(v) = &self.hostname {
            opts.push(HostOpt::hostname(v.as_str()));
        }
        if let Some(v) = self.port {
            opts.push(HostOpt::Port(v));
        }
        if let Some(v) = self.gtid_port {
            opts.push(HostOpt::GtidPort(v));
        }
        if let Some(v) = self.status {
            opts.push(HostOpt::Status(v));
        }
        if let Some(v) = self.weight {
            opts.push(HostOpt::Weight(v));
        }
        if let Some(v) = self.compression {
            opts.push(HostOpt::Compression(v));
        }
        if let Some(v) = self.max_connections {
            opts.push(HostOpt::MaxConnections(v));
        }
        if let Some(v) = self.max_replication_lag {
            opts.push(HostOpt::MaxReplicationLag(v));
        }
        if let Some(v) = self.use_ssl {
            opts.push(HostOpt::UseSsl(v));
        }
        if let Some(v) = self.max_latency_ms {
            opts.push(HostOpt::MaxLatencyMs(v));
        }
        if let Some(v) = &self.comment {
            opts.push(HostOpt::comment(v.as_str()));
        }
        opts
    }

    /// Options for commands that rewrite matching rows; an empty filter is
    /// refused so a missing flag never touches the whole table
    fn to_update_filter(&self) -> Result<Vec<HostOpt>> {
        if self.runtime {
            bail!("weights can only be changed in the staged table");
        }
        let opts = self.to_opts();
        if HostQuery::resolve(&opts)?.is_unfiltered() {
            bail!("refusing to update every host; give at least one field to match on");
        }
        Ok(opts)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config { output } => generate_config(output),
        Commands::Validate => validate_config(&cli.config),
        Commands::Version => {
            show_version();
            Ok(())
        }
        command => run_command(&cli.config, command).await,
    }
}

async fn run_command(config_path: &Path, command: Commands) -> Result<()> {
    let config = Config::load_from_file(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    init_logging(&config);

    let proxy = ProxySql::from_config(&config.admin)
        .await
        .with_context(|| format!("Failed to connect to {}:{}", config.admin.host, config.admin.port))?;
    info!("Connected to admin interface at {}:{}", config.admin.host, config.admin.port);

    let result = execute(&proxy, &config, command).await;
    proxy.close().await;
    result
}

async fn execute(proxy: &ProxySql, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::List { runtime } => {
            let opts = if runtime {
                vec![HostOpt::table(RUNTIME_TABLE)]
            } else {
                Vec::new()
            };
            print_hosts(&proxy.all(&opts).await?);
        }
        Commands::Find(filter) => {
            print_hosts(&proxy.hosts_like(&filter.to_opts()).await?);
        }
        Commands::Add(args) => {
            if args.runtime {
                bail!("hosts can only be added to the staged table");
            }
            proxy.add_host(&args.to_opts()).await?;
            println!("Host added; run `persist` to activate it");
        }
        Commands::Remove(filter) => {
            if filter.runtime {
                bail!("hosts can only be removed from the staged table");
            }
            proxy.remove_hosts_like(&filter.to_opts()).await?;
            println!("Matching hosts removed; run `persist` to activate the change");
        }
        Commands::SetWeight { filter, new_weight } => {
            let mut hosts = proxy.hosts_like(&filter.to_update_filter()?).await?;
            if hosts.is_empty() {
                bail!("no hosts match the given fields");
            }
            for host in hosts.iter_mut() {
                proxy.update_weight_for_host(host, new_weight).await?;
                println!("{}", host);
            }
        }
        Commands::Clear => {
            proxy.clear().await?;
            println!("Staged hosts cleared");
        }
        Commands::Persist => {
            proxy
                .persist_changes()
                .await
                .context("Staged and runtime configuration may now differ")?;
            println!("Changes saved to disk and loaded to runtime");
        }
        Commands::Apply { replace, no_persist } => {
            if replace {
                proxy.clear().await?;
            }
            proxy.add_hosts(&config.hosts).await?;
            info!("Added {} hosts from configuration", config.hosts.len());
            if !no_persist {
                proxy.persist_changes().await?;
            }
            println!("Applied {} hosts", config.hosts.len());
        }
        Commands::Ping => {
            proxy.ping().await?;
            println!("✓ Admin interface is reachable");
        }
        Commands::Config { .. } | Commands::Validate | Commands::Version => {
            unreachable!("handled before connecting")
        }
    }
    Ok(())
}

fn print_hosts(hosts: &[proxysql_admin::core::Host]) {
    if hosts.is_empty() {
        println!("No hosts");
        return;
    }
    for host in hosts {
        println!("{}", host);
    }
}

fn generate_config(output: PathBuf) -> Result<()> {
    println!("Generating configuration file: {:?}", output);

    Config::create_example_config(&output).context("Failed to generate config")?;

    println!("Configuration file generated successfully!");
    println!("Edit the file to match your environment and run:");
    println!("  proxysql-admin --config {:?} apply", output);

    Ok(())
}

fn validate_config(config_path: &Path) -> Result<()> {
    println!("Validating configuration file: {:?}", config_path);

    match Config::load_from_file(config_path) {
        Ok(config) => {
            println!("✓ Configuration file is valid");
            println!("  Admin interface: {}:{}", config.admin.host, config.admin.port);
            println!("  Pool size: {}", config.admin.max_connections);
            println!("  Hosts: {}", config.hosts.len());
            for (i, host) in config.hosts.iter().enumerate() {
                println!("    {}: {}", i + 1, host);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration file validation failed:");
            eprintln!("  {}", e);
            Err(e.into())
        }
    }
}

fn show_version() {
    println!("proxysql-admin v{}", env!("CARGO_PKG_VERSION"));
    println!("Manage ProxySQL backend servers through the admin interface");
    println!();
    println!("Target: {}", std::env::consts::ARCH);
}

fn init_logging(config: &Config) {
    let log_level = match config.logging.level.as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Logging initialized at level: {:?}", log_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_weight_filter(args: &[&str]) -> Result<Vec<HostOpt>> {
        let argv = ["proxysql-admin", "set-weight"].iter().chain(args.iter());
        match Cli::try_parse_from(argv)?.command {
            Commands::SetWeight { filter, .. } => filter.to_update_filter(),
            _ => bail!("parsed into another command"),
        }
    }

    #[test]
    fn test_set_weight_refuses_empty_filter() {
        assert!(set_weight_filter(&["--new-weight", "0"]).is_err());
        assert!(set_weight_filter(&["--new-weight", "0", "--runtime", "--hostgroup-id", "1"]).is_err());
    }

    #[test]
    fn test_set_weight_filter_matches_given_fields() {
        let opts = set_weight_filter(&["--new-weight", "5", "--hostgroup-id", "3", "--weight", "10"]).unwrap();
        assert_eq!(opts, vec![HostOpt::HostgroupId(3), HostOpt::Weight(10)]);
    }

    #[test]
    fn test_host_args_parse() {
        let cli = Cli::try_parse_from([
            "proxysql-admin",
            "add",
            "--hostname",
            "db1",
            "--port",
            "3306",
            "--status",
            "offline_soft",
            "--use-ssl",
            "true",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => assert_eq!(
                args.to_opts(),
                vec![
                    HostOpt::hostname("db1"),
                    HostOpt::Port(3306),
                    HostOpt::Status(HostStatus::OfflineSoft),
                    HostOpt::UseSsl(true),
                ]
            ),
            _ => panic!("expected add"),
        }
    }
}
