//! `snmpdisk`: check disk and inode usage of a host over SNMP.
//!
//! Prints one plugin line on stdout and exits with 0 (OK), 1 (WARNING), 2 (CRITICAL) or
//! 3 (UNKNOWN). Diagnostics go to stderr, controlled by `-v` and `RUST_LOG`.

use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snmpdisk::config::{self, CheckConfig, CheckKind, TableLayout};
use snmpdisk::config_generator::print_icinga_command_config_if_env_and_exit;
use snmpdisk::transport::UdpSession;
use snmpdisk::{list_report, run_check, CheckError, Report, Runner, State};

#[derive(Parser, Debug)]
#[command(version, about = "Check disk and inode usage of a host over SNMP")]
struct Cli {
    /// SNMP request timeout, e.g. 5, 5s, 1m30s or 500ms
    #[arg(short, long, global = true, default_value = "5s", value_parser = parse_timeout)]
    timeout: Duration,

    /// SNMP community string
    #[arg(short = 'C', long, global = true, env = "SNMP_COMMUNITY", default_value = config::DEFAULT_COMMUNITY)]
    community: String,

    /// SNMP agent port
    #[arg(short, long, global = true, default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// More diagnostics on stderr (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the used share of a HOST-RESOURCES-MIB storage entry
    Usage(CheckArgs),
    /// Check dskPercent of a UCD-SNMP-MIB disk entry
    Disk(CheckArgs),
    /// Check dskPercentNode (inode usage) of a UCD-SNMP-MIB disk entry
    Inodes(CheckArgs),
    /// List the drives known to the host
    #[command(visible_alias = "l")]
    List {
        /// Table to list
        #[arg(long, value_enum, default_value_t = Table::Hr)]
        table: Table,
        /// Host to query
        host: String,
    },
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Warning threshold range
    #[arg(short, long, default_value = config::DEFAULT_WARNING, allow_hyphen_values = true)]
    warning: String,

    /// Critical threshold range
    #[arg(short, long, default_value = config::DEFAULT_CRITICAL, allow_hyphen_values = true)]
    critical: String,

    /// Mount point or storage description to check
    #[arg(short, long, default_value = config::DEFAULT_MOUNT)]
    mount: String,

    /// Append performance data to the output
    #[arg(long)]
    perfdata: bool,

    /// Host to query
    host: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Table {
    /// hrStorageDescr
    Hr,
    /// UCD dskPath
    Ucd,
}

impl Table {
    fn layout(self) -> TableLayout {
        match self {
            Table::Hr => TableLayout::host_resources(),
            Table::Ucd => TableLayout::ucd_disk(),
        }
    }
}

/// A duration such as `5s`, `1m30s` or `500ms`; a bare number counts seconds.
fn parse_timeout(text: &str) -> Result<Duration, String> {
    let timeout = match text.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(text)
            .map_err(|err| format!("invalid timeout \"{}\": {}", text, err))?,
    };
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_owned());
    }
    Ok(timeout)
}

/// Command line mistakes are reported as UNKNOWN with the first paragraph of clap's message.
fn usage_error(err: &clap::Error) -> Report {
    let text = err.to_string();
    let summary = text.split("\n\n").next().unwrap_or_default();
    let message = summary
        .trim_start_matches("error:")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Report::message(State::Unknown, &message)
}

impl Cli {
    fn check_config(&self, kind: CheckKind, args: &CheckArgs) -> CheckConfig {
        CheckConfig {
            host: args.host.clone(),
            port: self.port,
            community: self.community.clone(),
            timeout: self.timeout,
            kind,
            mount: args.mount.clone(),
            warning: args.warning.clone(),
            critical: args.critical.clone(),
            perf_data: args.perfdata,
        }
    }

    fn list_config(&self, host: &str) -> CheckConfig {
        let mut config = CheckConfig::new(host, CheckKind::Usage);
        config.port = self.port;
        config.community = self.community.clone();
        config.timeout = self.timeout;
        config
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "snmpdisk=warn",
        1 => "snmpdisk=info",
        2 => "snmpdisk=debug",
        _ => "snmpdisk=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn connect(config: &CheckConfig) -> Result<UdpSession, CheckError> {
    UdpSession::connect(config).map_err(|source| CheckError::Connect {
        host: config.host.clone(),
        source,
    })
}

fn main() {
    if let Err(err) = print_icinga_command_config_if_env_and_exit("snmpdisk", &Cli::command()) {
        Report::message(State::Unknown, &err.to_string()).print_and_exit();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            // full usage for humans on stderr, the status line on stdout
            let _ = err.print();
            usage_error(&err).print_and_exit()
        }
    };
    init_tracing(cli.verbose);

    let (kind, args) = match &cli.command {
        Command::Usage(args) => (CheckKind::Usage, args),
        Command::Disk(args) => (CheckKind::Disk, args),
        Command::Inodes(args) => (CheckKind::Inodes, args),
        Command::List { table, host } => {
            let config = cli.list_config(host);
            Runner::<CheckError>::new()
                .safe_run(|| list_report(&mut connect(&config)?, &table.layout()))
                .print_and_exit()
        }
    };

    let config = cli.check_config(kind, args);
    Runner::<CheckError>::new()
        .safe_run(|| run_check(&mut connect(&config)?, &config))
        .print_and_exit()
}
