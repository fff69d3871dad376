use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use localgroup::config::{self, Config};
use localgroup::output::{format_group, print_json};
use localgroup::parse;
use localgroup::runner::SystemExecutor;
use localgroup::{GroupDirectory, GroupRecord, MemberName};

/// Exit code for `get` when the group does not exist.
const EXIT_NOT_FOUND: i32 = 2;

#[derive(Parser)]
#[command(
    name = "localgroup",
    version,
    about = "Read local security groups from `net localgroup` output"
)]
struct Cli {
    /// Log each command run and its exit status
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: .localgroup/config.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List local group names
    List,
    /// Show one group's comment and members
    Get {
        /// Group name
        name: String,
    },
    /// Show every group's comment and members
    All,
    /// Check a name against the naming policy without running anything
    CheckName {
        /// Candidate group name, or member name with --member
        name: String,
        /// Treat the name as a member (`DOMAIN\account`); only the account part is checked
        #[arg(long)]
        member: bool,
    },
    /// Parse a captured `net localgroup` transcript
    Parse {
        /// Which output shape the transcript has
        #[arg(value_enum)]
        mode: ParseMode,
        /// Path to the transcript file
        transcript: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParseMode {
    List,
    Detail,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "localgroup=debug"
    } else {
        "localgroup=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_names(names: &[String], json: bool) {
    if json {
        print_json(names);
    } else {
        for name in names {
            println!("{name}");
        }
    }
}

fn print_groups(records: &[GroupRecord], json: bool) {
    if json {
        print_json(records);
        return;
    }
    let blocks: Vec<String> = records.iter().map(format_group).collect();
    print!("{}", blocks.join("\n"));
}

fn directory(config: Config) -> GroupDirectory<SystemExecutor> {
    GroupDirectory::with_config(SystemExecutor, config)
}

fn cmd_list(config: Config, json: bool) -> anyhow::Result<i32> {
    let names = directory(config).list_names()?;
    print_names(&names, json);
    Ok(0)
}

fn cmd_get(config: Config, name: &str, json: bool) -> anyhow::Result<i32> {
    let dir = directory(config);
    let name = dir.validate(name).context("invalid group name")?;
    let Some(record) = dir.get_group(&name)? else {
        eprintln!("[localgroup] group not found: {name}");
        return Ok(EXIT_NOT_FOUND);
    };
    if json {
        print_json(&record);
    } else {
        print!("{}", format_group(&record));
    }
    Ok(0)
}

fn cmd_all(config: Config, json: bool) -> anyhow::Result<i32> {
    let records = directory(config).get_all_groups()?;
    print_groups(&records, json);
    Ok(0)
}

fn cmd_check_name(config: &Config, name: &str) -> i32 {
    match config.policy.validate(name) {
        Ok(valid) => {
            println!("{valid}");
            0
        }
        Err(e) => {
            eprintln!("[localgroup] {e}");
            1
        }
    }
}

fn cmd_check_member(config: &Config, name: &str) -> i32 {
    let member = MemberName::new(name);
    if let Err(e) = config.policy.check_member(&member) {
        eprintln!("[localgroup] {e}");
        return 1;
    }
    println!("domain:  {}", member.domain().unwrap_or("-"));
    println!("account: {}", member.account());
    0
}

fn cmd_parse(mode: ParseMode, transcript: &Path, json: bool) -> anyhow::Result<i32> {
    let text = std::fs::read_to_string(transcript)
        .with_context(|| format!("failed to read transcript: {}", transcript.display()))?;
    match mode {
        ParseMode::List => print_names(&parse::parse_names(&text)?, json),
        ParseMode::Detail => {
            let record = parse::parse_detail(&text)?;
            print_groups(std::slice::from_ref(&record), json);
        }
    }
    Ok(0)
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = config::load(cli.config.as_deref(), &config::default_search_paths())?;
    match &cli.command {
        Commands::List => cmd_list(config, cli.json),
        Commands::Get { name } => cmd_get(config, name, cli.json),
        Commands::All => cmd_all(config, cli.json),
        Commands::CheckName { name, member: false } => Ok(cmd_check_name(&config, name)),
        Commands::CheckName { name, member: true } => Ok(cmd_check_member(&config, name)),
        Commands::Parse { mode, transcript } => cmd_parse(*mode, transcript, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let exit_code = run(&cli).unwrap_or_else(|e| {
        eprintln!("[localgroup] error: {e:#}");
        1
    });
    std::process::exit(exit_code);
}
