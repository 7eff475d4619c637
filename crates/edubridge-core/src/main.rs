use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use edubridge_core::{demo, filter_requests, Actor, EduBridge, EduBridgeConfig, StatusFilter};
use edubridge_store::{CatalogSource, MemoryStore, RecordStore, RequestId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("edubridge")
        .version(edubridge_core::VERSION)
        .about("EduBridge counselor connection administration")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(Command::new("migrate").about("Apply database migrations"))
        .subcommand(
            Command::new("requests")
                .about("List connection requests")
                .arg(
                    Arg::new("status")
                        .long("status")
                        .default_value("all")
                        .help("pending, approved, rejected, reassigned, cancelled or all"),
                )
                .arg(
                    Arg::new("search")
                        .long("search")
                        .default_value("")
                        .help("Substring of the student id"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("approve")
                .about("Approve a pending request")
                .arg(Arg::new("id").required(true).help("Request id"))
                .arg(admin_arg())
                .arg(Arg::new("notes").long("notes").help("Admin notes")),
        )
        .subcommand(
            Command::new("reject")
                .about("Reject a pending request")
                .arg(Arg::new("id").required(true).help("Request id"))
                .arg(admin_arg())
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .required(true)
                        .help("Reason shown to the student"),
                ),
        )
        .subcommand(
            Command::new("reassign")
                .about("Redirect a pending request to another counselor")
                .arg(Arg::new("id").required(true).help("Request id"))
                .arg(admin_arg())
                .arg(
                    Arg::new("counselor")
                        .long("counselor")
                        .required(true)
                        .help("Email of the new counselor"),
                ),
        )
        .subcommand(
            Command::new("roster")
                .about("List a counselor's approved students")
                .arg(Arg::new("counselor").required(true).help("Counselor email")),
        )
        .subcommand(
            Command::new("stats")
                .about("Request and catalog counters")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("demo").about("Run a scripted scenario on the in-memory store"))
}

fn admin_arg() -> Arg {
    Arg::new("admin")
        .long("admin")
        .default_value("admin@edubridge.test")
        .help("Email of the acting admin")
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<EduBridgeConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => EduBridgeConfig::load(path)?,
        None => EduBridgeConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &EduBridgeConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config, matches.get_flag("json-logs"));

    #[cfg(feature = "postgres")]
    if config.uses_database() {
        let store = edubridge_store::PgStore::connect(
            &config.database.url,
            config.database.max_connections,
        )
        .await
        .context("connecting to database")?;
        if let Some(("migrate", _)) = matches.subcommand() {
            store.migrate().await?;
            println!("Migrations applied");
            return Ok(());
        }
        let platform = EduBridge::new(Arc::new(store), &config);
        return run(&platform, &matches).await;
    }

    #[cfg(not(feature = "postgres"))]
    if config.uses_database() {
        bail!("database.url is set but this build lacks the postgres feature; unset DATABASE_URL or rebuild with --features postgres");
    }

    if let Some(reason) = matches.subcommand_name().and_then(memory_store_refusal) {
        bail!(reason);
    }
    let store = Arc::new(MemoryStore::new());
    let cast = demo::seed(&store).await?;
    let platform = EduBridge::new(store, &config);
    match matches.subcommand() {
        Some(("demo", _)) => {
            let report = demo::run(&platform, &cast).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        _ => run(&platform, &matches).await,
    }
}

/// Commands that make no sense against the seeded in-memory store
fn memory_store_refusal(command: &str) -> Option<&'static str> {
    match command {
        "migrate" => Some("migrate needs database.url or DATABASE_URL"),
        "approve" | "reject" | "reassign" => Some(
            "the in-memory store starts without requests; set database.url or DATABASE_URL to manage real requests",
        ),
        _ => None,
    }
}

async fn run<S>(platform: &EduBridge<S>, matches: &ArgMatches) -> anyhow::Result<()>
where
    S: RecordStore + CatalogSource,
{
    match matches.subcommand() {
        Some(("requests", args)) => {
            let status: StatusFilter = arg(args, "status")?.parse()?;
            let all = platform.connections.all_requests().await?;
            let requests = filter_requests(&all, status, arg(args, "search")?);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&requests)?);
            } else if requests.is_empty() {
                println!("No requests");
            } else {
                for r in &requests {
                    println!(
                        "{}  {:<10}  student {}  counselor {}  {}",
                        r.id,
                        r.status,
                        r.student_id,
                        r.requested_counselor_id,
                        r.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Some(("approve", args)) => {
            let admin = acting_admin(platform, args).await?;
            let notes = args.get_one::<String>("notes").cloned();
            let request = platform
                .connections
                .approve(request_id(args)?, &admin, notes)
                .await?;
            println!("Request {} is {}", request.id, request.status);
        }
        Some(("reject", args)) => {
            let admin = acting_admin(platform, args).await?;
            let request = platform
                .connections
                .reject(request_id(args)?, &admin, arg(args, "reason")?)
                .await?;
            println!("Request {} is {}", request.id, request.status);
        }
        Some(("reassign", args)) => {
            let admin = acting_admin(platform, args).await?;
            let counselor = platform
                .directory
                .counselor_by_email(arg(args, "counselor")?)
                .await?;
            let successor = platform
                .connections
                .reassign(request_id(args)?, &admin, counselor.user_id)
                .await?;
            println!(
                "Reassigned to {}; new request {} is {}",
                counselor.display_name(),
                successor.id,
                successor.status
            );
        }
        Some(("roster", args)) => {
            let counselor = platform
                .directory
                .counselor_by_email(arg(args, "counselor")?)
                .await?;
            let roster = platform
                .connections
                .approved_students_for_counselor(counselor.user_id)
                .await?;
            println!("{} ({} students)", counselor.display_name(), roster.len());
            for entry in &roster {
                println!("  {}  <{}>", entry.student.display_name(), entry.student.email);
            }
        }
        Some(("stats", args)) => {
            let requests = platform.connections.summary().await?;
            let catalog = platform.catalog.statistics().await?;
            if args.get_flag("json") {
                let value = serde_json::json!({ "requests": requests, "catalog": catalog });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Requests");
                println!("  Total:      {}", requests.total);
                println!("  Pending:    {}", requests.pending);
                println!("  Approved:   {}", requests.approved);
                println!("  Rejected:   {}", requests.rejected);
                println!("  Reassigned: {}", requests.reassigned);
                println!("  Cancelled:  {}", requests.cancelled);
                println!("Catalog");
                println!("  Countries:    {}", catalog.countries);
                println!("  Universities: {}", catalog.universities);
                println!("  Courses:      {}", catalog.courses);
                println!("  Pathways:     {}", catalog.pathways);
            }
        }
        Some(("demo", _)) => bail!("demo runs only on the in-memory store; unset DATABASE_URL"),
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => {
            cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing --{name}"))
}

fn request_id(args: &ArgMatches) -> anyhow::Result<RequestId> {
    let raw = arg(args, "id")?;
    raw.parse()
        .with_context(|| format!("'{raw}' is not a request id"))
}

async fn acting_admin<S: RecordStore + CatalogSource>(
    platform: &EduBridge<S>,
    args: &ArgMatches,
) -> anyhow::Result<Actor> {
    let email = arg(args, "admin")?;
    Actor::load_by_email(&**platform.store(), email)
        .await
        .with_context(|| format!("loading admin {email}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decisions_are_refused_without_a_database() {
        for command in ["approve", "reject", "reassign", "migrate"] {
            assert!(memory_store_refusal(command).is_some(), "{command}");
        }
        for command in ["requests", "roster", "stats", "demo"] {
            assert!(memory_store_refusal(command).is_none(), "{command}");
        }
    }

    #[test]
    fn cli_parses_reject() {
        let matches = cli()
            .try_get_matches_from(["edubridge", "reject", "abc", "--reason", "full"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "reject");
        assert_eq!(arg(args, "reason").unwrap(), "full");
        assert_eq!(arg(args, "admin").unwrap(), "admin@edubridge.test");
        assert!(request_id(args).is_err());
    }
}
