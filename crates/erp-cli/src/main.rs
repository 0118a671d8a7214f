use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use erp_core::{BulkUpload, ErpConfig, ErpError, ErpService};
use erp_store::{EntityKind, EntityPayload, HsnKind, HsnPayload, RoleId};
use erp_units::{Unit, UnitType};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = include_str!("../../../config/erp.toml");

fn cli() -> Command {
    Command::new("erp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("ERP master data: unit conversions and approval workflow checks")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to the bundled config)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert an amount between registered units")
                .arg(Arg::new("amount").required(true).value_parser(value_parser!(f64)))
                .arg(Arg::new("from").required(true).help("Source unit symbol"))
                .arg(Arg::new("to").required(true).help("Target unit symbol")),
        )
        .subcommand(
            Command::new("preview")
                .about("Preview an unsaved conversion factor")
                .arg(Arg::new("base").long("base").required(true))
                .arg(Arg::new("target").long("target").required(true))
                .arg(
                    Arg::new("factor")
                        .long("factor")
                        .required(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("samples")
                        .long("samples")
                        .value_delimiter(',')
                        .default_value("1,10,100")
                        .value_parser(value_parser!(f64))
                        .help("Comma-separated sample amounts"),
                ),
        )
        .subcommand(
            Command::new("units")
                .about("List units of a type")
                .arg(Arg::new("type").required(true).help("WEIGHT, LENGTH, VOLUME, ..."))
                .arg(Arg::new("exclude").long("exclude").help("Unit to leave out"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("allowed")
                .about("Units an item with the given primary unit may use")
                .arg(Arg::new("primary").required(true))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("demo")
                .about("Run a scripted bulk upload and batch approval")
                .arg(
                    Arg::new("rows")
                        .long("rows")
                        .default_value("5")
                        .value_parser(value_parser!(u8).range(1..=50))
                        .help("Number of HSN rows to upload"),
                ),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = err
                .downcast_ref::<ErpError>()
                .map_or_else(|| format!("{err:#}"), ErpError::user_message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ErpConfig::load(path)?,
        None => ErpConfig::from_toml_str(DEFAULT_CONFIG).context("bundled configuration")?,
    };
    init_tracing(&config, matches.get_flag("log-json"));
    tracing::debug!(command = matches.subcommand_name().unwrap_or("-"), "starting");

    let service = ErpService::new(&config)?;
    match matches.subcommand() {
        Some(("convert", args)) => {
            let amount = *args.get_one::<f64>("amount").ok_or_else(|| anyhow!("amount is required"))?;
            let from = required(args, "from")?;
            let to = required(args, "to")?;
            let converted = service.convert(from, to, amount)?;
            println!("{amount} {} = {converted} {}", from.to_uppercase(), to.to_uppercase());
        }
        Some(("preview", args)) => {
            let base = required(args, "base")?;
            let target = required(args, "target")?;
            let factor = *args.get_one::<f64>("factor").ok_or_else(|| anyhow!("factor is required"))?;
            let samples: Vec<f64> = args.get_many::<f64>("samples").into_iter().flatten().copied().collect();

            for row in service.preview(base, target, factor, &samples)? {
                println!("{} {} -> {} {}", row.input, base.to_uppercase(), row.output, target.to_uppercase());
            }
        }
        Some(("units", args)) => {
            let unit_type: UnitType = required(args, "type")?.parse()?;
            let exclude = args.get_one::<String>("exclude").map(String::as_str);
            print_units(&service.units_by_type(unit_type, exclude), args.get_flag("json"))?;
        }
        Some(("allowed", args)) => {
            let units = service.allowed_units_for(required(args, "primary")?)?;
            print_units(&units, args.get_flag("json"))?;
        }
        Some(("demo", args)) => {
            let rows = *args.get_one::<u8>("rows").ok_or_else(|| anyhow!("rows is required"))?;
            demo(&service, rows)?;
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

fn init_tracing(config: &ErpConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{name} is required"))
}

fn print_units(units: &[Unit], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(units)?);
        return Ok(());
    }
    for unit in units {
        let marker = if unit.is_base_unit { " (base)" } else { "" };
        println!("{:<6} {}{marker}", unit.symbol, unit.name);
    }
    Ok(())
}

fn demo(service: &ErpService, rows: u8) -> anyhow::Result<()> {
    let clerk = RoleId::new("CLERK");
    let reviewer = RoleId::new("TAX_REVIEWER");

    let payloads: Vec<EntityPayload> = (0..rows)
        .map(|i| {
            EntityPayload::HsnCode(HsnPayload::new(
                format!("84{:02}", i % 100),
                HsnKind::Hsn,
                format!("Machinery group {i}"),
                18.0,
            ))
        })
        .collect();
    let receipt = service.submit_bulk(BulkUpload::new(payloads, clerk).with_file_name("demo.xlsx"))?;
    println!("uploaded {} rows as batch {}", receipt.entities.len(), receipt.batch_id);

    if let Some(first) = receipt.entities.first() {
        service.reject(first.id, &reviewer, "wrong chapter")?;
        println!("rejected {} ahead of the batch", first.id);
    }

    let outcome = service.approve_batch(receipt.batch_id, &reviewer, "bulk verified")?;
    println!("approved {} of {}", outcome.succeeded.len(), outcome.total());
    for failure in &outcome.failed {
        println!("  {} skipped: {}", failure.id, failure.reason);
    }

    let pending = service.queue_for(&reviewer, EntityKind::HsnCode)?;
    println!("pending HSN codes: {}", pending.len());

    let audit = service.engine().audit();
    audit.verify_integrity()?;
    println!("audit events: {} (head {})", audit.len(), audit.head_hash());
    Ok(())
}
