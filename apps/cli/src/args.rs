use std::env;
use std::path::PathBuf;

const DEFAULT_HISTORY_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Track {
        mac: String,
        name: Option<String>,
        site: Option<String>,
    },
    Untrack {
        mac: String,
    },
    Rename {
        mac: String,
        name: Option<String>,
    },
    Devices,
    History {
        mac: String,
        limit: u32,
    },
    Heatmap {
        mac: String,
    },
    Status,
}

#[derive(Debug)]
pub struct CliArgs {
    pub command: Command,
    pub config: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliArgs, String> {
    parse_from(env::args().skip(1))
}

pub fn parse_from(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut args = args.into_iter();
    let mut config = None;
    let mut name = None;
    let mut site = None;
    let mut limit = None;
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value_for(&mut args, "--config")?)),
            "--name" => name = Some(value_for(&mut args, "--name")?),
            "--site" => site = Some(value_for(&mut args, "--site")?),
            "--limit" => {
                let value = value_for(&mut args, "--limit")?;
                let parsed = value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid limit value: {value}"))?;
                limit = Some(parsed);
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown argument: {flag}")),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let verb = positional.next().unwrap_or_else(|| "run".to_string());
    let mut mac = |verb: &str| {
        positional
            .next()
            .ok_or_else(|| format!("{verb} needs a mac address"))
    };
    let command = match verb.as_str() {
        "run" => Command::Run,
        "track" => Command::Track {
            mac: mac("track")?,
            name,
            site,
        },
        "untrack" => Command::Untrack {
            mac: mac("untrack")?,
        },
        "rename" => Command::Rename {
            mac: mac("rename")?,
            name,
        },
        "devices" => Command::Devices,
        "history" => Command::History {
            mac: mac("history")?,
            limit: limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        },
        "heatmap" => Command::Heatmap {
            mac: mac("heatmap")?,
        },
        "status" => Command::Status,
        other => return Err(format!("unknown command: {other}")),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {extra}"));
    }
    Ok(CliArgs { command, config })
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {flag}"))
}

pub fn print_help() {
    println!(
        "WiFi Stalker\n\n\
Usage:\n  wifi-stalker [--config <path>] [command]\n\n\
Commands:\n  run                                   Poll the controller until Ctrl+C (default)\n  track <mac> [--name <n>] [--site <s>] Start tracking a device\n  untrack <mac>                         Stop tracking and delete its history\n  rename <mac> [--name <n>]             Set or clear a device's name\n  devices                               List tracked devices\n  history <mac> [--limit <n>]           Show recent connection intervals\n  heatmap <mac>                         Show average minutes per hour of week\n  status                                Show refresh status\n\n\
Options:\n  --config <path>  Use this config file instead of the default\n  -h, --help       Show this help message\n"
    );
}
