use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches};
use gps_to_local::{constants::PUBLISH_GLOBAL_TO_LOCAL_HZ, RunOptions};

#[derive(Debug, Clone)]
pub struct SerialArgs {
    pub port: String,
    pub baud: u32,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub verbose: bool,
    pub frames: PathBuf,
    /// `None` reads stdin
    pub input: Option<PathBuf>,
    /// `None` writes stdout
    pub output: Option<PathBuf>,
    pub serial: Option<SerialArgs>,
    pub options: RunOptions,
}

pub fn command() -> clap::Command {
    clap::Command::new("gps-to-local")
        .author(clap::crate_authors!())
        .version(clap::crate_version!())
        .about("Publish GPS fixes together with the body position in the local frame")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every dropped sentence and pose"),
        )
        .arg(
            Arg::new("publish-global-to-local")
                .short('p')
                .long("publish-global-to-local")
                .action(ArgAction::SetTrue)
                .help("Periodically republish the latest position on GLOBAL_TO_LOCAL"),
        )
        .arg(
            Arg::new("global-to-local-hz")
                .value_name("hz")
                .long("global-to-local-hz")
                .required(false)
                .default_value("10")
                .value_parser(value_parser!(f64))
                .help("Rate of the GLOBAL_TO_LOCAL publication"),
        )
        .arg(
            Arg::new("frames")
                .value_name("path")
                .short('f')
                .long("frames")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON file describing the coordinate frames"),
        )
        .arg(
            Arg::new("input")
                .value_name("path")
                .short('i')
                .long("input")
                .value_parser(value_parser!(PathBuf))
                .help("Read messages from this file instead of stdin"),
        )
        .arg(
            Arg::new("output")
                .value_name("path")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .help("Write published messages to this file instead of stdout"),
        )
        .arg(
            Arg::new("port")
                .value_name("port")
                .long("port")
                .help("Serial port delivering raw NMEA sentences"),
        )
        .arg(
            Arg::new("baud")
                .value_name("baud")
                .short('s')
                .long("baud")
                .required(false)
                .default_value("4800")
                .value_parser(value_parser!(u32))
                .help("Baud rate of the serial port"),
        )
}

impl Args {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let serial = matches.get_one::<String>("port").map(|port| SerialArgs {
            port: port.clone(),
            baud: matches.get_one::<u32>("baud").copied().unwrap_or(4800),
        });
        Self {
            verbose: matches.get_flag("verbose"),
            frames: matches
                .get_one::<PathBuf>("frames")
                .cloned()
                .unwrap_or_default(),
            input: matches.get_one::<PathBuf>("input").cloned(),
            output: matches.get_one::<PathBuf>("output").cloned(),
            serial,
            options: RunOptions {
                publish_global_to_local: matches.get_flag("publish-global-to-local"),
                global_to_local_hz: matches
                    .get_one::<f64>("global-to-local-hz")
                    .copied()
                    .unwrap_or(PUBLISH_GLOBAL_TO_LOCAL_HZ),
            },
        }
    }
}

/// Parses the process arguments. Exits with usage on invalid arguments.
pub fn parse_args() -> Args {
    Args::from_matches(&command().get_matches())
}
