pub mod cmd_check;
pub mod cmd_link;
pub mod cmd_ls;
pub mod cmd_put;
pub mod cmd_rm;
pub mod cmd_unlink;

use clap::{
    Arg, ColorChoice, Command,
    builder::ValueParser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::{
    cmp, fs,
    path::{Path, PathBuf},
};

pub fn validator_is_num() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<usize, String> {
        s.parse::<usize>()
            .map_err(|_| String::from("Not a valid number"))
    })
}

pub fn validator_is_file() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<PathBuf, String> {
        if let Ok(metadata) = fs::metadata(s)
            && metadata.is_file()
        {
            return Ok(PathBuf::from(s));
        }

        Err(format!("Invalid file path or file does not exist: '{s}'"))
    })
}

/// A readable file or `-` for STDIN
pub fn validator_is_file_or_stdin() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<String, String> {
        if s == "-" {
            return Ok(s.to_string());
        }

        if let Ok(metadata) = fs::metadata(s)
            && metadata.is_file()
        {
            return Ok(s.to_string());
        }

        Err(format!("Invalid file path or file does not exist: '{s}'"))
    })
}

/// Arguments shared by the subcommands creating records
pub fn record_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("group")
                .help("Attachment group of the created records")
                .long("group")
                .short('g')
                .num_args(1),
        )
        .arg(
            Arg::new("owner")
                .help("Owner of the created records")
                .long("owner")
                .short('o')
                .num_args(1),
        )
}

pub fn new(config_path: &Path) -> Command {
    // get config file path (default: ~/.config/s3attach/config.yml)
    let config_file_path = config_path.join("config.yml");

    // get the records db path (default: ~/.config/s3attach/records)
    let records_path = config_path.join("records");

    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    // num_cpus::get_physical() - 2 returns at least 1 type usize
    let num_threads = cmp::min(
        num_cpus::get_physical().saturating_sub(2).max(1),
        usize::from(u8::MAX),
    )
    .to_string();

    Command::new("s3attach")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stream attachments into S3 buckets and adopt the objects already there")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("config")
                .default_value(config_file_path.into_os_string())
                .long("config")
                .num_args(1)
                .short('c')
                .global(true)
                .value_parser(validator_is_file())
                .value_name("config.yml"),
        )
        .arg(
            Arg::new("db")
                .help("Directory of the attachment records database")
                .long("db")
                .default_value(records_path.into_os_string())
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Don't show progress bar")
                .global(true)
                .num_args(0),
        )
        .arg(
            Arg::new("buffer")
                .default_value("5242880")
                .help("Buffer \"part size\" in bytes, at least 5 MiB")
                .long("buffer")
                .short('b')
                .global(true)
                .num_args(1)
                .value_parser(validator_is_num()),
        )
        .arg(
            Arg::new("verbose")
                .help("Verbosity level")
                .short('v')
                .long("verbose")
                .global(true)
                .action(clap::ArgAction::Count),
        )
        .arg(
            Arg::new("number")
                .help("Number of max concurrent requests")
                .short('n')
                .long("number")
                .default_value(num_threads)
                .global(true)
                .value_parser(clap::value_parser!(u8).range(1..=255))
                .num_args(1),
        )
        .subcommand(cmd_put::command())
        .subcommand(cmd_ls::command())
        .subcommand(cmd_link::command())
        .subcommand(cmd_rm::command())
        .subcommand(cmd_unlink::command())
        .subcommand(cmd_check::command())
}
