use crate::cli::commands::{record_args, validator_is_file_or_stdin};
use clap::{Arg, Command};

pub fn command() -> Command {
    let command = Command::new("put")
        .about("Upload a file as an attachment, renamed when the name is taken")
        .arg(
            Arg::new("destination")
                .help("Destination name in the config file")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("file")
                .help("/path/to/file, \"-\" reads from STDIN")
                .required(true)
                .value_parser(validator_is_file_or_stdin())
                .num_args(1),
        )
        .arg(
            Arg::new("name")
                .help("File name to store, defaults to the name of the file")
                .long("name")
                .required_if_eq("file", "-")
                .num_args(1),
        );

    record_args(command)
}
