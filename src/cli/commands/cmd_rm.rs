use clap::{Arg, Command};

pub fn command() -> Command {
    Command::new("rm")
        .about("Delete an attachment record and its object, unless the record keeps it")
        .arg(
            Arg::new("destination")
                .help("Destination name in the config file")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("name")
                .help("Attachment record name")
                .required(true)
                .num_args(1),
        )
}
