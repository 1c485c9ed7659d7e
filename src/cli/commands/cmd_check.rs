use clap::{Arg, Command};

pub fn command() -> Command {
    Command::new("check")
        .about("Check the endpoint, credentials and bucket of a destination with a one key listing")
        .arg(
            Arg::new("destination")
                .help("Destination name in the config file")
                .required(true)
                .num_args(1),
        )
}
