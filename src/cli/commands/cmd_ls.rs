use clap::{Arg, Command};

pub fn command() -> Command {
    Command::new("ls")
        .about("List the objects of a destination, the unlinked ones or its attachment records")
        .arg(
            Arg::new("destination")
                .help("Destination name in the config file")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("prefix")
                .help("Limits the listing to file names that begin with the specified prefix")
                .long("prefix")
                .short('p')
                .num_args(1),
        )
        .arg(
            Arg::new("token")
                .help("Continuation token of the page to read")
                .long("token")
                .short('t')
                .num_args(1),
        )
        .arg(
            Arg::new("unlinked")
                .help("Only objects no attachment record references")
                .long("unlinked")
                .short('u')
                .num_args(0),
        )
        .arg(
            Arg::new("after")
                .help("Resume the unlinked listing after this object key")
                .long("after")
                .short('a')
                .requires("unlinked")
                .num_args(1),
        )
        .arg(
            Arg::new("records")
                .help("List the attachment records instead of the objects")
                .long("records")
                .short('r')
                .conflicts_with_all(["unlinked", "prefix", "token"])
                .num_args(0),
        )
        .arg(
            Arg::new("max-keys")
                .help("Number of objects per page")
                .long("max-keys")
                .short('m')
                .value_name("NUMBER")
                .default_value("100")
                .value_parser(clap::value_parser!(u32).range(1..=1000))
                .num_args(1),
        )
}
