use crate::{
    cli::{Config, actions::Action, commands, dispatch, globals::GlobalArgs},
    destination::Destination,
};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory holding `config.yml` and the records db, created when missing
///
/// # Errors
///
/// Will return `Err` if the directory can't be created
pub fn get_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().map_or_else(|| PathBuf::from("/tmp"), |h| h);

    let config_path = Path::new(&home_dir).join(".config").join("s3attach");
    fs::create_dir_all(&config_path)
        .with_context(|| format!("unable to create: {}", config_path.display()))?;

    Ok(config_path)
}

/// # Errors
///
/// Will return an error if the config file is not found or the destination does not exist
pub fn start() -> Result<(Destination, Action, GlobalArgs)> {
    let config_path = get_config_path()?;

    // start the command line interface
    let cmd = commands::new(&config_path);

    // get the matches
    let matches = cmd.get_matches();

    let verbosity_level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(verbosity_level)
        .init();

    log::info!("config path: {}", config_path.display());

    let global_args = global_args(&matches, &config_path);

    log::info!(
        "buffer size: {}, max requests: {}",
        global_args.buf_size,
        global_args.max_requests
    );

    // Config file is required
    let config_file = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .context("no config file found")?;

    // load the config file
    let config = Config::new(config_file)?;

    log::debug!("destinations: {:?}", config.destinations.keys());

    let (name, action) = dispatch::dispatch(&matches)?;

    let destination = get_destination(&config, &config_path, &name)?.clone();

    log::debug!("globals: {global_args:#?}, action: {action:#?}");

    Ok((destination, action, global_args))
}

fn global_args(matches: &ArgMatches, config_path: &Path) -> GlobalArgs {
    let db_path = matches
        .get_one::<PathBuf>("db")
        .cloned()
        .unwrap_or_else(|| config_path.join("records"));

    let mut global_args = GlobalArgs::new(db_path);

    // define chunk size
    if let Some(buf_size) = matches.get_one::<usize>("buffer") {
        global_args.set_buf_size(*buf_size);
    }

    if let Some(number) = matches.get_one::<u8>("number") {
        global_args.set_max_requests(*number);
    }

    global_args.quiet = matches.get_flag("quiet");

    global_args
}

fn get_destination<'a>(
    config: &'a Config,
    config_path: &Path,
    name: &str,
) -> Result<&'a Destination> {
    config.get_destination(name).map_err(|_| {
        anyhow!(
            "Could not find destination: \"{}\". Check config file {}/config.yml, For more information try {}",
            name.red(),
            config_path.display(),
            "--help".green()
        )
    })
}
