use crate::cli::commands::record_args;
use clap::{Arg, Command};

pub fn command() -> Command {
    let command = Command::new("link")
        .about("Create attachment records for objects already in the bucket")
        .arg(
            Arg::new("destination")
                .help("Destination name in the config file")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("keys")
                .help("Object keys to link")
                .required(true)
                .num_args(1..),
        );

    record_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_check_keys() -> Result<()> {
        let cmd = command();
        let m = cmd.try_get_matches_from(vec!["s3attach", "media", "up/a.png", "up/b.png"])?;

        let keys: Vec<&str> = m
            .get_many::<String>("keys")
            .unwrap_or_default()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["up/a.png", "up/b.png"]);
        Ok(())
    }

    #[test]
    fn test_check_keys_required() {
        let cmd = command();
        assert!(cmd.try_get_matches_from(vec!["s3attach", "media"]).is_err());
    }
}
