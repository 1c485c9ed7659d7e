use crate::{cli::actions::Action, scan::Cursor};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Destination name and action of the subcommand
pub fn dispatch(matches: &ArgMatches) -> Result<(String, Action)> {
    let (subcommand, sub_m) = matches.subcommand().context("subcommand missing")?;

    let destination = sub_m
        .get_one::<String>("destination")
        .cloned()
        .context("destination missing")?;

    let string = |id: &str| sub_m.get_one::<String>(id).cloned();

    let action = match subcommand {
        "put" => {
            let file = string("file").context("file missing")?;
            let file = (file != "-").then(|| PathBuf::from(file));

            let file_name = match string("name") {
                Some(name) => name,
                None => file
                    .as_deref()
                    .and_then(Path::file_name)
                    .map(|name| name.to_string_lossy().into_owned())
                    .context("could not get the file name")?,
            };

            Action::PutObject {
                file,
                file_name,
                group: string("group"),
                owner: string("owner"),
            }
        }

        "ls" => {
            let max_keys = sub_m.get_one::<u32>("max-keys").copied().unwrap_or(100);

            if sub_m.get_flag("records") {
                Action::ListRecords
            } else if sub_m.get_flag("unlinked") {
                Action::ListUnlinked {
                    prefix: string("prefix"),
                    cursor: Cursor {
                        token: string("token"),
                        continuation_object_key: string("after"),
                    },
                    max_keys,
                }
            } else {
                Action::ListObjects {
                    prefix: string("prefix"),
                    token: string("token"),
                    max_keys,
                }
            }
        }

        "link" => Action::LinkObjects {
            keys: sub_m
                .get_many::<String>("keys")
                .unwrap_or_default()
                .cloned()
                .collect(),
            group: string("group"),
            owner: string("owner"),
        },

        "rm" => Action::DeleteRecord {
            name: string("name").context("record name missing")?,
        },

        "unlink" => Action::UnlinkRecord {
            name: string("name").context("record name missing")?,
        },

        "check" => Action::CheckDestination,

        other => {
            return Err(anyhow!(
                "unknown subcommand {}, For more information try {}",
                other.red(),
                "--help".green()
            ));
        }
    };

    Ok((destination, action))
}
