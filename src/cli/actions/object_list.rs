use crate::{
    cli::actions::Action,
    destination::Destination,
    records::{AttachmentRecord, AttachmentRepository},
    scan::{self, ObjectDescriptor},
    store::ObjectStore,
};
use anyhow::Result;
use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use colored::Colorize;

/// # Errors
///
/// Will return an error if the listing or the records can't be read
pub async fn handle<S, R>(
    store: &S,
    records: &R,
    destination: &Destination,
    action: Action,
) -> Result<()>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    match action {
        Action::ListObjects {
            prefix,
            token,
            max_keys,
        } => {
            let page = scan::list_objects(
                store,
                records,
                destination,
                token.as_deref(),
                max_keys,
                prefix.as_deref(),
            )
            .await?;

            for object in &page.objects {
                print_object_info(object);
            }

            if page.is_truncated
                && let Some(token) = page.next_token
            {
                println!("{} {token}", "next page: --token".cyan());
            }
        }

        Action::ListUnlinked {
            prefix,
            cursor,
            max_keys,
        } => {
            let page = scan::list_unlinked(
                store,
                records,
                destination,
                &cursor,
                max_keys,
                prefix.as_deref(),
            )
            .await?;

            for object in &page.objects {
                print_object_info(object);
            }

            if page.has_more {
                let next = page.next_cursor();
                let mut hint = String::from("next page: -u");
                if let Some(token) = next.token {
                    hint.push_str(&format!(" --token {token}"));
                }
                if let Some(key) = next.continuation_object_key {
                    hint.push_str(&format!(" --after {key}"));
                }
                println!("{}", hint.cyan());
            }
        }

        Action::ListRecords => {
            for record in records.list(&destination.name)? {
                print_record_info(&record);
            }
        }

        _ => {}
    }

    Ok(())
}

fn print_object_info(object: &ObjectDescriptor) {
    let last_modified = object
        .last_modified
        .as_deref()
        .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
        .map_or_else(String::new, |dt| {
            DateTime::<Utc>::from(dt).format("%F %T %Z").to_string()
        });

    let linked = if object.linked { "linked" } else { "" };

    println!(
        "{} {:>10} {:<6} {:<}",
        format!("[{last_modified}]").green(),
        ByteSize(object.size).to_string().yellow(),
        linked.blue(),
        object.key
    );
}

fn print_record_info(record: &AttachmentRecord) {
    let created = DateTime::<Utc>::from_timestamp_millis(record.created_at)
        .map_or_else(String::new, |dt| dt.format("%F %T %Z").to_string());

    println!(
        "{} {} {:>10} {} {}",
        format!("[{created}]").green(),
        record.name.yellow(),
        ByteSize(record.size).to_string().yellow(),
        record.object_key,
        record.permalink.blue()
    );
}
