use crate::{
    cli::actions::Action,
    delete,
    destination::Destination,
    records::AttachmentRepository,
    store::ObjectStore,
};
use anyhow::{Result, anyhow};
use colored::Colorize;

/// # Errors
///
/// Will return an error if the record belongs to another destination or the deletion fails
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
        Action::DeleteRecord { name } => {
            check_destination(records, destination, &name)?;
            let record = delete::remove(store, records, &name).await?;
            let status = if record.skip_remote_deletion {
                "kept"
            } else {
                "deleted"
            };
            println!("{} {} {}", "removed".red(), record.name, status.yellow());
        }

        Action::UnlinkRecord { name } => {
            check_destination(records, destination, &name)?;
            let record = delete::unlink(records, &name)?;
            println!("{} {} {}", "unlinked".yellow(), record.name, record.object_key);
        }

        _ => {}
    }

    Ok(())
}

// records of other destinations point into other buckets
fn check_destination<R>(records: &R, destination: &Destination, name: &str) -> Result<()>
where
    R: AttachmentRepository + ?Sized,
{
    if let Some(record) = records.get(name)?
        && record.destination != destination.name
    {
        return Err(anyhow!(
            "record {name} belongs to destination {}, not {}",
            record.destination.red(),
            destination.name
        ));
    }
    Ok(())
}
