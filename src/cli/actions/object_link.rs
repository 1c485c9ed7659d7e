use crate::{
    cli::actions::Action,
    destination::Destination,
    link::{LinkResult, Linker},
    records::AttachmentRepository,
    store::ObjectStore,
};
use anyhow::{Result, anyhow};
use colored::Colorize;

/// # Errors
///
/// Will return an error if the batch is aborted or no key could be linked
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
    if let Action::LinkObjects { keys, group, owner } = action {
        let linker = Linker::new(store, records, destination)
            .with_group(group.as_deref())
            .with_owner(owner.as_deref());

        let result = linker.link(&keys).await?;

        print_result(&result);

        if result.succeeded() == 0 && !keys.is_empty() {
            return Err(anyhow!("no object linked"));
        }
    }

    Ok(())
}

fn print_result(result: &LinkResult) {
    for item in &result.items {
        if item.success {
            println!("{} {}", "linked".green(), item.object_key);
        } else {
            println!(
                "{} {}: {}",
                "failed".red(),
                item.object_key,
                item.message.as_deref().unwrap_or_default()
            );
        }
    }
}
