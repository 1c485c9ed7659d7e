use anyhow::Result;
use s3attach::{
    cli::{actions, actions::Action, start},
    records::SledRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    let (destination, action, globals) = start()?;

    let s3 = destination.s3()?;
    let records = SledRepository::open(&globals.db_path)?;

    match action {
        Action::PutObject { .. } => {
            actions::object_put::handle(&s3, &records, &destination, action, &globals).await?;
        }

        Action::ListObjects { .. } | Action::ListUnlinked { .. } | Action::ListRecords => {
            actions::object_list::handle(&s3, &records, &destination, action).await?;
        }

        Action::LinkObjects { .. } => {
            actions::object_link::handle(&s3, &records, &destination, action).await?;
        }

        Action::DeleteRecord { .. } | Action::UnlinkRecord { .. } => {
            actions::object_delete::handle(&s3, &records, &destination, action).await?;
        }

        Action::CheckDestination => {
            actions::object_check::handle(&s3, &destination).await?;
        }
    }

    records.flush()?;

    Ok(())
}
