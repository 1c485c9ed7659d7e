use crate::{
    cli::{actions::Action, globals::GlobalArgs, progressbar::Bar},
    destination::Destination,
    records::{AttachmentRecord, AttachmentRepository, RecordError},
    store::ObjectStore,
    upload::Uploader,
};
use anyhow::{Context, Result};
use bytes::Bytes;
use bytesize::ByteSize;
use colored::Colorize;
use futures::Stream;
use std::io;
use tokio::{fs::File, io::AsyncRead, sync::mpsc::unbounded_channel};
use tokio_util::io::ReaderStream;

// read buffer, the upload session regroups it into parts
const READ_CAPACITY: usize = 256 * 1024;

/// # Errors
///
/// Will return `Err` if the file can't be read, the upload fails or the record can't be created
pub async fn handle<S, R>(
    store: &S,
    records: &R,
    destination: &Destination,
    action: Action,
    globals: &GlobalArgs,
) -> Result<()>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    if let Action::PutObject {
        file,
        file_name,
        group,
        owner,
    } = action
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = match &file {
            Some(path) => Box::new(
                File::open(path)
                    .await
                    .with_context(|| format!("could not open {}", path.display()))?,
            ),
            None => Box::new(tokio::io::stdin()),
        };

        let body = ReaderStream::with_capacity(reader, READ_CAPACITY);

        let record = put(
            store,
            records,
            destination,
            globals,
            &file_name,
            body,
            group.as_deref(),
            owner.as_deref(),
        )
        .await?;

        println!(
            "{} {:>10} {} {}",
            format!("[{}]", record.name).green(),
            ByteSize(record.size).to_string().yellow(),
            record.object_key,
            record.permalink.blue()
        );
    }

    Ok(())
}

/// Upload `body` as `file_name` and record the stored object as an attachment
///
/// # Errors
///
/// Will return `Err` if the upload fails or the record can't be created
#[allow(clippy::too_many_arguments)]
pub async fn put<S, R, B>(
    store: &S,
    records: &R,
    destination: &Destination,
    globals: &GlobalArgs,
    file_name: &str,
    body: B,
    group: Option<&str>,
    owner: Option<&str>,
) -> Result<AttachmentRecord>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
    B: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let policy = destination.naming_policy();
    let (tx, rx) = unbounded_channel();

    let pb = Bar::new_spinner_stream(globals.quiet);
    let progress = pb.follow(rx);

    let uploader = Uploader::new(store, &policy)
        .with_location(&destination.expand_location())
        .with_part_size(globals.buf_size)
        .with_max_requests(globals.max_requests)
        .with_progress(tx);

    let uploaded = uploader.upload_held(file_name, body).await;

    // the sender went away with the uploader
    drop(uploader);
    let sent = progress.await.unwrap_or_default();
    pb.finish();

    // the key stays locked until the record exists, a concurrent link finds it locked
    let (uploaded, _guard) = uploaded?;
    log::debug!("acknowledged {sent} bytes of {}", uploaded.key);

    let mut record = AttachmentRecord::new(&destination.name, &uploaded.key, &uploaded.file_name);
    record.size = uploaded.size;
    record.media_type = uploaded.content_type;
    record.permalink = destination.object_url(&uploaded.key)?;
    record.group = group.filter(|g| !g.trim().is_empty()).map(ToString::to_string);
    record.owner = owner.map(ToString::to_string);

    match records.create(&record) {
        Ok(()) => Ok(record),

        // a record left behind by an object deleted outside of s3attach now points to the upload
        Err(RecordError::AlreadyLinked { name, .. }) => {
            log::warn!(
                "{}/{} is already recorded as {name}, keeping it",
                destination.name,
                uploaded.key
            );
            records
                .get(&name)?
                .with_context(|| format!("record {name} vanished"))
        }

        Err(e) => Err(e).with_context(|| {
            format!("could not record {}/{}", destination.bucket, uploaded.key)
        }),
    }
}
