use crate::{
    destination::Destination,
    scan::{self, ScanError},
    store::{ObjectStore, StoreError},
};
use anyhow::{Error, Result};
use colored::Colorize;

/// List one key under the location of `destination`, failures come back with what to look at
///
/// # Errors
///
/// Will return `Err` if the store refuses the listing or can't be reached
pub async fn handle<S: ObjectStore>(store: &S, destination: &Destination) -> Result<()> {
    match scan::check_destination(store, destination).await {
        Ok(page) => {
            println!(
                "{} {}/{} {}",
                "[ok]".green(),
                store.bucket(),
                destination.build_prefix(None).unwrap_or_default(),
                page.objects
                    .first()
                    .map_or_else(|| "(empty)".to_string(), |o| format!("(first: {})", o.key))
                    .dimmed()
            );
            Ok(())
        }

        Err(ScanError::Store { bucket, source, .. }) => {
            let advice = advice(destination, &bucket, &source);
            Err(Error::new(source).context(format!(
                "{} {} {advice}",
                "destination".red(),
                destination.name.yellow()
            )))
        }

        Err(e) => Err(e.into()),
    }
}

fn advice(destination: &Destination, bucket: &str, err: &StoreError) -> String {
    match err {
        StoreError::Auth(_) => {
            "was refused, check access_key and secret_key and their permissions on the bucket"
                .to_string()
        }
        StoreError::NotFound(_) => format!(
            "has no bucket {bucket}, check the bucket name and the {}",
            if destination.endpoint().is_some() {
                "endpoint"
            } else {
                "region"
            }
        ),
        StoreError::Transport { .. } => {
            "is unreachable, check the endpoint for typos and spaces and that the store is up"
                .to_string()
        }
        StoreError::Status { status, .. } => format!(
            "returned HTTP {status}, check the destination settings and that the store is working"
        ),
        StoreError::Invalid(_) | StoreError::Config(_) => "is misconfigured".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::s3::Protocol;

    fn destination(endpoint: &str) -> Destination {
        let mut destination = Destination::new("media", "media");
        destination.endpoint = Some(endpoint.to_string());
        destination.protocol = Protocol::Http;
        destination.path_style = true;
        destination.location = "uploads".to_string();
        destination.access_key = "access".to_string();
        destination.timeout = Some(5);
        destination
    }

    fn listing_path() -> mockito::Matcher {
        mockito::Matcher::Regex(r"^/media\?.*max-keys=1.*prefix=uploads%2F".to_string())
    }

    #[tokio::test]
    async fn test_check_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", listing_path())
            .with_status(200)
            .with_body("<ListBucketResult><Name>media</Name><IsTruncated>true</IsTruncated><Contents><Key>uploads/a.png</Key><Size>1</Size></Contents></ListBucketResult>")
            .create_async()
            .await;

        let destination = destination(&server.host_with_port());
        handle(&destination.s3().unwrap(), &destination)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_access_denied() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", listing_path())
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>")
            .create_async()
            .await;

        let destination = destination(&server.host_with_port());
        let err = handle(&destination.s3().unwrap(), &destination)
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("check access_key and secret_key"), "{message}");
        assert!(message.contains("Access Denied"), "{message}");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_check_no_such_bucket() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", listing_path())
            .with_status(404)
            .with_body("<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>")
            .create_async()
            .await;

        let destination = destination(&server.host_with_port());
        let err = handle(&destination.s3().unwrap(), &destination)
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("has no bucket media"), "{message}");
        assert!(message.contains("endpoint"), "{message}");
    }

    #[tokio::test]
    async fn test_check_unreachable_endpoint() {
        // nothing listens on port 1
        let destination = destination("127.0.0.1:1");
        let err = handle(&destination.s3().unwrap(), &destination)
            .await
            .unwrap_err();

        let message = format!("{err:#}");
        assert!(message.contains("is unreachable"), "{message}");
        assert!(message.contains("could not connect"), "{message}");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Transport { .. })
        ));
    }
}
