use bytesize::ByteSize;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tokio_stream::wrappers::UnboundedReceiverStream;

// "⠁⠂⠄⡀⢀⠠⠐⠈"
const PROGRES_CHARS_SPINNER: &[&str] = &[
    "\u{2801}", "\u{2802}", "\u{2804}", "\u{2840}", "\u{2880}", "\u{2820}", "\u{2810}", "\u{2808}",
    "",
];

#[derive(Default, Debug)]
pub struct Bar {
    pub progress: Option<ProgressBar>,
}

impl Bar {
    /// Spinner showing the bytes acknowledged by the store
    #[must_use]
    pub fn new_spinner_stream(quiet: bool) -> Self {
        if quiet {
            return Self::default();
        }

        let pb = ProgressBar::new_spinner();

        pb.enable_steady_tick(Duration::from_millis(200));

        let style_result = ProgressStyle::default_spinner()
            .tick_strings(PROGRES_CHARS_SPINNER)
            .template("[{elapsed_precise}] {msg} {spinner:.green}");

        let style = match style_result {
            Ok(s) => s,
            Err(err) => {
                eprintln!("Error creating spinner style: {err}");
                return Self { progress: None };
            }
        };

        pb.set_style(style);

        Self { progress: Some(pb) }
    }

    /// Sum the part sizes received on `rx` into the spinner message until the sender is
    /// dropped, returns the total
    #[must_use]
    pub fn follow(&self, rx: UnboundedReceiver<usize>) -> JoinHandle<u64> {
        let pb = self.progress.clone();
        let mut sizes = UnboundedReceiverStream::new(rx);
        tokio::spawn(async move {
            let mut total: u64 = 0;
            while let Some(size) = sizes.next().await {
                total = total.saturating_add(size as u64);
                if let Some(pb) = &pb {
                    pb.set_message(ByteSize(total).to_string());
                }
            }
            total
        })
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }
}
