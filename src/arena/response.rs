use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

const CHANNEL_CAPACITY: usize = 32;

/// What both sides of a battle have produced so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    pub a: String,
    pub b: String
}

/// Receiving end of a response pair being revealed.
pub struct ResponseStream {
    receiver: mpsc::Receiver<ResponseChunk>
}

impl ResponseStream {
    /// Next snapshot, or `None` once the complete pair has been delivered.
    pub async fn next(&mut self) -> Option<ResponseChunk> {
        self.receiver.recv().await
    }

    /// Drains the stream and returns the final snapshot.
    pub async fn finish(mut self) -> Option<ResponseChunk> {
        let mut last = None;
        while let Some(chunk) = self.receiver.recv().await {
            last = Some(chunk);
        }

        last
    }
}

// Byte offsets that end each successive character of `text`
fn char_ends(text: &str) -> Vec<usize> {
    text.char_indices()
        .skip(1)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .filter(|end| *end > 0)
        .collect()
}

fn prefix<'a>(text: &'a str, ends: &[usize], chars: usize) -> &'a str {
    match chars.checked_sub(1).and_then(|last| ends.get(last)) {
        Some(end) => &text[..*end],
        None if chars == 0 => "",
        None => text
    }
}

/// Reveals two finished responses side by side, one character at a time.
///
/// Snapshot `i` holds the first `i` characters of each response; the shorter
/// one stays at its full text once exhausted. The complete pair is sent last.
/// The producer stops as soon as the stream is dropped. The returned task
/// resolves to whether every snapshot was delivered.
pub fn stream_responses(a: String, b: String) -> (ResponseStream, JoinHandle<bool>) {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

    let producer = tokio::spawn(async move {
        let a_ends = char_ends(&a);
        let b_ends = char_ends(&b);
        let longest = a_ends.len().max(b_ends.len());

        for i in 1..=longest {
            let chunk = ResponseChunk {
                a: prefix(&a, &a_ends, i).to_string(),
                b: prefix(&b, &b_ends, i).to_string()
            };

            if sender.send(chunk).await.is_err() {
                debug!("Response stream dropped after {} of {} snapshots", i - 1, longest);
                return false;
            }
        }

        sender.send(ResponseChunk { a, b }).await.is_ok()
    });

    (ResponseStream { receiver }, producer)
}
