//! Mock implementations for testing.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use webgetter::{FetchError, FetchResult, FetchedResponse, Fetcher, RequestDescriptor, WebGetter};
use webgetter_core::{
    Formatter, FormatterProvider, HostError, HostResult, Locale, MatchScope, MessageSender,
    PlainFormatter, TextMessage, TriggerRegistry, TriggerToken,
};

/// Nickname used by the message helpers.
pub const TEST_NICK: &str = "alice";
/// Channel used by the message helpers.
pub const TEST_CHANNEL: &str = "#test";

/// A message captured by [`MockHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Channel or nickname.
    pub target: String,
    /// Wire text.
    pub text: String,
}

#[derive(Debug, Default)]
struct Registry {
    /// Lowercased word to token.
    active: BTreeMap<String, TriggerToken>,
    /// Words owned by "other modules".
    reserved: Vec<String>,
    freed: Vec<TriggerToken>,
    issued: u64,
}

/// Mock host bot: trigger registry, message sender and formatter provider.
///
/// Uses `std::sync::Mutex` internally to allow both sync and async usage
/// without requiring a tokio runtime for builder methods.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    registry: Arc<Mutex<Registry>>,
    /// Captured messages.
    sent: Arc<Mutex<Vec<SentMessage>>>,
    /// Whether sending fails.
    fail_sends: bool,
    /// Locale reported by every formatter.
    locale: Locale,
}

impl MockHost {
    /// Create a new mock host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another module owns `word`.
    #[must_use]
    pub fn with_reserved_trigger(self, word: &str) -> Self {
        self.reserve_trigger(word);
        self
    }

    /// Report `locale` from every formatter.
    #[must_use]
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Locale::parse(locale);
        self
    }

    /// Make every send fail with [`HostError::NotConnected`].
    #[must_use]
    pub fn with_failing_sender(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Pretend another module owns `word`.
    pub fn reserve_trigger(&self, word: &str) {
        if let Ok(mut guard) = self.registry.lock() {
            guard.reserved.push(word.to_lowercase());
        }
    }

    /// A module wired to this host.
    #[must_use]
    pub fn module(&self) -> WebGetter {
        let host = Arc::new(self.clone());
        WebGetter::new(host.clone(), host.clone(), host)
    }

    /// A channel message from [`TEST_NICK`] on [`TEST_CHANNEL`].
    #[must_use]
    pub fn channel_message(&self, text: &str) -> TextMessage {
        TextMessage::channel(TEST_NICK, TEST_CHANNEL, text)
    }

    /// A private message from [`TEST_NICK`].
    #[must_use]
    pub fn private_message(&self, text: &str) -> TextMessage {
        TextMessage::private(TEST_NICK, text)
    }

    /// Get captured messages.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Get the text of captured messages.
    #[must_use]
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_messages().into_iter().map(|m| m.text).collect()
    }

    /// Clear captured messages.
    pub fn clear_messages(&self) {
        if let Ok(mut guard) = self.sent.lock() {
            guard.clear();
        }
    }

    /// Words currently registered, lowercased and sorted.
    #[must_use]
    pub fn registered_triggers(&self) -> Vec<String> {
        self.registry
            .lock()
            .map(|g| g.active.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Tokens released so far, in order.
    #[must_use]
    pub fn freed_tokens(&self) -> Vec<TriggerToken> {
        self.registry
            .lock()
            .map(|g| g.freed.clone())
            .unwrap_or_default()
    }
}

impl TriggerRegistry for MockHost {
    fn register_triggers(&self, trigger: &str, _scope: MatchScope) -> Option<TriggerToken> {
        let mut guard = self.registry.lock().ok()?;
        let word = trigger.to_lowercase();
        if guard.reserved.contains(&word) || guard.active.contains_key(&word) {
            return None;
        }
        guard.issued = guard.issued.saturating_add(1);
        let token = TriggerToken::new(format!("{word}#{}", guard.issued));
        guard.active.insert(word, token.clone());
        Some(token)
    }

    fn free_triggers(&self, token: &TriggerToken) -> bool {
        let Ok(mut guard) = self.registry.lock() else {
            return false;
        };
        let word = guard
            .active
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(w, _)| w.clone());
        match word {
            Some(word) => {
                guard.active.remove(&word);
                guard.freed.push(token.clone());
                true
            },
            None => false,
        }
    }
}

#[async_trait]
impl MessageSender for MockHost {
    async fn send_message(&self, target: &str, text: &str) -> HostResult<()> {
        if self.fail_sends {
            return Err(HostError::NotConnected);
        }
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(SentMessage {
                target: target.to_owned(),
                text: text.to_owned(),
            });
        }
        Ok(())
    }
}

impl FormatterProvider for MockHost {
    fn formatter(&self, _channel: Option<&str>) -> Arc<dyn Formatter> {
        Arc::new(PlainFormatter::new(self.locale.clone()))
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Page { content_type: String, body: Vec<u8> },
    Response(FetchedResponse),
    Error(FetchError),
}

/// Mock fetcher answering from a queue and recording every request.
///
/// When the queue is empty, fetches fail with a transport error.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl MockFetcher {
    /// Create a fetcher with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `200` response served from the requested URL.
    #[must_use]
    pub fn with_page(self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.push(Reply::Page {
            content_type: content_type.to_owned(),
            body: body.into(),
        });
        self
    }

    /// Queue a complete response.
    #[must_use]
    pub fn with_response(self, response: FetchedResponse) -> Self {
        self.push(Reply::Response(response));
        self
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn with_error(self, error: FetchError) -> Self {
        self.push(Reply::Error(error));
        self
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut guard) = self.replies.lock() {
            guard.push_back(reply);
        }
    }

    /// Get recorded requests.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> FetchResult<FetchedResponse> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request.clone());
        }
        let reply = self.replies.lock().ok().and_then(|mut g| g.pop_front());
        match reply {
            Some(Reply::Page { content_type, body }) => Ok(FetchedResponse::ok(
                request.url.clone(),
                Some(content_type.as_str()),
                body,
            )),
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(error)) => Err(error),
            None => Err(FetchError::Transport("no response queued".to_owned())),
        }
    }
}
