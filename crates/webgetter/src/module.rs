//! The trigger dispatcher: registration, request handling and help.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use webgetter_config::{ModuleConfig, TriggerConfig};
use webgetter_core::{
    Context, FormatError, Formatter, FormatterProvider, MatchScope, MessageSender, ParamSource,
    TextMessage, TriggerRegistry, TriggerToken,
};

use crate::error::{ExtractError, FetchError, RequestError, WebGetterError, WebGetterResult};
use crate::extract::extract;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::render::{OutputLine, render_rows};
use crate::request::{self, NetworkOptions};

/// Name under which the module answers help requests.
pub const MODULE_NAME: &str = "webgetter";

const RETRIEVAL_ERROR: &str =
    "An error occurred while retrieving the information (<var name=\"error\"/>)";
const INVALID_RESPONSE: &str = "Invalid response received";
const MODULE_HELP: &str = "Provides the following commands, which retrieve information off \
                           the internet: <b><var name=\"triggers\"/></b>.";
const NO_COMMANDS_HELP: &str = "This module does not provide any command at the moment.";
const GENERIC_USAGE: &str = "<b>Usage:</b> <var name=\"trigger\"/> [<u>arguments</u>]. \
                             Retrieves information off the internet.";

/// A loaded configuration with its network options.
#[derive(Debug, Default)]
struct TriggerTable {
    config: ModuleConfig,
    options: NetworkOptions,
}

impl TriggerTable {
    fn new(config: ModuleConfig) -> Self {
        Self {
            options: NetworkOptions::from_config(&config),
            config,
        }
    }

    fn lookup(&self, word: &str) -> Option<&TriggerConfig> {
        self.config.trigger(word)
    }
}

/// Why an invocation produced an error line instead of output.
#[derive(Debug, Error)]
enum PipelineError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl PipelineError {
    fn line(&self, fmt: &dyn Formatter) -> String {
        match self {
            Self::Extract(ExtractError::UnsupportedContentType(_)) => {
                fmt.translate(INVALID_RESPONSE, &[])
            },
            other => fmt.translate(RETRIEVAL_ERROR, &[("error", other.to_string())]),
        }
    }
}

/// The WebGetter module.
///
/// Holds the host collaborators and the current trigger table. The table is
/// replaced wholesale by [`reload`](Self::reload); invocations already
/// running keep the table they started with.
pub struct WebGetter {
    registry: Arc<dyn TriggerRegistry>,
    sender: Arc<dyn MessageSender>,
    formatters: Arc<dyn FormatterProvider>,
    fetcher: Arc<dyn Fetcher>,
    table: RwLock<Arc<TriggerTable>>,
    tokens: Mutex<Vec<TriggerToken>>,
}

impl std::fmt::Debug for WebGetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebGetter")
            .field("triggers", &self.triggers())
            .finish_non_exhaustive()
    }
}

impl WebGetter {
    /// Create a module with no triggers, fetching over HTTP.
    #[must_use]
    pub fn new(
        registry: Arc<dyn TriggerRegistry>,
        sender: Arc<dyn MessageSender>,
        formatters: Arc<dyn FormatterProvider>,
    ) -> Self {
        Self {
            registry,
            sender,
            formatters,
            fetcher: Arc::new(HttpFetcher::new()),
            table: RwLock::new(Arc::new(TriggerTable::default())),
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Use `fetcher` instead of the HTTP fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Load the configuration from `params` and register its triggers.
    ///
    /// # Errors
    ///
    /// See [`install`](Self::install); configuration errors are returned
    /// before any registration changes.
    pub fn reload(&self, params: &dyn ParamSource) -> WebGetterResult<()> {
        let config = ModuleConfig::from_params(params)?;
        self.install(config)
    }

    /// Register the triggers of `config` and make it current.
    ///
    /// The previous triggers are released first so a configuration may keep
    /// the same words. If a word is refused, the triggers registered for
    /// `config` are released, the previous ones registered again and the
    /// previous table stays current.
    ///
    /// # Errors
    ///
    /// [`WebGetterError::Registration`] naming the refused trigger.
    pub fn install(&self, config: ModuleConfig) -> WebGetterResult<()> {
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        self.release(&mut tokens);

        match self.register_all(&config.triggers) {
            Ok(registered) => {
                *tokens = registered;
                let table = Arc::new(TriggerTable::new(config));
                info!(
                    triggers = table.config.triggers.len(),
                    timeout_secs = table.config.timeout_secs,
                    "webgetter configuration loaded"
                );
                *self.table.write().unwrap_or_else(PoisonError::into_inner) = table;
                Ok(())
            },
            Err(e) => {
                let previous = self.snapshot();
                match self.register_all(&previous.config.triggers) {
                    Ok(restored) => *tokens = restored,
                    Err(restore) => {
                        error!(error = %restore, "could not restore the previous triggers");
                    },
                }
                Err(e)
            },
        }
    }

    /// Release every trigger and forget the configuration.
    pub fn unload(&self) {
        let mut tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        self.release(&mut tokens);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(TriggerTable::default());
    }

    fn register_all(&self, triggers: &[TriggerConfig]) -> WebGetterResult<Vec<TriggerToken>> {
        let mut registered = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            if let Some(token) = self
                .registry
                .register_triggers(&trigger.trigger, MatchScope::Any)
            {
                registered.push(token);
            } else {
                warn!(
                    index = trigger.index,
                    trigger = %trigger.trigger,
                    "trigger refused by the registry"
                );
                self.release(&mut registered);
                return Err(WebGetterError::Registration {
                    index: trigger.index,
                    trigger: trigger.trigger.clone(),
                });
            }
        }
        Ok(registered)
    }

    fn release(&self, tokens: &mut Vec<TriggerToken>) {
        for token in tokens.drain(..) {
            if !self.registry.free_triggers(&token) {
                debug!(%token, "registry did not know the trigger token");
            }
        }
    }

    fn snapshot(&self) -> Arc<TriggerTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The current trigger words, in configuration order.
    #[must_use]
    pub fn triggers(&self) -> Vec<String> {
        self.snapshot()
            .config
            .triggers
            .iter()
            .map(|t| t.trigger.clone())
            .collect()
    }

    /// Whether `text` invokes a trigger: a trigger word (any case) followed
    /// by a space and more text.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let Some((word, rest)) = text.split_once(' ') else {
            return false;
        };
        !rest.trim().is_empty() && self.snapshot().lookup(word).is_some()
    }

    /// Run the trigger named by the first word of `message` and send the
    /// result to the channel, or to the sender of a private message.
    ///
    /// Failures of the pipeline are reported to the user as a single line;
    /// messages whose first word is not a trigger are ignored.
    ///
    /// # Errors
    ///
    /// [`WebGetterError::Host`] if a message cannot be sent.
    pub async fn handle_request(&self, message: &TextMessage) -> WebGetterResult<()> {
        let table = self.snapshot();
        let Some(trigger) = message
            .text
            .split_whitespace()
            .next()
            .and_then(|word| table.lookup(word))
        else {
            debug!(text = %message.text, "no trigger for message");
            return Ok(());
        };

        let fmt = self.formatters.formatter(message.channel.as_deref());
        let bot_fmt = self.formatters.formatter(None);
        let mut context = Context::for_invocation(bot_fmt.locale(), &message.text);

        let lines = match self.run(trigger, &table.options, &mut context).await {
            Ok(lines) => lines
                .into_iter()
                .map(|line| match line {
                    OutputLine::Text(markup) => fmt.render(&markup),
                    OutputLine::Notice(notice) => fmt.translate(notice.message(), &[]),
                })
                .collect(),
            Err(e) => {
                warn!(trigger = %trigger.trigger, error = %e, "request failed");
                vec![e.line(fmt.as_ref())]
            },
        };

        let target = message.reply_target();
        for line in &lines {
            self.sender.send_message(target, line).await?;
        }
        Ok(())
    }

    async fn run(
        &self,
        trigger: &TriggerConfig,
        options: &NetworkOptions,
        context: &mut Context,
    ) -> Result<Vec<OutputLine>, PipelineError> {
        let descriptor = request::build(trigger, context, options)?;
        debug!(
            trigger = %trigger.trigger,
            method = %descriptor.method,
            url = %descriptor.url,
            "fetching"
        );
        let response = self.fetcher.fetch(&descriptor).await?;
        extract(&response, trigger, context)?;
        Ok(render_rows(trigger, context)?)
    }

    /// Answer a help request. `words` is `[module]` for help on the module
    /// or `[module, trigger]` for help on one command. Returns whether the
    /// request was handled.
    ///
    /// # Errors
    ///
    /// [`WebGetterError::Host`] if the answer cannot be sent.
    pub async fn help(&self, message: &TextMessage, words: &[&str]) -> WebGetterResult<bool> {
        let fmt = self.formatters.formatter(message.channel.as_deref());
        let table = self.snapshot();

        let answer = match words {
            [module] if module.eq_ignore_ascii_case(MODULE_NAME) => {
                let triggers: Vec<&str> = table
                    .config
                    .triggers
                    .iter()
                    .map(|t| t.trigger.as_str())
                    .collect();
                if triggers.is_empty() {
                    fmt.translate(NO_COMMANDS_HELP, &[])
                } else {
                    fmt.translate(MODULE_HELP, &[("triggers", triggers.join(", "))])
                }
            },
            [module, word] if module.eq_ignore_ascii_case(MODULE_NAME) => {
                let Some(trigger) = table.lookup(word) else {
                    return Ok(false);
                };
                let usage = trigger.help.as_deref().unwrap_or(GENERIC_USAGE);
                fmt.translate(usage, &[("trigger", trigger.trigger.clone())])
            },
            _ => return Ok(false),
        };

        self.sender
            .send_message(message.reply_target(), &answer)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use webgetter_core::{HostResult, PlainFormatter};

    use super::*;
    use crate::error::FetchResult;
    use crate::fetch::FetchedResponse;
    use crate::request::RequestDescriptor;

    #[derive(Default)]
    struct Registry {
        words: Mutex<HashSet<String>>,
    }

    impl TriggerRegistry for Registry {
        fn register_triggers(&self, trigger: &str, _scope: MatchScope) -> Option<TriggerToken> {
            let word = trigger.to_lowercase();
            self.words
                .lock()
                .unwrap()
                .insert(word.clone())
                .then(|| TriggerToken::new(word))
        }

        fn free_triggers(&self, token: &TriggerToken) -> bool {
            self.words.lock().unwrap().remove(token.as_str())
        }
    }

    #[derive(Default)]
    struct Sender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageSender for Sender {
        async fn send_message(&self, target: &str, text: &str) -> HostResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((target.to_owned(), text.to_owned()));
            Ok(())
        }
    }

    struct Formatters;

    impl FormatterProvider for Formatters {
        fn formatter(&self, _channel: Option<&str>) -> Arc<dyn Formatter> {
            Arc::new(PlainFormatter::default())
        }
    }

    struct Page(&'static str);

    #[async_trait]
    impl Fetcher for Page {
        async fn fetch(&self, request: &RequestDescriptor) -> FetchResult<FetchedResponse> {
            Ok(FetchedResponse::ok(
                request.url.clone(),
                Some("text/html"),
                self.0,
            ))
        }
    }

    fn module(page: &'static str) -> (WebGetter, Arc<Registry>, Arc<Sender>) {
        let registry = Arc::new(Registry::default());
        let sender = Arc::new(Sender::default());
        let module = WebGetter::new(registry.clone(), sender.clone(), Arc::new(Formatters))
            .with_fetcher(Arc::new(Page(page)));
        (module, registry, sender)
    }

    fn config(triggers: Vec<TriggerConfig>) -> ModuleConfig {
        ModuleConfig {
            triggers,
            ..ModuleConfig::default()
        }
    }

    fn weather() -> TriggerConfig {
        TriggerConfig::new(1, "Weather", "http://x/?c=$(0)", "$(vars.1) degrees")
            .with_var("//span[@class='t']")
    }

    fn sent(sender: &Sender) -> Vec<(String, String)> {
        sender.sent.lock().unwrap().clone()
    }

    #[test]
    fn test_matches_requires_arguments() {
        let (module, _, _) = module("");
        module.install(config(vec![weather()])).unwrap();
        assert!(module.matches("weather paris"));
        assert!(module.matches("WEATHER paris"));
        assert!(!module.matches("weather"));
        assert!(!module.matches("weather   "));
        assert!(!module.matches("forecast paris"));
    }

    #[test]
    fn test_install_registers_and_reinstall_keeps_words() {
        let (module, registry, _) = module("");
        module.install(config(vec![weather()])).unwrap();
        module.install(config(vec![weather()])).unwrap();
        assert_eq!(module.triggers(), vec!["Weather"]);
        assert!(registry.words.lock().unwrap().contains("weather"));
    }

    #[test]
    fn test_refused_trigger_keeps_previous_table() {
        let (module, registry, _) = module("");
        module.install(config(vec![weather()])).unwrap();
        registry.words.lock().unwrap().insert("taken".into());

        let next = config(vec![
            TriggerConfig::new(1, "tv", "http://x/", "f"),
            TriggerConfig::new(2, "taken", "http://x/", "f"),
        ]);
        let err = module.install(next).unwrap_err();
        assert!(matches!(err, WebGetterError::Registration { index: 2, ref trigger } if trigger == "taken"));

        assert_eq!(module.triggers(), vec!["Weather"]);
        let words = registry.words.lock().unwrap();
        assert!(words.contains("weather"));
        assert!(!words.contains("tv"));
    }

    #[test]
    fn test_unload_releases_everything() {
        let (module, registry, _) = module("");
        module.install(config(vec![weather()])).unwrap();
        module.unload();
        assert!(module.triggers().is_empty());
        assert!(registry.words.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handle_request_replies_in_channel() {
        let (module, _, sender) = module("<span class='t'>72F</span>");
        module.install(config(vec![weather()])).unwrap();

        let msg = TextMessage::channel("alice", "#chan", "weather paris");
        module.handle_request(&msg).await.unwrap();
        assert_eq!(
            sent(&sender),
            vec![("#chan".to_owned(), "72F degrees".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_handle_request_private_goes_to_sender() {
        let (module, _, sender) = module("<span class='t'>72F</span>");
        module.install(config(vec![weather()])).unwrap();

        module
            .handle_request(&TextMessage::private("alice", "WEATHER paris"))
            .await
            .unwrap();
        assert_eq!(sent(&sender)[0].0, "alice");
    }

    #[tokio::test]
    async fn test_unknown_word_is_ignored() {
        let (module, _, sender) = module("");
        module.install(config(vec![weather()])).unwrap();
        module
            .handle_request(&TextMessage::channel("a", "#c", "forecast paris"))
            .await
            .unwrap();
        assert!(sent(&sender).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_one_error_line() {
        let (module, _, sender) = module("");
        let trigger = TriggerConfig::new(1, "go", "$(0)", "f");
        module.install(config(vec![trigger])).unwrap();
        module
            .handle_request(&TextMessage::channel("a", "#c", "go nowhere"))
            .await
            .unwrap();

        let lines = sent(&sender);
        assert_eq!(lines.len(), 1);
        assert!(
            lines[0]
                .1
                .starts_with("An error occurred while retrieving the information (invalid URL")
        );
    }

    #[tokio::test]
    async fn test_help() {
        let (module, _, sender) = module("");
        module
            .install(config(vec![
                weather().with_help("<b>Usage:</b> <var name=\"trigger\"/> <u>city</u>"),
                TriggerConfig::new(2, "tv", "http://x/", "f"),
            ]))
            .unwrap();
        let msg = TextMessage::channel("a", "#c", "help");

        assert!(module.help(&msg, &["webgetter"]).await.unwrap());
        assert!(module.help(&msg, &["WebGetter", "weather"]).await.unwrap());
        assert!(module.help(&msg, &["webgetter", "tv"]).await.unwrap());
        assert!(!module.help(&msg, &["webgetter", "nope"]).await.unwrap());
        assert!(!module.help(&msg, &["other"]).await.unwrap());

        let lines: Vec<String> = sent(&sender).into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Weather, tv"));
        assert_eq!(lines[1], "\x02Usage:\x02 Weather \x1fcity\x1f");
        assert!(lines[2].contains("tv"));
    }
}
