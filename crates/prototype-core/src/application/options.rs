//! Per-invocation clone options.
//!
//! [`Options`] is immutable once built and cheap to clone; build it with
//! [`OptionsBuilder`] or from a serialisable [`OptionsConfig`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::hooks::{HookFn, HookTable};
use crate::application::ports::{DefaultTimeCodec, TimeCodec};
use crate::domain::{Ambient, BoxError, FullPath, Kind, Type, Value};

pub const DEFAULT_TAG_KEY: &str = "prototype";
pub const DEFAULT_CYCLE_THRESHOLD: usize = 1024;

/// Label equality used when matching fields and map keys.
pub type NameComparer = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

fn fold_equal(a: &str, b: &str) -> bool {
    a == b
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

#[derive(Clone)]
pub struct Options {
    pub(crate) source_tag_key: String,
    pub(crate) target_tag_key: String,
    pub(crate) getter_prefix: String,
    pub(crate) setter_prefix: String,
    pub(crate) context: Ambient,
    pub(crate) deep_clone: bool,
    pub(crate) hooks: HookTable,
    pub(crate) time_codec: Arc<dyn TimeCodec>,
    pub(crate) name_comparer: NameComparer,
    pub(crate) omit_empty: bool,
    pub(crate) interrupt_on_error: bool,
    pub(crate) cycle_threshold: usize,
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    pub fn source_tag_key(&self) -> &str {
        &self.source_tag_key
    }

    pub fn target_tag_key(&self) -> &str {
        &self.target_tag_key
    }

    pub fn getter_prefix(&self) -> &str {
        &self.getter_prefix
    }

    pub fn setter_prefix(&self) -> &str {
        &self.setter_prefix
    }

    pub fn context(&self) -> &Ambient {
        &self.context
    }

    pub fn deep_clone(&self) -> bool {
        self.deep_clone
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    pub fn time_codec(&self) -> &dyn TimeCodec {
        self.time_codec.as_ref()
    }

    pub fn omit_empty(&self) -> bool {
        self.omit_empty
    }

    pub fn interrupt_on_error(&self) -> bool {
        self.interrupt_on_error
    }

    pub fn cycle_threshold(&self) -> usize {
        self.cycle_threshold
    }

    pub fn names_match(&self, a: &str, b: &str) -> bool {
        (self.name_comparer)(a, b)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source_tag_key: DEFAULT_TAG_KEY.to_string(),
            target_tag_key: DEFAULT_TAG_KEY.to_string(),
            getter_prefix: String::new(),
            setter_prefix: String::new(),
            context: Arc::new(()),
            deep_clone: false,
            hooks: HookTable::default(),
            time_codec: Arc::new(DefaultTimeCodec),
            name_comparer: Arc::new(fold_equal),
            omit_empty: false,
            interrupt_on_error: true,
            cycle_threshold: DEFAULT_CYCLE_THRESHOLD,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("source_tag_key", &self.source_tag_key)
            .field("target_tag_key", &self.target_tag_key)
            .field("getter_prefix", &self.getter_prefix)
            .field("setter_prefix", &self.setter_prefix)
            .field("deep_clone", &self.deep_clone)
            .field("hooks", &self.hooks)
            .field("omit_empty", &self.omit_empty)
            .field("interrupt_on_error", &self.interrupt_on_error)
            .field("cycle_threshold", &self.cycle_threshold)
            .finish_non_exhaustive()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent construction of [`Options`].
///
/// ```rust
/// use prototype_core::application::Options;
///
/// let opts = Options::builder()
///     .tag_key("json")
///     .setter_prefix("Set")
///     .deep_clone(true)
///     .build();
/// assert_eq!(opts.target_tag_key(), "json");
/// ```
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from a configuration record.
    ///
    /// `time_format` is not interpreted here; the adapters crate maps it to
    /// a codec.
    pub fn from_config(config: &OptionsConfig) -> Self {
        let source = config.source_tag_key.as_deref().unwrap_or(&config.tag_key);
        let target = config.target_tag_key.as_deref().unwrap_or(&config.tag_key);
        Self::new()
            .source_tag_key(source)
            .target_tag_key(target)
            .getter_prefix(config.getter_prefix.as_str())
            .setter_prefix(config.setter_prefix.as_str())
            .deep_clone(config.deep_clone)
            .omit_empty(config.omit_empty)
            .interrupt_on_error(config.interrupt_on_error)
            .cycle_threshold(config.cycle_threshold)
    }

    /// Set both tag keys.
    pub fn tag_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.source_tag_key(key.clone()).target_tag_key(key)
    }

    pub fn source_tag_key(mut self, key: impl Into<String>) -> Self {
        self.options.source_tag_key = key.into();
        self
    }

    pub fn target_tag_key(mut self, key: impl Into<String>) -> Self {
        self.options.target_tag_key = key.into();
        self
    }

    pub fn getter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.getter_prefix = prefix.into();
        self
    }

    pub fn setter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.setter_prefix = prefix.into();
        self
    }

    /// Ambient value handed to context-taking getters and setters.
    pub fn context<C: std::any::Any + Send + Sync>(mut self, context: C) -> Self {
        self.options.context = Arc::new(context);
        self
    }

    /// Never reuse storage already present in the target.
    pub fn deep_clone(mut self, deep: bool) -> Self {
        self.options.deep_clone = deep;
        self
    }

    pub fn type_hook<F>(mut self, source: &Type, target: &Type, hook: F) -> Self
    where
        F: Fn(&FullPath, &mut Value, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.options.hooks.add_type(source, target, Arc::new(hook));
        self
    }

    pub fn kind_hook<F>(mut self, source: Kind, target: Kind, hook: F) -> Self
    where
        F: Fn(&FullPath, &mut Value, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.options.hooks.add_kind(source, target, Arc::new(hook));
        self
    }

    /// Matches when the source equals `source` and the current target value
    /// equals `target`.
    pub fn value_hook<F>(mut self, source: Value, target: Value, hook: F) -> Self
    where
        F: Fn(&FullPath, &mut Value, &Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let hook: HookFn = Arc::new(hook);
        self.options.hooks.add_value(source, target, hook);
        self
    }

    pub fn time_codec<C: TimeCodec + 'static>(self, codec: C) -> Self {
        self.shared_time_codec(Arc::new(codec))
    }

    pub fn shared_time_codec(mut self, codec: Arc<dyn TimeCodec>) -> Self {
        self.options.time_codec = codec;
        self
    }

    pub fn name_comparer<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.options.name_comparer = Arc::new(comparer);
        self
    }

    /// Honour the `omitempty` tag option.
    pub fn omit_empty(mut self, omit: bool) -> Self {
        self.options.omit_empty = omit;
        self
    }

    /// `false` switches to best-effort mode: errors are collected and
    /// independent branches keep going.
    pub fn interrupt_on_error(mut self, interrupt: bool) -> Self {
        self.options.interrupt_on_error = interrupt;
        self
    }

    /// Recursion depth past which shared nodes are tracked for cycles.
    pub fn cycle_threshold(mut self, depth: usize) -> Self {
        self.options.cycle_threshold = depth;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

/// Serialisable subset of [`Options`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsConfig {
    pub tag_key: String,
    pub source_tag_key: Option<String>,
    pub target_tag_key: Option<String>,
    pub getter_prefix: String,
    pub setter_prefix: String,
    pub deep_clone: bool,
    pub omit_empty: bool,
    pub interrupt_on_error: bool,
    pub cycle_threshold: usize,
    /// `rfc3339`, `unix`, `unix-millis`, `unix-nanos` or a chrono layout.
    pub time_format: String,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_string(),
            source_tag_key: None,
            target_tag_key: None,
            getter_prefix: String::new(),
            setter_prefix: String::new(),
            deep_clone: false,
            omit_empty: false,
            interrupt_on_error: true,
            cycle_threshold: DEFAULT_CYCLE_THRESHOLD,
            time_format: "rfc3339".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = Options::default();
        assert_eq!(opts.source_tag_key(), "prototype");
        assert_eq!(opts.target_tag_key(), "prototype");
        assert_eq!(opts.getter_prefix(), "");
        assert!(opts.interrupt_on_error());
        assert!(!opts.deep_clone());
        assert!(!opts.omit_empty());
        assert_eq!(opts.cycle_threshold(), 1024);
        assert!(opts.hooks().is_empty());
    }

    #[test]
    fn default_comparer_folds_case() {
        let opts = Options::default();
        assert!(opts.names_match("UserId", "userid"));
        assert!(opts.names_match("ÄB", "äb"));
        assert!(!opts.names_match("a", "b"));
        assert!(!opts.names_match("Name", "Names"));
        assert!(opts.names_match("ΣΊΣΥΦΟΣ", "σίσυφοσ"));
    }

    #[test]
    fn builder_sets_everything() {
        let opts = Options::builder()
            .tag_key("json")
            .source_tag_key("src")
            .getter_prefix("Get")
            .setter_prefix("Set")
            .context(String::from("ctx"))
            .kind_hook(Kind::Int, Kind::String, |_, _, _| Ok(()))
            .name_comparer(|a, b| a == b)
            .build();
        assert_eq!(opts.source_tag_key(), "src");
        assert_eq!(opts.target_tag_key(), "json");
        assert_eq!(opts.getter_prefix(), "Get");
        assert_eq!(opts.hooks().len(), 1);
        assert!(!opts.names_match("A", "a"));
        assert_eq!(
            opts.context().downcast_ref::<String>().map(String::as_str),
            Some("ctx")
        );
    }

    #[test]
    fn config_overrides_tag_keys_independently() {
        let config = OptionsConfig {
            tag_key: "json".into(),
            target_tag_key: Some("db".into()),
            interrupt_on_error: false,
            ..OptionsConfig::default()
        };
        let opts = OptionsBuilder::from_config(&config).build();
        assert_eq!(opts.source_tag_key(), "json");
        assert_eq!(opts.target_tag_key(), "db");
        assert!(!opts.interrupt_on_error());
    }
}
