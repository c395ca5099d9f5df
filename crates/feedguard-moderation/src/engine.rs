//! Moderation decision engine
//!
//! Each call runs `INIT -> TRY_MODEL -> {SUCCESS, RETRY, EXHAUSTED} -> RECONCILE`.
//! The remote model is asked for a JSON verdict; malformed output and
//! transport failures are retried with backoff, and when the model is
//! unavailable or the budget runs out the rules classifier decides alone.
//! Reconciliation always runs afterwards so the minor-safety override holds
//! no matter which path produced the verdict.

use feedguard_classifiers::{RuleReport, RulesClassifier};
use feedguard_core::json::extract_json_object;
use feedguard_core::{
    ClientProvider, Error, LabelTag, Labels, ModerationConfig, ModerationRequest,
    ModerationVerdict, PromptClass, PromptVerdict, Result,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::prompt;
use crate::retry::{RetryOutcome, RetryPolicy};

/// Guidance shown when a verdict carries no usable message
pub const DEFAULT_USER_MESSAGE: &str =
    "Your content may violate our guidelines. Please review and edit.";

const NO_KEY_MESSAGE: &str = "We couldn’t fully check your content due to missing API key. Based on rules, please revise if flagged.";
const FORCED_RULES_MESSAGE: &str =
    "Your content was checked by automated rules only. Please revise if flagged.";
const HIGH_LOAD_MESSAGE: &str = "We couldn’t fully check your content due to high load. Based on rules, please revise if flagged.";
const RULES_ALLOW_REASON: &str = "Rules-only: no violations detected.";
const RULES_BLOCK_REASON: &str = "Rules-only: potential violation.";
const MINOR_OVERRIDE_REASON: &str = "Sexual content involving minors is never allowed.";
const FORCED_RULES_REASON: &str = "rules-only mode forced";
const EMPTY_PROMPT_REASON: &str = "Prompt is empty or whitespace";

/// Why the model path was skipped or abandoned
enum Fallback {
    Unavailable { reason: String, forced: bool },
    Exhausted { error: String },
}

impl Fallback {
    fn user_message(&self) -> &'static str {
        match self {
            Self::Unavailable { forced: true, .. } => FORCED_RULES_MESSAGE,
            Self::Unavailable { forced: false, .. } => NO_KEY_MESSAGE,
            Self::Exhausted { .. } => HIGH_LOAD_MESSAGE,
        }
    }

    fn error(self) -> String {
        match self {
            Self::Unavailable { reason, .. } => reason,
            Self::Exhausted { error } => error,
        }
    }
}

/// Fields read from a model response after repair
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    pub safe: bool,
    pub labels: Labels,
    pub allow_reason: String,
    pub block_reason: String,
    pub message_to_user: String,
}

impl ModelVerdict {
    /// Parse and repair a raw model answer.
    ///
    /// `safe` must be a boolean. A missing or non-array `labels` becomes
    /// empty and unknown label names are dropped. A missing or non-string
    /// `message_to_user` becomes the default guidance.
    pub fn parse(raw: &str) -> Result<Self> {
        let object = extract_json_object(raw)?;
        let safe = object
            .get("safe")
            .and_then(Value::as_bool)
            .ok_or_else(|| Error::schema("missing boolean 'safe'"))?;

        let labels = match object.get("labels") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|name| match name.parse::<LabelTag>() {
                    Ok(label) => Some(label),
                    Err(_) => {
                        debug!(label = %name, "Dropping unknown model label");
                        None
                    }
                })
                .collect(),
            _ => Labels::new(),
        };

        let mut message_to_user = match object.get("message_to_user") {
            Some(Value::String(message)) => message.trim().to_string(),
            _ => DEFAULT_USER_MESSAGE.to_string(),
        };
        let block_reason = string_field(&object, "block_reason");
        if !safe && message_to_user.is_empty() && block_reason.is_empty() {
            message_to_user = DEFAULT_USER_MESSAGE.to_string();
        }

        Ok(Self {
            safe,
            labels,
            allow_reason: string_field(&object, "allow_reason"),
            block_reason,
            message_to_user,
        })
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Hybrid model-plus-rules moderator
pub struct Moderator {
    provider: Arc<ClientProvider>,
    rules: RulesClassifier,
    retry: RetryPolicy,
    force_rules_only: bool,
}

impl Moderator {
    /// Create a moderator sharing `provider` with other engines
    pub fn new(provider: Arc<ClientProvider>, config: &ModerationConfig) -> Result<Self> {
        Ok(Self {
            provider,
            rules: RulesClassifier::new()?,
            retry: RetryPolicy::from_config(config),
            force_rules_only: config.force_rules_only,
        })
    }

    /// Moderate post text with optional extra links.
    ///
    /// `allow_mild_profanity` is accepted for API stability; it does not
    /// currently change any decision.
    pub async fn moderate_post_text(
        &self,
        text: &str,
        source_links: &[String],
        allow_mild_profanity: bool,
    ) -> ModerationVerdict {
        let request = ModerationRequest::new(text, source_links, allow_mild_profanity);
        self.moderate_post(&request).await
    }

    /// Moderate one post. Never fails; degraded verdicts carry
    /// `fallback_used` and `error`.
    pub async fn moderate_post(&self, request: &ModerationRequest) -> ModerationVerdict {
        if request.is_blank() {
            metrics::counter!("feedguard_moderation_total", "path" => "empty").increment(1);
            return ModerationVerdict::empty_post();
        }

        let report = self.rules.evaluate(&request.text, &request.links);

        let verdict = match self.model_verdict(request).await {
            Ok(model) => {
                metrics::counter!("feedguard_moderation_total", "path" => "model").increment(1);
                ModerationVerdict {
                    safe: model.safe,
                    labels: model.labels,
                    allow_reason: model.allow_reason,
                    block_reason: model.block_reason,
                    message_to_user: model.message_to_user,
                    links: request.links.clone(),
                    fallback_used: false,
                    error: None,
                }
            }
            Err(fallback) => {
                metrics::counter!("feedguard_moderation_total", "path" => "rules").increment(1);
                rules_verdict(&report, &request.links, fallback)
            }
        };

        self.reconcile(verdict, &report, &request.text)
    }

    /// Gate an image-generation prompt as SAFE or UNSAFE
    pub async fn is_prompt_safe(&self, prompt: &str) -> PromptVerdict {
        if prompt.trim().is_empty() {
            return PromptVerdict {
                reason: Some(EMPTY_PROMPT_REASON.to_string()),
                ..PromptVerdict::from_class(PromptClass::Unsafe)
            };
        }

        if let Err(fallback) = self.check_available() {
            return self.rules_prompt_verdict(prompt, fallback.error());
        }

        let messages = prompt::prompt_gate_messages(prompt);
        let outcome = self
            .with_model(|model| {
                let messages = &messages;
                async move {
                    let raw = model.complete(messages).await?;
                    PromptClass::parse_answer(&raw)
                        .ok_or_else(|| Error::schema(format!("unexpected output: {}", raw.trim())))
                }
            })
            .await;

        match outcome {
            RetryOutcome::Success { value, .. } => PromptVerdict::from_class(value),
            RetryOutcome::Exhausted { last_error, .. } => {
                self.rules_prompt_verdict(prompt, describe(last_error))
            }
        }
    }

    async fn model_verdict(&self, request: &ModerationRequest) -> std::result::Result<ModelVerdict, Fallback> {
        self.check_available()?;

        let messages = prompt::post_messages(&request.text, &request.links);
        let outcome = self
            .with_model(|model| {
                let messages = &messages;
                async move {
                    let raw = model.complete(messages).await?;
                    ModelVerdict::parse(&raw)
                }
            })
            .await;

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                debug!(attempts, safe = value.safe, "Model verdict received");
                Ok(value)
            }
            RetryOutcome::Exhausted { last_error, attempts } => {
                let error = describe(last_error);
                warn!(attempts, error = %error, "Moderation model exhausted retries, using rules");
                Err(Fallback::Exhausted { error })
            }
        }
    }

    fn check_available(&self) -> std::result::Result<(), Fallback> {
        if self.force_rules_only {
            return Err(Fallback::Unavailable {
                reason: FORCED_RULES_REASON.to_string(),
                forced: true,
            });
        }
        if self.provider.get().is_none() {
            let reason = match self.provider.unavailable_reason() {
                "" => "LLM client could not be created".to_string(),
                reason => reason.to_string(),
            };
            debug!(reason = %reason, "Remote model unavailable, using rules");
            return Err(Fallback::Unavailable { reason, forced: false });
        }
        Ok(())
    }

    /// Run `call` against the shared client under the retry policy,
    /// recreating the client after every failure.
    async fn with_model<T, F, Fut>(&self, call: F) -> RetryOutcome<T>
    where
        F: Fn(Arc<dyn feedguard_core::ChatModel>) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let provider = &self.provider;
        let call = &call;
        self.retry
            .run(
                |_| async move {
                    let model = provider
                        .get()
                        .ok_or_else(|| Error::config("remote model client unavailable"))?;
                    call(model).await
                },
                |error, attempt| {
                    warn!(attempt = attempt + 1, error = %error, "Remote model call failed");
                    metrics::counter!("feedguard_moderation_retries_total").increment(1);
                    provider.recreate();
                },
            )
            .await
    }

    fn rules_prompt_verdict(&self, prompt: &str, error: String) -> PromptVerdict {
        let class = if self.rules.prompt_is_unsafe(prompt) {
            PromptClass::Unsafe
        } else {
            PromptClass::Safe
        };
        PromptVerdict {
            fallback_used: true,
            error: Some(error),
            ..PromptVerdict::from_class(class)
        }
    }

    /// Apply the minor-safety hard override on top of any verdict
    fn reconcile(
        &self,
        mut verdict: ModerationVerdict,
        report: &RuleReport,
        text: &str,
    ) -> ModerationVerdict {
        if !self.rules.requires_minor_override(&report.labels, text) {
            return verdict;
        }

        if verdict.safe {
            warn!("Overriding model verdict: sexual content involving minors");
        }
        metrics::counter!("feedguard_hard_override_total").increment(1);

        verdict.safe = false;
        verdict.labels.insert(LabelTag::SexualMinors);
        if verdict.block_reason.is_empty() {
            verdict.block_reason = MINOR_OVERRIDE_REASON.to_string();
        }
        if verdict.message_to_user.is_empty() {
            verdict.message_to_user = DEFAULT_USER_MESSAGE.to_string();
        }
        verdict
    }
}

fn rules_verdict(report: &RuleReport, links: &[String], fallback: Fallback) -> ModerationVerdict {
    let safe = report.safe;
    ModerationVerdict {
        safe,
        labels: report.labels.clone(),
        allow_reason: if safe { RULES_ALLOW_REASON.to_string() } else { String::new() },
        block_reason: if safe { String::new() } else { RULES_BLOCK_REASON.to_string() },
        message_to_user: fallback.user_message().to_string(),
        links: links.to_vec(),
        fallback_used: true,
        error: Some(fallback.error()),
    }
}

fn describe(error: Option<Error>) -> String {
    error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "no model attempt was made".to_string())
}
