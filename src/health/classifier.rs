//! Upstream error classification.
//!
//! # Rule Order
//! ```text
//! guards:   flag off / success / local error  → NoAction
//! status:   401, 403 (allow-listed families)   → Disable
//! code:     invalid_api_key, ...               → Disable
//! type:     insufficient_quota, ...            → Disable
//! message:  case-sensitive substring phrases   → Disable
//! default:                                     → NoAction
//! ```
//!
//! Rules are evaluated top to bottom and the first match decides, so a
//! higher-confidence rule always wins over free-text heuristics further
//! down. The table is plain data; supporting another vendor dialect means
//! adding rows, not branches.

use serde::Serialize;

use crate::channel::ChannelType;
use crate::config::ChannelHealthConfig;
use crate::health::outcome::{UpstreamError, UpstreamOutcome};

/// What the lifecycle controller should do with a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    NoAction,
    Disable { reason: String },
    Enable,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::NoAction => "no_action",
            Decision::Disable { .. } => "disable",
            Decision::Enable => "enable",
        }
    }
}

/// Condition a rule checks against a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// HTTP status equals the value, for any channel type.
    Status(u16),
    /// HTTP status equals the value and the channel type is allow-listed
    /// in `ChannelHealthConfig::forbidden_disables`.
    StatusForChannelTypes(u16),
    /// Vendor error code equals the value.
    Code(&'static str),
    /// Vendor error type equals the value.
    ErrorType(&'static str),
    /// Vendor message contains the value (case-sensitive).
    MessageContains(&'static str),
}

impl Predicate {
    fn matches(&self, channel_type: ChannelType, allow_list: &[ChannelType], err: &UpstreamError) -> bool {
        match *self {
            Predicate::Status(status) => err.status_code == status,
            Predicate::StatusForChannelTypes(status) => {
                err.status_code == status && allow_list.contains(&channel_type)
            }
            Predicate::Code(code) => err.code.as_deref() == Some(code),
            Predicate::ErrorType(error_type) => err.error_type.as_deref() == Some(error_type),
            Predicate::MessageContains(phrase) => err
                .message
                .as_deref()
                .is_some_and(|message| message.contains(phrase)),
        }
    }

    fn pattern(&self) -> String {
        match *self {
            Predicate::Status(status) | Predicate::StatusForChannelTypes(status) => status.to_string(),
            Predicate::Code(s) | Predicate::ErrorType(s) | Predicate::MessageContains(s) => s.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Disable,
    Keep,
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub predicate: Predicate,
    pub verdict: Verdict,
    /// Template with `{status}`, `{code}`, `{type}`, `{message}`, `{pattern}`.
    pub reason: &'static str,
}

impl Rule {
    const fn disable(predicate: Predicate, reason: &'static str) -> Self {
        Self {
            predicate,
            verdict: Verdict::Disable,
            reason,
        }
    }

    /// Fill the reason template. Without a message the `": {message}"`
    /// tail is dropped.
    fn render(&self, err: &UpstreamError) -> String {
        let message = err.message.as_deref().map(str::trim).filter(|m| !m.is_empty());
        let template = match message {
            Some(_) => self.reason.to_string(),
            None => self.reason.replace(": {message}", ""),
        };
        template
            .replace("{status}", &err.status_code.to_string())
            .replace("{code}", err.code.as_deref().unwrap_or(""))
            .replace("{type}", err.error_type.as_deref().unwrap_or(""))
            .replace("{message}", message.unwrap_or(""))
            .replace("{pattern}", &self.predicate.pattern())
    }
}

const MESSAGE_REASON: &str = "upstream message matched \"{pattern}\": {message}";

/// Default classification table, highest confidence first.
pub const DEFAULT_RULES: &[Rule] = &[
    Rule::disable(Predicate::Status(401), "upstream rejected credentials (HTTP {status}): {message}"),
    Rule::disable(
        Predicate::StatusForChannelTypes(403),
        "upstream refused the request (HTTP {status}): {message}",
    ),
    Rule::disable(Predicate::Code("invalid_api_key"), "vendor error code {code}: {message}"),
    Rule::disable(Predicate::Code("account_deactivated"), "vendor error code {code}: {message}"),
    Rule::disable(Predicate::Code("billing_not_active"), "vendor error code {code}: {message}"),
    Rule::disable(Predicate::ErrorType("insufficient_quota"), "vendor error type {type}: {message}"),
    Rule::disable(Predicate::ErrorType("authentication_error"), "vendor error type {type}: {message}"),
    Rule::disable(Predicate::ErrorType("permission_error"), "vendor error type {type}: {message}"),
    Rule::disable(Predicate::ErrorType("forbidden"), "vendor error type {type}: {message}"),
    Rule::disable(Predicate::MessageContains("Your credit balance is too low"), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("This organization has been disabled."), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("You exceeded your current quota"), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("Permission denied"), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("credit"), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("balance"), MESSAGE_REASON),
    Rule::disable(Predicate::MessageContains("Access denied"), MESSAGE_REASON),
];

/// Maps upstream outcomes to channel decisions.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<Rule>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl ErrorClassifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Decide whether an outcome should auto-disable a channel.
    ///
    /// Never fails: anything ambiguous is `NoAction`.
    pub fn classify_disable(
        &self,
        policy: &ChannelHealthConfig,
        channel_type: ChannelType,
        outcome: &UpstreamOutcome,
    ) -> Decision {
        if !policy.automatic_disable {
            return Decision::NoAction;
        }
        let Some(err) = outcome.error() else {
            return Decision::NoAction;
        };
        if err.local {
            return Decision::NoAction;
        }

        let matched = self
            .rules
            .iter()
            .find(|rule| rule.predicate.matches(channel_type, &policy.forbidden_disables, err));

        match matched {
            Some(rule) if rule.verdict == Verdict::Disable => Decision::Disable {
                reason: rule.render(err),
            },
            _ => Decision::NoAction,
        }
    }

    /// Boolean form of [`classify_disable`](Self::classify_disable).
    pub fn should_disable(
        &self,
        policy: &ChannelHealthConfig,
        channel_type: ChannelType,
        outcome: &UpstreamOutcome,
    ) -> bool {
        matches!(
            self.classify_disable(policy, channel_type, outcome),
            Decision::Disable { .. }
        )
    }

    /// Decide whether an outcome is clean enough to re-enable a channel.
    pub fn classify_enable(&self, policy: &ChannelHealthConfig, outcome: &UpstreamOutcome) -> Decision {
        if policy.automatic_enable && outcome.is_success() {
            Decision::Enable
        } else {
            Decision::NoAction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [ChannelType; 6] = [
        ChannelType::OpenAi,
        ChannelType::Azure,
        ChannelType::Anthropic,
        ChannelType::Gemini,
        ChannelType::Mistral,
        ChannelType::Generic,
    ];

    fn policy(automatic_disable: bool) -> ChannelHealthConfig {
        ChannelHealthConfig {
            automatic_disable,
            automatic_enable: true,
            ..ChannelHealthConfig::default()
        }
    }

    /// A spread of failures touching every rule family.
    fn sample_errors() -> Vec<UpstreamError> {
        vec![
            UpstreamError::status(401),
            UpstreamError::status(403),
            UpstreamError::status(500).with_message("temporary overload"),
            UpstreamError::status(400).with_code("invalid_api_key"),
            UpstreamError::status(429).with_type("insufficient_quota"),
            UpstreamError::status(400).with_message("Your credit balance is too low"),
            UpstreamError::status(403).with_message("Access denied"),
            UpstreamError::status(401)
                .with_code("account_deactivated")
                .with_type("authentication_error")
                .with_message("This organization has been disabled."),
        ]
    }

    fn failure(err: UpstreamError) -> UpstreamOutcome {
        UpstreamOutcome::Failure(err)
    }

    #[test]
    fn test_local_errors_never_disable() {
        let classifier = ErrorClassifier::default();
        for mut err in sample_errors() {
            err.local = true;
            for channel_type in ALL_TYPES {
                assert!(
                    !classifier.should_disable(&policy(true), channel_type, &failure(err.clone())),
                    "local error disabled channel: {:?}",
                    err
                );
            }
        }
    }

    #[test]
    fn test_unauthorized_always_disables() {
        let classifier = ErrorClassifier::default();
        let messages = [None, Some("temporary overload"), Some("retry later")];
        for channel_type in ALL_TYPES {
            for message in messages {
                let mut err = UpstreamError::status(401);
                err.message = message.map(str::to_string);
                assert!(classifier.should_disable(&policy(true), channel_type, &failure(err)));
            }
        }
    }

    #[test]
    fn test_fatal_vendor_codes_disable() {
        let classifier = ErrorClassifier::default();
        for code in ["invalid_api_key", "account_deactivated", "billing_not_active"] {
            for status in [400, 402, 429, 500] {
                let err = UpstreamError::status(status).with_code(code);
                assert!(classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err)));
            }
        }
    }

    #[test]
    fn test_fatal_vendor_types_disable() {
        let classifier = ErrorClassifier::default();
        for error_type in ["insufficient_quota", "authentication_error", "permission_error", "forbidden"] {
            let err = UpstreamError::status(400).with_type(error_type);
            let decision = classifier.classify_disable(&policy(true), ChannelType::Anthropic, &failure(err));
            assert!(matches!(decision, Decision::Disable { ref reason } if reason.contains(error_type)));
        }
    }

    #[test]
    fn test_disabled_flag_blocks_everything() {
        let classifier = ErrorClassifier::default();
        for err in sample_errors() {
            for channel_type in ALL_TYPES {
                assert_eq!(
                    classifier.classify_disable(&policy(false), channel_type, &failure(err.clone())),
                    Decision::NoAction
                );
            }
        }
    }

    #[test]
    fn test_success_never_disables() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify_disable(&policy(true), ChannelType::Gemini, &UpstreamOutcome::Success),
            Decision::NoAction
        );
    }

    #[test]
    fn test_forbidden_depends_on_allow_list() {
        let classifier = ErrorClassifier::default();
        let err = UpstreamError::status(403).with_message("quota check failed");

        assert!(classifier.should_disable(&policy(true), ChannelType::Gemini, &failure(err.clone())));
        assert!(!classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err.clone())));

        let mut widened = policy(true);
        widened.forbidden_disables.push(ChannelType::OpenAi);
        assert!(classifier.should_disable(&widened, ChannelType::OpenAi, &failure(err.clone())));

        let mut emptied = policy(true);
        emptied.forbidden_disables.clear();
        assert!(!classifier.should_disable(&emptied, ChannelType::Gemini, &failure(err)));
    }

    #[test]
    fn test_access_denied_message_on_generic_provider() {
        let classifier = ErrorClassifier::default();
        let err = UpstreamError::status(403).with_message("Access denied");
        let decision = classifier.classify_disable(&policy(true), ChannelType::Generic, &failure(err));
        assert_eq!(
            decision,
            Decision::Disable {
                reason: "upstream message matched \"Access denied\": Access denied".into()
            }
        );
    }

    #[test]
    fn test_transient_failure_is_kept() {
        let classifier = ErrorClassifier::default();
        let err = UpstreamError::status(500).with_message("temporary overload");
        assert_eq!(
            classifier.classify_disable(&policy(true), ChannelType::Generic, &failure(err)),
            Decision::NoAction
        );
    }

    #[test]
    fn test_message_match_is_case_sensitive() {
        let classifier = ErrorClassifier::default();
        for message in ["access denied", "PERMISSION DENIED", "Credit limit"] {
            let err = UpstreamError::status(400).with_message(message);
            assert!(
                !classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err)),
                "matched {:?}",
                message
            );
        }
        let err = UpstreamError::status(400).with_message("insufficient account balance");
        assert!(classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err)));
    }

    #[test]
    fn test_higher_confidence_rule_wins() {
        let classifier = ErrorClassifier::default();

        // Status rule reports the status, even though the message would also match.
        let err = UpstreamError::status(401).with_message("Your credit balance is too low");
        let decision = classifier.classify_disable(&policy(true), ChannelType::Anthropic, &failure(err));
        assert_eq!(
            decision,
            Decision::Disable {
                reason: "upstream rejected credentials (HTTP 401): Your credit balance is too low".into()
            }
        );

        // Structured code wins over a reassuring message.
        let err = UpstreamError::status(400)
            .with_code("billing_not_active")
            .with_message("temporary overload, please retry");
        let decision = classifier.classify_disable(&policy(true), ChannelType::OpenAi, &failure(err));
        assert_eq!(
            decision,
            Decision::Disable {
                reason: "vendor error code billing_not_active: temporary overload, please retry".into()
            }
        );
    }

    #[test]
    fn test_reason_without_message() {
        let classifier = ErrorClassifier::default();

        let decision =
            classifier.classify_disable(&policy(true), ChannelType::OpenAi, &failure(UpstreamError::status(401)));
        assert_eq!(
            decision,
            Decision::Disable {
                reason: "upstream rejected credentials (HTTP 401)".into()
            }
        );

        let err = UpstreamError::status(400).with_type("insufficient_quota").with_message("  ");
        let decision = classifier.classify_disable(&policy(true), ChannelType::OpenAi, &failure(err));
        assert_eq!(
            decision,
            Decision::Disable {
                reason: "vendor error type insufficient_quota".into()
            }
        );
    }

    #[test]
    fn test_keep_rule_short_circuits() {
        let mut rules = vec![Rule {
            predicate: Predicate::MessageContains("maintenance"),
            verdict: Verdict::Keep,
            reason: "",
        }];
        rules.extend_from_slice(DEFAULT_RULES);
        let classifier = ErrorClassifier::new(rules);

        let err = UpstreamError::status(400).with_message("balance service under maintenance");
        assert!(!classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err)));

        // Everything else still falls through to the default table.
        let err = UpstreamError::status(401);
        assert!(classifier.should_disable(&policy(true), ChannelType::OpenAi, &failure(err)));
    }

    #[test]
    fn test_classify_enable() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify_enable(&policy(true), &UpstreamOutcome::Success),
            Decision::Enable
        );

        let mut off = policy(true);
        off.automatic_enable = false;
        assert_eq!(classifier.classify_enable(&off, &UpstreamOutcome::Success), Decision::NoAction);

        let err = failure(UpstreamError::status(500));
        assert_eq!(classifier.classify_enable(&policy(true), &err), Decision::NoAction);
    }
}
