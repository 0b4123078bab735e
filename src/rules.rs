//! Rule tables driving action classification and parameter extraction.
//!
//! A rule table is plain configuration data. [`RuleSpec`] is the serializable
//! form (YAML on disk), [`RuleTable`] the compiled form used by the pipeline.
//! The built-in table is compiled once per process and shared read-only.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Upper bound on the default parameters an action label may declare.
pub const MAX_DEFAULT_PARAMS: usize = 2;

/// Closed taxonomy of canonical action labels.
///
/// `RouteServiceRequest` and `ReturnValidationResult` double as the fallback
/// labels for unmatched action and result text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionLabel {
    AuthenticateEndpoint,
    AuthorizeAccessRequest,
    NegotiateCapability,
    IssueSessionToken,
    ValidatePolicyRule,
    RegisterDigitalTwin,
    CollectTelemetrySample,
    CorrelateSensorState,
    GenerateTrainingScenario,
    PublishPolicyUpdate,
    RetrieveTwinState,
    SignControlMessage,
    VerifySignature,
    EncryptPayload,
    DecryptPayload,
    RouteServiceRequest,
    SynchronizeStateVector,
    DetectAnomalyEvent,
    TriggerSafetyAlert,
    ReturnValidationResult,
}

impl ActionLabel {
    pub const ALL: [ActionLabel; 20] = [
        ActionLabel::AuthenticateEndpoint,
        ActionLabel::AuthorizeAccessRequest,
        ActionLabel::NegotiateCapability,
        ActionLabel::IssueSessionToken,
        ActionLabel::ValidatePolicyRule,
        ActionLabel::RegisterDigitalTwin,
        ActionLabel::CollectTelemetrySample,
        ActionLabel::CorrelateSensorState,
        ActionLabel::GenerateTrainingScenario,
        ActionLabel::PublishPolicyUpdate,
        ActionLabel::RetrieveTwinState,
        ActionLabel::SignControlMessage,
        ActionLabel::VerifySignature,
        ActionLabel::EncryptPayload,
        ActionLabel::DecryptPayload,
        ActionLabel::RouteServiceRequest,
        ActionLabel::SynchronizeStateVector,
        ActionLabel::DetectAnomalyEvent,
        ActionLabel::TriggerSafetyAlert,
        ActionLabel::ReturnValidationResult,
    ];

    /// Label used when no action rule matches.
    pub fn fallback(is_result: bool) -> Self {
        if is_result {
            ActionLabel::ReturnValidationResult
        } else {
            ActionLabel::RouteServiceRequest
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionLabel::AuthenticateEndpoint => "AuthenticateEndpoint",
            ActionLabel::AuthorizeAccessRequest => "AuthorizeAccessRequest",
            ActionLabel::NegotiateCapability => "NegotiateCapability",
            ActionLabel::IssueSessionToken => "IssueSessionToken",
            ActionLabel::ValidatePolicyRule => "ValidatePolicyRule",
            ActionLabel::RegisterDigitalTwin => "RegisterDigitalTwin",
            ActionLabel::CollectTelemetrySample => "CollectTelemetrySample",
            ActionLabel::CorrelateSensorState => "CorrelateSensorState",
            ActionLabel::GenerateTrainingScenario => "GenerateTrainingScenario",
            ActionLabel::PublishPolicyUpdate => "PublishPolicyUpdate",
            ActionLabel::RetrieveTwinState => "RetrieveTwinState",
            ActionLabel::SignControlMessage => "SignControlMessage",
            ActionLabel::VerifySignature => "VerifySignature",
            ActionLabel::EncryptPayload => "EncryptPayload",
            ActionLabel::DecryptPayload => "DecryptPayload",
            ActionLabel::RouteServiceRequest => "RouteServiceRequest",
            ActionLabel::SynchronizeStateVector => "SynchronizeStateVector",
            ActionLabel::DetectAnomalyEvent => "DetectAnomalyEvent",
            ActionLabel::TriggerSafetyAlert => "TriggerSafetyAlert",
            ActionLabel::ReturnValidationResult => "ReturnValidationResult",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern `{pattern}` for {label}: {source}")]
    InvalidPattern {
        pattern: String,
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule for {label} has an empty pattern")]
    EmptyPattern { label: String },

    #[error("info rule `{pattern}` has an empty parameter label")]
    EmptyLabel { pattern: String },

    #[error("{label} declares {count} default parameters, at most {max} are allowed")]
    TooManyDefaults {
        label: ActionLabel,
        count: usize,
        max: usize,
    },

    #[error("{label} declares an empty default parameter list")]
    EmptyDefaults { label: ActionLabel },

    #[error("failed to read rule table {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule table: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One `(pattern, label)` entry of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry<L> {
    pub pattern: String,
    pub label: L,
}

/// Serializable rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub action_rules: Vec<RuleEntry<ActionLabel>>,
    pub info_rules: Vec<RuleEntry<String>>,
    #[serde(default)]
    pub action_defaults: BTreeMap<ActionLabel, Vec<String>>,
}

const BUILTIN_ACTION_RULES: &[(&str, ActionLabel)] = &[
    ("(로그인|접속|인증|auth|login)", ActionLabel::AuthenticateEndpoint),
    ("(권한|인가|authorize|permission)", ActionLabel::AuthorizeAccessRequest),
    ("(역량|능력|capability|협상|negotiat)", ActionLabel::NegotiateCapability),
    ("(토큰|세션|issue token|session)", ActionLabel::IssueSessionToken),
    ("(정책|policy|rule)", ActionLabel::ValidatePolicyRule),
    ("(등록|register|digital twin)", ActionLabel::RegisterDigitalTwin),
    ("(수집|collect|telemetry)", ActionLabel::CollectTelemetrySample),
    ("(상태|state|correlat)", ActionLabel::CorrelateSensorState),
    ("(시나리오|scenario|학습|training)", ActionLabel::GenerateTrainingScenario),
    ("(배포|publish|update policy)", ActionLabel::PublishPolicyUpdate),
    ("(조회|retrieve|snapshot)", ActionLabel::RetrieveTwinState),
    ("(서명|sign)", ActionLabel::SignControlMessage),
    ("(검증|verify signature|signature)", ActionLabel::VerifySignature),
    ("(암호|encrypt)", ActionLabel::EncryptPayload),
    ("(복호|decrypt)", ActionLabel::DecryptPayload),
    ("(요청|route|forward)", ActionLabel::RouteServiceRequest),
    ("(동기화|sync|state vector)", ActionLabel::SynchronizeStateVector),
    ("(이상|anomaly|detect)", ActionLabel::DetectAnomalyEvent),
    ("(알림|경보|alert|notify)", ActionLabel::TriggerSafetyAlert),
    ("(결과|validation result|return)", ActionLabel::ReturnValidationResult),
];

const BUILTIN_INFO_RULES: &[(&str, &str)] = &[
    ("(역량|능력|capability)", "CapabilitySet"),
    ("(토큰|token)", "SessionToken"),
    ("(사용자.?id|user.?id|계정.?id)", "UserId"),
    ("(장치.?id|device.?id|단말.?id)", "DeviceId"),
    ("(트윈.?id|twin.?id)", "TwinId"),
    ("(세션.?id|session.?id)", "SessionId"),
    ("(정책|policy|rule)", "PolicyRule"),
    ("(자격증명|credential|password|otp)", "EndpointCredential"),
    ("(접근요청|access request|authorization request)", "AccessRequest"),
    ("(트윈 등록|twin registration)", "TwinRegistration"),
    ("(텔레메트리|telemetry)", "TelemetrySample"),
    ("(상태벡터|state vector|sensor state)", "SensorStateVector"),
    ("(센서|sensor)", "SensorData"),
    ("(위치|position|location)", "PositionData"),
    ("(속도|velocity|speed)", "VelocityData"),
    ("(가속도|acceleration)", "AccelerationData"),
    ("(시나리오|scenario|training spec)", "TrainingScenarioSpec"),
    ("(정책 업데이트|policy update)", "PolicyUpdateNotice"),
    ("(스냅샷|snapshot|twin state)", "TwinStateSnapshot"),
    ("(서명 메시지|signed control)", "SignedControlMessage"),
    ("(서명검증|signature proof|verify)", "SignatureProof"),
    ("(암호문|encrypted)", "EncryptedPayload"),
    ("(복호문|decrypted)", "DecryptedPayload"),
    ("(서비스 요청|service request)", "ServiceRequest"),
    ("(동기화 상태|state vector)", "StateVector"),
    ("(이상 이벤트|anomaly)", "AnomalyEvent"),
    ("(안전 경보|safety alert|alert)", "SafetyAlert"),
    ("(검증 결과|validation result|result)", "ValidationResult"),
    ("(임계값|threshold)", "ThresholdConfig"),
    ("(모델|model)", "ModelArtifact"),
    ("(학습 데이터|training data|dataset)", "TrainingDataset"),
    ("(감사 로그|audit log)", "AuditLogEntry"),
];

const BUILTIN_ACTION_DEFAULTS: &[(ActionLabel, [&str; 2])] = &[
    (ActionLabel::AuthenticateEndpoint, ["EndpointCredential", "SessionToken"]),
    (ActionLabel::AuthorizeAccessRequest, ["AccessRequest", "PolicyRule"]),
    (ActionLabel::NegotiateCapability, ["CapabilitySet", "PolicyRule"]),
    (ActionLabel::IssueSessionToken, ["SessionToken", "SessionId"]),
    (ActionLabel::ValidatePolicyRule, ["PolicyRule", "ValidationResult"]),
    (ActionLabel::RegisterDigitalTwin, ["TwinRegistration", "TwinId"]),
    (ActionLabel::CollectTelemetrySample, ["TelemetrySample", "SensorData"]),
    (ActionLabel::CorrelateSensorState, ["SensorStateVector", "TwinStateSnapshot"]),
    (ActionLabel::GenerateTrainingScenario, ["TrainingScenarioSpec", "TrainingDataset"]),
    (ActionLabel::PublishPolicyUpdate, ["PolicyUpdateNotice", "PolicyRule"]),
    (ActionLabel::RetrieveTwinState, ["TwinId", "TwinStateSnapshot"]),
    (ActionLabel::SignControlMessage, ["SignedControlMessage", "SignatureProof"]),
    (ActionLabel::VerifySignature, ["SignatureProof", "ValidationResult"]),
    (ActionLabel::EncryptPayload, ["EncryptedPayload", "ServiceRequest"]),
    (ActionLabel::DecryptPayload, ["DecryptedPayload", "ServiceRequest"]),
    (ActionLabel::RouteServiceRequest, ["ServiceRequest", "PolicyRule"]),
    (ActionLabel::SynchronizeStateVector, ["StateVector", "SensorStateVector"]),
    (ActionLabel::DetectAnomalyEvent, ["AnomalyEvent", "TelemetrySample"]),
    (ActionLabel::TriggerSafetyAlert, ["SafetyAlert", "AnomalyEvent"]),
    (ActionLabel::ReturnValidationResult, ["ValidationResult", "AuditLogEntry"]),
];

impl RuleSpec {
    /// The rule set shipped with the tool (mixed Korean and English keywords).
    pub fn builtin() -> Self {
        Self {
            action_rules: BUILTIN_ACTION_RULES
                .iter()
                .map(|(pattern, label)| RuleEntry {
                    pattern: pattern.to_string(),
                    label: *label,
                })
                .collect(),
            info_rules: BUILTIN_INFO_RULES
                .iter()
                .map(|(pattern, label)| RuleEntry {
                    pattern: pattern.to_string(),
                    label: label.to_string(),
                })
                .collect(),
            action_defaults: BUILTIN_ACTION_DEFAULTS
                .iter()
                .map(|(label, params)| (*label, params.iter().map(|p| p.to_string()).collect()))
                .collect(),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, RuleError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, RuleError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[derive(Debug, Clone)]
struct CompiledRule<L> {
    regex: Regex,
    label: L,
}

/// Compiled, immutable rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    action_rules: Vec<CompiledRule<ActionLabel>>,
    info_rules: Vec<CompiledRule<String>>,
    action_defaults: HashMap<ActionLabel, Vec<String>>,
}

static BUILTIN_TABLE: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::compile(RuleSpec::builtin()).expect("built-in rule table must compile")
});

fn compile_pattern(pattern: &str, label: &str) -> Result<Regex, RuleError> {
    if pattern.trim().is_empty() {
        return Err(RuleError::EmptyPattern {
            label: label.to_string(),
        });
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            label: label.to_string(),
            source,
        })
}

impl RuleTable {
    /// Shared built-in table, compiled on first use.
    pub fn builtin() -> &'static RuleTable {
        &BUILTIN_TABLE
    }

    pub fn compile(spec: RuleSpec) -> Result<Self, RuleError> {
        let action_rules = spec
            .action_rules
            .into_iter()
            .map(|entry| {
                let regex = compile_pattern(&entry.pattern, entry.label.as_str())?;
                Ok(CompiledRule {
                    regex,
                    label: entry.label,
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let info_rules = spec
            .info_rules
            .into_iter()
            .map(|entry| {
                let label = entry.label.trim().to_string();
                if label.is_empty() {
                    return Err(RuleError::EmptyLabel {
                        pattern: entry.pattern,
                    });
                }
                let regex = compile_pattern(&entry.pattern, &label)?;
                Ok(CompiledRule { regex, label })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;

        let mut action_defaults = HashMap::new();
        for (label, params) in spec.action_defaults {
            let params: Vec<String> = params
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            if params.is_empty() {
                return Err(RuleError::EmptyDefaults { label });
            }
            if params.len() > MAX_DEFAULT_PARAMS {
                return Err(RuleError::TooManyDefaults {
                    label,
                    count: params.len(),
                    max: MAX_DEFAULT_PARAMS,
                });
            }
            action_defaults.insert(label, params);
        }

        debug!(
            action_rules = action_rules.len(),
            info_rules = info_rules.len(),
            defaults = action_defaults.len(),
            "compiled rule table"
        );

        Ok(Self {
            action_rules,
            info_rules,
            action_defaults,
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, RuleError> {
        Self::compile(RuleSpec::from_yaml_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), "loaded rule table");
        Ok(table)
    }

    /// Label of the first action rule matching `text`, in declared order.
    pub fn match_action(&self, text: &str) -> Option<ActionLabel> {
        self.action_rules
            .iter()
            .find(|rule| rule.regex.is_match(text))
            .map(|rule| rule.label)
    }

    /// Labels of every info rule matching `text`, in declared order.
    pub fn match_info<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.info_rules
            .iter()
            .filter(move |rule| rule.regex.is_match(text))
            .map(|rule| rule.label.as_str())
    }

    pub fn defaults_for(&self, label: ActionLabel) -> Option<&[String]> {
        self.action_defaults.get(&label).map(Vec::as_slice)
    }

    pub fn action_rule_count(&self) -> usize {
        self.action_rules.len()
    }

    pub fn info_rule_count(&self) -> usize {
        self.info_rules.len()
    }

    pub fn default_count(&self) -> usize {
        self.action_defaults.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_every_label_with_defaults() {
        let table = RuleTable::builtin();
        assert_eq!(table.action_rule_count(), 20);
        assert_eq!(table.info_rule_count(), 32);
        for label in ActionLabel::ALL {
            let defaults = table.defaults_for(label).unwrap();
            assert_eq!(defaults.len(), MAX_DEFAULT_PARAMS, "{label}");
        }
    }

    #[test]
    fn every_label_fits_the_action_width() {
        for label in ActionLabel::ALL {
            assert!(label.as_str().chars().count() <= 24, "{label}");
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let table = RuleTable::builtin();
        assert_eq!(table.match_action("LOGIN now"), Some(ActionLabel::AuthenticateEndpoint));
        assert_eq!(table.match_action("nothing here"), None);
    }
}
