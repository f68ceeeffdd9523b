//! Core type definitions for RuleForge
//!
//! These types map directly to the content-blocker JSON schema and are
//! used by both the compiler and the list refresher. Key names and casing
//! are fixed by the consuming engine.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// Rule Actions
// =============================================================================

/// Action to take when a rule's trigger matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Cancel the request
    Block,
    /// Strip cookies from the request
    BlockCookies,
    /// Hide elements matching `Action::selector`
    CssDisplayNone,
    /// Exception: discard earlier matching rules
    IgnorePreviousRules,
}

/// The `action` object of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// CSS selector, only present for `css-display-none`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

// =============================================================================
// Load Types
// =============================================================================

bitflags::bitflags! {
    /// `load-type` values understood by the content-blocking engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoadType: u8 {
        const FIRST_PARTY = 1 << 0;
        const THIRD_PARTY = 1 << 1;
    }
}

// =============================================================================
// Resource Types
// =============================================================================

bitflags::bitflags! {
    /// `resource-type` values understood by the content-blocking engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceType: u16 {
        const DOCUMENT = 1 << 0;
        const IMAGE = 1 << 1;
        const STYLE_SHEET = 1 << 2;
        const SCRIPT = 1 << 3;
        const FONT = 1 << 4;
        const RAW = 1 << 5;
        const SVG_DOCUMENT = 1 << 6;
        const MEDIA = 1 << 7;
        const POPUP = 1 << 8;
    }
}

/// A flag set whose members serialize as an ordered list of names.
pub trait NamedMask: Copy + Sized + 'static {
    /// Every flag with its schema name, in output order.
    const NAMES: &'static [(Self, &'static str)];

    fn empty_mask() -> Self;
    fn has(self, flag: Self) -> bool;
    fn union(self, other: Self) -> Self;

    /// Look up a single flag by its schema name.
    fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(flag, _)| *flag)
    }

    /// Names of the set flags, in schema order.
    fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl NamedMask for LoadType {
    const NAMES: &'static [(Self, &'static str)] = &[
        (Self::FIRST_PARTY, "first-party"),
        (Self::THIRD_PARTY, "third-party"),
    ];

    fn empty_mask() -> Self {
        Self::empty()
    }

    fn has(self, flag: Self) -> bool {
        self.contains(flag)
    }

    fn union(self, other: Self) -> Self {
        self | other
    }
}

impl NamedMask for ResourceType {
    const NAMES: &'static [(Self, &'static str)] = &[
        (Self::DOCUMENT, "document"),
        (Self::IMAGE, "image"),
        (Self::STYLE_SHEET, "style-sheet"),
        (Self::SCRIPT, "script"),
        (Self::FONT, "font"),
        (Self::RAW, "raw"),
        (Self::SVG_DOCUMENT, "svg-document"),
        (Self::MEDIA, "media"),
        (Self::POPUP, "popup"),
    ];

    fn empty_mask() -> Self {
        Self::empty()
    }

    fn has(self, flag: Self) -> bool {
        self.contains(flag)
    }

    fn union(self, other: Self) -> Self {
        self | other
    }
}

mod named_mask {
    use super::*;

    pub fn serialize<M: NamedMask, S: Serializer>(mask: &M, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(mask.names())
    }

    pub fn deserialize<'de, M: NamedMask, D: Deserializer<'de>>(deserializer: D) -> Result<M, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names.iter().try_fold(M::empty_mask(), |acc, name| {
            M::from_name(name)
                .map(|flag| acc.union(flag))
                .ok_or_else(|| de::Error::custom(format!("unknown type `{}`", name)))
        })
    }
}

// =============================================================================
// Triggers
// =============================================================================

/// The `trigger` object of a rule.
///
/// Domain lists and type masks are never written as empty collections: the
/// engine treats a present key as a constraint, so empty means absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "url-filter")]
    pub url_filter: String,
    #[serde(rename = "if-domain", default, skip_serializing_if = "Option::is_none")]
    pub if_domain: Option<Vec<String>>,
    #[serde(rename = "unless-domain", default, skip_serializing_if = "Option::is_none")]
    pub unless_domain: Option<Vec<String>>,
    #[serde(
        rename = "load-type",
        with = "named_mask",
        default = "LoadType::empty",
        skip_serializing_if = "LoadType::is_empty"
    )]
    pub load_type: LoadType,
    #[serde(
        rename = "resource-type",
        with = "named_mask",
        default = "ResourceType::empty",
        skip_serializing_if = "ResourceType::is_empty"
    )]
    pub resource_type: ResourceType,
    #[serde(
        rename = "url-filter-is-case-sensitive",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub case_sensitive: Option<bool>,
}

impl Trigger {
    /// Trigger matching `url_filter` with no further scoping.
    pub fn new(url_filter: impl Into<String>) -> Self {
        Self {
            url_filter: url_filter.into(),
            if_domain: None,
            unless_domain: None,
            load_type: LoadType::empty(),
            resource_type: ResourceType::empty(),
            case_sensitive: None,
        }
    }

    /// Scope the trigger to domains. Empty lists stay absent.
    pub fn with_domains(mut self, if_domain: Vec<String>, unless_domain: Vec<String>) -> Self {
        self.if_domain = non_empty(if_domain);
        self.unless_domain = non_empty(unless_domain);
        self
    }

    pub fn with_load_type(mut self, load_type: LoadType) -> Self {
        self.load_type = load_type;
        self
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

// =============================================================================
// Rules
// =============================================================================

/// One compiled content-blocker rule: exactly one action, exactly one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRule {
    pub action: Action,
    pub trigger: Trigger,
}

impl BlockRule {
    /// Rule with an action that carries no selector.
    pub fn new(action_type: ActionType, trigger: Trigger) -> Self {
        Self {
            action: Action {
                action_type,
                selector: None,
            },
            trigger,
        }
    }

    pub fn block(trigger: Trigger) -> Self {
        Self::new(ActionType::Block, trigger)
    }

    /// Cosmetic rule hiding elements matched by `selector`.
    pub fn hide(selector: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            action: Action {
                action_type: ActionType::CssDisplayNone,
                selector: Some(selector.into()),
            },
            trigger,
        }
    }
}

// =============================================================================
// Rule Sets
// =============================================================================

/// Ordered output of one compile, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<BlockRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: BlockRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockRule> {
        self.rules.iter()
    }

    pub fn as_slice(&self) -> &[BlockRule] {
        &self.rules
    }

    pub fn into_vec(self) -> Vec<BlockRule> {
        self.rules
    }

    /// Keep only the `max` most recently added rules.
    ///
    /// Returns how many rules were dropped from the front.
    pub fn retain_last(&mut self, max: usize) -> usize {
        if self.rules.len() <= max {
            return 0;
        }
        let excess = self.rules.len() - max;
        self.rules.drain(..excess);
        excess
    }

    /// Keep rules for which `f` returns true, preserving order.
    pub fn retain<F: FnMut(&BlockRule) -> bool>(&mut self, f: F) {
        self.rules.retain(f);
    }

    /// Encode as the engine's JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl From<Vec<BlockRule>> for RuleSet {
    fn from(rules: Vec<BlockRule>) -> Self {
        Self { rules }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a BlockRule;
    type IntoIter = std::slice::Iter<'a, BlockRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
