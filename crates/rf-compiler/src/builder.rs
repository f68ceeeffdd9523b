use rf_core::domains::TopDomainAllowlist;
use rf_core::types::{ActionType, BlockRule, Trigger};

use crate::classifier::LineCategory;
use crate::syntax::{SupportedSyntax, ANY_HTTP_URL};
use crate::url_filter::is_valid_url_filter;

/// Turns one classified line into at most one rule.
///
/// Stateless apart from the borrowed allowlist and syntax policy, so one
/// builder can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct RuleBuilder<'a> {
    allowlist: &'a TopDomainAllowlist,
    syntax: &'a SupportedSyntax,
}

impl<'a> RuleBuilder<'a> {
    pub fn new(allowlist: &'a TopDomainAllowlist, syntax: &'a SupportedSyntax) -> Self {
        Self { allowlist, syntax }
    }

    pub fn build(&self, category: LineCategory, line: &str) -> Option<BlockRule> {
        match category {
            LineCategory::Comment
            | LineCategory::LastModifiedMeta
            | LineCategory::ExpiresMeta
            | LineCategory::CosmeticHideWithOptions
            | LineCategory::CosmeticHideException => None,
            LineCategory::Verbatim => self.verbatim_rule(line),
            LineCategory::CosmeticHide => self.cosmetic_rule(line),
            LineCategory::DomainRule => {
                let rule = line.strip_prefix("||")?;
                if self.syntax.is_rejected_domain_rule(rule) {
                    return None;
                }
                self.domain_rule(rule, ActionType::Block)
            }
            LineCategory::DomainRuleException => {
                let rule = line.strip_prefix("@@||")?;
                let action = if self.syntax.exceptions_as_ignore_previous {
                    ActionType::IgnorePreviousRules
                } else {
                    ActionType::Block
                };
                self.domain_rule(rule, action)
            }
            LineCategory::FilterResourceRule | LineCategory::DomainResourceRuleWithCap => {
                let rule = line.strip_prefix("||")?;
                self.domain_rule(rule, ActionType::Block)
            }
        }
    }

    /// Plain pattern used as-is for the url-filter.
    fn verbatim_rule(&self, line: &str) -> Option<BlockRule> {
        if !line.is_ascii() || line.len() <= self.syntax.min_verbatim_len {
            return None;
        }
        // only a leading start anchor is representable
        if line.char_indices().any(|(i, ch)| ch == '^' && i != 0) {
            return None;
        }
        if !is_valid_url_filter(line, self.syntax) {
            return None;
        }
        Some(BlockRule::block(Trigger::new(line)))
    }

    /// `domains##selector`, kept only for allowlisted sites.
    fn cosmetic_rule(&self, line: &str) -> Option<BlockRule> {
        let (domains, selector) = line.split_once("##")?;
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        let mut if_domain = Vec::new();
        let mut unless_domain = Vec::new();
        for raw in domains.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.strip_prefix('~') {
                Some(negated) if !negated.is_empty() => unless_domain.push(negated.to_string()),
                Some(_) => {}
                None => if_domain.push(raw.to_string()),
            }
        }

        if if_domain.is_empty() && unless_domain.is_empty() {
            return None;
        }
        if !self.allowlist.intersects(&if_domain) {
            return None;
        }

        Some(BlockRule::hide(
            selector,
            Trigger::new(ANY_HTTP_URL).with_domains(if_domain, unless_domain),
        ))
    }

    /// Shared parser for host-anchored rules with the `||`/`@@||` prefix removed.
    fn domain_rule(&self, rule: &str, action: ActionType) -> Option<BlockRule> {
        let (url_part, options) = match rule.split_once('$') {
            Some((url_part, options)) => (url_part, Some(options)),
            None => (rule, None),
        };
        let candidate = match url_part.split_once('^') {
            Some((host, _)) => host,
            None => url_part,
        };

        if !is_valid_url_filter(candidate, self.syntax) {
            return None;
        }

        let url_filter = if candidate.is_empty() { ANY_HTTP_URL } else { candidate };
        let mut trigger = Trigger::new(url_filter);
        if let Some(options) = options {
            trigger = trigger
                .with_load_type(self.syntax.load_types_in(options))
                .with_resource_type(self.syntax.resource_types_in(options));
            if self.syntax.wants_case_sensitive(options) {
                trigger = trigger.with_case_sensitive(true);
            }
        }

        Some(BlockRule::new(action, trigger))
    }
}
