use std::collections::BTreeMap;
use std::sync::Arc;

use rf_core::domains::TopDomainAllowlist;
use rf_core::types::RuleSet;

use crate::builder::RuleBuilder;
use crate::classifier::{classify, LineCategory};
use crate::optimizer::optimize_rules;
use crate::syntax::SupportedSyntax;

/// Per-document compile statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Non-empty lines seen
    pub lines: usize,
    /// Rules produced before optimization
    pub rules_built: usize,
    pub deduped: usize,
    /// Rules dropped by the size cap
    pub truncated: usize,
    /// Rules in the final set
    pub rules: usize,
    pub categories: BTreeMap<LineCategory, usize>,
}

/// Compiles whole filter-list documents.
///
/// Holds only read-only state, so a single compiler can serve concurrent
/// compiles of different lists.
#[derive(Debug, Clone)]
pub struct FilterListCompiler {
    allowlist: Arc<TopDomainAllowlist>,
    syntax: SupportedSyntax,
}

impl FilterListCompiler {
    pub fn new(allowlist: Arc<TopDomainAllowlist>) -> Self {
        Self {
            allowlist,
            syntax: SupportedSyntax::default(),
        }
    }

    pub fn with_syntax(mut self, syntax: SupportedSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn allowlist(&self) -> &TopDomainAllowlist {
        &self.allowlist
    }

    pub fn syntax(&self) -> &SupportedSyntax {
        &self.syntax
    }

    pub fn compile(&self, text: &str) -> RuleSet {
        self.compile_with_stats(text).0
    }

    pub fn compile_with_stats(&self, text: &str) -> (RuleSet, CompileStats) {
        compile_document(text, &self.allowlist, &self.syntax)
    }
}

/// Compile `text` with the default syntax policy.
pub fn compile_filter_list(text: &str, allowlist: &TopDomainAllowlist) -> RuleSet {
    compile_filter_list_with_stats(text, allowlist).0
}

pub fn compile_filter_list_with_stats(text: &str, allowlist: &TopDomainAllowlist) -> (RuleSet, CompileStats) {
    compile_document(text, allowlist, &SupportedSyntax::default())
}

fn compile_document(
    text: &str,
    allowlist: &TopDomainAllowlist,
    syntax: &SupportedSyntax,
) -> (RuleSet, CompileStats) {
    let builder = RuleBuilder::new(allowlist, syntax);
    let mut rules = RuleSet::new();
    let mut stats = CompileStats::default();

    for raw_line in text.split('\n') {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        let category = classify(line);
        *stats.categories.entry(category).or_insert(0) += 1;
        if category.is_discarded() {
            continue;
        }

        if let Some(rule) = builder.build(category, line) {
            rules.push(rule);
        }
    }

    stats.rules_built = rules.len();
    let optimized = optimize_rules(&mut rules, syntax.max_rules);
    stats.deduped = optimized.deduped;
    stats.truncated = optimized.truncated;
    stats.rules = optimized.after;

    log::debug!(
        "Compiled {} lines into {} rules ({} duplicates, {} truncated)",
        stats.lines,
        stats.rules,
        stats.deduped,
        stats.truncated
    );

    (rules, stats)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn allowlist() -> TopDomainAllowlist {
        TopDomainAllowlist::from_domains(["example.com"])
    }

    #[test]
    fn compiles_domain_rule_to_engine_json() {
        let rules = compile_filter_list("||ads.example.com^$image,third-party", &allowlist());
        let value: serde_json::Value =
            serde_json::from_str(&rules.to_json().expect("serialize")).expect("valid json");

        assert_eq!(
            value,
            json!([{
                "action": { "type": "block" },
                "trigger": {
                    "url-filter": "ads.example.com",
                    "resource-type": ["image"],
                    "load-type": ["third-party"]
                }
            }])
        );
    }

    #[test]
    fn compiles_cosmetic_rule_for_allowlisted_domain() {
        let rules = compile_filter_list("example.com,~sub.example.com##.banner-ad", &allowlist());
        let value: serde_json::Value =
            serde_json::from_str(&rules.to_json().expect("serialize")).expect("valid json");

        assert_eq!(
            value,
            json!([{
                "action": { "type": "css-display-none", "selector": ".banner-ad" },
                "trigger": {
                    "url-filter": "^https?://",
                    "if-domain": ["example.com"],
                    "unless-domain": ["sub.example.com"]
                }
            }])
        );
    }

    #[test]
    fn metadata_and_invalid_lines_produce_nothing() {
        let rules = compile_filter_list(
            "! Last Modified: 2021-01-01\nrandom*pattern|bad\n[Adblock Plus 2.0]\n",
            &allowlist(),
        );
        assert!(rules.is_empty());
    }

    #[test]
    fn preserves_document_order() {
        let text = "/first-rule/\r\n! comment\n\nexample.com##.ad\n||tracker.net^\n/second-rule/\n";
        let rules = compile_filter_list(text, &allowlist());
        let filters: Vec<&str> = rules.iter().map(|r| r.trigger.url_filter.as_str()).collect();
        assert_eq!(filters, vec!["/first-rule/", "^https?://", "tracker.net", "/second-rule/"]);
    }

    #[test]
    fn non_ascii_lines_are_excluded() {
        let rules = compile_filter_list("/werbung-ü/banner\n/reklama/баннер\n/banner-ad/", &allowlist());
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.as_slice()[0].trigger.url_filter, "/banner-ad/");
    }

    #[test]
    fn compile_is_idempotent() {
        let text = "||a.example.com^$script\nexample.com##.ad\n/banner-ad/\n@@||b.example.com^";
        let allowlist = allowlist();
        let first = compile_filter_list(text, &allowlist).to_json().expect("serialize");
        let second = compile_filter_list(text, &allowlist).to_json().expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn cap_keeps_last_rules_in_document_order() {
        let text: String = (1..=60_000).map(|i| format!("/banner-{i}/\n")).collect();
        let rules = compile_filter_list(&text, &allowlist());

        assert_eq!(rules.len(), 50_000);
        assert_eq!(rules.as_slice()[0].trigger.url_filter, "/banner-10001/");
        assert_eq!(rules.as_slice()[49_999].trigger.url_filter, "/banner-60000/");
    }

    #[test]
    fn rule_repeated_at_tail_survives_cap() {
        let mut text = String::from("/repeated-rule/\n");
        text.extend((1..=60_000).map(|i| format!("/banner-{i}/\n")));
        text.push_str("/repeated-rule/\n");
        let rules = compile_filter_list(&text, &allowlist());

        assert_eq!(rules.len(), 50_000);
        assert_eq!(rules.as_slice()[0].trigger.url_filter, "/banner-10002/");
        assert_eq!(rules.as_slice()[49_999].trigger.url_filter, "/repeated-rule/");
    }

    #[test]
    fn stats_count_categories_and_truncation() {
        let compiler = FilterListCompiler::new(Arc::new(allowlist()))
            .with_syntax(SupportedSyntax::default().with_max_rules(2));
        let text = "! Title\n/rule-one/\n/rule-one/\n/rule-two/\n/rule-three/\nexample.com#@#.ad";
        let (rules, stats) = compiler.compile_with_stats(text);

        assert_eq!(rules.len(), 2);
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.rules_built, 4);
        assert_eq!(stats.deduped, 1);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.rules, 2);
        assert_eq!(stats.categories.get(&LineCategory::Verbatim), Some(&4));
        assert_eq!(stats.categories.get(&LineCategory::Comment), Some(&1));
        assert_eq!(stats.categories.get(&LineCategory::CosmeticHideException), Some(&1));
    }

    #[test]
    fn shared_compiler_across_threads() {
        let compiler = Arc::new(FilterListCompiler::new(Arc::new(allowlist())));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let compiler = Arc::clone(&compiler);
                std::thread::spawn(move || compiler.compile(&format!("/thread-{i}-rule/")).len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("thread should finish"), 1);
        }
    }
}
