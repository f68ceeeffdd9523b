use std::collections::HashSet;

use rf_core::types::{BlockRule, RuleSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub truncated: usize,
}

/// Drop exact duplicates (last occurrence wins), then cap the set at
/// `max_rules` by discarding the earliest rules.
///
/// Both passes favour later lines, so a rule repeated at the end of a
/// document survives the cap.
pub fn optimize_rules(rules: &mut RuleSet, max_rules: usize) -> OptimizeStats {
    let before = rules.len();

    let keep: Vec<bool> = {
        let mut seen: HashSet<&BlockRule> = HashSet::with_capacity(before);
        let mut keep: Vec<bool> = rules.iter().rev().map(|rule| seen.insert(rule)).collect();
        keep.reverse();
        keep
    };
    let deduped = keep.iter().filter(|kept| !**kept).count();

    let mut keep = keep.into_iter();
    rules.retain(|_| keep.next().unwrap_or(true));

    let truncated = rules.retain_last(max_rules);

    OptimizeStats {
        before,
        after: rules.len(),
        deduped,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use rf_core::types::Trigger;

    use super::*;

    fn rule_set(filters: &[&str]) -> RuleSet {
        filters
            .iter()
            .map(|f| BlockRule::block(Trigger::new(*f)))
            .collect::<Vec<_>>()
            .into()
    }

    fn filters(rules: &RuleSet) -> Vec<&str> {
        rules.iter().map(|r| r.trigger.url_filter.as_str()).collect()
    }

    #[test]
    fn removes_duplicates_keeping_last() {
        let mut rules = rule_set(&["aaa", "bbb", "aaa", "ccc", "bbb"]);
        let stats = optimize_rules(&mut rules, 100);

        assert_eq!(filters(&rules), vec!["aaa", "ccc", "bbb"]);
        assert_eq!(
            stats,
            OptimizeStats {
                before: 5,
                after: 3,
                deduped: 2,
                truncated: 0,
            }
        );
    }

    #[test]
    fn rules_differing_in_options_are_kept() {
        let mut rules = rule_set(&["aaa"]);
        rules.push(BlockRule::block(
            Trigger::new("aaa").with_load_type(rf_core::types::LoadType::THIRD_PARTY),
        ));
        let stats = optimize_rules(&mut rules, 100);
        assert_eq!(stats.deduped, 0);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn cap_keeps_most_recent() {
        let mut rules = rule_set(&["r1", "r2", "r3", "r4", "r5"]);
        let stats = optimize_rules(&mut rules, 2);

        assert_eq!(filters(&rules), vec!["r4", "r5"]);
        assert_eq!(stats.truncated, 3);
        assert_eq!(stats.after, 2);
    }

    #[test]
    fn dedup_runs_before_cap() {
        let mut rules = rule_set(&["r1", "r2", "r2", "r3"]);
        let stats = optimize_rules(&mut rules, 3);

        assert_eq!(filters(&rules), vec!["r1", "r2", "r3"]);
        assert_eq!(stats.truncated, 0);
    }

    #[test]
    fn duplicate_at_tail_survives_cap() {
        let mut rules = rule_set(&["repeated", "r1", "r2", "r3", "repeated"]);
        let stats = optimize_rules(&mut rules, 3);

        assert_eq!(filters(&rules), vec!["r2", "r3", "repeated"]);
        assert_eq!(stats.deduped, 1);
        assert_eq!(stats.truncated, 1);
    }
}
