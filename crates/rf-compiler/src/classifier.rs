/// Syntactic category of one filter-list line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LineCategory {
    /// `!` or `[` header/comment line
    Comment,
    /// `! Last Modified: ...`
    LastModifiedMeta,
    /// `! Expires: ...`
    ExpiresMeta,
    /// `domains##selector`
    CosmeticHide,
    /// `domains#@#selector`
    CosmeticHideException,
    /// `domains#?#selector` (extended CSS)
    CosmeticHideWithOptions,
    /// `||host^`
    DomainRule,
    /// `@@||host^...`
    DomainRuleException,
    /// `||host^$options`
    DomainResourceRuleWithCap,
    /// `||pattern$options`
    FilterResourceRule,
    /// Anything else, taken as a plain url-filter
    Verbatim,
}

impl LineCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::LastModifiedMeta => "last-modified",
            Self::ExpiresMeta => "expires",
            Self::CosmeticHide => "cosmetic",
            Self::CosmeticHideException => "cosmetic-exception",
            Self::CosmeticHideWithOptions => "cosmetic-extended",
            Self::DomainRule => "domain",
            Self::DomainRuleException => "domain-exception",
            Self::DomainResourceRuleWithCap => "domain-options",
            Self::FilterResourceRule => "filter-options",
            Self::Verbatim => "verbatim",
        }
    }

    /// Categories that never yield a rule.
    pub fn is_discarded(self) -> bool {
        matches!(
            self,
            Self::Comment
                | Self::LastModifiedMeta
                | Self::ExpiresMeta
                | Self::CosmeticHideException
                | Self::CosmeticHideWithOptions
        )
    }
}

/// Classify a single line. Total: unknown syntax is `Verbatim`.
///
/// Checks run in a fixed order because the raw markers overlap
/// (`@@||a.com^$image` contains `||`, `^`, `$` and `^$`).
pub fn classify(line: &str) -> LineCategory {
    if line.starts_with('!') || line.starts_with('[') {
        if line.contains("Last Modified") {
            return LineCategory::LastModifiedMeta;
        }
        if line.contains("Expires") {
            return LineCategory::ExpiresMeta;
        }
        return LineCategory::Comment;
    }

    if line.starts_with("@@||") && line.contains('^') {
        return LineCategory::DomainRuleException;
    }

    if line.starts_with("||") {
        if line.contains("^$") {
            return LineCategory::DomainResourceRuleWithCap;
        }
        if line.contains('$') {
            return LineCategory::FilterResourceRule;
        }
        if line.contains('^') {
            return LineCategory::DomainRule;
        }
    }

    if line.contains("#?#") {
        return LineCategory::CosmeticHideWithOptions;
    }
    if line.contains("#@#") {
        return LineCategory::CosmeticHideException;
    }
    if line.contains("##") {
        return LineCategory::CosmeticHide;
    }

    LineCategory::Verbatim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_metadata() {
        assert_eq!(classify("! Title: EasyList"), LineCategory::Comment);
        assert_eq!(classify("[Adblock Plus 2.0]"), LineCategory::Comment);
        assert_eq!(classify("! Last Modified: 2021-01-01"), LineCategory::LastModifiedMeta);
        assert_eq!(classify("! Expires: 4 days (update frequency)"), LineCategory::ExpiresMeta);
        // comment markers win over every other marker
        assert_eq!(classify("! ||ads.example.com^$image"), LineCategory::Comment);
        assert_eq!(classify("!example.com##.ad"), LineCategory::Comment);
    }

    #[test]
    fn exception_takes_precedence_over_options() {
        assert_eq!(classify("@@||ads.example.com^$image"), LineCategory::DomainRuleException);
        assert_eq!(classify("@@||ads.example.com^"), LineCategory::DomainRuleException);
        // no separator: not a domain exception
        assert_eq!(classify("@@||ads.example.com/path$image"), LineCategory::Verbatim);
    }

    #[test]
    fn host_anchored_rules() {
        assert_eq!(classify("||ads.example.com^$image,third-party"), LineCategory::DomainResourceRuleWithCap);
        assert_eq!(classify("||ads.example.com/banner$script"), LineCategory::FilterResourceRule);
        // `^` present but not immediately before `$`
        assert_eq!(classify("||ads.example.com^foo$script"), LineCategory::FilterResourceRule);
        assert_eq!(classify("||ads.example.com^"), LineCategory::DomainRule);
        assert_eq!(classify("||ads.example.com^|"), LineCategory::DomainRule);
    }

    #[test]
    fn host_anchor_without_markers_falls_through() {
        assert_eq!(classify("||ads.example.com/banner"), LineCategory::Verbatim);
        assert_eq!(classify("||example.com##.ad"), LineCategory::CosmeticHide);
    }

    #[test]
    fn cosmetic_variants() {
        assert_eq!(classify("example.com#?#div:has(> .ad)"), LineCategory::CosmeticHideWithOptions);
        assert_eq!(classify("example.com#@#.ad"), LineCategory::CosmeticHideException);
        assert_eq!(classify("example.com,~sub.example.com##.banner-ad"), LineCategory::CosmeticHide);
        assert_eq!(classify("##.generic-ad"), LineCategory::CosmeticHide);
    }

    #[test]
    fn extended_css_checked_before_plain_hide() {
        // `#?#` lines can also contain `##` inside the selector
        assert_eq!(classify("example.com#?#a[href*='##']"), LineCategory::CosmeticHideWithOptions);
        assert_eq!(classify("example.com#@#a[href*='##']"), LineCategory::CosmeticHideException);
    }

    #[test]
    fn plain_patterns_are_verbatim() {
        assert_eq!(classify("/banner/ads/"), LineCategory::Verbatim);
        assert_eq!(classify("&ad_type="), LineCategory::Verbatim);
        assert_eq!(classify("random*pattern|bad"), LineCategory::Verbatim);
        assert_eq!(classify(""), LineCategory::Verbatim);
    }

    #[test]
    fn discarded_categories() {
        assert!(LineCategory::Comment.is_discarded());
        assert!(LineCategory::CosmeticHideWithOptions.is_discarded());
        assert!(LineCategory::CosmeticHideException.is_discarded());
        assert!(!LineCategory::CosmeticHide.is_discarded());
        assert!(!LineCategory::Verbatim.is_discarded());
    }
}
