//! Pattern library for rule-based moderation
//!
//! Stateless, deterministic matchers over free text:
//! - Regex categories (hate, threats, doxxing, illegal solicitation, sexual content, insults)
//! - Co-occurrence detectors (protected group + exclusionary phrase, insult target)
//! - A condemnation detector used only to suppress the minor-safety override
//! - Per-URL link risk (shorteners, adult TLDs, numeric IPv4 hosts)

use aho_corasick::AhoCorasick;
use feedguard_core::{Error, Result};
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use url::{Host, Url};

/// Known URL shortener domains
pub const URL_SHORTENERS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "t.co",
    "goo.gl",
    "ow.ly",
    "is.gd",
    "buff.ly",
];

/// Top-level domains reserved for adult content
pub const ADULT_TLDS: &[&str] = &[".xxx", ".porn", ".sex", ".adult"];

/// Regex-backed pattern categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternCategory {
    /// Explicit sexual violence or abuse terms
    HardSexual,
    /// A minor-referencing term together with a sexual term, either order
    MinorSexual,
    /// Direct threats of violence
    DirectThreat,
    /// Explicit slurs
    Slur,
    /// Redacted slur placeholders such as `<slur>`
    HatePlaceholder,
    /// Private data disclosure
    Doxxing,
    /// Solicitation of illegal goods
    Illegal,
    /// Insult vocabulary; only bullying when aimed at someone
    Insult,
}

impl PatternCategory {
    pub const ALL: [PatternCategory; 8] = [
        Self::HardSexual,
        Self::MinorSexual,
        Self::DirectThreat,
        Self::Slur,
        Self::HatePlaceholder,
        Self::Doxxing,
        Self::Illegal,
        Self::Insult,
    ];

    /// Source patterns for this category, matched case-insensitively
    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            Self::HardSexual => &[
                r"\b(?:child\s*sex|cp|child\s*porn|underage\s*sex|rape|incest)\b",
                r"\bexplicit\s+sex(?:ual)?\s+(?:acts?|content|videos?|pics?)\b",
                r"\bsend\s+(?:me\s+)?nudes\b",
            ],
            Self::MinorSexual => &[
                r"(?s)\b(?:child|children|minors?|underage|teens?|teenagers?)\b.*\b(?:sex|sexual|porn\w*|explicit)\b",
                r"(?s)\b(?:sex|sexual|porn\w*|explicit)\b.*\b(?:child|children|minors?|underage|teens?|teenagers?)\b",
            ],
            Self::DirectThreat => &[
                r"\b(?:kill(?:\s*yourself|\s+him|\s+her)|i(?:'|’)m\s+going\s+to\s+kill|i\s+will\s+(?:hurt|kill))\b",
            ],
            Self::Slur => &[r"\b(?:kike|nigg[ae]r|faggot|tranny)\b"],
            Self::HatePlaceholder => &[r"<\s*slur\s*>", r"\bracial\s+slur\b"],
            Self::Doxxing => &[
                r"\b(?:home\s+address|address|credit\s*card|card\s*number|ssn|id\s*number)\b.*(?:\bis\b|[=:])",
            ],
            Self::Illegal => &[r"\b(?:sell(?:ing)?\s*drugs|buy\s*weapons|stolen\s*cards?)\b"],
            Self::Insult => &[
                r"\b(?:loser|idiot|moron|worthless|pathetic|dumbass|trash|garbage|kill\s*yourself)\b",
            ],
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Group nouns used for the "group + exclusionary phrase" hate heuristic
const HATE_GROUP_TERMS: &[&str] = &[
    "immigrants",
    r"jews?",
    r"muslims?",
    r"christians?",
    r"asians?",
    r"latinos?",
    r"africans?",
    r"blacks?",
    r"whites?",
    r"gays?",
    r"lesbians?",
    r"trans(?:gender)?",
    "women",
    "men",
];

/// Language that opposes, reports or bans harmful content
const CONDEMNATION_TERMS: &[&str] = &[
    "ban",
    "bans",
    "banned",
    "banning",
    "report",
    "reports",
    "reported",
    "reporting",
    "prohibit",
    "prohibits",
    "prohibited",
    "prohibiting",
    "oppose",
    "opposes",
    "opposed",
    "opposing",
    "crack down",
    "cracking down",
    "cracked down",
    "crackdown",
    "condemn",
    "condemns",
    "condemned",
    "condemning",
    "outlaw",
    "outlawed",
    "fight against",
    "protect children",
];

/// Why a link was considered risky
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRisk {
    Shortener(String),
    AdultTld(String),
    NumericHost(String),
}

impl LinkRisk {
    pub fn describe(&self) -> String {
        match self {
            Self::Shortener(domain) => format!("shortener:{}", domain),
            Self::AdultTld(tld) => format!("adult_tld:{}", tld),
            Self::NumericHost(host) => format!("numeric_host:{}", host),
        }
    }
}

/// Compiled pattern library
pub struct PatternLibrary {
    sets: Vec<RegexSet>,
    hate_group: Regex,
    exclusion_phrase: Regex,
    direct_address: Regex,
    dotted_quad: Regex,
    condemnation: AhoCorasick,
}

impl PatternLibrary {
    /// Compile every matcher
    pub fn new() -> Result<Self> {
        let sets = PatternCategory::ALL
            .iter()
            .map(|category| {
                RegexSetBuilder::new(category.patterns())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        Error::classifier(format!("Failed to compile {:?} patterns: {}", category, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let hate_group = Self::build_regex(&format!(r"\b(?:{})\b", HATE_GROUP_TERMS.join("|")))?;
        let exclusion_phrase = Self::build_regex(r"\b(?:do\s*not|don['’]?t)\s+belong\s+here\b")?;
        // An @-mention, or "you" standing alone (not "you're", "your", "you'll")
        let direct_address = Self::build_regex(
            r"(?:^|[^A-Za-z0-9_.])@[A-Za-z0-9_]+|(?:^|[^A-Za-z0-9_'’])you(?:$|[^A-Za-z0-9_'’])",
        )?;

        let dotted_quad = Self::build_regex(r"^[0-9]{1,3}(?:\.[0-9]{1,3}){3}$")?;

        let condemnation = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(CONDEMNATION_TERMS)
            .map_err(|e| Error::classifier(format!("Failed to build condemnation matcher: {}", e)))?;

        Ok(Self {
            sets,
            hate_group,
            exclusion_phrase,
            direct_address,
            dotted_quad,
            condemnation,
        })
    }

    fn build_regex(pattern: &str) -> Result<Regex> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::classifier(format!("Failed to compile regex {}: {}", pattern, e)))
    }

    /// First pattern in `category` matching `text`
    pub fn find(&self, category: PatternCategory, text: &str) -> Option<&'static str> {
        self.sets[category.index()]
            .matches(text)
            .iter()
            .next()
            .map(|i| category.patterns()[i])
    }

    pub fn matches(&self, category: PatternCategory, text: &str) -> bool {
        self.sets[category.index()].is_match(text)
    }

    /// Matched group noun when it co-occurs with an exclusionary phrase
    pub fn group_exclusion<'t>(&self, text: &'t str) -> Option<&'t str> {
        if !self.exclusion_phrase.is_match(text) {
            return None;
        }
        self.hate_group.find(text).map(|m| m.as_str())
    }

    /// True if the text addresses someone directly
    pub fn is_direct_address(&self, text: &str) -> bool {
        self.direct_address.is_match(text)
    }

    /// True if the text opposes, reports or calls for banning content
    pub fn is_condemnation(&self, text: &str) -> bool {
        let bytes = text.as_bytes();
        let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

        self.condemnation.find_overlapping_iter(text).any(|m| {
            let before_ok = m.start() == 0 || !is_word(bytes[m.start() - 1]);
            let after_ok = m.end() == bytes.len() || !is_word(bytes[m.end()]);
            before_ok && after_ok
        })
    }

    /// Classify a URL's host.
    ///
    /// Numeric hosts are judged on the host as written: only a bare
    /// dotted quad counts, octet ranges unchecked. Other links must parse
    /// as URLs to be considered at all.
    pub fn link_risk(&self, link: &str) -> Option<LinkRisk> {
        if let Some(host) = written_host(link) {
            if self.dotted_quad.is_match(host) {
                return Some(LinkRisk::NumericHost(host.to_string()));
            }
        }

        let url = Url::parse(link.trim()).ok()?;
        match url.host()? {
            Host::Ipv4(_) | Host::Ipv6(_) => None,
            Host::Domain(host) => {
                let (domain, tld) = domain_parts(host);
                if URL_SHORTENERS.contains(&domain.as_str()) {
                    Some(LinkRisk::Shortener(domain))
                } else if ADULT_TLDS.contains(&tld.as_str()) {
                    Some(LinkRisk::AdultTld(tld))
                } else {
                    None
                }
            }
        }
    }
}

/// Host portion of `scheme://[user@]host[:port]/...` without userinfo or port
fn written_host(link: &str) -> Option<&str> {
    let (_, rest) = link.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => host_port,
    };
    (!host.is_empty()).then_some(host)
}

/// Registrable domain (last two labels) and dotted TLD of a host
fn domain_parts(host: &str) -> (String, String) {
    let host = host.trim_matches('.').to_ascii_lowercase();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return (host, String::new());
    }
    let domain = parts[parts.len() - 2..].join(".");
    let tld = format!(".{}", parts[parts.len() - 1]);
    (domain, tld)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> PatternLibrary {
        PatternLibrary::new().unwrap()
    }

    #[test]
    fn test_all_categories_compile() {
        let lib = library();
        assert_eq!(lib.sets.len(), PatternCategory::ALL.len());
    }

    #[test]
    fn test_minor_sexual_either_order() {
        let lib = library();
        assert!(lib.matches(PatternCategory::MinorSexual, "stories about underage sex"));
        assert!(lib.matches(PatternCategory::MinorSexual, "Explicit photos of a TEEN"));
        assert!(lib.matches(PatternCategory::MinorSexual, "porn\nwith minors"));
        assert!(!lib.matches(PatternCategory::MinorSexual, "my teen loves soccer"));
        assert!(!lib.matches(PatternCategory::MinorSexual, "sex education for adults"));
    }

    #[test]
    fn test_find_reports_matching_pattern() {
        let lib = library();
        let hit = lib.find(PatternCategory::Illegal, "Selling drugs cheap").unwrap();
        assert!(hit.contains("drugs"));
        assert!(lib.find(PatternCategory::Illegal, "selling cookies").is_none());
    }

    #[test]
    fn test_threats_and_slurs() {
        let lib = library();
        assert!(lib.matches(PatternCategory::DirectThreat, "I'm going to kill the boss"));
        assert!(lib.matches(PatternCategory::DirectThreat, "i will hurt you"));
        assert!(!lib.matches(PatternCategory::DirectThreat, "this workout will kill me"));
        assert!(lib.matches(PatternCategory::HatePlaceholder, "those < slur > again"));
    }

    #[test]
    fn test_doxxing_requires_disclosure() {
        let lib = library();
        assert!(lib.matches(PatternCategory::Doxxing, "her home address is 12 Elm St"));
        assert!(lib.matches(PatternCategory::Doxxing, "card number: 4111"));
        assert!(!lib.matches(PatternCategory::Doxxing, "what is a good address book app"));
    }

    #[test]
    fn test_group_exclusion() {
        let lib = library();
        assert_eq!(lib.group_exclusion("Immigrants don't belong here"), Some("Immigrants"));
        assert_eq!(lib.group_exclusion("immigrants built this city"), None);
        assert_eq!(lib.group_exclusion("you don't belong here"), None);
    }

    #[test]
    fn test_direct_address() {
        let lib = library();
        assert!(lib.is_direct_address("@sam_99 hey"));
        assert!(lib.is_direct_address("I'm talking to you."));
        assert!(lib.is_direct_address("you loser"));
        assert!(!lib.is_direct_address("you're such a loser"));
        assert!(!lib.is_direct_address("your call"));
        assert!(!lib.is_direct_address("email me at sam@example.com"));
    }

    #[test]
    fn test_condemnation_respects_word_boundaries() {
        let lib = library();
        assert!(lib.is_condemnation("This should be BANNED and reported"));
        assert!(lib.is_condemnation("we need to crack down on it"));
        assert!(!lib.is_condemnation("banana bread recipe"));
        assert!(!lib.is_condemnation("the reporter said"));
    }

    #[test]
    fn test_link_risk() {
        let lib = library();
        assert_eq!(
            lib.link_risk("https://bit.ly/xyz"),
            Some(LinkRisk::Shortener("bit.ly".to_string()))
        );
        assert_eq!(
            lib.link_risk("http://www.bit.ly:8080/abc"),
            Some(LinkRisk::Shortener("bit.ly".to_string()))
        );
        assert_eq!(
            lib.link_risk("https://example.xxx/"),
            Some(LinkRisk::AdultTld(".xxx".to_string()))
        );
        assert_eq!(
            lib.link_risk("http://192.168.0.1/login"),
            Some(LinkRisk::NumericHost("192.168.0.1".to_string()))
        );
        assert_eq!(
            lib.link_risk("http://user@10.0.0.7:8080/x"),
            Some(LinkRisk::NumericHost("10.0.0.7".to_string()))
        );
        assert_eq!(lib.link_risk("https://news.example.com/story"), None);
        assert_eq!(lib.link_risk("not a url"), None);
    }

    #[test]
    fn test_numeric_host_is_literal_dotted_quad() {
        let lib = library();
        // Out-of-range octets are still a written IP address
        assert_eq!(
            lib.link_risk("http://999.1.1.1/x"),
            Some(LinkRisk::NumericHost("999.1.1.1".to_string()))
        );
        // Short and integer IPv4 forms are not dotted quads
        assert_eq!(lib.link_risk("http://1.2.3/x"), None);
        assert_eq!(lib.link_risk("http://3232235521/"), None);
        assert_eq!(lib.link_risk("http://[::1]/"), None);
    }

    #[test]
    fn test_written_host() {
        assert_eq!(written_host("https://a:b@Host.com:443/p?q"), Some("Host.com"));
        assert_eq!(written_host("http://1.2.3.4"), Some("1.2.3.4"));
        assert_eq!(written_host("http://1.2.3.4#frag"), Some("1.2.3.4"));
        assert_eq!(written_host("no scheme here"), None);
        assert_eq!(written_host("http:///path"), None);
    }

    #[test]
    fn test_domain_parts() {
        assert_eq!(
            domain_parts("Sub.Example.COM."),
            ("example.com".to_string(), ".com".to_string())
        );
        assert_eq!(domain_parts("localhost"), ("localhost".to_string(), String::new()));
    }
}
