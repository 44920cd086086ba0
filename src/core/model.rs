// GachaSniff - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use regex::Regex;
use std::fmt;

// =============================================================================
// Device
// =============================================================================

/// An attached, authorised device as reported by the bridge tool.
///
/// The identifier is opaque (a USB serial or `ip:port` for network devices);
/// identity is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Device(String);

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Connection endpoint
// =============================================================================

/// Network endpoint for the optional `adb connect` before device listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEndpoint {
    pub host: String,
    pub port: String,
}

impl ConnectionEndpoint {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for ConnectionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Pattern rules
// =============================================================================

/// A compiled (category, regex) pair used to classify and extract a URL
/// from a logcat line.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Unique identifier (e.g. "genshin"). User rules override by id.
    pub id: String,

    /// Operator-facing category label (e.g. "原神").
    pub category: String,

    /// Free-text description from the rule file.
    pub description: String,

    /// Compiled pattern; the whole match is the extracted URL.
    pub pattern: Regex,

    /// Whether this rule is embedded in the binary.
    pub is_builtin: bool,
}

impl PatternRule {
    /// Return the first substring of `line` matched by this rule.
    pub fn find<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern.find(line).map(|m| m.as_str())
    }
}

/// An ordered set of pattern rules. Order is match priority: when a line
/// satisfies several rules, the earliest rule wins.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Test `line` against each rule in priority order and return the first
    /// rule that matches along with the matched substring.
    pub fn first_match<'r, 'l>(&'r self, line: &'l str) -> Option<(&'r PatternRule, &'l str)> {
        self.rules
            .iter()
            .find_map(|rule| rule.find(line).map(|url| (rule, url)))
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Scan result
// =============================================================================

/// Terminal outcome of one scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    /// A rule matched; `url` is the matched substring.
    Matched { category: String, url: String },

    /// The stream ended without any rule matching.
    Exhausted,
}

// =============================================================================
// Tests
// =============================================================================
