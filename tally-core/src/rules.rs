//! Classification rule set: type prefixes, generic types, description
//! normalization rules and category patterns.
//!
//! Every table is ordered; evaluation order is declaration order and the
//! first match wins. The defaults describe a UK current-account export.

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Which rule table a pattern came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleGroup {
    Exchange,
    Rules,
    Categories,
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleGroup::Exchange => "exchange",
            RuleGroup::Rules => "rules",
            RuleGroup::Categories => "categories",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid pattern in {group}: '{pattern}'")]
    InvalidPattern {
        group: RuleGroup,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Compile one rule pattern, tagging failures with the table it belongs to
pub fn compile_pattern(group: RuleGroup, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        group,
        pattern: pattern.to_string(),
        source,
    })
}

/// String-keyed map that keeps insertion (document) order.
///
/// Re-inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// The full classification configuration.
///
/// Each key present in a config file replaces the built-in table of the
/// same name; absent keys keep the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleSet {
    /// Types whose transactions are shown under the type label
    pub generic_types: Vec<String>,
    /// Description prefix -> type label
    pub types: OrderedMap<String>,
    /// Description regex -> replacement description
    pub rules: OrderedMap<String>,
    /// Category label -> description regexes
    pub categories: OrderedMap<Vec<String>>,
}

impl RuleSet {
    /// A rule set with every table empty
    pub fn empty() -> Self {
        Self {
            generic_types: Vec::new(),
            types: OrderedMap::new(),
            rules: OrderedMap::new(),
            categories: OrderedMap::new(),
        }
    }

    pub fn is_generic(&self, kind: &str) -> bool {
        self.generic_types.iter().any(|g| g == kind)
    }
}

const DEFAULT_TYPES: &[(&str, &str)] = &[
    ("SO - ", "Standing Order"),
    ("DD - Hbos Card Services", "Internal Transfer"),
    ("DD - ", "Direct Debit"),
    ("CHQ - ", "Cheque"),
    ("Bank Credit - ", "Bank Credit"),
    ("Bill Payment - Hfx Credit Card", "Internal Transfer"),
    ("Bill Payment - ", "Bill Payment"),
    ("DC - ", "Debit Card"),
    ("DC Cashback - ", "Debit Card Cashback"),
    ("DC Refund - ", "Debit Card Refund"),
    ("Link ATM - ", "Cash Withdrawal"),
    ("ATM - ", "Cash Withdrawal"),
    ("Faster Payment - ", "Transfer"),
    ("PAYMENT REC'D - THANK YOU", "Internal Transfer"),
    ("DIRECT DEBIT THANK YOU", "Internal Transfer"),
];

const DEFAULT_GENERIC_TYPES: &[&str] = &["Internal Transfer", "Cash Withdrawal", "Cheque"];

const DEFAULT_RULES: &[(&str, &str)] = &[
    (r"^(?i)tesco", "Tesco"),
    (r"^(?i)(sacat )?sainsbury'?s", "Sainsbury's"),
    (r"^(?i)marks & spencer", "M&S"),
    (r"^(?i)argos", "Argos"),
    (r"^(?i)subway", "Subway"),
    (r"^(?i)specsavers", "Specsavers"),
    (r"^(?i)adsl24", "ADSL 24"),
    (r"^(?i)foxtons", "Foxtons"),
    (r"^(?i)(eve online|ccp games)", "CCP Games"),
    (r"^(?i)nandos", "Nandos"),
    (r"^(?i)pizza express", "Pizza Express"),
    (r"^(?i)steam(games|powered)\.com", "Steam"),
    (r"^(?i)spotify(\.com|subs|\s)", "Spotify"),
    (r"^(?i)t-\s?mobile", "T-Mobile"),
    (r"^(?i)TGI Friday's", "TGI Friday's"),
    (r"^(?i)wh smith", "WH Smiths"),
    (r"^(?i)Codeweavers", "Codeweavers"),
    (r"^(?i)Cineworld", "Cineworld"),
    (r"^(?i)123-reg\.co\.uk", "123-reg.co.uk"),
    (r"866-321-8851", "Amazon Kindle"),
    (r"(?i)Amazon Digital Dwnlds\s*amazon.co.uk", "Amazon MP3"),
    (r"^(?i)Ocado", "Ocado"),
];

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("Groceries", &["Tesco", "Ocado", "M&S"]),
    (
        "Home expenses",
        &[
            "T-Mobile",
            "Bt Group Plc",
            "Edf Energy",
            "Foxtons",
            "ADSL 24",
            "Lb Southwark",
            "(?i)0800 Repair",
        ],
    ),
    (
        "Entertainment",
        &["Amazon", "Spotify", "Cineworld", "(?i)sky payments", "Steam", "(?i)play.com"],
    ),
    ("Online", &["(?i)giganews", "Shane", "(?i)^github"]),
    ("Cash", &["Cash Withdrawal"]),
    (
        "Going out",
        &[
            "(?i)tayyab",
            "(?i)founders arms",
            "Nandos",
            "(?i)all bar one",
            "TGI Friday's",
            "(?i)^piccolino",
            "EAT & DRINK",
            "(?i)www.urbanbite.com",
        ],
    ),
    ("Transport", &["(?i)ec mainline"]),
    ("Health/Medical", &["Specsavers"]),
    ("(Ignored)", &["Internal Transfer"]),
];

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            generic_types: DEFAULT_GENERIC_TYPES.iter().map(|s| s.to_string()).collect(),
            types: DEFAULT_TYPES.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            rules: DEFAULT_RULES.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(k, pats)| (*k, pats.iter().map(|p| p.to_string()).collect()))
                .collect(),
        }
    }
}
