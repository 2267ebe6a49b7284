//! Team Name Normalizer
//!
//! Maps free-text team names from odds feeds onto the canonical short codes
//! used by the schedule store ("Kansas City Chiefs" -> "KC").
//!
//! Resolution is an ordered list of lookup tables, first hit wins:
//! 1. Canonical full names, exact
//! 2. Known alternates (relocations, renames, city-only and abbreviated
//!    forms), case-insensitive
//! 3. Substring containment against the canonical names in either
//!    direction, case-insensitive. A fragment shared by several teams
//!    ("New York", "Los Angeles") resolves to nothing.
//!
//! A miss is a normal outcome and is reported as `None`.

use std::collections::HashMap;
use std::sync::OnceLock;
use strsim::jaro_winkler;
use tracing::debug;

/// Global NFL normalizer, built once on first access
static NFL_NORMALIZER: OnceLock<TeamNormalizer> = OnceLock::new();

/// Inputs shorter than this never reach the substring pass; a one or two
/// letter fragment is contained in most canonical names.
const MIN_SUBSTRING_LEN: usize = 3;

/// Canonical full name -> code, one entry per team.
/// Codes follow the ESPN scoreboard abbreviations.
const NFL_CANONICAL: &[(&str, &str)] = &[
    ("Arizona Cardinals", "ARI"),
    ("Atlanta Falcons", "ATL"),
    ("Baltimore Ravens", "BAL"),
    ("Buffalo Bills", "BUF"),
    ("Carolina Panthers", "CAR"),
    ("Chicago Bears", "CHI"),
    ("Cincinnati Bengals", "CIN"),
    ("Cleveland Browns", "CLE"),
    ("Dallas Cowboys", "DAL"),
    ("Denver Broncos", "DEN"),
    ("Detroit Lions", "DET"),
    ("Green Bay Packers", "GB"),
    ("Houston Texans", "HOU"),
    ("Indianapolis Colts", "IND"),
    ("Jacksonville Jaguars", "JAX"),
    ("Kansas City Chiefs", "KC"),
    ("Las Vegas Raiders", "LV"),
    ("Los Angeles Chargers", "LAC"),
    ("Los Angeles Rams", "LAR"),
    ("Miami Dolphins", "MIA"),
    ("Minnesota Vikings", "MIN"),
    ("New England Patriots", "NE"),
    ("New Orleans Saints", "NO"),
    ("New York Giants", "NYG"),
    ("New York Jets", "NYJ"),
    ("Philadelphia Eagles", "PHI"),
    ("Pittsburgh Steelers", "PIT"),
    ("San Francisco 49ers", "SF"),
    ("Seattle Seahawks", "SEA"),
    ("Tampa Bay Buccaneers", "TB"),
    ("Tennessee Titans", "TEN"),
    ("Washington Commanders", "WSH"),
];

/// Historical names, short forms and city-only variants.
/// Shared cities (Los Angeles, New York) are absent and do not resolve.
const NFL_ALTERNATES: &[(&str, &str)] = &[
    // Relocations and renames
    ("Oakland Raiders", "LV"),
    ("Los Angeles Raiders", "LV"),
    ("San Diego Chargers", "LAC"),
    ("St. Louis Rams", "LAR"),
    ("St Louis Rams", "LAR"),
    ("Washington Redskins", "WSH"),
    ("Washington Football Team", "WSH"),
    ("Houston Oilers", "TEN"),
    ("Tennessee Oilers", "TEN"),
    ("Phoenix Cardinals", "ARI"),
    // Abbreviated forms
    ("LV Raiders", "LV"),
    ("LA Chargers", "LAC"),
    ("LA Rams", "LAR"),
    ("NY Giants", "NYG"),
    ("NY Jets", "NYJ"),
    ("KC Chiefs", "KC"),
    ("SF 49ers", "SF"),
    ("GB Packers", "GB"),
    ("NE Patriots", "NE"),
    ("NO Saints", "NO"),
    ("TB Buccaneers", "TB"),
    ("Tampa Bay Bucs", "TB"),
    ("Jax Jaguars", "JAX"),
    // City-only
    ("Arizona", "ARI"),
    ("Atlanta", "ATL"),
    ("Baltimore", "BAL"),
    ("Buffalo", "BUF"),
    ("Carolina", "CAR"),
    ("Chicago", "CHI"),
    ("Cincinnati", "CIN"),
    ("Cleveland", "CLE"),
    ("Dallas", "DAL"),
    ("Denver", "DEN"),
    ("Detroit", "DET"),
    ("Green Bay", "GB"),
    ("Houston", "HOU"),
    ("Indianapolis", "IND"),
    ("Jacksonville", "JAX"),
    ("Kansas City", "KC"),
    ("Las Vegas", "LV"),
    ("Miami", "MIA"),
    ("Minnesota", "MIN"),
    ("New England", "NE"),
    ("New Orleans", "NO"),
    ("Philadelphia", "PHI"),
    ("Pittsburgh", "PIT"),
    ("San Francisco", "SF"),
    ("Seattle", "SEA"),
    ("Tampa Bay", "TB"),
    ("Tennessee", "TEN"),
    ("Washington", "WSH"),
];

/// Which rule resolved a name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResolutionTier {
    Canonical,
    Alternate,
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub code: &'a str,
    pub tier: ResolutionTier,
}

/// One exact-lookup table in the resolution order
#[derive(Debug, Clone)]
struct NameTable {
    tier: ResolutionTier,
    case_insensitive: bool,
    entries: HashMap<String, String>,
}

impl NameTable {
    fn new(tier: ResolutionTier, case_insensitive: bool, pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .map(|(name, code)| {
                let key = if case_insensitive {
                    name.to_lowercase()
                } else {
                    name.to_string()
                };
                (key, code.to_string())
            })
            .collect();

        Self {
            tier,
            case_insensitive,
            entries,
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        let hit = if self.case_insensitive {
            self.entries.get(&name.to_lowercase())
        } else {
            self.entries.get(name)
        };
        hit.map(String::as_str)
    }
}

/// Team name normalizer over a prioritized list of lookup tables
#[derive(Debug, Clone)]
pub struct TeamNormalizer {
    tables: Vec<NameTable>,
    /// (lowercase canonical name, code) in declaration order, for the
    /// substring pass and suggestions
    canonical: Vec<(String, String)>,
}

impl TeamNormalizer {
    /// Create a normalizer from a canonical full-name table
    pub fn new(canonical: &[(&str, &str)]) -> Self {
        Self {
            tables: vec![NameTable::new(ResolutionTier::Canonical, false, canonical)],
            canonical: canonical
                .iter()
                .map(|(name, code)| (name.to_lowercase(), code.to_string()))
                .collect(),
        }
    }

    /// Append a case-insensitive alternate-name table after the existing ones
    pub fn with_alternates(mut self, alternates: &[(&str, &str)]) -> Self {
        self.tables
            .push(NameTable::new(ResolutionTier::Alternate, true, alternates));
        self
    }

    /// The shared NFL normalizer (32 teams plus historical names)
    pub fn nfl() -> &'static TeamNormalizer {
        NFL_NORMALIZER
            .get_or_init(|| TeamNormalizer::new(NFL_CANONICAL).with_alternates(NFL_ALTERNATES))
    }

    /// Resolve a display name to its canonical code
    pub fn normalize(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(|r| r.code)
    }

    /// Resolve a display name, reporting which rule matched
    pub fn resolve(&self, name: &str) -> Option<Resolution<'_>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        for table in &self.tables {
            if let Some(code) = table.lookup(name) {
                return Some(Resolution {
                    code,
                    tier: table.tier,
                });
            }
        }

        self.resolve_by_substring(name)
    }

    fn resolve_by_substring(&self, name: &str) -> Option<Resolution<'_>> {
        if name.chars().count() < MIN_SUBSTRING_LEN {
            return None;
        }

        let lower = name.to_lowercase();
        let mut hits = self
            .canonical
            .iter()
            .filter(|(canonical, _)| lower.contains(canonical.as_str()) || canonical.contains(&lower))
            .map(|(_, code)| code.as_str());

        let code = hits.next()?;
        if hits.any(|other| other != code) {
            debug!("Ambiguous team name '{}' matches more than one team", name);
            return None;
        }

        Some(Resolution {
            code,
            tier: ResolutionTier::Substring,
        })
    }

    /// Closest canonical name by Jaro-Winkler similarity.
    ///
    /// Only used to enrich diagnostics when a name fails to resolve; never
    /// feeds back into matching.
    pub fn closest_canonical(&self, name: &str) -> Option<(&str, f64)> {
        let lower = name.trim().to_lowercase();
        self.canonical
            .iter()
            .map(|(canonical, _)| (canonical.as_str(), jaro_winkler(&lower, canonical)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// True if `code` is one of the canonical codes
    pub fn is_known_code(&self, code: &str) -> bool {
        self.canonical.iter().any(|(_, c)| c == code)
    }
}

/// Normalize a team name with the NFL tables
pub fn normalize_team_name(name: &str) -> Option<&'static str> {
    TeamNormalizer::nfl().normalize(name)
}
