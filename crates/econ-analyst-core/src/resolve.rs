//! Free-text resolution of country and indicator codes.
//!
//! Both resolvers lower-case the input and scan a static table for
//! substring matches. Tables are slices, so iteration follows declaration
//! order and the first matching country alias always wins.
//!
//! Matching is plain substring containment, not word matching: `"us"`
//! also matches inside `"australia"` or `"business"`, and `"de"` inside
//! `"trade"`. Longer aliases are declared before the short ones of the
//! same country so that they win when both are present.

use std::collections::BTreeSet;

/// World Bank code for real GDP growth (annual %).
pub const GDP_GROWTH: &str = "NY.GDP.MKTP.KD.ZG";
/// World Bank code for consumer price inflation (annual %).
pub const CPI_INFLATION: &str = "FP.CPI.TOTL.ZG";
/// World Bank code for unemployment (% of labor force, modeled ILO).
pub const UNEMPLOYMENT: &str = "SL.UEM.TOTL.ZS";

/// Alias phrase → country code, in match priority order.
pub const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("us", "US"),
    ("america", "US"),
    ("germany", "DE"),
    ("deutschland", "DE"),
    ("de", "DE"),
    ("france", "FR"),
    ("fr", "FR"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("britain", "GB"),
    ("european union", "EU"),
    ("eurozone", "EU"),
    ("eu", "EU"),
];

/// Keyword → indicator code. Several keywords may share a code.
pub const INDICATOR_KEYWORDS: &[(&str, &str)] = &[
    ("gdp", GDP_GROWTH),
    ("growth", GDP_GROWTH),
    ("inflation", CPI_INFLATION),
    ("cpi", CPI_INFLATION),
    ("unemployment", UNEMPLOYMENT),
    ("jobless", UNEMPLOYMENT),
];

/// Indicators analyzed when a query names none.
pub const DEFAULT_INDICATORS: [&str; 2] = [GDP_GROWTH, CPI_INFLATION];

/// Map free text to a country code.
///
/// Returns the code of the first alias in [`COUNTRY_ALIASES`] that occurs
/// in the lower-cased text, otherwise `default` upper-cased. Never returns
/// an empty string unless `default` is empty.
pub fn resolve_country(text: &str, default: &str) -> String {
    let text = text.to_lowercase();
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| text.contains(alias))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| default.trim().to_uppercase())
}

/// Map free text to the set of indicator codes it mentions.
///
/// A pure function of the lower-cased text. The returned set is ordered by
/// code, which is also the order the orchestrator processes indicators in.
/// Falls back to [`DEFAULT_INDICATORS`] when no keyword matches.
pub fn resolve_indicators(text: &str) -> BTreeSet<String> {
    let text = text.to_lowercase();
    let mut codes: BTreeSet<String> = INDICATOR_KEYWORDS
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, code)| code.to_string())
        .collect();

    if codes.is_empty() {
        codes.extend(DEFAULT_INDICATORS.iter().map(|c| c.to_string()));
    }

    codes
}
