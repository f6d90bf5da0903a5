//! Reference data: country metadata and the city/alias list.
//!
//! Two static datasets feed the matcher:
//!
//! - **Countries** (`countries-readable.json`): name, capital and population
//!   per country. Used for the country-name pass and for tie-breaking.
//! - **World cities** (`world-cities_json.json`): city name, country and
//!   administrative subdivision. Every city becomes an alias of its country,
//!   and every subdivision becomes one too (the first time its name is seen).
//!
//! Loading normalizes both: names are lower-cased, "south korea" is folded
//! into "korea", a handful of common abbreviations are appended, and the
//! alias list is sorted longest-first. That ordering is what the matcher's
//! longest-match rule relies on, so it is established here once and never
//! re-checked.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{GeoError, Result};

const SOUTH_KOREA: &str = "south korea";
const KOREA: &str = "korea";

/// Abbreviations people commonly put in their profile location.
const CURATED_ALIASES: &[(&str, &str)] = &[
    ("united states", "usa"),
    ("united states", "u.s.a."),
    ("united kingdom", "uk"),
    ("united kingdom", "u.k."),
    ("china", "prc"),
    ("china", "p.r.c."),
];

/// Population as found in the countries dataset: a JSON number or a
/// numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Population {
    Count(u64),
    Text(String),
}

impl Population {
    fn to_count(&self, country: &str) -> Result<u64> {
        match self {
            Population::Count(n) => Ok(*n),
            Population::Text(s) => s.trim().parse::<u64>().map_err(|e| {
                GeoError::data_load(
                    "countries",
                    format!("population '{}' of '{}' is not an integer: {}", s, country, e),
                )
            }),
        }
    }
}

/// One row of the countries dataset, as deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    pub population: Population,
}

impl CountryEntry {
    pub fn new(name: &str, capital: &str, population: u64) -> Self {
        Self {
            name: name.to_string(),
            capital: Some(capital.to_string()),
            population: Population::Count(population),
        }
    }
}

/// One row of the world-cities dataset, as deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub subcountry: Option<String>,
}

impl CityEntry {
    pub fn new(name: &str, country: &str, subcountry: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            country: country.to_string(),
            subcountry: subcountry.map(str::to_string),
        }
    }
}

/// Capital and population of one canonical country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    pub capital: String,
    pub population: u64,
}

/// Insertion-ordered country table keyed by lower-cased name.
///
/// Order matters: the matcher's country pass walks it front to back, and
/// tie-breaks favour earlier candidates.
#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    entries: Vec<(String, CountryRecord)>,
    index: HashMap<String, usize>,
}

impl CountryTable {
    /// Insert or overwrite. Overwriting keeps the original position.
    pub fn insert(&mut self, key: String, record: CountryRecord) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = record,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, record));
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<CountryRecord> {
        let pos = self.index.remove(key)?;
        let (_, record) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(record)
    }

    pub fn get(&self, key: &str) -> Option<&CountryRecord> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CountryRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A (country, alias) pair. `len` caches the alias length in chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityAlias {
    pub country: String,
    pub alias: String,
    pub len: usize,
}

impl CityAlias {
    fn new(country: String, alias: String) -> Self {
        let len = alias.chars().count();
        Self {
            country,
            alias,
            len,
        }
    }
}

/// Immutable lookup tables used by the matcher.
///
/// Built once per run; `Send + Sync`, so it can be shared freely.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    countries: CountryTable,
    aliases: Vec<CityAlias>,
}

impl ReferenceData {
    /// Build the lookup tables from deserialized dataset rows.
    pub fn load(countries: Vec<CountryEntry>, cities: Vec<CityEntry>) -> Result<Self> {
        let countries = build_country_table(countries)?;
        let aliases = build_alias_list(cities)?;
        Ok(Self { countries, aliases })
    }

    /// Parse both datasets from their JSON text and build the tables.
    pub fn from_json(countries_json: &str, cities_json: &str) -> Result<Self> {
        let countries: Vec<CountryEntry> = serde_json::from_str(countries_json)
            .map_err(|e| GeoError::data_load("countries", e))?;
        let cities: Vec<CityEntry> =
            serde_json::from_str(cities_json).map_err(|e| GeoError::data_load("cities", e))?;
        Self::load(countries, cities)
    }

    pub fn countries(&self) -> &CountryTable {
        &self.countries
    }

    /// Aliases, longest first.
    pub fn aliases(&self) -> &[CityAlias] {
        &self.aliases
    }
}

/// Lower-case the countries dataset and fold "south korea" into "korea".
pub fn build_country_table(entries: Vec<CountryEntry>) -> Result<CountryTable> {
    if entries.is_empty() {
        return Err(GeoError::data_load("countries", "dataset is empty"));
    }

    let mut table = CountryTable::default();
    for entry in entries {
        let key = entry.name.trim().to_lowercase();
        if key.is_empty() {
            return Err(GeoError::data_load("countries", "entry with empty name"));
        }
        let population = entry.population.to_count(&key)?;
        let capital = entry
            .capital
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_default();
        table.insert(
            key,
            CountryRecord {
                capital,
                population,
            },
        );
    }

    // Most people write just "Korea".
    if let Some(record) = table.get(SOUTH_KOREA).cloned() {
        table.insert(KOREA.to_string(), record);
        table.remove(SOUTH_KOREA);
    }

    Ok(table)
}

/// Turn the world-cities dataset into a deduplicated, longest-first alias list.
///
/// Subdivision names are deduplicated across the whole dataset, so a
/// subdivision name shared by two countries belongs to whichever appears
/// first. Blank names are skipped: an empty alias would match every string.
pub fn build_alias_list(entries: Vec<CityEntry>) -> Result<Vec<CityAlias>> {
    if entries.is_empty() {
        return Err(GeoError::data_load("cities", "dataset is empty"));
    }

    let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
    let mut seen_subcountries: HashSet<String> = HashSet::new();

    for entry in entries {
        let mut country = entry.country.trim().to_lowercase();
        if country == SOUTH_KOREA {
            country = KOREA.to_string();
        }

        let city = entry.name.trim().to_lowercase();
        if !city.is_empty() {
            pairs.insert((country.clone(), city));
        }

        if let Some(sub) = entry.subcountry.as_deref() {
            let sub = sub.trim().to_lowercase();
            if !sub.is_empty() && seen_subcountries.insert(sub.clone()) {
                pairs.insert((country, sub));
            }
        }
    }

    for (country, alias) in CURATED_ALIASES {
        pairs.insert((country.to_string(), alias.to_string()));
    }

    let mut aliases: Vec<CityAlias> = pairs
        .into_iter()
        .map(|(country, alias)| CityAlias::new(country, alias))
        .collect();
    // Stable: equal lengths keep (country, alias) order from the set.
    aliases.sort_by(|a, b| b.len.cmp(&a.len));
    Ok(aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_south_korea_folded_into_korea() {
        let table = build_country_table(vec![
            CountryEntry::new("France", "Paris", 67_000_000),
            CountryEntry::new("South Korea", "Seoul", 51_000_000),
        ])
        .unwrap();
        assert!(!table.contains("south korea"));
        let korea = table.get("korea").unwrap();
        assert_eq!(korea.capital, "seoul");
        assert_eq!(korea.population, 51_000_000);
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["france", "korea"]);
    }

    #[test]
    fn test_population_as_string() {
        let json = r#"[{"name": "Israel", "capital": "Jerusalem", "population": "8700000"}]"#;
        let countries: Vec<CountryEntry> = serde_json::from_str(json).unwrap();
        let table = build_country_table(countries).unwrap();
        assert_eq!(table.get("israel").unwrap().population, 8_700_000);
    }

    #[test]
    fn test_bad_population_is_data_load_error() {
        let json = r#"[{"name": "Nowhere", "capital": "X", "population": "lots"}]"#;
        let countries: Vec<CountryEntry> = serde_json::from_str(json).unwrap();
        let err = build_country_table(countries).unwrap_err();
        assert!(matches!(err, GeoError::DataLoad { .. }));
    }

    #[test]
    fn test_empty_countries_rejected() {
        assert!(build_country_table(Vec::new()).is_err());
    }

    #[test]
    fn test_empty_cities_rejected() {
        let err = build_alias_list(Vec::new()).unwrap_err();
        assert!(matches!(err, GeoError::DataLoad { ref dataset, .. } if dataset == "cities"));

        let countries = r#"[{"name": "Chad", "capital": "N'Djamena", "population": 16000000}]"#;
        assert!(ReferenceData::from_json(countries, "[]").is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = ReferenceData::from_json("{not json", "[]").unwrap_err();
        assert!(matches!(err, GeoError::DataLoad { ref dataset, .. } if dataset == "countries"));
    }

    #[test]
    fn test_aliases_sorted_longest_first() {
        let aliases = build_alias_list(vec![
            CityEntry::new("Rome", "Italy", Some("Lazio")),
            CityEntry::new("San Francisco", "United States", Some("California")),
        ])
        .unwrap();
        for pair in aliases.windows(2) {
            assert!(pair[0].len >= pair[1].len);
        }
        assert_eq!(aliases[0].alias, "san francisco");
        assert!(aliases.iter().any(|a| a.alias == "usa"));
        assert!(aliases.iter().any(|a| a.alias == "p.r.c."));
    }

    #[test]
    fn test_subcountry_deduplicated_across_countries() {
        let aliases = build_alias_list(vec![
            CityEntry::new("Perth", "Australia", Some("Western")),
            CityEntry::new("Freetown", "Sierra Leone", Some("Western")),
        ])
        .unwrap();
        let western: Vec<&CityAlias> = aliases.iter().filter(|a| a.alias == "western").collect();
        assert_eq!(western.len(), 1);
        assert_eq!(western[0].country, "australia");
    }

    #[test]
    fn test_city_pairs_are_a_set() {
        let aliases = build_alias_list(vec![
            CityEntry::new("Springfield", "United States", Some("Illinois")),
            CityEntry::new("Springfield", "United States", Some("Missouri")),
        ])
        .unwrap();
        let count = aliases.iter().filter(|a| a.alias == "springfield").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_south_korea_cities_map_to_korea() {
        let aliases =
            build_alias_list(vec![CityEntry::new("Busan", "South Korea", None)]).unwrap();
        let busan = aliases.iter().find(|a| a.alias == "busan").unwrap();
        assert_eq!(busan.country, "korea");
    }

    #[test]
    fn test_blank_names_skipped() {
        let aliases =
            build_alias_list(vec![CityEntry::new("", "Chad", Some(" "))]).unwrap();
        assert!(aliases.iter().all(|a| !a.alias.is_empty()));
    }

    #[test]
    fn test_table_remove_keeps_index_consistent() {
        let mut table = CountryTable::default();
        for name in ["a", "b", "c"] {
            table.insert(
                name.to_string(),
                CountryRecord {
                    capital: String::new(),
                    population: 1,
                },
            );
        }
        table.remove("a");
        assert!(table.get("c").is_some());
        assert_eq!(table.len(), 2);
    }
}
