use crate::config::toml_config::DistrictConfig;
use crate::utils::text::{contains_word_sequence, normalize};
use std::collections::HashMap;

const PLACE_SEPARATORS: [char; 4] = [',', ';', '/', '|'];

/// Normalized district name to canonical configured spelling.
///
/// Configuration order is kept and decides which district wins when more
/// than one appears inside an unseparated place string.
#[derive(Debug, Clone, Default)]
pub struct DistrictTable {
    ordered: Vec<(String, String)>,
    lookup: HashMap<String, String>,
}

impl DistrictTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for name in names {
            let canonical = name.as_ref().trim().to_string();
            let normalized = normalize(&canonical);
            if normalized.is_empty() || table.lookup.contains_key(&normalized) {
                continue;
            }
            table.lookup.insert(normalized.clone(), canonical.clone());
            table.ordered.push((normalized, canonical));
        }
        table
    }

    pub fn from_config(districts: &[DistrictConfig]) -> Self {
        Self::new(districts.iter().map(|d| d.name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Resolves a free-text execution place to a configured district.
    ///
    /// Exact fragment matches (split on `, ; / |`) win; otherwise the first
    /// district appearing as whole words in the full string. `None` means the
    /// contract is out of scope.
    pub fn find_district(&self, execution_place: &str) -> Option<&str> {
        for fragment in execution_place.split(PLACE_SEPARATORS.as_slice()) {
            if let Some(canonical) = self.lookup.get(&normalize(fragment)) {
                return Some(canonical.as_str());
            }
        }

        let whole = normalize(execution_place);
        if whole.is_empty() {
            return None;
        }
        self.ordered
            .iter()
            .find(|(normalized, _)| contains_word_sequence(&whole, normalized))
            .map(|(_, canonical)| canonical.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centro() -> DistrictTable {
        DistrictTable::new([
            "Aveiro",
            "Castelo Branco",
            "Coimbra",
            "Guarda",
            "Leiria",
            "Viseu",
        ])
    }

    #[test]
    fn test_exact_fragment_match() {
        let table = centro();
        assert_eq!(table.find_district("Aveiro, Ílhavo"), Some("Aveiro"));
        assert_eq!(
            table.find_district("Portugal; castelo  branco; Fundão"),
            Some("Castelo Branco")
        );
        assert_eq!(table.find_district("Portugal | VISEU"), Some("Viseu"));
    }

    #[test]
    fn test_fragment_match_beats_earlier_substring() {
        let table = centro();
        // "Aveiro" is configured first but only appears inside a longer fragment.
        assert_eq!(
            table.find_district("Ria de Aveiro Norte, Coimbra"),
            Some("Coimbra")
        );
    }

    #[test]
    fn test_whole_word_fallback() {
        let table = centro();
        assert_eq!(table.find_district("Portugal Leiria Pombal"), Some("Leiria"));
        assert_eq!(
            table.find_district("Distrito de Castelo-Branco (Covilhã)"),
            Some("Castelo Branco")
        );
    }

    #[test]
    fn test_no_partial_word_match() {
        let table = centro();
        assert_eq!(table.find_district("Guardamar"), None);
        assert_eq!(table.find_district("Lisboa"), None);
    }

    #[test]
    fn test_total_on_odd_inputs() {
        let table = centro();
        for input in ["", " ", ",,,", "|/;", "💡", "\0", "Coimbra\n"] {
            let found = table.find_district(input);
            assert!(found.is_none() || centro().lookup.values().any(|v| Some(v.as_str()) == found));
        }
        assert_eq!(table.find_district(""), None);
        assert_eq!(table.find_district("Coimbra\n"), Some("Coimbra"));
    }

    #[test]
    fn test_empty_and_duplicate_names_are_skipped() {
        let table = DistrictTable::new(["", "  ", "Aveiro", "aveiro"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find_district("AVEIRO"), Some("Aveiro"));
        assert!(DistrictTable::new(Vec::<String>::new()).find_district("Aveiro").is_none());
    }
}
