use crate::models::Profile;

/// Queries shorter than this (in characters) never match anything.
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<'a> {
    /// Query below [`MIN_QUERY_CHARS`]; the results panel should stay hidden.
    TooShort,
    /// Real matching happened. May be empty ("no people found").
    Matches(Vec<&'a Profile>),
}

impl<'a> SearchOutcome<'a> {
    pub fn results(&self) -> &[&'a Profile] {
        match self {
            SearchOutcome::TooShort => &[],
            SearchOutcome::Matches(found) => found,
        }
    }

    pub fn into_results(self) -> Vec<&'a Profile> {
        match self {
            SearchOutcome::TooShort => Vec::new(),
            SearchOutcome::Matches(found) => found,
        }
    }

    pub fn is_too_short(&self) -> bool {
        matches!(self, SearchOutcome::TooShort)
    }
}

fn contains_lower(field: &str, needle_lower: &str) -> bool {
    field.to_lowercase().contains(needle_lower)
}

/// Whether any searchable field of `profile` matches.
///
/// Text fields are compared case-insensitively; the graduation year is
/// compared against the raw query.
pub fn matches(profile: &Profile, query: &str) -> bool {
    let needle = query.to_lowercase();
    contains_lower(&profile.name, &needle)
        || contains_lower(&profile.program, &needle)
        || contains_lower(&profile.location, &needle)
        || profile
            .graduation_year
            .as_deref()
            .is_some_and(|year| year.contains(query))
        || profile
            .current_term
            .as_deref()
            .is_some_and(|term| contains_lower(term, &needle))
}

/// Filter profiles by `query`, keeping input order.
pub fn search_outcome<'a>(profiles: &'a [Profile], query: &str) -> SearchOutcome<'a> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return SearchOutcome::TooShort;
    }
    SearchOutcome::Matches(profiles.iter().filter(|p| matches(p, query)).collect())
}

/// Like [`search_outcome`] but collapses "too short" into an empty result.
pub fn search<'a>(profiles: &'a [Profile], query: &str) -> Vec<&'a Profile> {
    search_outcome(profiles, query).into_results()
}

/// Text placed in the search box after picking a result.
pub fn result_label(profile: &Profile) -> String {
    format!("{} - {}", profile.name, profile.location)
}

pub fn results_summary(count: usize) -> String {
    if count == 1 {
        "1 result found".to_string()
    } else {
        format!("{count} results found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Owner;

    fn profile(id: &str, name: &str, program: &str, location: &str) -> Profile {
        Profile {
            id: id.to_string(),
            name: name.to_string(),
            program: program.to_string(),
            graduation_year: None,
            current_term: None,
            location: location.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            owner: Owner::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn maria() -> Profile {
        profile("m", "Maria Lopez", "Biology", "Lima, Peru")
    }

    #[test]
    fn test_single_char_query_is_too_short() {
        let profiles = vec![maria()];
        assert!(search(&profiles, "a").is_empty());
        assert!(search_outcome(&profiles, "a").is_too_short());
        assert!(search_outcome(&profiles, "").is_too_short());
    }

    #[test]
    fn test_two_char_query_performs_matching() {
        let profiles = vec![maria()];
        assert_eq!(search(&profiles, "ma").len(), 1);
        assert_eq!(
            search_outcome(&profiles, "zz"),
            SearchOutcome::Matches(vec![])
        );
    }

    #[test]
    fn test_field_or_semantics_case_insensitive() {
        let profiles = vec![maria()];
        assert_eq!(search(&profiles, "mari").len(), 1);
        assert_eq!(search(&profiles, "BIO").len(), 1);
        assert_eq!(search(&profiles, "lima").len(), 1);
        assert!(search(&profiles, "chemistry").is_empty());
    }

    #[test]
    fn test_current_term_matches() {
        let mut p = maria();
        p.current_term = Some("Fall 2024".to_string());
        assert!(matches(&p, "fall"));
    }

    #[test]
    fn test_graduation_year_uses_raw_query() {
        let mut p = profile("g", "Someone", "Physics", "Oslo");
        p.graduation_year = Some("2025".to_string());
        assert!(matches(&p, "202"));
        assert!(matches(&p, "25"));
        assert!(!matches(&p, "2019"));
    }

    #[test]
    fn test_results_keep_input_order() {
        let profiles = vec![
            profile("1", "Zed", "Law", "Berlin"),
            profile("2", "Amy", "Law", "Paris"),
            profile("3", "Bob", "Art", "Rome"),
            profile("4", "Cal", "Law", "Lagos"),
        ];
        let ids: Vec<&str> = search(&profiles, "law").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "4"]);
    }

    #[test]
    fn test_multibyte_query_length_counts_chars() {
        let profiles = vec![profile("z", "Zoë", "Music", "Zürich")];
        assert!(search_outcome(&profiles, "ü").is_too_short());
        assert_eq!(search(&profiles, "zü").len(), 1);
    }

    #[test]
    fn test_result_label() {
        assert_eq!(result_label(&maria()), "Maria Lopez - Lima, Peru");
    }

    #[test]
    fn test_results_summary_pluralizes() {
        assert_eq!(results_summary(1), "1 result found");
        assert_eq!(results_summary(0), "0 results found");
        assert_eq!(results_summary(3), "3 results found");
    }
}
