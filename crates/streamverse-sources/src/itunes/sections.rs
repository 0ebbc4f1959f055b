//! Curated music sections and the search terms that feed them.

use streamverse_models::Language;

pub const DEFAULT_SECTION: &str = "Trending Now";
pub const INTERNATIONAL_HITS: &str = "International Hits";

pub const SECTIONS: &[(&str, &[&str])] = &[
    ("Trending Now", &["2025 hits", "top charts", "trending songs", "viral hits"]),
    ("New Releases", &["new releases 2025", "latest songs", "fresh music"]),
    ("Top Hindi", &["hindi top hits", "bollywood latest", "arijit singh", "hindi trending"]),
    (INTERNATIONAL_HITS, &["billboard hot 100", "global hits", "us pop", "uk charts"]),
    ("Chill & Focus", &["lofi beats", "ambient chill", "study music", "piano relax"]),
    ("Workout Mix", &["workout hits", "gym motivation", "pumping base", "high energy cardio"]),
    ("Party Anthems", &["party mix", "dance hits", "club music", "celebration songs"]),
    ("Retro Classics", &["90s hits", "80s pop", "old is gold", "classic rock"]),
];

const BENGALI_HITS: &[&str] = &[
    "Bengali Movie Songs",
    "New Bengali Hits",
    "Bengali Pop 2025",
    "Tollywood Bengali",
];

const BENGALI_ARTISTS: &[&str] = &[
    "Anupam Roy",
    "Jeet Gannguli Bengali",
    "Nachiketa",
    "Anjan Dutt",
    "Iman Chakraborty",
];

pub fn section_names() -> impl Iterator<Item = &'static str> {
    SECTIONS.iter().map(|(name, _)| *name)
}

pub fn is_section(name: &str) -> bool {
    SECTIONS.iter().any(|(section, _)| *section == name)
}

/// Resolved iTunes search for one page of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionQuery {
    pub term: String,
    pub offset: u32,
    pub country: &'static str,
}

fn rotate<'a>(list: &[&'a str], page: u32) -> &'a str {
    list[(page.saturating_sub(1) as usize) % list.len()]
}

/// Pick the search term, offset and storefront for `page` of `section`.
///
/// Pages rotate through the section's keywords first and only advance the
/// offset once every keyword has been used. Unknown sections search for
/// their own name.
pub fn section_query(section: &str, page: u32, limit: u32, language: &Language) -> SectionQuery {
    let fallback = [section];
    let keywords: &[&str] = SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&fallback);

    let base = rotate(keywords, page);
    let offset = (page.saturating_sub(1) / keywords.len() as u32) * limit;

    if section == INTERNATIONAL_HITS {
        return SectionQuery {
            term: base.to_string(),
            offset,
            country: "US",
        };
    }

    let (term, country) = match language {
        Language::Hindi => (format!("Bollywood {}", base), "IN"),
        Language::Bengali => {
            let term = match section {
                "Trending Now" | "New Releases" => rotate(BENGALI_HITS, page).to_string(),
                "Top Hindi" => rotate(BENGALI_ARTISTS, page).to_string(),
                _ => format!("Bengali {}", base),
            };
            (term, "IN")
        }
        _ => (base.to_string(), "US"),
    };

    SectionQuery { term, offset, country }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_rotation_then_offset() {
        let q = section_query("Trending Now", 1, 20, &Language::All);
        assert_eq!(q, SectionQuery { term: "2025 hits".into(), offset: 0, country: "US" });

        let q = section_query("Trending Now", 4, 20, &Language::All);
        assert_eq!(q.term, "viral hits");
        assert_eq!(q.offset, 0);

        let q = section_query("Trending Now", 5, 20, &Language::All);
        assert_eq!(q.term, "2025 hits");
        assert_eq!(q.offset, 20);
    }

    #[test]
    fn test_three_keyword_section() {
        let q = section_query("New Releases", 4, 10, &Language::English);
        assert_eq!(q.term, "new releases 2025");
        assert_eq!(q.offset, 10);
        assert_eq!(q.country, "US");
    }

    #[test]
    fn test_hindi_prefixes_bollywood() {
        let q = section_query("Chill & Focus", 2, 20, &Language::Hindi);
        assert_eq!(q.term, "Bollywood ambient chill");
        assert_eq!(q.country, "IN");
    }

    #[test]
    fn test_bengali_specific_rotations() {
        let q = section_query("New Releases", 3, 20, &Language::Bengali);
        assert_eq!(q.term, "Bengali Pop 2025");
        assert_eq!(q.country, "IN");

        let q = section_query("Top Hindi", 5, 20, &Language::Bengali);
        assert_eq!(q.term, "Iman Chakraborty");

        let q = section_query("Workout Mix", 1, 20, &Language::Bengali);
        assert_eq!(q.term, "Bengali workout hits");
    }

    #[test]
    fn test_international_hits_stays_global() {
        let q = section_query(INTERNATIONAL_HITS, 2, 20, &Language::Hindi);
        assert_eq!(q.term, "global hits");
        assert_eq!(q.country, "US");
    }

    #[test]
    fn test_unknown_section_searches_its_name() {
        let q = section_query("Jazz Lounge", 3, 20, &Language::All);
        assert_eq!(q.term, "Jazz Lounge");
        assert_eq!(q.offset, 40);
        assert!(!is_section("Jazz Lounge"));
        assert_eq!(section_names().count(), 8);
    }
}
