//! Static TMDB genre taxonomy. TMDB exposes genres only as numeric ids.

/// Browse filter name → TMDB genre id.
pub fn genre_id(name: &str) -> Option<u32> {
    let id = match name {
        "Action" => 28,
        "Adventure" => 12,
        "Animation" => 16,
        "Comedy" => 35,
        "Crime" => 80,
        "Documentary" => 99,
        "Drama" => 18,
        "Family" => 10751,
        "Fantasy" => 14,
        "History" => 36,
        "Horror" => 27,
        "Music" => 10402,
        "Mystery" => 9648,
        "Romance" => 10749,
        "Science Fiction" | "Sci-Fi" => 878,
        "TV Movie" => 10770,
        "Thriller" => 53,
        "War" => 10752,
        "Western" => 37,
        _ => return None,
    };
    Some(id)
}

/// TMDB genre id → display name, covering both movie and TV taxonomies.
pub fn genre_name(id: u32) -> Option<&'static str> {
    let name = match id {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        36 => "History",
        27 => "Horror",
        10402 => "Music",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Sci-Fi",
        10770 => "TV Movie",
        53 => "Thriller",
        10752 => "War",
        37 => "Western",
        10759 => "Action & Adventure",
        10762 => "Kids",
        10763 => "News",
        10764 => "Reality",
        10765 => "Sci-Fi & Fantasy",
        10766 => "Soap",
        10767 => "Talk",
        10768 => "War & Politics",
        _ => return None,
    };
    Some(name)
}

pub const MUSIC_GENRE_ID: u32 = 10402;
pub const NEWS_GENRE_ID: u32 = 10763;
pub const TALK_GENRE_ID: u32 = 10767;
/// TMDB keyword id for "sport"
pub const SPORT_KEYWORD_ID: u32 = 6075;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sci_fi_aliases() {
        assert_eq!(genre_id("Sci-Fi"), Some(878));
        assert_eq!(genre_id("Science Fiction"), Some(878));
        assert_eq!(genre_name(878), Some("Sci-Fi"));
    }

    #[test]
    fn test_unknown_genres() {
        assert_eq!(genre_id("Polka"), None);
        assert_eq!(genre_name(1), None);
    }

    #[test]
    fn test_tv_only_genres_have_names() {
        assert_eq!(genre_name(10765), Some("Sci-Fi & Fantasy"));
        assert_eq!(genre_name(TALK_GENRE_ID), Some("Talk"));
    }
}
