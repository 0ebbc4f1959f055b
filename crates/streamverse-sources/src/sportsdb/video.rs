use regex::Regex;
use std::sync::LazyLock;

static YOUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("valid regex")
});

const YOUTUBE_ID_LEN: usize = 11;

/// Autoplaying embed URL for a YouTube link, if it carries a well-formed video id.
pub fn youtube_embed_url(url: &str) -> Option<String> {
    let captures = YOUTUBE_ID_RE.captures(url)?;
    let id = captures.get(2)?.as_str();
    if id.len() != YOUTUBE_ID_LEN {
        return None;
    }
    Some(format!("https://www.youtube.com/embed/{}?autoplay=1", id))
}
