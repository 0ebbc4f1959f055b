//! Owned playback state for the music player. Decoding audio is left to
//! whatever front end holds the session; this only tracks what should play.

use streamverse_models::ContentItem;
use tracing::debug;

/// Preview played for tracks that carry no audio URL.
pub const DEMO_AUDIO_URL: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3";

pub const DEFAULT_VOLUME: f32 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    pub current: Option<ContentItem>,
    pub is_playing: bool,
    /// 0-100
    pub progress: f64,
    /// 0.0-1.0
    pub volume: f32,
    /// Seconds, known once the first time update arrives
    pub duration: Option<f64>,
    pub queue: Vec<ContentItem>,
    position: Option<usize>,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current: None,
            is_playing: false,
            progress: 0.0,
            volume: DEFAULT_VOLUME,
            duration: None,
            queue: Vec::new(),
            position: None,
        }
    }
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL the current track streams from.
    pub fn source(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|t| t.audio_url.as_deref().unwrap_or(DEMO_AUDIO_URL))
    }

    /// Replace the queue and start `track` within it.
    pub fn play_queue(&mut self, track: ContentItem, queue: Vec<ContentItem>) {
        self.queue = queue;
        self.play_track(track);
    }

    /// Start `track`, or toggle play/pause if it is already loaded.
    pub fn play_track(&mut self, track: ContentItem) {
        if let Some(index) = self.queue.iter().position(|t| t.id == track.id) {
            self.position = Some(index);
        }

        if self.current.as_ref().is_some_and(|c| c.id == track.id) {
            self.toggle_play();
            return;
        }

        debug!("Loading track {} ({})", track.id, track.audio_url.as_deref().unwrap_or(DEMO_AUDIO_URL));
        self.current = Some(track);
        self.is_playing = true;
        self.progress = 0.0;
        self.duration = None;
    }

    pub fn toggle_play(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.is_playing = !self.is_playing;
    }

    /// Jump to `percent` of the track. Ignored until the duration is known.
    pub fn seek(&mut self, percent: f64) {
        if self.duration.is_some_and(|d| d > 0.0) && percent.is_finite() {
            self.progress = percent.clamp(0.0, 100.0);
        }
    }

    /// Seconds into the track `seek` would land on.
    pub fn position_secs(&self) -> Option<f64> {
        self.duration.map(|d| d * self.progress / 100.0)
    }

    pub fn change_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }

    pub fn on_time_update(&mut self, position_secs: f64, duration_secs: f64) {
        if duration_secs > 0.0 && duration_secs.is_finite() {
            self.duration = Some(duration_secs);
            self.progress = (position_secs / duration_secs * 100.0).clamp(0.0, 100.0);
        }
    }

    /// Stop at the end of the track, then advance when a queue is loaded.
    pub fn on_ended(&mut self) {
        self.is_playing = false;
        if !self.queue.is_empty() {
            self.play_next();
        }
    }

    pub fn play_next(&mut self) {
        self.step(1);
    }

    pub fn play_prev(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, offset: isize) {
        let (Some(index), len) = (self.position, self.queue.len()) else {
            return;
        };
        if len == 0 {
            return;
        }
        let next = (index as isize + offset).rem_euclid(len as isize) as usize;
        let track = self.queue[next].clone();
        self.position = Some(next);
        if self.current.as_ref().is_some_and(|c| c.id == track.id) {
            // single-track queue: restart
            self.is_playing = true;
            self.progress = 0.0;
            return;
        }
        self.play_track(track);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamverse_models::ContentType;

    fn track(id: &str, audio: Option<&str>) -> ContentItem {
        let mut item = ContentItem::new(id, format!("Track {}", id), ContentType::Music);
        item.audio_url = audio.map(str::to_string);
        item
    }

    #[test]
    fn test_play_same_track_toggles() {
        let mut session = PlaybackSession::new();
        session.play_track(track("1", Some("https://a/1.m4a")));
        assert!(session.is_playing);
        assert_eq!(session.source(), Some("https://a/1.m4a"));

        session.play_track(track("1", Some("https://a/1.m4a")));
        assert!(!session.is_playing);
        session.play_track(track("1", Some("https://a/1.m4a")));
        assert!(session.is_playing);
    }

    #[test]
    fn test_new_track_resets_progress_and_uses_demo_fallback() {
        let mut session = PlaybackSession::new();
        session.play_track(track("1", Some("https://a/1.m4a")));
        session.on_time_update(30.0, 120.0);
        assert_eq!(session.progress, 25.0);

        session.play_track(track("2", None));
        assert_eq!(session.progress, 0.0);
        assert_eq!(session.duration, None);
        assert_eq!(session.source(), Some(DEMO_AUDIO_URL));
    }

    #[test]
    fn test_toggle_without_track_is_noop() {
        let mut session = PlaybackSession::new();
        session.toggle_play();
        assert!(!session.is_playing);
    }

    #[test]
    fn test_seek_requires_duration() {
        let mut session = PlaybackSession::new();
        session.play_track(track("1", None));
        session.seek(50.0);
        assert_eq!(session.progress, 0.0);

        session.on_time_update(0.0, 200.0);
        session.seek(50.0);
        assert_eq!(session.progress, 50.0);
        assert_eq!(session.position_secs(), Some(100.0));
        session.seek(150.0);
        assert_eq!(session.progress, 100.0);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.volume, DEFAULT_VOLUME);
        session.change_volume(1.7);
        assert_eq!(session.volume, 1.0);
        session.change_volume(-0.2);
        assert_eq!(session.volume, 0.0);
    }

    #[test]
    fn test_ended_without_queue_stops() {
        let mut session = PlaybackSession::new();
        session.play_track(track("1", None));
        session.on_ended();
        assert!(!session.is_playing);
        assert_eq!(session.current.as_ref().map(|t| t.id.as_str()), Some("1"));
    }

    #[test]
    fn test_queue_advances_and_wraps() {
        let queue = vec![track("a", None), track("b", None), track("c", None)];
        let mut session = PlaybackSession::new();
        session.play_queue(queue[2].clone(), queue.clone());

        session.on_ended();
        assert_eq!(session.current.as_ref().unwrap().id, "a");
        assert!(session.is_playing);

        session.play_prev();
        assert_eq!(session.current.as_ref().unwrap().id, "c");
    }
}
