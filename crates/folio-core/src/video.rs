// crates/folio-core/src/video.rs
// Video reference parsing: bare IDs and the common YouTube URL shapes

use url::Url;

const ID_LEN: usize = 11;
const EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";

/// A parsed video: 11-character ID plus start offset in seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub id: String,
    pub start: u32,
}

/// What the modal should play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Embed(VideoRef),
    /// Unparsable input, used verbatim as the frame source
    Direct(String),
}

impl VideoSource {
    pub fn resolve(raw: &str) -> Self {
        match VideoRef::parse(raw) {
            Some(video) => VideoSource::Embed(video),
            None => VideoSource::Direct(raw.trim().to_string()),
        }
    }

    pub fn frame_src(&self) -> String {
        match self {
            VideoSource::Embed(video) => video.embed_url(),
            VideoSource::Direct(raw) => raw.clone(),
        }
    }
}

impl VideoRef {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if is_video_id(input) {
            return Some(Self {
                id: input.to_string(),
                start: 0,
            });
        }

        let url = Url::parse(input)
            .ok()
            .filter(|u| u.has_host())
            .or_else(|| Url::parse(&format!("https://{}", input)).ok())?;
        let id = extract_id(&url)?;
        Some(Self {
            id,
            start: extract_start(&url),
        })
    }

    pub fn embed_url(&self) -> String {
        let mut url = format!("{}{}?autoplay=1&rel=0", EMBED_BASE, self.id);
        if self.start > 0 {
            url.push_str(&format!("&start={}", self.start));
        }
        url
    }
}

fn is_video_id(s: &str) -> bool {
    s.len() == ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn extract_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(&host);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = match host {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => match segments.next()? {
            "watch" => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            "shorts" | "embed" | "live" | "v" => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;

    is_video_id(&candidate).then_some(candidate)
}

fn extract_start(url: &Url) -> u32 {
    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == "t" || k == "start")
        .and_then(|(_, v)| parse_timestamp(&v));
    if let Some(start) = from_query {
        return start;
    }

    url.fragment()
        .map(|f| f.strip_prefix("t=").unwrap_or(f))
        .and_then(parse_timestamp)
        .unwrap_or(0)
}

/// Seconds from `90`, `90s`, `1m5s`, `1h2m3s`
pub fn parse_timestamp(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<u32>() {
        return Some(secs);
    }

    let mut total: u32 = 0;
    let mut digits = String::new();
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u32 = digits.parse().ok()?;
        digits.clear();
        let unit = match c.to_ascii_lowercase() {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }
    if !digits.is_empty() {
        total = total.checked_add(digits.parse().ok()?)?;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(input: &str) -> (String, u32) {
        let video = VideoRef::parse(input).expect("parsable");
        (video.id, video.start)
    }

    #[test]
    fn bare_id() {
        assert_eq!(parsed("dQw4w9WgXcQ"), ("dQw4w9WgXcQ".into(), 0));
    }

    #[test]
    fn short_link_with_seconds() {
        assert_eq!(
            parsed("https://youtu.be/dQw4w9WgXcQ?t=90"),
            ("dQw4w9WgXcQ".into(), 90)
        );
    }

    #[test]
    fn watch_url_with_fragment_timestamp() {
        assert_eq!(
            parsed("https://www.youtube.com/watch?v=dQw4w9WgXcQ#1m5s"),
            ("dQw4w9WgXcQ".into(), 65)
        );
    }

    #[test]
    fn shorts_embed_and_start_param() {
        assert_eq!(
            parsed("https://youtube.com/shorts/dQw4w9WgXcQ"),
            ("dQw4w9WgXcQ".into(), 0)
        );
        assert_eq!(
            parsed("https://www.youtube.com/embed/dQw4w9WgXcQ?start=12"),
            ("dQw4w9WgXcQ".into(), 12)
        );
        assert_eq!(
            parsed("https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=1h2m3s"),
            ("dQw4w9WgXcQ".into(), 3723)
        );
        assert_eq!(
            parsed("youtu.be/dQw4w9WgXcQ#t=30s"),
            ("dQw4w9WgXcQ".into(), 30)
        );
    }

    #[test]
    fn unrelated_url_falls_back_to_direct() {
        assert_eq!(VideoRef::parse("https://example.com/not-a-video"), None);
        assert_eq!(
            VideoSource::resolve("https://example.com/not-a-video"),
            VideoSource::Direct("https://example.com/not-a-video".into())
        );
        assert_eq!(
            VideoSource::resolve("https://example.com/not-a-video").frame_src(),
            "https://example.com/not-a-video"
        );
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(VideoRef::parse("https://youtu.be/short"), None);
        assert_eq!(VideoRef::parse("https://www.youtube.com/watch?v=bad!id!here"), None);
    }

    #[test]
    fn embed_url_carries_start() {
        let video = VideoRef {
            id: "dQw4w9WgXcQ".into(),
            start: 65,
        };
        assert_eq!(
            video.embed_url(),
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ?autoplay=1&rel=0&start=65"
        );
    }

    #[test]
    fn timestamps() {
        assert_eq!(parse_timestamp("90"), Some(90));
        assert_eq!(parse_timestamp("90s"), Some(90));
        assert_eq!(parse_timestamp("2m"), Some(120));
        assert_eq!(parse_timestamp("1m5"), Some(65));
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
