/// Media type support and container sniffing

/// How confident the platform is that it can play a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CanPlayType {
    /// Cannot play
    Empty,
    /// Might be able to play
    Maybe,
    /// Probably can play
    Probably,
}

impl CanPlayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanPlayType::Empty => "",
            CanPlayType::Maybe => "maybe",
            CanPlayType::Probably => "probably",
        }
    }
}

/// Container families the sniffer recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// ISO base media (mp4, mov, m4v)
    IsoBmff,
    /// Matroska / WebM
    Ebml,
    Ogg,
}

/// Answer a `canPlayType`-style query for a MIME type.
/// Codec parameters (`; codecs=...`) are ignored.
pub fn can_play_type(mime_type: &str) -> CanPlayType {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "video/mp4" | "video/webm" | "video/ogg" => CanPlayType::Probably,
        "video/quicktime" | "video/x-m4v" | "video/x-matroska" => CanPlayType::Maybe,
        _ => CanPlayType::Empty,
    }
}

/// Container a MIME type is expected to use
pub fn expected_container(mime_type: &str) -> Option<Container> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "video/mp4" | "video/quicktime" | "video/x-m4v" => Some(Container::IsoBmff),
        "video/webm" | "video/x-matroska" => Some(Container::Ebml),
        "video/ogg" => Some(Container::Ogg),
        _ => None,
    }
}

/// Identify a container from the first bytes of a resource
pub fn sniff_container(head: &[u8]) -> Option<Container> {
    if head.len() >= 8 && &head[4..8] == b"ftyp" {
        return Some(Container::IsoBmff);
    }
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(Container::Ebml);
    }
    if head.starts_with(b"OggS") {
        return Some(Container::Ogg);
    }
    None
}
