//! Working out what each download variant is for.
//!
//! The backend does not say which variant is the HLS master playlist and which
//! one is the poster image, so it is guessed from the content type, then the
//! quality label, then the URL. A per-variant role field on the server would
//! make this unnecessary.

use crate::api::types::DownloadVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantRole {
    /// HLS master playlist, fed to the player
    Manifest,
    /// Thumbnail used as the player poster
    Poster,
    /// Any other transcoded output
    Rendition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSources {
    pub master_url: Option<String>,
    pub poster_url: Option<String>,
}

pub fn classify_variant(variant: &DownloadVariant) -> VariantRole {
    let content_type = variant.content_type.to_ascii_lowercase();
    if content_type.contains("mpegurl") {
        return VariantRole::Manifest;
    }
    if content_type.contains("image") {
        return VariantRole::Poster;
    }

    let quality = variant.quality.to_ascii_lowercase();
    if quality.contains("master") {
        return VariantRole::Manifest;
    }
    if quality.contains("thumbnail") {
        return VariantRole::Poster;
    }

    let url = variant.url.to_ascii_lowercase();
    if url.contains("master.m3u8") {
        return VariantRole::Manifest;
    }
    if url.contains("thumb") {
        return VariantRole::Poster;
    }

    VariantRole::Rendition
}

/// First manifest and first poster in server order
pub fn select_playback(variants: &[DownloadVariant]) -> PlaybackSources {
    let find = |role: VariantRole| {
        variants.iter()
            .find(|v| classify_variant(v) == role)
            .map(|v| v.url.clone())
    };

    PlaybackSources {
        master_url: find(VariantRole::Manifest),
        poster_url: find(VariantRole::Poster),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(quality: &str, url: &str, content_type: &str) -> DownloadVariant {
        DownloadVariant {
            quality: quality.to_string(),
            url: url.to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn test_content_type_wins_over_label() {
        let v = variant("master", "https://cdn/poster.jpg", "image/jpeg");
        assert_eq!(classify_variant(&v), VariantRole::Poster);

        let v = variant("thumbnail", "https://cdn/x", "application/x-mpegURL");
        assert_eq!(classify_variant(&v), VariantRole::Manifest);
    }

    #[test]
    fn test_label_then_url() {
        let v = variant("Master", "https://cdn/a", "application/octet-stream");
        assert_eq!(classify_variant(&v), VariantRole::Manifest);

        let v = variant("720p", "https://cdn/video/master.m3u8?sig=1", "application/octet-stream");
        assert_eq!(classify_variant(&v), VariantRole::Manifest);

        let v = variant("small", "https://cdn/thumbs/1.bin", "application/octet-stream");
        assert_eq!(classify_variant(&v), VariantRole::Poster);

        let v = variant("720p", "https://cdn/720p.mp4", "video/mp4");
        assert_eq!(classify_variant(&v), VariantRole::Rendition);
    }

    #[test]
    fn test_select_playback_picks_first_matches() {
        let variants = vec![
            variant("1080p", "https://cdn/1080p.mp4", "video/mp4"),
            variant("hls", "https://cdn/master.m3u8", "application/vnd.apple.mpegurl"),
            variant("thumbnail", "https://cdn/thumb.jpg", "image/jpeg"),
            variant("hls-alt", "https://cdn/alt/master.m3u8", "application/vnd.apple.mpegurl"),
        ];

        let sources = select_playback(&variants);
        assert_eq!(sources.master_url.as_deref(), Some("https://cdn/master.m3u8"));
        assert_eq!(sources.poster_url.as_deref(), Some("https://cdn/thumb.jpg"));
    }

    #[test]
    fn test_select_playback_without_manifest() {
        let variants = vec![variant("720p", "https://cdn/720p.mp4", "video/mp4")];
        assert_eq!(select_playback(&variants), PlaybackSources::default());
    }
}
