//! Extracts media file references from Anki note markup
//!
//! Supports:
//! - HTML images: `<img src="cat.png">` (single or double quotes)
//! - Sound directives: `[sound:audio.mp3]`
//! - Markdown images: `![alt](assets/cat.png)`
//!
//! Every reference is reduced to a bare filename: query string stripped,
//! directories dropped, percent-escapes decoded. Remote images (`http://`,
//! `https://`, `data:`) are not media the vault can provide and are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IMG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["'][^>]*>"#).unwrap());

static SOUND_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\[sound:([^\]]+)\]").unwrap());

static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").unwrap());

/// URL prefixes that mark a reference as remote rather than a local file.
const REMOTE_PREFIXES: &[&str] = &["http://", "https://", "data:"];

/// A set of media filenames that remembers discovery order.
///
/// Iteration yields each filename once, at the position where it was first
/// inserted, so batches built from the set are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filename. Returns false if it was already present.
    pub fn insert(&mut self, filename: impl Into<String>) -> bool {
        let filename = filename.into();
        if self.seen.contains(&filename) {
            return false;
        }
        self.seen.insert(filename.clone());
        self.order.push(filename);
        true
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.seen.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Filenames in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Filenames in `self` that are not in `other`, keeping discovery order.
    pub fn difference(&self, other: &HashSet<String>) -> MediaSet {
        self.iter()
            .filter(|name| !other.contains(*name))
            .map(str::to_string)
            .collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl FromIterator<String> for MediaSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = MediaSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// Extract all distinct media filenames referenced by a sequence of field texts.
pub fn extract_media<'a, I>(fields: I) -> MediaSet
where
    I: IntoIterator<Item = &'a str>,
{
    let mut media = MediaSet::new();
    for text in fields {
        extract_from_text(text, &mut media);
    }
    media
}

/// Add every media filename referenced in `text` to `media`.
///
/// Each pattern is applied over the whole text, in order: HTML images,
/// sound directives, markdown images.
pub fn extract_from_text(text: &str, media: &mut MediaSet) {
    for caps in IMG_TAG.captures_iter(text) {
        add_local(&caps[1], media);
    }

    for caps in SOUND_TAG.captures_iter(text) {
        if let Some(name) = bare_filename(&caps[1]) {
            media.insert(name);
        }
    }

    for caps in MARKDOWN_IMAGE.captures_iter(text) {
        add_local(&caps[1], media);
    }
}

fn add_local(raw: &str, media: &mut MediaSet) {
    if is_remote_url(raw) {
        return;
    }
    if let Some(name) = bare_filename(raw) {
        media.insert(name);
    }
}

/// Whether a captured reference points at a remote resource.
pub fn is_remote_url(raw: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Reduce a captured reference to a bare, decoded filename.
///
/// Returns None when nothing but whitespace is left.
pub fn bare_filename(raw: &str) -> Option<String> {
    let without_query = raw.split('?').next().unwrap_or_default();
    let segment = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    // A segment whose escapes don't decode to UTF-8 is kept as written
    let name = match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    };

    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<String> {
        extract_media([text]).into_vec()
    }

    #[test]
    fn extract_html_image() {
        assert_eq!(extract(r#"<img src="cat.png">"#), vec!["cat.png"]);
        assert_eq!(extract("<img class='x' src='dog.jpg' />"), vec!["dog.jpg"]);
        assert_eq!(extract(r#"<IMG SRC="upper.gif">"#), vec!["upper.gif"]);
    }

    #[test]
    fn skip_remote_images() {
        assert!(extract(r#"<img src="http://x/y.png">"#).is_empty());
        assert!(extract(r#"<img src="https://example.com/a.png">"#).is_empty());
        assert!(extract(r#"<img src="data:image/png;base64,AAAA">"#).is_empty());
        assert!(extract("![remote](https://example.com/pic.jpg)").is_empty());
    }

    #[test]
    fn percent_decode_filenames() {
        assert_eq!(extract(r#"<img src="foo%20bar.png">"#), vec!["foo bar.png"]);
        assert_eq!(extract("[sound:caf%C3%A9.mp3]"), vec!["café.mp3"]);
    }

    #[test]
    fn undecodable_escape_kept_as_written() {
        assert_eq!(extract(r#"<img src="bad%FF.png">"#), vec!["bad%FF.png"]);
    }

    #[test]
    fn extract_sound_directive() {
        assert_eq!(extract("[sound:audio1.mp3]"), vec!["audio1.mp3"]);
    }

    #[test]
    fn sound_directive_keeps_url_like_names() {
        // Only image references are filtered for remote URLs
        assert_eq!(extract("[sound:http://host/clip.mp3]"), vec!["clip.mp3"]);
    }

    #[test]
    fn markdown_image_strips_query_and_path() {
        assert_eq!(extract("![alt](../assets/pic.jpg?v=2)"), vec!["pic.jpg"]);
        assert_eq!(extract(r"![](C:\media\win.png)"), vec!["win.png"]);
    }

    #[test]
    fn all_matches_in_a_field_are_found() {
        let text = r#"<img src="a.png"> text <img src="b.png"> [sound:c.mp3] [sound:d.mp3] ![](e.png) ![](f.png)"#;
        assert_eq!(
            extract(text),
            vec!["a.png", "b.png", "c.mp3", "d.mp3", "e.png", "f.png"]
        );
    }

    #[test]
    fn patterns_apply_in_fixed_order() {
        let text = r#"![](md.png) [sound:s.mp3] <img src="html.png">"#;
        assert_eq!(extract(text), vec!["html.png", "s.mp3", "md.png"]);
    }

    #[test]
    fn drop_empty_names() {
        assert!(extract(r#"<img src="folder/">"#).is_empty());
        assert!(extract("[sound:   ]").is_empty());
        assert!(extract("![x](?only=query)").is_empty());
    }

    #[test]
    fn no_matches_contribute_nothing() {
        assert!(extract("Just some text with no media").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn dedupes_across_fields_in_discovery_order() {
        let media = extract_media([
            r#"<img src="b.png">"#,
            "[sound:a.mp3]",
            r#"<img src="dir/b.png">"#,
        ]);
        assert_eq!(media.len(), 2);
        assert_eq!(media.iter().collect::<Vec<_>>(), vec!["b.png", "a.mp3"]);
    }

    #[test]
    fn extraction_is_idempotent() {
        let fields = [r#"<img src="x.png"> [sound:y.mp3]"#, "![](z.gif)"];
        assert_eq!(extract_media(fields), extract_media(fields));
    }

    #[test]
    fn difference_excludes_remote_names() {
        let refs: MediaSet = ["a.png", "b.png", "c.png"]
            .into_iter()
            .map(String::from)
            .collect();
        let remote: HashSet<String> = ["b.png".to_string(), "zzz.png".to_string()].into();

        let missing = refs.difference(&remote);

        assert_eq!(missing.iter().collect::<Vec<_>>(), vec!["a.png", "c.png"]);
        assert!(missing.iter().all(|name| refs.contains(name)));
        assert!(missing.iter().all(|name| !remote.contains(name)));
    }

    #[test]
    fn remote_url_check_is_case_insensitive() {
        assert!(is_remote_url("HTTPS://example.com/a.png"));
        assert!(is_remote_url("Data:image/png;base64,AA"));
        assert!(!is_remote_url("httpfoo.png"));
        assert!(!is_remote_url("ht"));
    }

    #[test]
    fn bare_filename_reduction() {
        assert_eq!(bare_filename("a/b/c.png?x=1?y=2"), Some("c.png".to_string()));
        assert_eq!(bare_filename(r"a\b\c.png"), Some("c.png".to_string()));
        assert_eq!(bare_filename(""), None);
    }
}
