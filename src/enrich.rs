//! Makes raw post objects readable.
//!
//! Post text arrives studded with t.co shortener tokens, and media hangs
//! off the response in a separate `includes` array. This module rewrites
//! shortener tokens into semantic placeholders (`[quote]`, `[img1]`, ...)
//! and condenses a post's attachments into a small per-post summary.

use crate::response::Fields;
use counter::Counter;
use itertools::Itertools;
use serde_json::Value;
use std::collections::HashMap;

/// Hosts that serve media previews; a shortened link resolving to one of
/// these is a media link.
const MEDIA_HOSTS: [&str; 3] = ["pbs.twimg.com", "pic.twitter.com", "pic.x.com"];

/// What a post's attachments amount to.
#[derive(Debug, Default, PartialEq)]
pub struct MediaSummary {
    /// Attachments of any kind.
    pub total: usize,

    /// Attachments with a fetchable URL (directly or via a preview image).
    pub downloadable: usize,

    /// Attachment counts keyed by media type.
    pub by_type: Counter<String>,
}

impl MediaSummary {
    /// A short human-readable rendition, e.g. `"2 photo, 1 video (2 downloadable)"`.
    pub fn describe(&self) -> String {
        if self.total == 0 {
            return String::new();
        }
        let kinds = self
            .by_type
            .iter()
            .sorted()
            .map(|(kind, count)| format!("{count} {kind}"))
            .join(", ");
        format!("{kinds} ({} downloadable)", self.downloadable)
    }
}

/// Indexes `includes.media` objects by media key.
pub fn media_index<'a>(media: &[&'a Value]) -> HashMap<String, &'a Value> {
    media
        .iter()
        .filter_map(|item| {
            item.str_field("media_key")
                .map(|key| (key.to_string(), *item))
        })
        .collect()
}

/// Summarizes the attachments of one post against the media index.
pub fn summarize_media(post: &Value, index: &HashMap<String, &Value>) -> MediaSummary {
    let keys = post
        .object_field("attachments")
        .and_then(|attachments| attachments.array_field("media_keys"))
        .map(|keys| keys.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut summary = MediaSummary::default();
    for key in keys {
        let Some(media) = index.get(key) else {
            continue;
        };
        summary.total += 1;
        let kind = media.str_field("type").unwrap_or("unknown");
        summary.by_type[&kind.to_string()] += 1;
        if media.str_field("url").is_some() || media.str_field("preview_image_url").is_some() {
            summary.downloadable += 1;
        }
    }
    summary
}

/// Rewrites the t.co shortener tokens in a post's text.
///
/// Each URL entity attached to the post is classified and its token
/// replaced: links to the post's `quoted` referent become `[quote]`,
/// links to media become `[img1]`, `[img2]`, ... numbered by first
/// occurrence in the text, and anything else is left alone. A token that
/// appears more than once reuses its placeholder. Replacement is literal
/// substring substitution of the token, never pattern-based.
pub fn rewrite_links(post: &Value) -> String {
    let text = post.str_field("text").unwrap_or_default().to_string();
    let Some(entities) = post.object_field("entities") else {
        return text;
    };
    let Some(urls) = entities.array_field("urls") else {
        return text;
    };

    let quoted_id = quoted_post_id(post);

    // Number placeholders by where their token first appears in the text,
    // not by entity order.
    let ordered: Vec<&Value> = urls
        .iter()
        .filter(|entity| entity.str_field("url").is_some())
        .sorted_by_key(|entity| {
            text.find(entity.str_field("url").unwrap_or_default())
                .unwrap_or(usize::MAX)
        })
        .collect();

    let mut rewritten = text.clone();
    let mut assigned: HashMap<&str, String> = HashMap::new();
    let mut images = 0;

    for entity in ordered {
        let token = entity.str_field("url").unwrap_or_default();
        if assigned.contains_key(token) {
            continue;
        }

        let expanded = entity.str_field("expanded_url").unwrap_or_default();
        let display = entity.str_field("display_url").unwrap_or_default();

        // Quote takes precedence over media.
        let placeholder = if let Some(id) = &quoted_id
            && (links_to_status(expanded, id) || links_to_status(display, id))
        {
            "[quote]".to_string()
        } else if is_media_link(expanded) || is_media_link(display) {
            images += 1;
            format!("[img{images}]")
        } else {
            continue;
        };

        rewritten = rewritten.replace(token, &placeholder);
        assigned.insert(token, placeholder);
    }

    rewritten
}

/// The ID of the post this one quotes, if any.
fn quoted_post_id(post: &Value) -> Option<String> {
    post.array_field("referenced_tweets")?
        .iter()
        .find(|referenced| referenced.str_field("type") == Some("quoted"))
        .and_then(|referenced| referenced.str_field("id"))
        .map(String::from)
}

/// True if `link` contains a `/status/<id>` path whose ID is exactly `id`.
fn links_to_status(link: &str, id: &str) -> bool {
    let Some(at) = link.find("/status/") else {
        return false;
    };
    let rest = &link[at + "/status/".len()..];
    let digits: String = rest.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    digits == id
}

/// True if `link` points at a media preview: a known media host, or a
/// `/photo/` or `/video/` path.
fn is_media_link(link: &str) -> bool {
    if link.is_empty() {
        return false;
    }
    let without_scheme = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if MEDIA_HOSTS.contains(&host.to_lowercase().as_str()) {
        return true;
    }
    let path = &without_scheme[host.len()..];
    path.contains("/photo/") || path.contains("/video/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod media_summaries {
        use super::*;

        fn includes() -> Vec<Value> {
            vec![
                json!({"media_key": "3_1", "type": "photo", "url": "https://pbs.twimg.com/a.jpg"}),
                json!({"media_key": "3_2", "type": "photo"}),
                json!({"media_key": "7_1", "type": "video", "preview_image_url": "https://pbs.twimg.com/v.jpg"}),
            ]
        }

        #[test]
        fn it_counts_attachments_by_type() {
            let media = includes();
            let refs: Vec<&Value> = media.iter().collect();
            let index = media_index(&refs);
            let post = json!({"attachments": {"media_keys": ["3_1", "3_2", "7_1"]}});

            let summary = summarize_media(&post, &index);
            assert_eq!(summary.total, 3);
            assert_eq!(summary.downloadable, 2);
            assert_eq!(summary.by_type[&"photo".to_string()], 2);
            assert_eq!(summary.by_type[&"video".to_string()], 1);
        }

        #[test]
        fn it_summarizes_posts_without_attachments() {
            let index = HashMap::new();
            let post = json!({"id": "1", "text": "no media here"});
            let summary = summarize_media(&post, &index);
            assert_eq!(summary, MediaSummary::default());
            assert_eq!(summary.describe(), "");
        }

        #[test]
        fn it_skips_keys_missing_from_the_index() {
            let index = HashMap::new();
            let post = json!({"attachments": {"media_keys": ["3_404"]}});
            let summary = summarize_media(&post, &index);
            assert_eq!(summary.total, 0);
        }

        #[test]
        fn it_describes_itself() {
            let media = includes();
            let refs: Vec<&Value> = media.iter().collect();
            let index = media_index(&refs);
            let post = json!({"attachments": {"media_keys": ["3_1", "3_2", "7_1"]}});
            let summary = summarize_media(&post, &index);
            assert_eq!(summary.describe(), "2 photo, 1 video (2 downloadable)");
        }
    }

    mod link_rewriting {
        use super::*;

        fn post() -> Value {
            json!({
                "id": "100",
                "text": "look at this https://t.co/quoteX and this https://t.co/mediaY plus https://t.co/plainZ",
                "referenced_tweets": [{"type": "quoted", "id": "1228393702244134912"}],
                "entities": {
                    "urls": [
                        {
                            "url": "https://t.co/quoteX",
                            "expanded_url": "https://x.com/someone/status/1228393702244134912",
                            "display_url": "x.com/someone/status\u{2026}"
                        },
                        {
                            "url": "https://t.co/mediaY",
                            "expanded_url": "https://x.com/someone/status/100/photo/1",
                            "display_url": "pic.x.com/abcdef"
                        },
                        {
                            "url": "https://t.co/plainZ",
                            "expanded_url": "https://example.com/article",
                            "display_url": "example.com/article"
                        }
                    ]
                }
            })
        }

        #[test]
        fn it_rewrites_quote_and_media_links_and_leaves_the_rest() {
            let rewritten = rewrite_links(&post());
            assert_eq!(
                rewritten,
                "look at this [quote] and this [img1] plus https://t.co/plainZ"
            );
        }

        #[test]
        fn it_requires_an_exact_status_id_match_for_quotes() {
            let mut post = post();
            post["referenced_tweets"][0]["id"] = json!("122839370224413491");
            let rewritten = rewrite_links(&post);
            // The quoted ID is a prefix of the status path ID, so the
            // first link is not a quote; it is a status link to nothing
            // we know about, and not media either.
            assert!(rewritten.contains("https://t.co/quoteX"));
        }

        #[test]
        fn it_numbers_media_placeholders_by_first_occurrence() {
            let post = json!({
                "id": "100",
                "text": "b https://t.co/bbb a https://t.co/aaa",
                "entities": {
                    "urls": [
                        {
                            "url": "https://t.co/aaa",
                            "expanded_url": "https://pbs.twimg.com/one.jpg",
                            "display_url": "pic.x.com/one"
                        },
                        {
                            "url": "https://t.co/bbb",
                            "expanded_url": "https://pbs.twimg.com/two.jpg",
                            "display_url": "pic.x.com/two"
                        }
                    ]
                }
            });
            assert_eq!(rewrite_links(&post), "b [img1] a [img2]");
        }

        #[test]
        fn it_reuses_a_placeholder_for_a_repeated_token() {
            let post = json!({
                "id": "100",
                "text": "twice https://t.co/mediaY and https://t.co/mediaY",
                "entities": {
                    "urls": [
                        {
                            "url": "https://t.co/mediaY",
                            "expanded_url": "https://pbs.twimg.com/a.jpg",
                            "display_url": "pic.x.com/a"
                        },
                        {
                            "url": "https://t.co/mediaY",
                            "expanded_url": "https://pbs.twimg.com/a.jpg",
                            "display_url": "pic.x.com/a"
                        }
                    ]
                }
            });
            assert_eq!(rewrite_links(&post), "twice [img1] and [img1]");
        }

        #[test]
        fn it_prefers_quote_over_media_for_ambiguous_links() {
            let post = json!({
                "id": "100",
                "text": "see https://t.co/both",
                "referenced_tweets": [{"type": "quoted", "id": "42"}],
                "entities": {
                    "urls": [{
                        "url": "https://t.co/both",
                        "expanded_url": "https://x.com/someone/status/42/photo/1",
                        "display_url": "x.com/someone/status\u{2026}"
                    }]
                }
            });
            assert_eq!(rewrite_links(&post), "see [quote]");
        }

        #[test]
        fn it_leaves_posts_without_entities_untouched() {
            let post = json!({"id": "1", "text": "plain text post"});
            assert_eq!(rewrite_links(&post), "plain text post");
        }

        #[test]
        fn it_recognizes_media_hosts_in_display_urls() {
            assert!(is_media_link("pic.x.com/abc"));
            assert!(is_media_link("https://pbs.twimg.com/media/x.jpg"));
            assert!(is_media_link("https://x.com/u/status/1/video/1"));
            assert!(!is_media_link("https://example.com/photos"));
            assert!(!is_media_link(""));
        }

        #[test]
        fn it_matches_status_ids_exactly() {
            assert!(links_to_status("https://x.com/a/status/42", "42"));
            assert!(links_to_status("https://x.com/a/status/42/photo/1", "42"));
            assert!(!links_to_status("https://x.com/a/status/421", "42"));
            assert!(!links_to_status("https://x.com/a/about", "42"));
        }
    }
}
