// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Classifies free-form user and post references.
//!
//! Almost every birdseye command takes one or more "references": strings
//! that may be a numeric ID, a username (with or without a leading `@`),
//! or a profile or status URL on one of the accepted hosts. Classification
//! is a pure function of the input string -- it performs no I/O, never
//! normalizes case, and always preserves the original input for error
//! messages -- so the command layer can validate an entire argument list
//! before making a single network call.

use itertools::Itertools;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Hostnames recognized in profile and status URLs, after lowercasing
/// and stripping a `www.` prefix.
pub const ACCEPTED_HOSTS: [&str; 2] = ["twitter.com", "x.com"];

/// Path segments that can never be a profile slug.
const RESERVED_SLUGS: [&str; 18] = [
    "home",
    "explore",
    "notifications",
    "messages",
    "settings",
    "search",
    "hashtag",
    "compose",
    "intent",
    "login",
    "logout",
    "signup",
    "tos",
    "privacy",
    "about",
    "jobs",
    "download",
    "i",
];

/// The most distinct values a single lookup group may contain.
pub const MAX_GROUP_SIZE: usize = 100;

/// A classified user or post reference.
///
/// Every input string classifies to exactly one variant; `source` is
/// always the original, unmodified input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ref {
    /// A numeric entity ID.
    Id { value: String, source: String },

    /// A username, normalized to have no leading `@`.
    Username { value: String, source: String },

    /// An input that could not be understood, with a human-readable reason.
    Invalid { source: String, reason: String },
}

impl Ref {
    fn id(value: &str, source: &str) -> Self {
        Ref::Id {
            value: value.to_string(),
            source: source.to_string(),
        }
    }

    fn username(value: &str, source: &str) -> Self {
        Ref::Username {
            value: value.to_string(),
            source: source.to_string(),
        }
    }

    fn invalid(source: &str, reason: &str) -> Self {
        Ref::Invalid {
            source: source.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn username_syntax() -> Regex {
    Regex::new(r"^[A-Za-z0-9_]{1,50}$").unwrap()
}

fn is_numeric_id(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parses a URL and returns it only if its host is one of the
/// [`ACCEPTED_HOSTS`].
fn accepted_url(input: &str) -> Result<Url, Ref> {
    let url = Url::parse(input).map_err(|_| Ref::invalid(input, "Invalid URL."))?;
    let host = url
        .host_str()
        .map(|h| h.to_lowercase())
        .map(|h| h.strip_prefix("www.").map(String::from).unwrap_or(h));
    match host {
        Some(host) if ACCEPTED_HOSTS.contains(&host.as_str()) => Ok(url),
        _ => Err(Ref::invalid(
            input,
            &format!(
                "URL must be on {} or {}.",
                ACCEPTED_HOSTS[0], ACCEPTED_HOSTS[1]
            ),
        )),
    }
}

fn status_id_in_path(path: &str) -> Option<String> {
    let re = Regex::new(r"/status/(\d+)(?:/|$)").unwrap();
    re.captures(path).map(|c| c[1].to_string())
}

fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Classifies a reference to a user: a numeric ID, a username with or
/// without a leading `@`, or a profile/status URL.
pub fn classify_user_ref(input: &str) -> Ref {
    if is_url(input) {
        let url = match accepted_url(input) {
            Ok(url) => url,
            Err(invalid) => return invalid,
        };
        return classify_user_url(&url, input);
    }

    if is_numeric_id(input) {
        return Ref::id(input, input);
    }

    let name = input.strip_prefix('@').unwrap_or(input);
    if username_syntax().is_match(name) {
        Ref::username(name, input)
    } else {
        Ref::invalid(input, "Expected an ID, username, or URL.")
    }
}

fn classify_user_url(url: &Url, source: &str) -> Ref {
    let segments = path_segments(url);

    // A status URL names its author, so prefer the username over whatever
    // reserved segment might lead the path.
    if segments.len() >= 3 && segments[1] == "status" && is_numeric_id(&segments[2]) {
        let author = &segments[0];
        if username_syntax().is_match(author) {
            return Ref::username(author, source);
        }
    }

    if segments.len() >= 3 && segments[0] == "i" && segments[1] == "user" {
        if is_numeric_id(&segments[2]) {
            return Ref::id(&segments[2], source);
        }
    }

    let Some(slug) = segments.first() else {
        return Ref::invalid(source, "Could not determine a username from URL.");
    };
    let slug = percent_decode_str(slug).decode_utf8_lossy().to_string();
    let slug = slug.strip_prefix('@').unwrap_or(&slug).to_string();
    if RESERVED_SLUGS.contains(&slug.to_lowercase().as_str()) {
        return Ref::invalid(source, "Could not determine a username from URL.");
    }
    if username_syntax().is_match(&slug) {
        Ref::username(&slug, source)
    } else {
        Ref::invalid(source, "Could not determine a username from URL.")
    }
}

/// Classifies a reference to a post: a numeric ID or a status URL.
///
/// Post references never classify as [`Ref::Username`].
pub fn classify_post_ref(input: &str) -> Ref {
    if is_url(input) {
        let url = match accepted_url(input) {
            Ok(url) => url,
            Err(invalid) => return invalid,
        };
        return match status_id_in_path(url.path()) {
            Some(id) => Ref::id(&id, input),
            None => Ref::invalid(input, "Could not determine a Post ID from URL."),
        };
    }

    if is_numeric_id(input) {
        Ref::id(input, input)
    } else {
        Ref::invalid(input, "Expected a numeric Post ID or status URL.")
    }
}

/// References partitioned into lookup groups.
///
/// Each group holds distinct values in order of first occurrence.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefGroups {
    pub ids: Vec<String>,
    pub usernames: Vec<String>,
}

/// A batch of references that could not be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// One or more inputs failed classification. Every failure is
    /// reported, not just the first.
    Invalid(Vec<(String, String)>),

    /// A lookup group exceeded [`MAX_GROUP_SIZE`] distinct values.
    GroupTooLarge { group: &'static str, count: usize },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Invalid(entries) => {
                let lines = entries
                    .iter()
                    .map(|(source, reason)| format!("{source}: {reason}"))
                    .join("\n");
                write!(f, "{lines}")
            }
            BatchError::GroupTooLarge { group, count } => write!(
                f,
                "Too many {group}: {count} exceeds the maximum of {MAX_GROUP_SIZE}."
            ),
        }
    }
}

fn partition(inputs: &[String], classify: fn(&str) -> Ref) -> Result<RefGroups, BatchError> {
    let mut groups = RefGroups::default();
    let mut invalid = Vec::new();

    for classified in inputs.iter().map(|input| classify(input)) {
        match classified {
            Ref::Id { value, .. } => groups.ids.push(value),
            Ref::Username { value, .. } => groups.usernames.push(value),
            Ref::Invalid { source, reason } => invalid.push((source, reason)),
        }
    }

    if !invalid.is_empty() {
        return Err(BatchError::Invalid(invalid));
    }

    groups.ids = groups.ids.into_iter().unique().collect();
    groups.usernames = groups.usernames.into_iter().unique().collect();

    if groups.ids.len() > MAX_GROUP_SIZE {
        return Err(BatchError::GroupTooLarge {
            group: "IDs",
            count: groups.ids.len(),
        });
    }
    if groups.usernames.len() > MAX_GROUP_SIZE {
        return Err(BatchError::GroupTooLarge {
            group: "usernames",
            count: groups.usernames.len(),
        });
    }

    Ok(groups)
}

/// Partitions raw user references into ID and username lookup groups.
///
/// All invalid inputs are collected and reported together; each group is
/// deduplicated and capped at [`MAX_GROUP_SIZE`] distinct values.
pub fn partition_user_refs(inputs: &[String]) -> Result<RefGroups, BatchError> {
    partition(inputs, classify_user_ref)
}

/// Partitions raw post references into an ID lookup group.
pub fn partition_post_refs(inputs: &[String]) -> Result<RefGroups, BatchError> {
    partition(inputs, classify_post_ref)
}

#[cfg(test)]
mod tests {
    mod user_refs {
        use super::super::*;

        #[test]
        fn it_classifies_digits_as_an_id() {
            let actual = classify_user_ref("2244994945");
            assert_eq!(actual, Ref::id("2244994945", "2244994945"));
        }

        #[test]
        fn it_classifies_a_bare_username() {
            let actual = classify_user_ref("XDevelopers");
            assert_eq!(actual, Ref::username("XDevelopers", "XDevelopers"));
        }

        #[test]
        fn it_strips_a_leading_at_sign() {
            let actual = classify_user_ref("@XDevelopers");
            assert_eq!(actual, Ref::username("XDevelopers", "@XDevelopers"));
        }

        #[test]
        fn it_preserves_username_case() {
            let actual = classify_user_ref("@XDevelopers");
            let Ref::Username { value, .. } = actual else {
                panic!("expected a username");
            };
            assert_eq!(value, "XDevelopers");
        }

        #[test]
        fn it_accepts_a_fifty_character_username() {
            let name = "a".repeat(50);
            let actual = classify_user_ref(&name);
            assert_eq!(actual, Ref::username(&name, &name));
        }

        #[test]
        fn it_rejects_a_fifty_one_character_username() {
            let name = "a".repeat(51);
            let actual = classify_user_ref(&name);
            assert_eq!(
                actual,
                Ref::invalid(&name, "Expected an ID, username, or URL.")
            );
        }

        #[test]
        fn it_rejects_usernames_with_punctuation() {
            let actual = classify_user_ref("not a user");
            assert_eq!(
                actual,
                Ref::invalid("not a user", "Expected an ID, username, or URL.")
            );
        }

        #[test]
        fn it_classifies_a_profile_url() {
            let source = "https://x.com/XDevelopers";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::username("XDevelopers", source));
        }

        #[test]
        fn it_accepts_www_and_mixed_case_hosts() {
            let source = "https://WWW.Twitter.COM/XDevelopers";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::username("XDevelopers", source));
        }

        #[test]
        fn it_strips_an_at_sign_from_a_profile_slug() {
            let source = "https://x.com/@XDevelopers";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::username("XDevelopers", source));
        }

        #[test]
        fn it_decodes_percent_encoded_slugs() {
            let source = "https://x.com/%40XDevelopers";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::username("XDevelopers", source));
        }

        #[test]
        fn it_resolves_a_status_url_to_its_author() {
            let source = "https://x.com/XDevelopers/status/1228393702244134912";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::username("XDevelopers", source));
        }

        #[test]
        fn it_resolves_an_i_user_url_to_an_id() {
            let source = "https://twitter.com/i/user/2244994945";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::id("2244994945", source));
        }

        #[test]
        fn it_rejects_reserved_slugs() {
            for slug in ["home", "settings", "explore", "i"] {
                let source = format!("https://x.com/{slug}");
                let actual = classify_user_ref(&source);
                assert_eq!(
                    actual,
                    Ref::invalid(&source, "Could not determine a username from URL."),
                    "{slug} should be rejected"
                );
            }
        }

        #[test]
        fn it_rejects_urls_on_other_hosts() {
            let source = "https://example.com/XDevelopers";
            let actual = classify_user_ref(source);
            assert_eq!(
                actual,
                Ref::invalid(source, "URL must be on twitter.com or x.com.")
            );
        }

        #[test]
        fn it_rejects_unparseable_urls() {
            let source = "https://";
            let actual = classify_user_ref(source);
            assert_eq!(actual, Ref::invalid(source, "Invalid URL."));
        }
    }

    mod post_refs {
        use super::super::*;

        #[test]
        fn it_classifies_digits_as_an_id() {
            let actual = classify_post_ref("1228393702244134912");
            assert_eq!(
                actual,
                Ref::id("1228393702244134912", "1228393702244134912")
            );
        }

        #[test]
        fn it_extracts_a_post_id_from_a_status_url() {
            let source = "https://x.com/XDevelopers/status/1228393702244134912";
            let actual = classify_post_ref(source);
            assert_eq!(actual, Ref::id("1228393702244134912", source));
        }

        #[test]
        fn it_extracts_a_post_id_from_a_web_status_url() {
            let source = "https://twitter.com/i/web/status/1228393702244134912";
            let actual = classify_post_ref(source);
            assert_eq!(actual, Ref::id("1228393702244134912", source));
        }

        #[test]
        fn it_ignores_trailing_path_segments() {
            let source = "https://x.com/XDevelopers/status/1228393702244134912/photo/1";
            let actual = classify_post_ref(source);
            assert_eq!(actual, Ref::id("1228393702244134912", source));
        }

        #[test]
        fn it_rejects_urls_without_a_status_path() {
            let source = "https://x.com/XDevelopers";
            let actual = classify_post_ref(source);
            assert_eq!(
                actual,
                Ref::invalid(source, "Could not determine a Post ID from URL.")
            );
        }

        #[test]
        fn it_rejects_usernames() {
            let actual = classify_post_ref("@XDevelopers");
            assert_eq!(
                actual,
                Ref::invalid("@XDevelopers", "Expected a numeric Post ID or status URL.")
            );
        }

        #[test]
        fn it_rejects_urls_on_other_hosts() {
            let source = "https://example.com/user/status/12345";
            let actual = classify_post_ref(source);
            assert_eq!(
                actual,
                Ref::invalid(source, "URL must be on twitter.com or x.com.")
            );
        }
    }

    mod batches {
        use super::super::*;

        fn inputs(raw: &[&str]) -> Vec<String> {
            raw.iter().map(|s| s.to_string()).collect()
        }

        #[test]
        fn it_partitions_mixed_references() {
            let groups = partition_user_refs(&inputs(&[
                "2244994945",
                "@XDevelopers",
                "https://x.com/jack",
            ]))
            .unwrap();
            assert_eq!(groups.ids, vec!["2244994945"]);
            assert_eq!(groups.usernames, vec!["XDevelopers", "jack"]);
        }

        #[test]
        fn it_deduplicates_preserving_first_occurrence() {
            let groups = partition_user_refs(&inputs(&[
                "@jack",
                "@XDevelopers",
                "jack",
                "https://x.com/jack",
            ]))
            .unwrap();
            assert_eq!(groups.usernames, vec!["jack", "XDevelopers"]);
        }

        #[test]
        fn it_collects_every_invalid_entry() {
            let err = partition_user_refs(&inputs(&["ok_user", "not a user", "also bad!"]))
                .unwrap_err();
            let BatchError::Invalid(entries) = err else {
                panic!("expected invalid entries");
            };
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].0, "not a user");
            assert_eq!(entries[1].0, "also bad!");
        }

        #[test]
        fn it_rejects_an_oversized_username_group() {
            let raw: Vec<String> = (0..101).map(|i| format!("user{i}")).collect();
            let err = partition_user_refs(&raw).unwrap_err();
            assert_eq!(
                err,
                BatchError::GroupTooLarge {
                    group: "usernames",
                    count: 101
                }
            );
            assert!(err.to_string().contains("usernames"));
            assert!(err.to_string().contains("101"));
        }

        #[test]
        fn it_accepts_exactly_one_hundred_distinct_values() {
            let raw: Vec<String> = (0..100).map(|i| format!("user{i}")).collect();
            assert!(partition_user_refs(&raw).is_ok());
        }

        #[test]
        fn it_partitions_post_references_into_ids() {
            let groups = partition_post_refs(&inputs(&[
                "1228393702244134912",
                "https://x.com/XDevelopers/status/20",
            ]))
            .unwrap();
            assert_eq!(groups.ids, vec!["1228393702244134912", "20"]);
            assert!(groups.usernames.is_empty());
        }
    }
}
