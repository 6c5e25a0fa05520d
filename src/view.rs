//! Draws API objects into a terminal window.

use crate::enrich;
use crate::media::DownloadReport;
use crate::response::{ApiResponse, Fields};
use crate::table::{Table, TableOptions};
use crate::text;
use crate::woeid::ScoredLocation;
use chrono::DateTime;
use colored::Colorize;
use indoc::formatdoc;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::io::IsTerminal;

/// The styling context for one invocation.
///
/// Computed once from flags, the environment, and terminal capability,
/// then threaded into rendering; formatting functions never consult
/// ambient state themselves.
#[derive(Clone, Copy, Debug)]
pub struct StyleSheet {
    enabled: bool,
}

impl StyleSheet {
    /// Decides whether to style output: not when `--no-color` was given,
    /// `$NO_COLOR` is set, the terminal is dumb, or stdout is not a tty.
    pub fn detect(no_color: bool) -> Self {
        let enabled = !no_color
            && env::var_os("NO_COLOR").is_none()
            && env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
            && std::io::stdout().is_terminal();
        colored::control::set_override(enabled);
        StyleSheet { enabled }
    }

    /// A stylesheet that never styles. Useful for tests and `--json`.
    pub fn plain() -> Self {
        StyleSheet { enabled: false }
    }

    fn header(&self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.enabled {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

fn headers(style: &StyleSheet, names: &[&str]) -> Vec<String> {
    names.iter().map(|name| style.header(name)).collect()
}

fn table(style: &StyleSheet, names: &[&str]) -> Table {
    let styled = headers(style, names);
    let refs: Vec<&str> = styled.iter().map(String::as_str).collect();
    Table::new(&refs)
}

/// Reformats an RFC 3339 timestamp for display; unparseable input is
/// passed through untouched.
fn created_at(object: &Value) -> String {
    let raw = object.str_field("created_at").unwrap_or_default();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%b %d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn metric(object: &Value, name: &str) -> String {
    object
        .object_field("public_metrics")
        .and_then(|metrics| metrics.u64_field(name))
        .map(|count| count.to_string())
        .unwrap_or_default()
}

/// Structured error details rendered after a table, dimmed.
fn error_lines(response: &ApiResponse, style: &StyleSheet) -> Vec<String> {
    response
        .errors()
        .iter()
        .map(|error| {
            let title = error.str_field("title").unwrap_or("Error");
            let detail = error
                .str_field("detail")
                .or_else(|| error.str_field("message"))
                .unwrap_or_default();
            style.dim(&format!("{title}: {detail}"))
        })
        .collect()
}

/// Renders a user lookup as a table.
pub fn render_users(
    response: &ApiResponse,
    style: &StyleSheet,
    max_width: Option<usize>,
) -> Vec<String> {
    if response.data().is_empty() {
        let mut lines = vec!["No users found.".to_string()];
        lines.extend(error_lines(response, style));
        return lines;
    }

    let mut table = table(style, &["ID", "Username", "Name", "Created", "Followers", "Description"]);
    for user in response.data() {
        table.push_row(vec![
            user.str_field("id").unwrap_or_default().to_string(),
            user.str_field("username").unwrap_or_default().to_string(),
            user.str_field("name").unwrap_or_default().to_string(),
            created_at(user),
            metric(user, "followers_count"),
            text::flatten_whitespace(&text::convert_html_entities(
                user.str_field("description").unwrap_or_default(),
            )),
        ]);
    }

    let mut opts = TableOptions::default().min_widths(&[8, 8, 10, 12, 6, 24]);
    if let Some(width) = max_width {
        opts = opts.max_width(width);
    }
    let mut lines = table.render(&opts);
    lines.extend(error_lines(response, style));
    lines
}

/// Renders a post lookup or search as a table, with t.co tokens
/// rewritten and attachments summarized.
pub fn render_posts(
    response: &ApiResponse,
    style: &StyleSheet,
    max_width: Option<usize>,
) -> Vec<String> {
    if response.data().is_empty() {
        let mut lines = vec!["No posts found.".to_string()];
        lines.extend(error_lines(response, style));
        return lines;
    }

    let media = response.includes("media");
    let media_index = enrich::media_index(&media);
    let authors: HashMap<&str, &str> = response
        .includes("users")
        .iter()
        .filter_map(|user| Some((user.str_field("id")?, user.str_field("username")?)))
        .collect();

    let mut table = table(style, &["ID", "Author", "Created", "Media", "Text"]);
    for post in response.data() {
        let author = post
            .str_field("author_id")
            .map(|id| authors.get(id).map_or(id, |name| *name))
            .unwrap_or_default();
        let body = enrich::rewrite_links(post);
        table.push_row(vec![
            post.str_field("id").unwrap_or_default().to_string(),
            author.to_string(),
            created_at(post),
            enrich::summarize_media(post, &media_index).describe(),
            text::flatten_whitespace(&text::convert_html_entities(&body)),
        ]);
    }

    let mut opts = TableOptions::default().min_widths(&[8, 8, 12, 12, 24]);
    if let Some(width) = max_width {
        opts = opts.max_width(width);
    }
    let mut lines = table.render(&opts);
    lines.extend(error_lines(response, style));
    lines
}

/// Renders trending topics as a table.
pub fn render_trends(
    response: &ApiResponse,
    style: &StyleSheet,
    max_width: Option<usize>,
) -> Vec<String> {
    if response.data().is_empty() {
        return vec!["No trends found.".to_string()];
    }

    let mut table = table(style, &["Trend", "Posts"]);
    for trend in response.data() {
        let name = trend
            .str_field("trend_name")
            .or_else(|| trend.str_field("name"))
            .unwrap_or_default();
        let volume = trend
            .u64_field("tweet_volume")
            .or_else(|| trend.u64_field("post_count"))
            .or_else(|| trend.u64_field("tweet_count"))
            .map(|count| count.to_string())
            .unwrap_or_default();
        table.push_row(vec![name.to_string(), volume]);
    }

    let mut opts = TableOptions::default();
    if let Some(width) = max_width {
        opts = opts.max_width(width);
    }
    table.render(&opts)
}

/// Renders scored location matches as a table.
pub fn render_locations(
    matches: &[ScoredLocation],
    style: &StyleSheet,
    max_width: Option<usize>,
) -> Vec<String> {
    if matches.is_empty() {
        return vec!["No matching locations.".to_string()];
    }

    let mut table = table(style, &["WOEID", "Place", "Country", "Type", "Score"]);
    for scored in matches {
        table.push_row(vec![
            scored.location.woeid.to_string(),
            scored.location.place_name.clone(),
            scored.location.country.clone(),
            scored.location.place_type.clone(),
            scored.score.to_string(),
        ]);
    }

    let mut opts = TableOptions::default();
    if let Some(width) = max_width {
        opts = opts.max_width(width);
    }
    table.render(&opts)
}

/// Renders the outcome of a media download run.
pub fn render_download_report(report: &DownloadReport) -> String {
    let mut out = formatdoc! {"
        Media download into {dir}:
          attempted:  {attempted}
          downloaded: {downloaded}
          failed:     {failed}",
        dir = report.output_dir.display(),
        attempted = report.attempted,
        downloaded = report.downloaded,
        failed = report.failed,
    };
    for error in &report.errors {
        out += &format!("\n  error: {error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::load_data;

    fn response(file: &str) -> ApiResponse {
        ApiResponse::from_value(serde_json::from_str(&load_data(file)).unwrap())
    }

    mod users {
        use super::*;

        #[test]
        fn it_renders_one_row_per_user() {
            let lines = render_users(&response("users_lookup"), &StyleSheet::plain(), None);
            // Header, separator, and two single-line rows.
            assert_eq!(lines.len(), 4);
            assert!(lines[0].starts_with("ID"));
            assert!(lines[2].contains("XDevelopers"));
            assert!(lines[3].contains("jack"));
        }

        #[test]
        fn it_reports_an_empty_lookup() {
            let resp = ApiResponse::from_value(serde_json::json!({"data": []}));
            let lines = render_users(&resp, &StyleSheet::plain(), None);
            assert_eq!(lines, vec!["No users found."]);
        }

        #[test]
        fn it_appends_partial_error_details() {
            let resp = ApiResponse::from_value(serde_json::json!({
                "data": [{"id": "1", "username": "ok", "name": "OK"}],
                "errors": [{"title": "Not Found Error", "detail": "Could not find user nope."}]
            }));
            let lines = render_users(&resp, &StyleSheet::plain(), None);
            assert!(lines.last().unwrap().contains("Could not find user nope."));
        }
    }

    mod posts {
        use super::*;

        #[test]
        fn it_resolves_authors_and_rewrites_links() {
            let lines = render_posts(&response("posts_lookup"), &StyleSheet::plain(), None);
            let row = lines
                .iter()
                .find(|line| line.contains("1228393702244134912"))
                .unwrap();
            assert!(row.contains("XDevelopers"));
            assert!(row.contains("[img1]"));
        }

        #[test]
        fn it_summarizes_attached_media() {
            let lines = render_posts(&response("posts_lookup"), &StyleSheet::plain(), None);
            assert!(lines.iter().any(|line| line.contains("2 photo")));
        }

        #[test]
        fn it_wraps_post_text_to_the_width_budget() {
            let unbounded = render_posts(&response("posts_lookup"), &StyleSheet::plain(), None);
            let bounded =
                render_posts(&response("posts_lookup"), &StyleSheet::plain(), Some(60));
            assert!(bounded.len() > unbounded.len());
        }
    }

    mod trends {
        use super::*;

        #[test]
        fn it_renders_trend_names_and_volumes() {
            let lines = render_trends(&response("trends"), &StyleSheet::plain(), None);
            assert!(lines[0].starts_with("Trend"));
            assert!(lines.iter().any(|line| line.contains("#RustConf")));
        }

        #[test]
        fn it_reports_no_trends() {
            let resp = ApiResponse::from_value(serde_json::json!({"data": []}));
            let lines = render_trends(&resp, &StyleSheet::plain(), None);
            assert_eq!(lines, vec!["No trends found."]);
        }
    }

    mod locations {
        use super::*;
        use crate::woeid::{Location, ScoredLocation};

        #[test]
        fn it_renders_scored_matches() {
            let matches = vec![ScoredLocation {
                location: Location {
                    place_name: "São Paulo".to_string(),
                    country: "Brazil".to_string(),
                    country_code: Some("BR".to_string()),
                    place_type: "Town".to_string(),
                    woeid: 455827,
                },
                score: 224,
            }];
            let lines = render_locations(&matches, &StyleSheet::plain(), None);
            assert!(lines[2].contains("455827"));
            assert!(lines[2].contains("São Paulo"));
            assert!(lines[2].contains("224"));
        }
    }

    mod reports {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn it_renders_counts_and_errors() {
            let report = DownloadReport {
                output_dir: PathBuf::from("media"),
                attempted: 3,
                downloaded: 2,
                failed: 1,
                files: vec![],
                errors: vec!["https://pbs.twimg.com/a.jpg: HTTP 404".to_string()],
            };
            let rendered = render_download_report(&report);
            assert!(rendered.contains("attempted:  3"));
            assert!(rendered.contains("downloaded: 2"));
            assert!(rendered.contains("error: https://pbs.twimg.com/a.jpg: HTTP 404"));
        }
    }
}
