//! Drives the command-line program.

use crate::media;
use crate::refs::{self, BatchError};
use crate::response::ApiResponse;
use crate::view::{self, StyleSheet};
use crate::woeid::{self, Index};
use crate::x::client::{self, Request};
use crate::x::{Client, Raw, Service, ServiceError, XService};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use log::debug;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for bad input: unusable references, oversized groups,
/// unresolvable locations.
const EXIT_USAGE: i32 = 1;

/// Exit code for runtime failures: transport errors, API errors, an
/// unloadable location index.
const EXIT_RUNTIME: i32 = 2;

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(about = "Looks up and searches X users, posts, and trends", long_about = None)]
pub struct Config {
    #[command(flatten)]
    verbosity: Verbosity,

    /// Print the normalized JSON response instead of a table
    #[arg(long, global = true)]
    json: bool,

    /// Never style output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up users by ID, username, or profile URL
    #[clap(alias = "u")]
    Users {
        /// User references: IDs, usernames (with or without @), or URLs
        #[arg(required = true)]
        refs: Vec<String>,

        /// Comma-separated user fields, replacing the default preset
        #[arg(long, value_name = "LIST")]
        fields: Option<String>,

        /// Print the raw HTTP status, headers, and body
        #[arg(long)]
        raw: bool,
    },

    /// Look up posts by ID or status URL
    #[clap(alias = "p")]
    Posts {
        /// Post references: numeric IDs or status URLs
        #[arg(required = true)]
        refs: Vec<String>,

        /// Comma-separated post fields, replacing the default preset
        #[arg(long, value_name = "LIST")]
        fields: Option<String>,

        /// Print the raw HTTP status, headers, and body
        #[arg(long)]
        raw: bool,

        /// Download media attachments after the lookup
        #[arg(long)]
        download_media: bool,

        /// Directory downloaded media files are written to
        #[arg(long, value_name = "DIR", default_value = media::DEFAULT_OUTPUT_DIR)]
        media_dir: PathBuf,
    },

    /// Search recent posts
    #[clap(alias = "s")]
    Search {
        /// Search query, in the API's query syntax
        query: String,

        /// Number of results to request (10-100)
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: u32,

        /// Comma-separated post fields, replacing the default preset
        #[arg(long, value_name = "LIST")]
        fields: Option<String>,

        /// Print the raw HTTP status, headers, and body
        #[arg(long)]
        raw: bool,
    },

    /// Show trending topics for a location
    Trends {
        /// A numeric WOEID or a free-text place name
        location: String,

        /// Print the raw HTTP status, headers, and body
        #[arg(long)]
        raw: bool,
    },

    /// Search the location index for places trends can be scoped to
    Locations {
        /// Free-text place name
        query: String,

        /// Number of matches to show
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

/// Anything that can end the program unhappily.
#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Refs(#[from] BatchError),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Api(#[from] ServiceError),

    #[error("{0}")]
    Woeid(#[from] woeid::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Refs(_) | CliError::Usage(_) => EXIT_USAGE,
            CliError::Api(_) | CliError::Woeid(_) => EXIT_RUNTIME,
        }
    }
}

/// Runs the command-line program, returning its exit code.
pub async fn run(config: Config) -> i32 {
    env_logger::Builder::new()
        .filter_level(config.verbosity.log_level_filter())
        .init();

    let runner = Runner {
        json: config.json,
        style: StyleSheet::detect(config.no_color),
        width: Some(textwrap::termwidth()),
    };

    match runner.run(&config.command).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

/// Replaces a request's field preset when the user asked for different
/// fields.
fn override_fields(request: Request, key: &str, fields: &Option<String>) -> Request {
    match fields {
        Some(fields) => request.with_param(key, fields.as_str()),
        None => request,
    }
}

/// Executes one parsed command.
#[derive(Debug)]
struct Runner {
    json: bool,
    style: StyleSheet,
    width: Option<usize>,
}

impl Runner {
    async fn run(&self, command: &Command) -> Result<(), CliError> {
        match command {
            Command::Users { refs, fields, raw } => self.run_users(refs, fields, *raw).await,
            Command::Posts {
                refs,
                fields,
                raw,
                download_media,
                media_dir,
            } => {
                self.run_posts(refs, fields, *raw, *download_media, media_dir)
                    .await
            }
            Command::Search {
                query,
                limit,
                fields,
                raw,
            } => self.run_search(query, *limit, fields, *raw).await,
            Command::Trends { location, raw } => self.run_trends(location, *raw).await,
            Command::Locations { query, limit } => self.run_locations(query, *limit).await,
        }
    }

    fn client(&self) -> Result<Client<XService>, CliError> {
        Ok(Client::new(XService::from_env()?))
    }

    async fn run_users(
        &self,
        raw_refs: &[String],
        fields: &Option<String>,
        raw: bool,
    ) -> Result<(), CliError> {
        // Validate the whole argument list before any network call.
        let groups = refs::partition_user_refs(raw_refs)?;
        let mut requests = Vec::new();
        if !groups.ids.is_empty() {
            requests.push(override_fields(client::users_by_ids(&groups.ids), "user.fields", fields));
        }
        if !groups.usernames.is_empty() {
            requests.push(override_fields(
                client::users_by_usernames(&groups.usernames),
                "user.fields",
                fields,
            ));
        }
        debug!(
            "looking up {} ids and {} usernames",
            groups.ids.len(),
            groups.usernames.len()
        );

        let client = self.client()?;
        if raw {
            return self.print_all_raw(&client, &requests).await;
        }

        let mut responses = Vec::new();
        for request in &requests {
            responses.push(client.fetch(request).await?);
        }
        if self.json {
            self.print_json_responses(&responses.iter().collect::<Vec<_>>());
        } else {
            for response in &responses {
                self.print_lines(view::render_users(response, &self.style, self.width));
            }
        }
        Ok(())
    }

    async fn run_posts(
        &self,
        raw_refs: &[String],
        fields: &Option<String>,
        raw: bool,
        download_media: bool,
        media_dir: &PathBuf,
    ) -> Result<(), CliError> {
        let groups = refs::partition_post_refs(raw_refs)?;
        let request = override_fields(client::posts_by_ids(&groups.ids), "tweet.fields", fields);

        let client = self.client()?;
        if raw {
            return self.print_all_raw(&client, &[request]).await;
        }

        let response = client.fetch(&request).await?;
        if self.json {
            self.print_json_responses(&[&response]);
        } else {
            self.print_lines(view::render_posts(&response, &self.style, self.width));
        }

        if download_media {
            let assets = media::collect_assets(&response);
            let http = reqwest::Client::new();
            let report = media::download_all(&http, &assets, media_dir).await;
            println!("{}", view::render_download_report(&report));
        }
        Ok(())
    }

    async fn run_search(
        &self,
        query: &str,
        limit: u32,
        fields: &Option<String>,
        raw: bool,
    ) -> Result<(), CliError> {
        let request = override_fields(client::search_recent(query, limit), "tweet.fields", fields);
        let client = self.client()?;
        if raw {
            return self.print_all_raw(&client, &[request]).await;
        }

        let response = client.fetch(&request).await?;
        if self.json {
            self.print_json_responses(&[&response]);
        } else {
            self.print_lines(view::render_posts(&response, &self.style, self.width));
        }
        Ok(())
    }

    async fn run_trends(&self, location: &str, raw: bool) -> Result<(), CliError> {
        let woeid = self.resolve_location(location).await?;
        let request = client::trends_by_woeid(woeid);

        let client = self.client()?;
        if raw {
            return self.print_all_raw(&client, &[request]).await;
        }

        let response = client.fetch(&request).await?;
        if self.json {
            self.print_json_responses(&[&response]);
        } else {
            self.print_lines(view::render_trends(&response, &self.style, self.width));
        }
        Ok(())
    }

    async fn run_locations(&self, query: &str, limit: usize) -> Result<(), CliError> {
        let index = Index::load().await?;
        let matches = index.search(query, limit);
        if self.json {
            let values: Vec<Value> = matches
                .iter()
                .map(|scored| {
                    serde_json::json!({
                        "location": scored.location,
                        "score": scored.score,
                    })
                })
                .collect();
            self.print_value(&Value::Array(values));
        } else {
            self.print_lines(view::render_locations(&matches, &self.style, self.width));
        }
        Ok(())
    }

    /// Turns a trends location argument into a WOEID: either the number
    /// it already is, or the best fuzzy match from the location index.
    async fn resolve_location(&self, location: &str) -> Result<i64, CliError> {
        if !location.is_empty() && location.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(woeid) = location.parse::<i64>() {
                return Ok(woeid);
            }
        }
        let index = Index::load().await?;
        let best = index.best_match(location).ok_or_else(|| {
            CliError::Usage(format!("No location in the index matches \"{location}\"."))
        })?;
        debug!(
            "resolved \"{location}\" to {} ({}, WOEID {})",
            best.location.place_name, best.location.country, best.location.woeid
        );
        Ok(best.location.woeid)
    }

    async fn print_all_raw<S: Service>(
        &self,
        client: &Client<S>,
        requests: &[Request],
    ) -> Result<(), CliError> {
        for request in requests {
            self.print_raw(client.fetch_raw(request).await?);
        }
        Ok(())
    }

    fn print_raw(&self, raw: Raw) {
        println!("HTTP {}", raw.status);
        for (name, value) in &raw.headers {
            println!("{name}: {value}");
        }
        println!();
        println!("{}", raw.body);
    }

    fn print_json_responses(&self, responses: &[&ApiResponse]) {
        match responses {
            [single] => self.print_value(single.json()),
            many => {
                let values: Vec<Value> =
                    many.iter().map(|response| response.json().clone()).collect();
                self.print_value(&Value::Array(values));
            }
        }
    }

    fn print_value(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("could not serialize response: {err}"),
        }
    }

    fn print_lines(&self, lines: Vec<String>) {
        for line in lines {
            println!("{line}");
        }
    }
}
