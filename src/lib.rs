// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! birdseye is a command-line tool for looking at X (formerly Twitter)
//! from the terminal. It looks up users and posts by ID, username, or
//! URL, searches recent posts, and shows trending topics for a place,
//! rendering everything as terminal-width-aware tables (or raw JSON),
//! and can download the media attached to posts.
//!
//! # Examples
//!
//! Look up users, mixing IDs, usernames, and URLs freely:
//!
//! ```bash
//! birdseye users 2244994945 @jack https://x.com/XDevelopers
//! ```
//!
//! Look up a post from its status URL and download its media:
//!
//! ```bash
//! birdseye posts https://x.com/XDevelopers/status/1228393702244134912 --download-media
//! ```
//!
//! Search recent posts:
//!
//! ```bash
//! birdseye search "from:XDevelopers -is:retweet" -n 25
//! ```
//!
//! Show trending topics for a place, by name or WOEID:
//!
//! ```bash
//! birdseye trends "são paulo"
//! birdseye trends 455827
//! ```
//!
//! Find the WOEID for a place:
//!
//! ```bash
//! birdseye locations "paris"
//! ```
//!
//! Get usage and help for the tool:
//!
//! ```bash
//! birdseye --help
//! ```
//!
//! # API Setup
//!
//! birdseye talks to the X API v2 with app-only authentication. To enable
//! access:
//!
//! 1. Set up a project and app in the [X developer portal].
//! 2. Generate an app-only bearer token.
//! 3. Store the token in your shell's `$X_BEARER_TOKEN` environment
//!    variable. Follow your shell's procedure for configuring environment
//!    variables, but generally this involves running
//!
//!    ```bash
//!    $ export X_BEARER_TOKEN='copied bearer token'
//!    ```
//!
//!    in your shell session or in your shell's configuration ("rc") file
//!    (e.g., `~/.bashrc` or `~/.zshrc`).
//!
//! Only read operations are performed; birdseye never posts, likes, or
//! follows on your behalf.
//!
//! # License
//!
//! birdseye is licensed under the terms of the [Apache License 2.0].
//! Please see the LICENSE file accompanying this source code or visit the
//! previous link for more information on licensing.
//!
//! [Apache License 2.0]: https://www.apache.org/licenses/LICENSE-2.0
//! [X developer portal]: https://developer.x.com/

pub mod cli;
pub mod enrich;
pub mod media;
pub mod refs;
pub mod response;
pub mod table;
pub mod text;
pub mod view;
pub mod woeid;
pub mod x;

#[cfg(test)]
mod test_utils;
