// Custom Connections – A word grouping game
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use super::token;

/// Path of the play page, relative to the origin
pub const PLAY_PATH: &'static str = "/play";
/// Path of the creator page
pub const CREATOR_PATH: &'static str = "/";
/// Endpoint of the server that proxies the link shortener
pub const SHORTEN_PATH: &'static str = "/api/shorten";

pub fn share_url(origin: &str, token: &str) -> String {
    format!(
        "{}{}?{}={}",
        origin.trim_end_matches('/'),
        PLAY_PATH,
        token::QUERY_PARAM,
        token,
    )
}

/// Body returned by the shorten endpoint. Only one of `short_url` or
/// `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl ShortenResponse {
    pub fn shortened(short_url: String) -> ShortenResponse {
        ShortenResponse {
            short_url: Some(short_url),
            ..Default::default()
        }
    }

    pub fn error(error: &str, original_url: Option<&str>) -> ShortenResponse {
        ShortenResponse {
            error: Some(error.to_string()),
            original_url: original_url.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Picks the link to share from the body of the shorten response.
/// Anything unexpected falls back to the long URL.
pub fn link_from_response(long_url: &str, body: Option<&str>) -> String {
    body.and_then(|body| {
        serde_json::from_str::<ShortenResponse>(body).ok()
    })
        .and_then(|response| response.short_url)
        .filter(|short_url| !short_url.trim().is_empty())
        .unwrap_or_else(|| long_url.to_string())
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ShareOutcome {
    CopiedShort,
    CopiedOriginal,
    Failed,
}

impl ShareOutcome {
    pub fn new(long_url: &str, shared_url: &str, copied: bool) -> ShareOutcome {
        if !copied {
            ShareOutcome::Failed
        } else if shared_url != long_url {
            ShareOutcome::CopiedShort
        } else {
            ShareOutcome::CopiedOriginal
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            ShareOutcome::CopiedShort => "Short link copied!",
            ShareOutcome::CopiedOriginal => "Link copied!",
            ShareOutcome::Failed => "Share failed!",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn url() {
        assert_eq!(
            &share_url("https://example.com", "abc-_"),
            "https://example.com/play?puzzle=abc-_",
        );
        assert_eq!(
            &share_url("http://localhost:8080/", "x"),
            "http://localhost:8080/play?puzzle=x",
        );
    }

    #[test]
    fn response_json() {
        assert_eq!(
            &serde_json::to_string(
                &ShortenResponse::shortened("https://tiny/x".to_string())
            ).unwrap(),
            "{\"shortUrl\":\"https://tiny/x\"}",
        );
        assert_eq!(
            &serde_json::to_string(
                &ShortenResponse::error("Failed to shorten URL", Some("u"))
            ).unwrap(),
            "{\"error\":\"Failed to shorten URL\",\"originalUrl\":\"u\"}",
        );
        assert_eq!(
            &serde_json::to_string(
                &ShortenResponse::error("URL parameter is required", None)
            ).unwrap(),
            "{\"error\":\"URL parameter is required\"}",
        );
    }

    #[test]
    fn link() {
        let long = "https://example.com/play?puzzle=abc";

        assert_eq!(
            &link_from_response(long, Some("{\"shortUrl\":\"https://t/1\"}")),
            "https://t/1",
        );
        assert_eq!(&link_from_response(long, None), long);
        assert_eq!(&link_from_response(long, Some("not json")), long);
        assert_eq!(
            &link_from_response(
                long,
                Some("{\"error\":\"Failed\",\"originalUrl\":\"x\"}"),
            ),
            long,
        );
        assert_eq!(
            &link_from_response(long, Some("{\"shortUrl\":\" \"}")),
            long,
        );
    }

    #[test]
    fn outcome() {
        assert_eq!(
            ShareOutcome::new("a", "b", true),
            ShareOutcome::CopiedShort,
        );
        assert_eq!(
            ShareOutcome::new("a", "a", true),
            ShareOutcome::CopiedOriginal,
        );
        assert_eq!(ShareOutcome::new("a", "b", false), ShareOutcome::Failed);
        assert_eq!(ShareOutcome::Failed.text(), "Share failed!");
    }
}
