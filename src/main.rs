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

use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use custom_connections::server::{
    self,
    AppState,
    Shortener,
    TinyUrl,
};

#[derive(Parser)]
#[command(name = "custom-connections")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, value_name = "ADDRESS", default_value = "127.0.0.1:8080")]
    address: SocketAddr,
    /// Directory containing the pages and the built wasm package
    #[arg(short, long, value_name = "DIR", default_value = "www")]
    root: PathBuf,
    #[arg(
        long,
        value_name = "URL",
        default_value = server::DEFAULT_SHORTENER_ENDPOINT,
    )]
    shortener_endpoint: String,
    /// Don’t contact the link shortener. Shared links stay long.
    #[arg(long)]
    no_shortener: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let shortener = if cli.no_shortener {
        None
    } else {
        let shortener = TinyUrl::new(cli.shortener_endpoint.as_str())
            .context("failed to create the link shortener client")?;
        Some(Arc::new(shortener) as Arc<dyn Shortener>)
    };

    if !cli.root.is_dir() {
        tracing::warn!(
            root = %cli.root.display(),
            "web root is not a directory",
        );
    }

    let listener = tokio::net::TcpListener::bind(cli.address)
        .await
        .with_context(|| format!("failed to listen on {}", cli.address))?;

    tracing::info!(
        address = %cli.address,
        root = %cli.root.display(),
        shortener = shortener.is_some(),
        "serving",
    );

    axum::serve(listener, server::app(AppState::new(cli.root, shortener)))
        .await
        .context("server failed")
}
