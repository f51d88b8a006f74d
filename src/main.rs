use anyhow::Result;
use clap::Parser;

mod auth;
mod cli;
mod config;
mod handlers;
mod media;
mod qr;
mod router;
mod schemas;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    model::init_tracing();

    let cli = cli::Cli::parse();
    cli.run().await
}
