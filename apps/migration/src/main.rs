//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` from the environment (or `.env`) and accepts the
//! usual sea-orm-migration subcommands: `up`, `down`, `status`, `fresh`.
//! The CLI installs its own tracing subscriber; pass `-v` for debug output.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(migration::Migrator).await;
}
