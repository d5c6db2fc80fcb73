//! Print the OpenAPI document, or write it to the path given as first argument.

use std::{env, fs};

use anyhow::Context;
use scoreboard_back::services::documentation::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serializing OpenAPI document")?;

    match env::args().nth(1) {
        Some(path) => fs::write(&path, json).with_context(|| format!("writing `{path}`"))?,
        None => println!("{json}"),
    }
    Ok(())
}
