use anyhow::{Context as _, Error, anyhow};
use cycle_label::HarnessConfig;
use cycle_label::session::PageSession;
use dom::parse_html;
use label_config::{Config, ConfigStore, FileStorage};
use label_editor::EditSubmitter;
use log::info;
use reqwest::Client;
use reqwest::header::COOKIE;
use std::env;
use std::path::Path;
use tokio::fs;
use url::Url;

const USAGE: &str = "usage: cycle_label <page url | html file> [page url for a file]";

/// Fetch an http(s) page, or read a local file and pretend it was served from `as_url`.
async fn load_page(client: &Client, target: &str, as_url: Option<&str>, cookie: Option<&str>) -> Result<(String, Url), Error> {
    if let Ok(url) = Url::parse(target)
        && matches!(url.scheme(), "http" | "https")
    {
        let mut request = client.get(url.clone());
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let response = request.send().await?.error_for_status()?;
        let html = response.text().await?;
        return Ok((html, url));
    }
    let path = Path::new(target);
    let html = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let url = match as_url {
        Some(url) => Url::parse(url)?,
        None => Url::from_file_path(path.canonicalize()?)
            .map_err(|()| anyhow!("Cannot turn {} into a URL", path.display()))?,
    };
    Ok((html, url))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let settings = HarnessConfig::from_env();
    let mut args = env::args().skip(1);
    let target = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let as_url = args.next();

    let config = match &settings.config_path {
        Some(path) => ConfigStore::new(FileStorage::new(path)).get_config().await,
        None => Config::default(),
    };

    let client = Client::new();
    let (html, url) = load_page(&client, &target, as_url.as_deref(), settings.cookie.as_deref()).await?;
    info!("loaded {url} ({} bytes)", html.len());

    let mut doc = parse_html(&html, Some(url))?;
    if let Some(cookie) = &settings.cookie {
        doc.set_cookie(cookie.as_str());
    }
    let session = PageSession::open(doc, &config, EditSubmitter::new(client))?;
    let Some(editor) = session.editor() else {
        info!("page has no editable label sidebar");
        return Ok(());
    };

    #[allow(clippy::print_stdout, reason = "The harness reports to the terminal")]
    {
        for label in session.labels() {
            println!(
                "{:<24} cyclable={:<5} imitated={:<5} next={}",
                label.title,
                label.is_cyclable,
                label.is_imitated,
                label.next_title.as_deref().unwrap_or("-")
            );
        }
        println!("{}", session.document().outer_html(editor.view().sidebar()));
    }
    Ok(())
}
