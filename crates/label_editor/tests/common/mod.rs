#![allow(dead_code, reason = "Each test binary uses a different subset of the fixtures")]
use anyhow::{Result, anyhow};
use dom::{Document, NodeId, parse_html};
use label_config::Config;
use url::Url;

pub const ISSUE_PATH: &str = "/org/repo/issues/1";

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The inner sidebar the host renders: root marker, label form, and one anchor per title.
pub fn sidebar_inner(titles: &[&str]) -> String {
    let checkboxes: String = titles
        .iter()
        .map(|title| {
            format!(r#"<input type="checkbox" name="issue[labels][]" value="{title}" checked>"#)
        })
        .collect();
    let anchors: String = titles
        .iter()
        .map(|title| format!(r#"<a class="label" title="{title}" href="/org/repo/labels/{title}">{title}</a>"#))
        .collect();
    format!(
        r#"<div id="partial-discussion-sidebar">
             <div class="discussion-sidebar-item sidebar-labels">
               <form action="/org/repo/issues/1/labels" method="POST">
                 <input type="hidden" name="_method" value="put">
                 <input type="hidden" name="authenticity_token" value="tok en">
                 <div class="label-select-menu">
                   <input type="hidden" name="issue[labels][]" value="">
                   {checkboxes}
                   <input type="checkbox" name="issue[labels][]" value="unused">
                   <button type="submit" name="commit">Apply</button>
                 </div>
                 <div class="labels">{anchors}</div>
               </form>
             </div>
             <div class="sidebar-assignee">nobody</div>
           </div>"#
    )
}

/// A full issue page at `origin` + [`ISSUE_PATH`].
pub fn page(origin: &str, titles: &[&str]) -> Result<Document> {
    let html = format!(
        r#"<html><body><div class="discussion-sidebar">{}</div><div id="footer"></div></body></html>"#,
        sidebar_inner(titles)
    );
    let url = Url::parse(origin)?.join(ISSUE_PATH)?;
    parse_html(&html, Some(url))
}

pub fn config(origin: &str) -> Result<Config> {
    let text = format!(r#"{{"labelSetting": {{"{origin}": [["bug", "wontfix"], ["todo", "doing", "done"]]}}}}"#);
    Ok(Config::from_json(&text)?)
}

pub fn sidebar(doc: &Document) -> Result<NodeId> {
    let marker = find(doc, "#partial-discussion-sidebar")?;
    doc.parent_element(marker)
        .ok_or_else(|| anyhow!("root marker has no parent"))
}

pub fn find(doc: &Document, selector: &str) -> Result<NodeId> {
    doc.query(doc.root(), selector)?
        .ok_or_else(|| anyhow!("missing {selector}"))
}

/// `(prev, next)` of every cycle button, in document order.
pub fn cycle_buttons(doc: &Document) -> Result<Vec<(String, String)>> {
    Ok(doc
        .query_all(doc.root(), ".cycle-button")?
        .into_iter()
        .map(|button| {
            (
                doc.get_attribute(button, "data-prev-title").unwrap_or_default().to_owned(),
                doc.get_attribute(button, "data-next-title").unwrap_or_default().to_owned(),
            )
        })
        .collect())
}

pub fn imitation_titles(doc: &Document) -> Result<Vec<String>> {
    Ok(doc
        .query_all(doc.root(), ".imitation-label")?
        .into_iter()
        .map(|label| doc.text_content(label))
        .collect())
}
