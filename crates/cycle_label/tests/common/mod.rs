#![allow(dead_code, reason = "Each test binary uses a different subset of the fixtures")]
use anyhow::{Result, anyhow};
use dom::{Document, NodeId, parse_fragment, parse_html};
use label_config::Config;
use url::Url;

pub const ISSUE_PATH: &str = "/org/repo/issues/1";
pub const LABELS_PATH: &str = "/org/repo/issues/1/labels";

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The host's sidebar markup; `editable` controls whether the label menu is present.
pub fn sidebar_inner(titles: &[&str], editable: bool) -> String {
    let checkboxes: String = titles
        .iter()
        .map(|title| {
            format!(r#"<input type="checkbox" name="issue[labels][]" value="{title}" checked>"#)
        })
        .collect();
    let anchors: String = titles
        .iter()
        .map(|title| format!(r#"<a class="label" title="{title}">{title}</a>"#))
        .collect();
    let menu = if editable {
        format!(
            r#"<div class="label-select-menu"><input type="hidden" name="issue[labels][]" value="">{checkboxes}</div>"#
        )
    } else {
        String::new()
    };
    format!(
        r#"<div id="partial-discussion-sidebar">
             <div class="sidebar-labels">
               <form action="{LABELS_PATH}" method="post">
                 <input type="hidden" name="_method" value="put">
                 {menu}
                 <div class="labels">{anchors}</div>
               </form>
             </div>
           </div>"#
    )
}

pub fn page(origin: &str, titles: &[&str], editable: bool) -> Result<Document> {
    let html = format!(
        r#"<html><body><div class="discussion-sidebar">{}</div></body></html>"#,
        sidebar_inner(titles, editable)
    );
    let url = Url::parse(origin)?.join(ISSUE_PATH)?;
    parse_html(&html, Some(url))
}

pub fn config(origin: &str) -> Result<Config> {
    let text = format!(r#"{{"labelSetting": {{"{origin}": [["bug", "wontfix"], ["todo", "doing", "done"]]}}}}"#);
    Ok(Config::from_json(&text)?)
}

pub fn find(doc: &Document, selector: &str) -> Result<NodeId> {
    doc.query(doc.root(), selector)?
        .ok_or_else(|| anyhow!("missing {selector}"))
}

/// Swap the root marker for a freshly rendered one, the way the host re-renders.
pub fn rerender(doc: &mut Document, titles: &[&str]) -> Result<()> {
    let fragment = parse_fragment(&sidebar_inner(titles, true))?;
    let fresh_root = fragment
        .first_element()
        .ok_or_else(|| anyhow!("empty fragment"))?;
    let fresh = doc
        .adopt(&fragment.doc, fresh_root)
        .ok_or_else(|| anyhow!("adopt failed"))?;
    let old = find(doc, "#partial-discussion-sidebar")?;
    doc.replace_child(old, fresh)?;
    Ok(())
}

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
