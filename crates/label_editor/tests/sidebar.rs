//! Scanning, rendering, observing, and patching the label sidebar.

mod common;

use anyhow::{Result, anyhow};
use common::{
    config, cycle_buttons, find, imitation_titles, init_logs, page, sidebar, sidebar_inner,
};
use dom::{ObserveOptions, Selector, parse_fragment, parse_html};
use label_editor::view::reconcile;
use label_editor::{
    EditorError, FormSnapshot, LABEL_FIELD, Label, LabelEditor, SIDEBAR_ROOT_MARKER,
    derive_labels, is_sidebar_replaced, serialize_array,
};
use label_config::Lane;

const ORIGIN: &str = "https://github.com";

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn serializer_follows_native_submission_rules() -> Result<()> {
    let doc = parse_html(
        r#"<form id="f">
            <input name="text" value="plain">
            <input name="">
            <input value="nameless">
            <input type="checkbox" name="off" value="x">
            <input type="checkbox" name="on">
            <input type="radio" name="pick" value="a">
            <input type="radio" name="pick" value="b" checked>
            <input type="submit" name="go" value="Go">
            <input type="file" name="upload">
            <input type="image" name="img">
            <input type="reset" name="reset">
            <input type="button" name="btn" value="b">
            <button name="real-button" value="1">x</button>
            <input name="disabled" value="x" disabled>
            <fieldset disabled>
              <legend><input name="legend" value="kept"></legend>
              <input name="fenced" value="dropped">
            </fieldset>
            <textarea name="body">a
b</textarea>
            <select name="many" multiple>
              <option selected>one</option>
              <option value="2">two</option>
              <option value="3" selected>three</option>
              <option value="4" selected disabled>four</option>
            </select>
            <select name="single"><option value="first">1</option><option>second</option></select>
        </form>"#,
        None,
    )?;
    let form = find(&doc, "#f")?;
    assert_eq!(
        serialize_array(&doc, form),
        pairs(&[
            ("text", "plain"),
            ("on", "on"),
            ("pick", "b"),
            ("legend", "kept"),
            ("body", "a\r\nb"),
            ("many", "one"),
            ("many", "3"),
            ("single", "first"),
        ])
    );
    Ok(())
}

#[test]
fn serializer_reflects_current_state() -> Result<()> {
    let mut doc = parse_html(
        r#"<form id="f"><input type="checkbox" name="c" value="x" checked><textarea name="t"></textarea></form>"#,
        None,
    )?;
    let form = find(&doc, "#f")?;
    let checkbox = find(&doc, "[name=c]")?;
    let textarea = find(&doc, "textarea")?;

    assert_eq!(serialize_array(&doc, form), pairs(&[("c", "x"), ("t", "")]));
    doc.set_checked(checkbox, false)?;
    doc.set_value(textarea, "line\r\nbreak\n")?;
    assert_eq!(serialize_array(&doc, form), pairs(&[("t", "line\r\nbreak\r\n")]));
    Ok(())
}

#[test]
fn serializer_keeps_whitespace_only_values() -> Result<()> {
    let doc = parse_html(
        "<form id=\"f\"><textarea name=\"note\">   </textarea>\
         <select name=\"pick\"><option selected>  two   words </option></select></form>",
        None,
    )?;
    let form = find(&doc, "#f")?;
    assert_eq!(
        serialize_array(&doc, form),
        pairs(&[("note", "   "), ("pick", "two words")])
    );
    Ok(())
}

#[test]
fn snapshot_resolves_action_and_drops_label_fields_from_base() -> Result<()> {
    let doc = page(ORIGIN, &["bug", "question"])?;
    let form = find(&doc, ".sidebar-labels form")?;
    let snapshot = FormSnapshot::capture(&doc, form)?;
    assert_eq!(snapshot.method, "post");
    assert_eq!(snapshot.action.as_str(), "https://github.com/org/repo/issues/1/labels");
    assert_eq!(
        snapshot.params,
        pairs(&[
            ("_method", "put"),
            ("authenticity_token", "tok en"),
            (LABEL_FIELD, ""),
            (LABEL_FIELD, "bug"),
            (LABEL_FIELD, "question"),
        ])
    );
    let base: Vec<&(String, String)> = snapshot.base_params().collect();
    assert_eq!(base.len(), 2);

    let relative = parse_html(r#"<form id="f" action=""></form>"#, None)?;
    let err = FormSnapshot::capture(&relative, find(&relative, "#f")?).unwrap_err();
    assert!(matches!(err, EditorError::Dom(_)));
    Ok(())
}

#[test]
fn derived_labels_match_documented_examples() -> Result<()> {
    let lanes = vec![Lane::new(["bug", "wontfix"])?];
    assert_eq!(derive_labels(&["bug"], &lanes), vec![Label {
        title: "bug".to_owned(),
        next_title: Some("wontfix".to_owned()),
        is_cyclable: true,
        is_imitated: false,
    }]);
    let none: [&str; 0] = [];
    assert_eq!(derive_labels(&none, &lanes), vec![Label {
        title: "bug".to_owned(),
        next_title: Some("bug".to_owned()),
        is_cyclable: false,
        is_imitated: true,
    }]);
    Ok(())
}

#[test]
fn attach_renders_buttons_before_anchors_and_placeholders_last() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug", "question"])?;
    let sidebar = sidebar(&doc)?;
    let editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;

    assert_eq!(doc.get_attribute(sidebar, "data-cycle-label-initialized"), Some("true"));
    assert_eq!(editor.presenter().labels(), [
        Label::cyclable("bug", "wontfix"),
        Label::plain("question"),
        Label::imitated("todo"),
    ]);
    assert_eq!(cycle_buttons(&doc)?, [("bug".to_owned(), "wontfix".to_owned())]);
    assert_eq!(imitation_titles(&doc)?, ["todo"]);

    let labels = find(&doc, ".labels")?;
    let order: Vec<String> = doc
        .element_children(labels)
        .into_iter()
        .map(|child| {
            doc.get_attribute(child, "class")
                .unwrap_or_default()
                .to_owned()
        })
        .collect();
    assert_eq!(order, [
        "cycle-button",
        "label cycle-label",
        "label",
        "label imitation-label"
    ]);
    let placeholder = find(&doc, ".imitation-label")?;
    assert_eq!(doc.get_attribute(placeholder, "data-next-title"), Some("todo"));
    assert_eq!(doc.get_attribute(placeholder, "href"), Some("#"));
    Ok(())
}

#[test]
fn pages_outside_the_configuration_get_no_controls() -> Result<()> {
    let mut doc = page("https://gitlab.com", &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    assert_eq!(editor.presenter().labels(), [Label::plain("bug")]);
    assert!(cycle_buttons(&doc)?.is_empty());
    assert!(imitation_titles(&doc)?.is_empty());
    Ok(())
}

#[test]
fn mismatch_aborts_the_render_and_leaves_the_page_alone() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug", "question"])?;
    let sidebar = sidebar(&doc)?;
    let editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    let before = doc.outer_html(sidebar);

    let stale = [Label::cyclable("wontfix", "bug"), Label::imitated("todo")];
    let err = editor.view().update_labels(&mut doc, &stale).unwrap_err();
    assert!(matches!(
        err,
        EditorError::Mismatch { index: 0, ref expected, ref found }
            if expected.as_deref() == Some("wontfix") && found.as_deref() == Some("bug")
    ));
    assert_eq!(doc.outer_html(sidebar), before);
    Ok(())
}

#[test]
fn reconcile_rejects_every_misaligned_shape() -> Result<()> {
    let doc = page(ORIGIN, &["a", "b"])?;
    let anchors: Vec<_> = doc
        .query_all(doc.root(), "a.label")?
        .into_iter()
        .map(|anchor| (anchor, doc.get_attribute(anchor, "title").unwrap_or_default().to_owned()))
        .collect();

    let aligned = [Label::plain("a"), Label::cyclable("b", "c"), Label::imitated("x")];
    assert_eq!(reconcile(&aligned, &anchors)?.len(), 2);

    let imitation_too_early = [Label::plain("a"), Label::imitated("x")];
    assert!(matches!(
        reconcile(&imitation_too_early, &anchors),
        Err(EditorError::Mismatch { index: 1, .. })
    ));

    let missing_anchor = [Label::plain("a"), Label::plain("b"), Label::plain("c")];
    assert!(matches!(
        reconcile(&missing_anchor, &anchors),
        Err(EditorError::Mismatch { index: 2, found: None, .. })
    ));

    let extra_anchor = [Label::plain("a")];
    assert!(matches!(
        reconcile(&extra_anchor, &anchors),
        Err(EditorError::Mismatch { index: 1, expected: None, .. })
    ));
    Ok(())
}

#[test]
fn own_insertions_do_not_retrigger_the_observer() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;

    doc.flush_mutations();
    assert!(!editor.handle_mutations(&mut doc), "render batch is insertion only");

    let note = doc.create_element("div");
    let marker = find(&doc, SIDEBAR_ROOT_MARKER)?;
    doc.append_child(marker, note)?;
    doc.remove(note)?;
    doc.flush_mutations();
    assert!(!editor.handle_mutations(&mut doc), "removing other nodes is not a replacement");
    assert_eq!(cycle_buttons(&doc)?.len(), 1);
    Ok(())
}

#[test]
fn host_rerender_triggers_exactly_one_rederivation() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    doc.flush_mutations();
    editor.handle_mutations(&mut doc);

    // The host swaps in a freshly rendered sidebar and touches other nodes in the same tick.
    let fragment = parse_fragment(&sidebar_inner(&["wontfix", "doing"]))?;
    let fresh_root = fragment
        .first_element()
        .ok_or_else(|| anyhow!("empty fragment"))?;
    let fresh = doc
        .adopt(&fragment.doc, fresh_root)
        .ok_or_else(|| anyhow!("adopt failed"))?;
    let old = find(&doc, SIDEBAR_ROOT_MARKER)?;
    doc.replace_child(old, fresh)?;
    let spinner = doc.create_element("span");
    doc.append_child(sidebar, spinner)?;
    doc.remove(spinner)?;
    assert_eq!(doc.flush_mutations(), 1);

    assert!(editor.handle_mutations(&mut doc));
    assert_eq!(editor.presenter().labels(), [
        Label::cyclable("wontfix", "bug"),
        Label::cyclable("doing", "done"),
    ]);
    assert_eq!(cycle_buttons(&doc)?, [
        ("wontfix".to_owned(), "bug".to_owned()),
        ("doing".to_owned(), "done".to_owned()),
    ]);
    assert!(imitation_titles(&doc)?.is_empty());
    assert_eq!(
        editor.view().form(),
        find(&doc, ".sidebar-labels form")?,
        "form reference is re-acquired"
    );

    doc.flush_mutations();
    assert!(!editor.handle_mutations(&mut doc), "the re-render itself is ignored");
    Ok(())
}

#[test]
fn removal_of_a_marker_ancestor_counts_as_replacement() -> Result<()> {
    let mut doc = page(ORIGIN, &["bug"])?;
    let body = find(&doc, "body")?;
    let container = find(&doc, ".discussion-sidebar")?;
    let marker = Selector::parse(SIDEBAR_ROOT_MARKER)?;
    let mut observer = doc.observe(body, ObserveOptions::child_list_subtree());

    let footer = find(&doc, "#footer")?;
    let extra = doc.create_element("p");
    doc.append_child(footer, extra)?;
    doc.flush_mutations();
    let batches = observer.take_batches();
    assert!(!is_sidebar_replaced(&doc, &marker, &batches[0]));

    doc.remove(container)?;
    doc.flush_mutations();
    let batches = observer.take_batches();
    assert!(is_sidebar_replaced(&doc, &marker, &batches[0]));
    Ok(())
}

#[test]
fn successful_edit_patches_labels_and_rerenders() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug", "question"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    doc.flush_mutations();
    editor.handle_mutations(&mut doc);
    let marker = find(&doc, SIDEBAR_ROOT_MARKER)?;

    editor.complete_edit(&mut doc, Ok(sidebar_inner(&["wontfix", "question"])));

    assert!(editor.presenter().last_error().is_none());
    assert!(editor.presenter().last_sidebar_content().is_some());
    assert_eq!(find(&doc, SIDEBAR_ROOT_MARKER)?, marker, "only the labels section is swapped");
    assert_eq!(editor.presenter().labels(), [
        Label::cyclable("wontfix", "bug"),
        Label::plain("question"),
        Label::imitated("todo"),
    ]);
    assert_eq!(cycle_buttons(&doc)?, [("wontfix".to_owned(), "bug".to_owned())]);
    assert_eq!(imitation_titles(&doc)?, ["todo"]);
    assert_eq!(doc.query_all(sidebar, ".sidebar-labels")?.len(), 1);

    doc.flush_mutations();
    assert!(!editor.handle_mutations(&mut doc), "our own patch keeps the root marker");
    Ok(())
}

#[test]
fn failures_show_a_notice_and_change_nothing_else() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    let labels_before = doc.outer_html(find(&doc, ".sidebar-labels")?);

    editor.complete_edit(&mut doc, Err(EditorError::Status { status: 502 }));
    let notice = doc.element_children(sidebar)[0];
    assert!(doc.has_class(notice, "cycle-label-error"));
    assert!(doc.has_class(notice, "flash-error"));
    assert!(doc.text_content(notice).contains("502"));
    assert_eq!(doc.outer_html(find(&doc, ".sidebar-labels")?), labels_before);

    editor.complete_edit(&mut doc, Ok("<p>Something went wrong</p>".to_owned()));
    assert!(matches!(editor.presenter().last_error(), Some(EditorError::InvalidFragment)));
    assert_eq!(doc.query_all(sidebar, ".cycle-label-error")?.len(), 1, "notice is replaced");
    assert_eq!(doc.outer_html(find(&doc, ".sidebar-labels")?), labels_before);

    let button = find(&doc, ".cycle-button")?;
    let request = editor.handle_click(&mut doc, button);
    assert!(request.is_some());
    assert!(editor.presenter().last_error().is_none());
    assert!(doc.query(sidebar, ".cycle-label-error")?.is_none(), "a new request clears it");
    Ok(())
}

#[test]
fn responses_not_starting_with_the_sidebar_are_rejected() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    let labels_before = doc.outer_html(find(&doc, ".sidebar-labels")?);

    for body in [
        format!("<style>.x {{}}</style>{}", sidebar_inner(&["wontfix"])),
        format!("<meta charset=\"utf-8\">{}", sidebar_inner(&["wontfix"])),
        format!("Error {}", sidebar_inner(&["wontfix"])),
    ] {
        editor.complete_edit(&mut doc, Ok(body));
        assert!(matches!(editor.presenter().last_error(), Some(EditorError::InvalidFragment)));
        assert_eq!(doc.outer_html(find(&doc, ".sidebar-labels")?), labels_before);
    }

    editor.complete_edit(&mut doc, Ok(format!("\n  <!-- partial -->\n{}", sidebar_inner(&["wontfix"]))));
    assert!(editor.presenter().last_error().is_none());
    assert_eq!(cycle_buttons(&doc)?, [("wontfix".to_owned(), "bug".to_owned())]);
    Ok(())
}

#[test]
fn repeated_rerenders_do_not_grow_the_document() -> Result<()> {
    init_logs();
    let mut doc = page(ORIGIN, &["bug"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;
    doc.flush_mutations();
    editor.handle_mutations(&mut doc);

    let mut counts = Vec::new();
    for titles in [["wontfix"], ["bug"], ["wontfix"], ["bug"]] {
        editor.complete_edit(&mut doc, Ok(sidebar_inner(&titles)));
        editor.refresh(&mut doc)?;
        doc.flush_mutations();
        assert!(!editor.handle_mutations(&mut doc));
        counts.push(doc.node_count());
    }
    assert!(counts.windows(2).all(|pair| pair[0] == pair[1]), "node counts: {counts:?}");
    Ok(())
}

#[test]
fn clicks_become_edit_requests() -> Result<()> {
    let mut doc = page(ORIGIN, &["bug", "question"])?;
    let sidebar = sidebar(&doc)?;
    let mut editor = LabelEditor::attach(&mut doc, sidebar, &config(ORIGIN)?)?;

    let button = find(&doc, ".cycle-button")?;
    let cycle = editor
        .handle_click(&mut doc, button)
        .ok_or_else(|| anyhow!("cycle button click ignored"))?;
    assert_eq!(cycle.method, "post");
    assert_eq!(cycle.titles(), ["wontfix", "question"]);
    assert_eq!(
        cycle.body(),
        "_method=put&authenticity_token=tok+en&issue%5Blabels%5D%5B%5D=\
         &issue%5Blabels%5D%5B%5D=wontfix&issue%5Blabels%5D%5B%5D=question"
    );

    let placeholder = find(&doc, ".imitation-label")?;
    let add = editor
        .handle_click(&mut doc, placeholder)
        .ok_or_else(|| anyhow!("imitation click ignored"))?;
    assert_eq!(add.titles(), ["bug", "question", "todo"]);

    let anchor = find(&doc, "a.label[title=question]")?;
    assert!(editor.handle_click(&mut doc, anchor).is_none());

    editor.detach(&mut doc);
    assert!(doc.query(sidebar, ".cycle-button")?.is_some(), "rendered controls stay");
    Ok(())
}
