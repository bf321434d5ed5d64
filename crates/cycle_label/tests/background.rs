//! Navigation filtering and rebinding on configuration changes.

use anyhow::Result;
use cycle_label::background::{Background, NavigationEvent, NavigationEvents, NavigationStatus};
use label_config::{Config, ConfigStore, MemoryStorage};
use url::Url;

fn event(url: &str, status: NavigationStatus) -> Result<NavigationEvent> {
    Ok(NavigationEvent {
        tab_id: 7,
        url: Url::parse(url)?,
        status,
    })
}

#[test]
fn only_completed_issue_and_pull_pages_inject() -> Result<()> {
    let mut hub = NavigationEvents::default();
    let background = Background::register(&mut hub, &Config::default());

    let issue = event("https://github.com/org/repo/issues/3", NavigationStatus::Complete)?;
    let pull = event("https://github.com/org/repo/pull/4", NavigationStatus::Complete)?;
    let loading = event("https://github.com/org/repo/issues/3", NavigationStatus::Loading)?;
    let other_path = event("https://github.com/org/repo/wiki", NavigationStatus::Complete)?;
    let other_host = event("https://gitlab.com/org/repo/issues/3", NavigationStatus::Complete)?;

    assert!(background.handle_navigation(&hub, &issue));
    assert!(background.handle_navigation(&hub, &pull));
    assert!(!background.handle_navigation(&hub, &loading));
    assert!(!background.handle_navigation(&hub, &other_path));
    assert!(!background.handle_navigation(&hub, &other_host));
    Ok(())
}

#[test]
fn unfiltered_listeners_hear_every_completed_navigation() -> Result<()> {
    let mut hub = NavigationEvents::default();
    let handle = hub.add_listener(Vec::new());
    let anywhere = event("https://example.org/", NavigationStatus::Complete)?;
    assert_eq!(hub.dispatch(&anywhere), [handle]);
    assert!(hub.remove_listener(handle));
    assert!(!hub.remove_listener(handle));
    assert!(hub.dispatch(&anywhere).is_empty());
    Ok(())
}

#[tokio::test]
async fn saved_configuration_rebinds_a_single_listener() -> Result<()> {
    let store = ConfigStore::new(MemoryStorage::default());
    let mut changes = store.on_config_changed();
    let mut hub = NavigationEvents::default();
    let mut background = Background::register(&mut hub, &store.get_config().await);
    let first = background.handle();

    let config = Config::from_json(r#"{"labelSetting": {"https://git.example.com": [["a", "b"]]}}"#)?;
    store.save_config(&config).await;
    let change = changes.recv().await?;
    background.apply_change(&mut hub, &change);

    assert!(first.is_some());
    assert_ne!(background.handle(), first);
    assert_eq!(hub.listener_count(), 1);
    assert!(background.should_inject(&Url::parse("https://git.example.com/x/issues/1")?));
    assert!(!background.should_inject(&Url::parse("https://github.com/x/issues/1")?));
    Ok(())
}

#[test]
fn empty_label_setting_injects_nowhere() -> Result<()> {
    let mut hub = NavigationEvents::default();
    let config = Config::from_json(r#"{"labelSetting": {}}"#)?;
    let background = Background::register(&mut hub, &config);

    let anywhere = event("https://bank.example/account", NavigationStatus::Complete)?;
    let issue = event("https://github.com/org/repo/issues/3", NavigationStatus::Complete)?;
    assert!(background.handle().is_none());
    assert_eq!(hub.listener_count(), 0);
    assert!(!background.handle_navigation(&hub, &anywhere));
    assert!(!background.handle_navigation(&hub, &issue));
    assert!(!background.should_inject(&issue.url));
    Ok(())
}

#[test]
fn rebinding_to_an_empty_setting_drops_the_listener() -> Result<()> {
    let mut hub = NavigationEvents::default();
    let mut background = Background::register(&mut hub, &Config::default());
    assert_eq!(hub.listener_count(), 1);

    background.rebind(&mut hub, &Config::from_json(r#"{"labelSetting": {}}"#)?);
    assert_eq!(hub.listener_count(), 0);
    let issue = event("https://github.com/org/repo/issues/3", NavigationStatus::Complete)?;
    assert!(!background.handle_navigation(&hub, &issue));
    Ok(())
}
