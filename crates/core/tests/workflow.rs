use std::{fs, path::Path};

use anyhow::Result;
use curator_core::{
    merge::{AuthorOutcome, LabelOutcome, ModOutcome, SaveTarget},
    preview, AppConfig, AuthorMergePolicy, Workspace,
};
use serde_json::{json, Value};
use tempfile::tempdir;

const MOD_REPORTS: &str = "\
Game Shortname: baldursgate3
Mod ID: 123
Status: BROKEN
Reason: Crashes on load
after the latest patch.
Alternative: -

Game Shortname: newvegas
Mod ID: 77
Status: LAME
Reason: Reupload of another author's work
Alternative: https://www.nexusmods.com/newvegas/mods/1
";

fn author_report(reference: &str) -> String {
    format!(
        "Username: SomeAuthor\n\
         Labels: Bug Ignorer\n\
         \n\
         Bug Ignorer:\n  \
         Label: Ignores crash reports\n  \
         Reference: {reference}\n"
    )
}

fn config_in(dir: &Path) -> AppConfig {
    AppConfig {
        mod_status_path: dir.join("mod-status.json"),
        author_status_path: dir.join("author-status.json"),
        ..AppConfig::default()
    }
}

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

#[test]
fn mod_reports_save_then_repeat_is_duplicate() -> Result<()> {
    let dir = tempdir()?;
    let config = config_in(dir.path());
    let (mut workspace, _) = Workspace::open(&config);

    let parsed = workspace.parse_mod_reports(MOD_REPORTS);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.dropped, 0);

    let first = workspace.save_mod_reports(&parsed.records)?;
    assert_eq!(first.added().count(), 2);
    assert_eq!(first.target, SaveTarget::Written(config.mod_status_path.clone()));

    let saved = read_json(&config.mod_status_path)?;
    assert_eq!(saved["Mod Statuses"]["baldursgate3"]["BROKEN"], json!(["123"]));
    assert_eq!(
        saved["Mod Descriptors"]["baldursgate3"]["123"],
        json!({"reason": "Crashes on load\nafter the latest patch.", "alternative": null})
    );
    assert_eq!(
        saved["Mod Descriptors"]["newvegas"]["77"]["alternative"],
        json!("https://www.nexusmods.com/newvegas/mods/1")
    );

    let (mut reopened, warnings) = Workspace::open(&config);
    assert!(warnings.iter().all(|warning| warning.is_not_found()));
    let before = reopened.mod_status().clone();
    let again = reopened.parse_mod_reports(MOD_REPORTS);
    let second = reopened.save_mod_reports(&again.records)?;

    assert!(second
        .entries
        .iter()
        .all(|entry| entry.outcome == ModOutcome::Duplicate));
    assert_eq!(second.target, SaveTarget::Unsaved);
    assert_eq!(reopened.mod_status(), &before);
    assert_eq!(read_json(&config.mod_status_path)?, saved);
    Ok(())
}

#[test]
fn conflicting_reason_keeps_existing_descriptor() -> Result<()> {
    let dir = tempdir()?;
    let config = config_in(dir.path());
    let (mut workspace, _) = Workspace::open(&config);
    let parsed = workspace.parse_mod_reports(MOD_REPORTS);
    workspace.save_mod_reports(&parsed.records)?;
    let saved = read_json(&config.mod_status_path)?;

    let changed = workspace.parse_mod_reports(
        "Game Shortname: baldursgate3\nMod ID: 123\nStatus: BROKEN\nReason: Something else",
    );
    let summary = workspace.save_mod_reports(&changed.records)?;

    assert_eq!(summary.conflicts().count(), 1);
    assert!(summary.to_string().contains("Reason: Crashes on load"));
    assert_eq!(read_json(&config.mod_status_path)?, saved);
    Ok(())
}

#[test]
fn changed_reference_updates_single_label_entry() -> Result<()> {
    let dir = tempdir()?;
    let config = config_in(dir.path());
    let (mut workspace, _) = Workspace::open(&config);

    let first = workspace.parse_author_reports(&author_report("https://example.test/a"));
    let summary = workspace.save_author_reports(&first.records)?;
    assert_eq!(summary.added_count(), 1);

    let second = workspace.parse_author_reports(&author_report("https://example.test/b"));
    let summary = workspace.save_author_reports(&second.records)?;
    assert_eq!(summary.updated_count(), 1);
    assert!(matches!(
        &summary.entries[0].outcome,
        AuthorOutcome::Labels(labels)
            if matches!(labels.as_slice(), [(label, LabelOutcome::Updated { .. })] if label == "Bug Ignorer")
    ));

    let saved = read_json(&config.author_status_path)?;
    assert_eq!(saved["Labels"]["Bug Ignorer"]["authors"], json!(["SomeAuthor"]));
    assert_eq!(
        saved["Tooltips"]["SomeAuthor"],
        json!({"Bug Ignorer": {
            "label": "Ignores crash reports",
            "referenceLink": "https://example.test/b"
        }})
    );
    Ok(())
}

#[test]
fn whole_record_policy_skips_known_author() -> Result<()> {
    let dir = tempdir()?;
    let config = AppConfig {
        author_merge: AuthorMergePolicy::WholeRecord,
        ..config_in(dir.path())
    };
    let (mut workspace, _) = Workspace::open(&config);

    let first = workspace.parse_author_reports(&author_report("https://example.test/a"));
    workspace.save_author_reports(&first.records)?;
    let saved = read_json(&config.author_status_path)?;

    let second = workspace.parse_author_reports(&author_report("https://example.test/b"));
    let summary = workspace.save_author_reports(&second.records)?;
    assert!(matches!(
        summary.entries[0].outcome,
        AuthorOutcome::Conflict { tooltips_differ: true, .. }
    ));
    assert_eq!(summary.target, SaveTarget::Unsaved);
    assert_eq!(read_json(&config.author_status_path)?, saved);
    Ok(())
}

#[test]
fn untouched_documents_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let config = config_in(dir.path());
    let mods = json!({
        "Mod Statuses": {"skyrimspecialedition": {"CAUTION": ["9", "3"]}},
        "Mod Descriptors": {"skyrimspecialedition": {"9": {"reason": "Dirty edits", "alternative": null, "note": 1}}},
        "Keyword Rules": {"global": {"BROKEN": ["crash"]}},
        "Schema": 2
    });
    let authors = json!({
        "Labels": {"Paywaller": {"authors": ["zed", "amy"], "icon": "💰"}, "Incident": {}},
        "Tooltips": {"zed": {"Paywaller": {"label": null, "referenceLink": "https://x.test", "seen": true}}}
    });
    fs::write(&config.mod_status_path, serde_json::to_string(&mods)?)?;
    fs::write(&config.author_status_path, serde_json::to_string(&authors)?)?;

    let (mut workspace, warnings) = Workspace::open(&config);
    assert!(warnings.is_empty());

    let report = workspace.parse_mod_reports(
        "Game Shortname: newvegas\nMod ID: 5\nStatus: ABANDONED",
    );
    workspace.save_mod_reports(&report.records)?;

    let mut expected = mods;
    expected["Mod Statuses"]["newvegas"] = json!({"ABANDONED": ["5"]});
    expected["Mod Descriptors"]["newvegas"] = json!({"5": {"alternative": null}});
    assert_eq!(read_json(&config.mod_status_path)?, expected);

    let written = fs::read_to_string(&config.mod_status_path)?;
    let keys = ["Mod Statuses", "Mod Descriptors", "Keyword Rules", "Schema"];
    let positions: Vec<usize> = keys
        .iter()
        .filter_map(|key| written.find(&format!("\"{key}\"")))
        .collect();
    assert_eq!(positions.len(), keys.len());
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    assert_eq!(workspace.author_status().label_names(), ["Incident", "Paywaller"]);
    Ok(())
}

#[test]
fn preview_shows_parsed_reports() -> Result<()> {
    let dir = tempdir()?;
    let (workspace, _) = Workspace::open(&config_in(dir.path()));
    let parsed = workspace.parse_author_reports(&author_report("-"));

    let text = preview::author_reports(&parsed.records);
    assert!(text.starts_with("Username: SomeAuthor\nLabels: Bug Ignorer\n"));
    assert!(text.contains("  Label: Ignores crash reports\n  Reference: None\n"));
    Ok(())
}
