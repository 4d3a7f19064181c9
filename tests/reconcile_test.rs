//! End-to-end reconciliation runs against an in-memory share table

mod common;

use std::cell::RefCell;
use std::path::PathBuf;

use common::{windows, FakeShareSystem, UnlaunchableRunner};
use sage_helper::{always_apply, Aktion, ReconcileOptions, Reconciler};
use tempfile::TempDir;

fn test_base() -> (TempDir, PathBuf, String) {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("SystemAG");
    let base_str = base.to_string_lossy().to_string();
    (temp, base, base_str)
}

fn reject_all(_diff: &str) -> bool {
    false
}

#[test]
fn test_fresh_system_creates_folders_and_shares() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german();
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();

    assert_eq!(outcome.folders.created.len(), 11);
    assert!(base.join("Installation").join("Lizenzen").is_dir());
    assert_eq!(outcome.principal_candidates[0], "Jeder");

    let results = &outcome.protocol.ergebnisse;
    assert_eq!(results.len(), 3);
    for result in results {
        assert!(result.erfolg, "{}", result.meldung);
        assert_eq!(result.aktion, Aktion::Create);
        assert_eq!(result.principal, "Jeder");
        assert!(result.nachher.as_ref().unwrap().existiert);
    }
    assert_eq!(system.mutating_calls().len(), 3);
    assert_eq!(
        system.share("AddinsOL$").unwrap().path,
        windows(&base.join("AddinsOL"))
    );

    let flags = outcome.protocol.abschluss;
    assert!(!flags.ordner_bereits_vorhanden);
    assert!(flags.freigaben_geaendert);
    assert!(!flags.keine_aktion_noetig);
}

#[test]
fn test_second_run_changes_nothing() {
    let (_temp, _base, base_str) = test_base();
    let system = FakeShareSystem::german();
    let reconciler = Reconciler::new(&system);
    let options = ReconcileOptions::new(&base_str);

    reconciler.run(&options, always_apply).unwrap();
    system.clear_calls();

    let outcome = reconciler
        .run(&options, |_| panic!("nothing to confirm"))
        .unwrap();

    assert!(system.mutating_calls().is_empty());
    assert!(outcome
        .protocol
        .ergebnisse
        .iter()
        .all(|r| r.erfolg && r.aktion == Aktion::Noop));
    assert!(outcome.folders.already_complete());
    assert!(outcome.protocol.abschluss.keine_aktion_noetig);
    assert_eq!(
        outcome.protocol.abschlussmeldungen[0],
        "Ordner vorhanden: ja (Struktur war bereits vollständig)."
    );
}

#[test]
fn test_already_correct_shares_issue_no_mutation() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german()
        .with_share("SystemAG$", &windows(&base), &[("Jeder", "ÄNDERN")])
        .with_share(
            "AddinsOL$",
            &windows(&base.join("AddinsOL")),
            &[("VORDEFINIERT\\Administratoren", "VOLLZUGRIFF"), ("Jeder", "VOLLZUGRIFF")],
        )
        .with_share(
            "LiveupdateOL$",
            &windows(&base.join("LiveupdateOL")),
            &[("Everyone", "CHANGE")],
        );
    let reconciler = Reconciler::new(&system);

    let preview = reconciler.preview(&base_str, &[]).unwrap();
    assert!(preview.plan.iter().all(|e| e.aktion == Aktion::Noop));

    system.clear_calls();
    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), |_| panic!("nothing to confirm"))
        .unwrap();

    // only the read-only SID translation and the three queries
    assert!(system.mutating_calls().is_empty());
    assert_eq!(system.calls().len(), 4);
    for result in &outcome.protocol.ergebnisse {
        assert_eq!(result.vorher, result.nachher);
    }
}

#[test]
fn test_missing_share_recreated_with_fallback_principal() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::english_without_powershell()
        .with_unresolvable("Everyone")
        .with_share(
            "AddinsOL$",
            &windows(&base.join("AddinsOL")),
            &[("Jeder", "ÄNDERN")],
        )
        .with_share(
            "LiveupdateOL$",
            &windows(&base.join("LiveupdateOL")),
            &[("Jeder", "ÄNDERN")],
        );
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();

    let system_ag = &outcome.protocol.ergebnisse[0];
    assert_eq!(system_ag.name, "SystemAG$");
    assert!(system_ag.erfolg);
    assert_eq!(system_ag.aktion, Aktion::Create);
    assert_eq!(system_ag.principal, "Jeder");
    assert_eq!(outcome.protocol.plan[0].begruendung, "Freigabe fehlt");

    let grants: Vec<String> = system
        .mutating_calls()
        .iter()
        .map(|c| c[3].clone())
        .collect();
    assert_eq!(grants, vec!["/GRANT:Everyone,CHANGE", "/GRANT:Jeder,CHANGE"]);
}

#[test]
fn test_exhausted_principals_report_last_attempt() {
    let (_temp, _base, base_str) = test_base();
    let system = FakeShareSystem::english_without_powershell()
        .with_unresolvable("Everyone")
        .with_unresolvable("Jeder")
        .with_unresolvable("Authenticated Users")
        .with_unresolvable("Authentifizierte Benutzer");
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();

    for result in &outcome.protocol.ergebnisse {
        assert!(!result.erfolg);
        assert_eq!(result.principal, "Authentifizierte Benutzer");
        assert_eq!(result.returncode, Some(2));
        assert!(result.meldung.contains("1332"), "{}", result.meldung);
    }
    // four attempts per share, nothing created
    assert_eq!(system.mutating_calls().len(), 12);
    assert!(system.share("SystemAG$").is_none());
    assert!(!outcome.protocol.abschluss.freigaben_geaendert);
}

#[test]
fn test_insufficient_rights_delete_before_recreate() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german()
        .with_share("SystemAG$", &windows(&base), &[("Jeder", "LESEN")])
        .with_share(
            "AddinsOL$",
            &windows(&base.join("AddinsOL")),
            &[("Jeder", "ÄNDERN")],
        )
        .with_share(
            "LiveupdateOL$",
            &windows(&base.join("LiveupdateOL")),
            &[("Jeder", "ÄNDERN")],
        );
    let reconciler = Reconciler::new(&system);
    let shown = RefCell::new(String::new());

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), |diff| {
            *shown.borrow_mut() = diff.to_string();
            true
        })
        .unwrap();

    let diff = shown.into_inner();
    assert!(diff.contains("[UPDATE] SystemAG$"));
    assert!(diff.contains("Jeder:READ"));
    assert!(diff.contains("Everyone/Jeder:CHANGE"));
    assert!(diff.contains("erforderliche Rechte fehlen"));
    assert!(!diff.contains("AddinsOL$"));

    let mutating = system.mutating_calls();
    assert_eq!(mutating.len(), 2);
    assert_eq!(mutating[0][3], "/DELETE");
    assert!(mutating[1][2].starts_with("SystemAG$="));

    let result = &outcome.protocol.ergebnisse[0];
    assert!(result.erfolg);
    assert_eq!(result.aktion, Aktion::Update);
    assert_eq!(system.share("SystemAG$").unwrap().grants[0].1, "ÄNDERN");
}

#[test]
fn test_rejected_confirmation_changes_nothing() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german().with_share(
        "SystemAG$",
        &windows(&base),
        &[("Jeder", "ÄNDERN")],
    );
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), reject_all)
        .unwrap();

    assert!(system.mutating_calls().is_empty());
    assert!(system.share("AddinsOL$").is_none());
    for result in &outcome.protocol.ergebnisse {
        assert!(!result.erfolg);
        assert_eq!(result.aktion, Aktion::Abgebrochen);
        assert!(result.meldung.contains("abgebrochen"));
    }
    assert!(!outcome.protocol.abschluss.freigaben_geaendert);
}

#[test]
fn test_share_found_under_alternate_base() {
    let (temp, _base, base_str) = test_base();
    let old_base = temp.path().join("Alt").join("SystemAG");
    let old_base_str = old_base.to_string_lossy().to_string();
    let system = FakeShareSystem::german().with_share(
        "AddinsOL$",
        &windows(&old_base.join("AddinsOL")),
        &[("Jeder", "ÄNDERN")],
    );
    let reconciler = Reconciler::new(&system);

    let preview = reconciler
        .preview(&base_str, &[old_base_str.clone()])
        .unwrap();

    let addins = &preview.plan[1];
    assert_eq!(addins.aktion, Aktion::Update);
    assert!(
        addins.begruendung.contains("gefunden unter Kandidat"),
        "{}",
        addins.begruendung
    );
    assert!(addins.begruendung.contains(&old_base_str));
    assert!(system.mutating_calls().is_empty());
}

#[test]
fn test_unknown_state_plans_create_without_delete() {
    let (_temp, _base, base_str) = test_base();
    let system = FakeShareSystem::german().with_broken_query("LiveupdateOL$");
    let reconciler = Reconciler::new(&system);

    let preview = reconciler.preview(&base_str, &[]).unwrap();
    let entry = &preview.plan[2];
    assert_eq!(entry.aktion, Aktion::Create);
    assert!(!entry.ist.zustand_bekannt);
    assert_eq!(entry.ist.stderr, "Zugriff verweigert");
    assert!(entry.begruendung.contains("nicht ermittelbar"));

    reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();
    assert!(system
        .mutating_calls()
        .iter()
        .all(|c| !c.iter().any(|a| a == "/DELETE")));
}

#[test]
fn test_other_grant_error_stops_fallback() {
    let (_temp, base, base_str) = test_base();
    // existing share whose state cannot be read, so a create is attempted
    let system = FakeShareSystem::english_without_powershell()
        .with_share("SystemAG$", &windows(&base), &[("Everyone", "CHANGE")])
        .with_broken_query("SystemAG$");
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();

    let attempts: Vec<Vec<String>> = system
        .mutating_calls()
        .into_iter()
        .filter(|c| c[2].starts_with("SystemAG$="))
        .collect();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0][3], "/GRANT:Everyone,CHANGE");

    let result = &outcome.protocol.ergebnisse[0];
    assert!(!result.erfolg);
    assert_eq!(result.principal, "Everyone");
    assert!(result.meldung.contains("2118"), "{}", result.meldung);
}

#[test]
fn test_planning_twice_gives_same_plan() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german()
        .with_share("SystemAG$", &windows(&base), &[("Jeder", "LESEN")])
        .with_share(
            "AddinsOL$",
            &windows(&base.join("AddinsOL")),
            &[("Jeder", "ÄNDERN")],
        );
    let reconciler = Reconciler::new(&system);

    let first = reconciler.preview(&base_str, &[]).unwrap();
    let second = reconciler.preview(&base_str, &[]).unwrap();

    let actions: Vec<Aktion> = first.plan.iter().map(|e| e.aktion).collect();
    assert_eq!(actions, vec![Aktion::Update, Aktion::Noop, Aktion::Create]);
    assert_eq!(first.plan, second.plan);
    assert!(system.mutating_calls().is_empty());
}

#[test]
fn test_failed_share_does_not_stop_the_others() {
    let (_temp, base, base_str) = test_base();
    let system = FakeShareSystem::german()
        .with_share("SystemAG$", &windows(&base), &[("Jeder", "LESEN")])
        .with_locked_share("SystemAG$");
    let reconciler = Reconciler::new(&system);

    let outcome = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap();

    let results = &outcome.protocol.ergebnisse;
    assert_eq!(results.len(), 3);
    assert!(!results[0].erfolg);
    assert_eq!(results[0].aktion, Aktion::Update);
    assert!(results[0].meldung.contains("Systemfehler: 5"), "{}", results[0].meldung);
    for result in &results[1..] {
        assert!(result.erfolg, "{}", result.meldung);
        assert_eq!(result.aktion, Aktion::Create);
    }
    assert!(system.share("AddinsOL$").is_some());
    assert!(system.share("LiveupdateOL$").is_some());
    assert_eq!(system.share("SystemAG$").unwrap().grants[0].1, "LESEN");
    assert!(outcome.protocol.abschluss.freigaben_geaendert);
}

#[test]
fn test_launch_failure_is_returned() {
    let (_temp, _base, base_str) = test_base();
    let reconciler = Reconciler::new(UnlaunchableRunner);

    let err = reconciler
        .run(&ReconcileOptions::new(&base_str), always_apply)
        .unwrap_err();
    assert!(err.is_launch_error());
}
