//! In-memory share table that answers `net share` and the SID translation
//! the way a German Windows installation does.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use sage_helper::{ProcessOutput, ProcessRunner, Result};

/// One share of the fake table
#[derive(Debug, Clone)]
pub struct FakeShare {
    pub path: String,
    /// (principal, German right name)
    pub grants: Vec<(String, String)>,
}

/// Fake OS: shares, unresolvable principals and a call log
#[derive(Debug, Default)]
pub struct FakeShareSystem {
    shares: RefCell<BTreeMap<String, FakeShare>>,
    calls: RefCell<Vec<Vec<String>>>,
    /// Principals answered with system error 1332
    unresolvable: BTreeSet<String>,
    /// Name returned by the SID translation, failure when `None`
    sid_name: Option<String>,
    /// Share names whose query fails with an unknown error
    broken_queries: BTreeSet<String>,
    /// Share names whose deletion fails with system error 5
    locked_shares: BTreeSet<String>,
}

impl FakeShareSystem {
    /// German system where "Everyone" is unknown and "Jeder" works
    pub fn german() -> Self {
        FakeShareSystem {
            sid_name: Some("Jeder".to_string()),
            unresolvable: ["Everyone".to_string()].into_iter().collect(),
            ..Default::default()
        }
    }

    /// English system where the SID translation is not available
    pub fn english_without_powershell() -> Self {
        FakeShareSystem::default()
    }

    pub fn with_unresolvable(mut self, principal: &str) -> Self {
        self.unresolvable.insert(principal.to_string());
        self
    }

    pub fn with_broken_query(mut self, share_name: &str) -> Self {
        self.broken_queries.insert(share_name.to_uppercase());
        self
    }

    pub fn with_locked_share(mut self, share_name: &str) -> Self {
        self.locked_shares.insert(share_name.to_uppercase());
        self
    }

    pub fn with_share(self, name: &str, path: &str, grants: &[(&str, &str)]) -> Self {
        self.shares.borrow_mut().insert(
            name.to_uppercase(),
            FakeShare {
                path: path.to_string(),
                grants: grants
                    .iter()
                    .map(|(p, r)| (p.to_string(), r.to_string()))
                    .collect(),
            },
        );
        self
    }

    pub fn share(&self, name: &str) -> Option<FakeShare> {
        self.shares.borrow().get(&name.to_uppercase()).cloned()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Calls that would change the share table
    pub fn mutating_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| sage_helper::share_executor::is_mutating_command(c))
            .collect()
    }

    fn query(&self, name: &str) -> ProcessOutput {
        if self.broken_queries.contains(&name.to_uppercase()) {
            return ProcessOutput::new(2, "", "Zugriff verweigert");
        }
        match self.shares.borrow().get(&name.to_uppercase()) {
            Some(share) => {
                let mut out = format!(
                    "Freigabename      {}\r\nPfad              {}\r\nBeschreibung      Automatisch verwaltet\r\n",
                    name, share.path
                );
                for (i, (principal, right)) in share.grants.iter().enumerate() {
                    let label = if i == 0 { "Berechtigung" } else { "" };
                    out.push_str(&format!("{:<18}{}, {}\r\n", label, principal, right));
                }
                out.push_str("Der Befehl wurde erfolgreich ausgeführt.\r\n");
                ProcessOutput::new(0, out, "")
            }
            None => ProcessOutput::new(
                2,
                "",
                "Der Freigabename existiert nicht.\r\n\r\nWeitere Hilfe erhalten Sie, indem Sie NET HELPMSG 2310 eingeben.\r\n",
            ),
        }
    }

    fn create(&self, spec: &str, grant: &str) -> ProcessOutput {
        let (name, path) = spec.split_once('=').unwrap_or((spec, ""));
        let grant = grant.trim_start_matches("/GRANT:");
        let (principal, right) = grant.rsplit_once(',').unwrap_or((grant, ""));

        if self.unresolvable.contains(principal) {
            return ProcessOutput::new(
                2,
                "",
                "Zuordnungen von Kontennamen und Sicherheitskennungen wurden nicht durchgeführt.\r\nSystemfehler 1332 aufgetreten.",
            );
        }
        if self.shares.borrow().contains_key(&name.to_uppercase()) {
            return ProcessOutput::new(
                2,
                "",
                "Der Name wurde bereits freigegeben.\r\n\r\nWeitere Hilfe erhalten Sie, indem Sie NET HELPMSG 2118 eingeben.\r\n",
            );
        }

        let german_right = match right {
            "READ" => "LESEN",
            "CHANGE" => "ÄNDERN",
            "FULL" => "VOLLZUGRIFF",
            other => other,
        };
        self.shares.borrow_mut().insert(
            name.to_uppercase(),
            FakeShare {
                path: path.to_string(),
                grants: vec![(principal.to_string(), german_right.to_string())],
            },
        );
        ProcessOutput::new(0, format!("{} wurde erfolgreich freigegeben.", name), "")
    }

    fn delete(&self, name: &str) -> ProcessOutput {
        if self.locked_shares.contains(&name.to_uppercase()) {
            return ProcessOutput::new(2, "", "Systemfehler 5 aufgetreten.\r\n\r\nZugriff verweigert.");
        }
        match self.shares.borrow_mut().remove(&name.to_uppercase()) {
            Some(_) => ProcessOutput::new(0, format!("{} wurde gelöscht.", name), ""),
            None => ProcessOutput::new(
                2,
                "",
                "Der Freigabename existiert nicht.\r\n\r\nWeitere Hilfe erhalten Sie, indem Sie NET HELPMSG 2310 eingeben.\r\n",
            ),
        }
    }
}

impl ProcessRunner for FakeShareSystem {
    fn run(&self, command: &[String]) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(command.to_vec());

        let args: Vec<&str> = command.iter().map(|s| s.as_str()).collect();
        let output = match args.as_slice() {
            ["powershell", ..] => match &self.sid_name {
                Some(name) => ProcessOutput::new(0, format!("{}\r\n", name), ""),
                None => ProcessOutput::new(1, "", "Die Benennung \"powershell\" wurde nicht erkannt."),
            },
            ["net", "share", name, "/DELETE", "/Y"] => self.delete(name),
            ["net", "share", spec, grant, _remark] if spec.contains('=') => {
                self.create(spec, grant)
            }
            ["net", "share", name] => self.query(name),
            _ => ProcessOutput::new(1, "", "unbekannter Befehl"),
        };
        Ok(output)
    }
}

/// Runner whose every launch fails
pub struct UnlaunchableRunner;

impl ProcessRunner for UnlaunchableRunner {
    fn run(&self, command: &[String]) -> Result<ProcessOutput> {
        Err(sage_helper::Error::launch(
            command.join(" "),
            std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
        ))
    }
}

/// Windows-style backslash form of a test path
pub fn windows(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('/', "\\")
}
