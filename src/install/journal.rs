use serde::Serialize;
use std::fmt;

/// A completed step of installing one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStep {
    DirectoryPrepared,
    FilesFetched,
    AssembliesIndexed,
    IdentityStaged,
    DependenciesLinked,
    ManifestCommitted,
    DescriptorWritten,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InstallStep::DirectoryPrepared => "directory prepared",
            InstallStep::FilesFetched => "files fetched",
            InstallStep::AssembliesIndexed => "assemblies indexed",
            InstallStep::IdentityStaged => "identity staged",
            InstallStep::DependenciesLinked => "dependencies linked",
            InstallStep::ManifestCommitted => "manifest committed",
            InstallStep::DescriptorWritten => "descriptor written",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    /// `Name@version` of the package.
    pub package: String,
    pub steps: Vec<InstallStep>,
}

impl JournalEntry {
    pub fn is_complete(&self) -> bool {
        self.steps.contains(&InstallStep::DescriptorWritten)
    }
}

/// Record of what an install run has done so far, one entry per member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallJournal {
    entries: Vec<JournalEntry>,
}

impl InstallJournal {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: packages
                .into_iter()
                .map(|package| JournalEntry {
                    package: package.into(),
                    steps: Vec::new(),
                })
                .collect(),
        }
    }

    pub(crate) fn record(&mut self, member: usize, step: InstallStep) {
        if let Some(entry) = self.entries.get_mut(member) {
            entry.steps.push(step);
        }
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry(&self, package: &str) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.package == package)
    }

    /// Packages that were touched but not finished.
    pub fn incomplete(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries
            .iter()
            .filter(|e| !e.steps.is_empty() && !e.is_complete())
    }
}

impl fmt::Display for InstallJournal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for entry in &self.entries {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            match entry.steps.last() {
                Some(step) => write!(f, "{}: {}", entry.package, step)?,
                None => write!(f, "{}: not started", entry.package)?,
            }
        }
        Ok(())
    }
}

/// An install stopped part way; the journal tells what was done.
#[derive(Debug, Clone)]
pub struct InstallInterrupted {
    pub journal: InstallJournal,
}

impl fmt::Display for InstallInterrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Installation interrupted ({})", self.journal)
    }
}

impl std::error::Error for InstallInterrupted {}
