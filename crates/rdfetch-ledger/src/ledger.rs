//! Three-list classification ledger backed by append-only text files.
//!
//! Each list lives in its own flat file, one identifier per line, written
//! incrementally as outcomes occur so a crashed run still leaves a usable
//! audit trail. The in-memory view is authoritative for the running
//! process; files are never rewritten, so a reclassified identifier keeps
//! its old line in the old file and gains a new line in the new one.

use crate::error::Result;
use rdfetch_core::types::RdNumber;
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Terminal classification for a processed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// A crash report exists for this identifier.
    Successful,
    /// The portal affirmatively reported that no record exists.
    Unsuccessful,
    /// The lookup did not reach a verdict within its bounded waits.
    TimedOut,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Successful => write!(f, "successful"),
            Self::Unsuccessful => write!(f, "unsuccessful"),
            Self::TimedOut => write!(f, "timed-out"),
        }
    }
}

/// Per-list counts, as reported in the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    /// Identifiers classified successful.
    pub successful: usize,
    /// Identifiers classified unsuccessful.
    pub unsuccessful: usize,
    /// Identifiers classified timed-out.
    pub timed_out: usize,
}

impl LedgerCounts {
    /// Total identifiers holding any classification.
    #[must_use]
    pub fn total(&self) -> usize {
        self.successful + self.unsuccessful + self.timed_out
    }
}

/// One append-only list file plus its in-memory membership.
struct ListFile {
    file: File,
    order: Vec<RdNumber>,
    members: HashSet<RdNumber>,
}

impl ListFile {
    fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            order: Vec::new(),
            members: HashSet::new(),
        })
    }

    fn append(&mut self, rd: &RdNumber) -> Result<()> {
        writeln!(self.file, "{rd}")?;
        self.order.push(rd.clone());
        self.members.insert(rd.clone());
        Ok(())
    }

    fn forget(&mut self, rd: &RdNumber) {
        self.members.remove(rd);
        self.order.retain(|member| member != rd);
    }

    fn contains(&self, rd: &RdNumber) -> bool {
        self.members.contains(rd)
    }
}

/// Durable record of lookup outcomes, one list per classification.
///
/// An identifier belongs to at most one list at any point in time;
/// recording a different classification moves it. Writes happen
/// per-outcome rather than batched.
pub struct ResultLedger {
    successful: ListFile,
    unsuccessful: ListFile,
    timed_out: ListFile,
}

impl ResultLedger {
    /// Open (creating if needed) the three list files.
    ///
    /// Parent directories are created as needed. Existing file content is
    /// left untouched; this run appends below it.
    ///
    /// # Errors
    /// Returns error if any file cannot be created or opened.
    pub fn open(successful: &Path, unsuccessful: &Path, timed_out: &Path) -> Result<Self> {
        Ok(Self {
            successful: ListFile::open(successful)?,
            unsuccessful: ListFile::open(unsuccessful)?,
            timed_out: ListFile::open(timed_out)?,
        })
    }

    /// Record `classification` for `rd`.
    ///
    /// Returns `true` if the ledger changed, `false` if the identifier
    /// already held this classification (re-recording is a no-op, so a
    /// retried identifier counts once).
    ///
    /// # Errors
    /// Returns error if the list file cannot be written.
    pub fn record(&mut self, rd: &RdNumber, classification: Classification) -> Result<bool> {
        match self.classification_of(rd) {
            Some(current) if current == classification => return Ok(false),
            Some(current) => {
                tracing::debug!(%rd, from = %current, to = %classification, "reclassifying identifier");
                self.list_mut(current).forget(rd);
            }
            None => {}
        }
        self.list_mut(classification).append(rd)?;
        Ok(true)
    }

    /// The classification currently held by `rd`, if any.
    #[must_use]
    pub fn classification_of(&self, rd: &RdNumber) -> Option<Classification> {
        if self.successful.contains(rd) {
            Some(Classification::Successful)
        } else if self.unsuccessful.contains(rd) {
            Some(Classification::Unsuccessful)
        } else if self.timed_out.contains(rd) {
            Some(Classification::TimedOut)
        } else {
            None
        }
    }

    /// Members of one list, in the order they were recorded.
    #[must_use]
    pub fn members(&self, classification: Classification) -> &[RdNumber] {
        &self.list(classification).order
    }

    /// Current size of each list.
    #[must_use]
    pub fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            successful: self.successful.order.len(),
            unsuccessful: self.unsuccessful.order.len(),
            timed_out: self.timed_out.order.len(),
        }
    }

    fn list(&self, classification: Classification) -> &ListFile {
        match classification {
            Classification::Successful => &self.successful,
            Classification::Unsuccessful => &self.unsuccessful,
            Classification::TimedOut => &self.timed_out,
        }
    }

    fn list_mut(&mut self, classification: Classification) -> &mut ListFile {
        match classification {
            Classification::Successful => &mut self.successful,
            Classification::Unsuccessful => &mut self.unsuccessful,
            Classification::TimedOut => &mut self.timed_out,
        }
    }
}
