//! Record store backed by one file per record.
//!
//! Layout under the root directory:
//!
//! ```text
//! driver_in  driver_out  rastermatrix  depthmatrix
//! T1/T1_in   T1/T1_out   T2/T2_in ...
//! ```
//!
//! A writer leases a record by creating `<file>.lock`, writes the payload to
//! `<file>.tmp` and renames it over the record, so a reader only ever sees a
//! complete payload. A consuming reader claims the record by renaming it to
//! `<file>.claimed`; the rename is atomic, so the claim doubles as the
//! "record consumed" signal the writer observes. A claim left behind by a
//! reader that failed before deleting it is delivered on the next read.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};

use crate::error::Unavailable;
use crate::record::{ReadSemantics, RecordId, RecordKind, WriteOutcome};
use crate::store::RecordStore;

const LOCK_SUFFIX: &str = "lock";
const TMP_SUFFIX: &str = "tmp";
const CLAIM_SUFFIX: &str = "claimed";

pub struct FileStore {
    root: PathBuf,
    semantics: ReadSemantics,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, semantics: ReadSemantics) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("file store: root {} ({semantics:?})", root.display());
        Ok(Self { root, semantics })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn semantics(&self) -> ReadSemantics {
        self.semantics
    }

    /// Path of the file that holds the payload of `id`.
    pub fn path(&self, id: RecordId) -> PathBuf {
        match id.kind() {
            RecordKind::TriangulatorIn | RecordKind::TriangulatorOut => self
                .root
                .join(format!("T{}", id.index()))
                .join(id.to_string()),
            _ => self.root.join(id.to_string()),
        }
    }

    /// Removes writer leases left behind by a participant that exited while
    /// holding them. Only safe while no participant is running.
    pub fn clear_stale_leases(&self, ids: impl IntoIterator<Item = RecordId>) -> io::Result<()> {
        for id in ids {
            match fs::remove_file(sibling(&self.path(id), LOCK_SUFFIX)) {
                Ok(()) => debug!("file store: removed stale lease on {id}"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Puts a claimed payload back so the next read can retry it. A newer
/// payload written meanwhile is left alone; the claim is then resumed first.
fn unclaim(claimed: &Path, path: &Path) {
    if path.exists() {
        return;
    }
    if let Err(err) = fs::rename(claimed, path) {
        warn!("file store: failed to restore {}: {err}", path.display());
    }
}

fn absent_or_io(err: io::Error) -> Unavailable {
    if err.kind() == io::ErrorKind::NotFound {
        Unavailable::Absent
    } else {
        Unavailable::Io(err)
    }
}

impl RecordStore for FileStore {
    fn try_acquire_read(&self, id: RecordId) -> Result<Vec<u8>, Unavailable> {
        let path = self.path(id);
        if !self.semantics.consumes(id) {
            return fs::read(&path).map_err(absent_or_io);
        }
        let claimed = sibling(&path, CLAIM_SUFFIX);
        if claimed.exists() {
            debug!("file store: resuming stranded claim on {id}");
        } else {
            fs::rename(&path, &claimed).map_err(absent_or_io)?;
        }
        let payload = match fs::read(&claimed) {
            Ok(payload) => payload,
            Err(err) => {
                unclaim(&claimed, &path);
                return Err(Unavailable::Io(err));
            }
        };
        // The bytes are delivered now; a leftover claim is retried next read.
        if let Err(err) = fs::remove_file(&claimed) {
            warn!("file store: failed to drop claim {}: {err}", claimed.display());
        }
        trace!("file store: consumed {id} ({} bytes)", payload.len());
        Ok(payload)
    }

    fn try_acquire_write(&self, id: RecordId) -> Result<(), Unavailable> {
        let path = self.path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(sibling(&path, LOCK_SUFFIX))
        {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Err(Unavailable::Busy),
            Err(err) => Err(Unavailable::Io(err)),
        }
    }

    fn commit_write(&self, id: RecordId, payload: &[u8]) -> io::Result<WriteOutcome> {
        let path = self.path(id);
        // Under consume-on-read a surviving file was never claimed. Retained
        // records always exist once written, so they never report coalescing.
        let unread = self.semantics.consumes(id) && path.exists();
        let tmp = sibling(&path, TMP_SUFFIX);
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        fs::remove_file(sibling(&path, LOCK_SUFFIX))?;
        trace!("file store: wrote {id} ({} bytes)", payload.len());
        Ok(if unread {
            WriteOutcome::Coalesced
        } else {
            WriteOutcome::Accepted
        })
    }

    fn release_write(&self, id: RecordId) {
        let lock = sibling(&self.path(id), LOCK_SUFFIX);
        if let Err(err) = fs::remove_file(&lock) {
            if err.kind() != io::ErrorKind::NotFound {
                debug!("file store: failed to release {}: {err}", lock.display());
            }
        }
    }
}
