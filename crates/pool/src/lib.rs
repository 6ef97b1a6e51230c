use std::sync::Mutex;

use memballast_models::BallastError;
use tracing::debug;

const MIB: usize = 1024 * 1024;

/// Pages backing a zero-filled allocation can be served lazily by the
/// kernel and never show up in RSS. Filling with a non-zero pattern forces
/// every page to be committed.
const FILL_PATTERN: u8 = 0xA5;

/// One reservation: the chunks allocated by a single grow operation.
type Group = Vec<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub allocated_mb: u64,
    pub groups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Unchanged,
    Grew,
    Shrank,
}

/// Mutex-guarded pool of deliberately resident memory.
///
/// Chunks are allocated and filled outside the lock; the lock only covers
/// list manipulation and accounting, so status reads stay cheap while a
/// large reservation is being built.
pub struct BallastPool {
    groups: Mutex<Vec<Group>>,
}

impl Default for BallastPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BallastPool {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
        }
    }

    /// Allocates `mb` MiB as one new group split into `chunk_mb` chunks.
    pub fn grow(&self, mb: u64, chunk_mb: u64) -> Result<PoolSnapshot, BallastError> {
        if mb == 0 {
            return Ok(self.snapshot());
        }

        let group = alloc_group(mb, chunk_mb)?;

        let mut groups = self.lock();
        groups.push(group);
        let snapshot = snapshot_of(&groups);
        drop(groups);

        debug!(added_mb = mb, total_mb = snapshot.allocated_mb, "pool grown");
        Ok(snapshot)
    }

    /// Brings the pool to `target_mb`: grows by the difference when below,
    /// releases newest-first when above. Releasing whole chunks may leave
    /// the pool just below the target when sizes do not divide evenly.
    pub fn resize(
        &self,
        target_mb: u64,
        chunk_mb: u64,
    ) -> Result<(PoolSnapshot, ResizeOutcome), BallastError> {
        let current = self.snapshot().allocated_mb;

        if target_mb == current {
            return Ok((self.snapshot(), ResizeOutcome::Unchanged));
        }

        if target_mb > current {
            // The deficit is computed before allocating; a concurrent writer
            // can move the total in between, in which case the pool lands
            // near, not exactly at, the target.
            let group = alloc_group(target_mb - current, chunk_mb)?;

            let mut groups = self.lock();
            groups.push(group);
            let snapshot = snapshot_of(&groups);
            drop(groups);

            debug!(target_mb, total_mb = snapshot.allocated_mb, "pool resized up");
            Ok((snapshot, ResizeOutcome::Grew))
        } else {
            let mut groups = self.lock();
            let to_free = snapshot_of(&groups).allocated_mb.saturating_sub(target_mb);
            drain_newest(&mut groups, to_free);
            let snapshot = snapshot_of(&groups);
            drop(groups);

            debug!(target_mb, total_mb = snapshot.allocated_mb, "pool resized down");
            Ok((snapshot, ResizeOutcome::Shrank))
        }
    }

    /// Releases up to `mb` MiB, newest group first. Saturates at empty.
    pub fn release(&self, mb: u64) -> PoolSnapshot {
        let mut groups = self.lock();
        drain_newest(&mut groups, mb);
        let snapshot = snapshot_of(&groups);
        drop(groups);

        debug!(freed_request_mb = mb, total_mb = snapshot.allocated_mb, "pool released");
        snapshot
    }

    /// Drops every group.
    pub fn clear(&self) -> PoolSnapshot {
        let mut groups = self.lock();
        groups.clear();
        let snapshot = snapshot_of(&groups);
        drop(groups);

        debug!("pool cleared");
        snapshot
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        snapshot_of(&self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Group>> {
        self.groups.lock().expect("ballast pool lock poisoned")
    }

    #[cfg(test)]
    fn chunk_layout_mb(&self) -> Vec<Vec<u64>> {
        self.lock()
            .iter()
            .map(|group| group.iter().map(|chunk| (chunk.len() / MIB) as u64).collect())
            .collect()
    }
}

fn snapshot_of(groups: &[Group]) -> PoolSnapshot {
    let bytes: usize = groups
        .iter()
        .flat_map(|group| group.iter())
        .map(Vec::len)
        .sum();
    PoolSnapshot {
        allocated_mb: (bytes / MIB) as u64,
        groups: groups.len(),
    }
}

/// Pops whole chunks from the newest group backwards until `mb` MiB have
/// been returned or the pool is empty. Emptied groups are removed.
fn drain_newest(groups: &mut Vec<Group>, mb: u64) {
    let mut remaining = mb;
    while remaining > 0 {
        let Some(group) = groups.last_mut() else {
            break;
        };
        while remaining > 0 {
            let Some(chunk) = group.pop() else {
                break;
            };
            remaining = remaining.saturating_sub((chunk.len() / MIB) as u64);
        }
        if group.is_empty() {
            groups.pop();
        }
    }
}

fn alloc_group(mb: u64, chunk_mb: u64) -> Result<Group, BallastError> {
    if chunk_mb == 0 {
        return Err(BallastError::InvalidParameter {
            reason: "chunk size must be greater than zero".to_string(),
        });
    }

    let mut blocks = Vec::new();
    let mut remain = mb;
    while remain > 0 {
        let take = chunk_mb.min(remain);
        blocks.push(alloc_chunk(take)?);
        remain -= take;
    }
    Ok(blocks)
}

fn alloc_chunk(mb: u64) -> Result<Vec<u8>, BallastError> {
    let bytes = usize::try_from(mb)
        .ok()
        .and_then(|mb| mb.checked_mul(MIB))
        .ok_or_else(|| BallastError::AllocationFailed {
            reason: format!("chunk of {mb} MB overflows addressable memory"),
        })?;

    let mut chunk: Vec<u8> = Vec::new();
    chunk
        .try_reserve_exact(bytes)
        .map_err(|err| BallastError::AllocationFailed {
            reason: err.to_string(),
        })?;
    chunk.resize(bytes, FILL_PATTERN);
    Ok(chunk)
}
