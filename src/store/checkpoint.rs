//! Checkpoint persistence
//!
//! A checkpoint is the whole current generation, written record-by-record
//! so corruption is detected at the record that carries it:
//!
//! ```text
//! +------------------+
//! | Magic "RDBCKPT1" | (8 bytes)
//! +------------------+
//! | Commit ID        | (u64 LE)
//! +------------------+
//! | Record*          | (until EOF)
//! +------------------+
//!
//! Record:
//! +------------------+
//! | Body Length      | (u32 LE)
//! +------------------+
//! | Body             | (bucket name + slot tree, see below)
//! +------------------+
//! | Checksum         | (u32 LE, crc32 of Body)
//! +------------------+
//! ```
//!
//! Body: length-prefixed bucket name, then its slot. A slot is a kind byte
//! (0 = value, 1 = bucket) followed by a length-prefixed payload or an
//! entry count and recursively encoded child slots.
//!
//! Writes go to a sibling temp file, are fsynced, and replace the target
//! with an atomic rename; the directory is fsynced afterwards. A torn
//! write therefore leaves the previous checkpoint intact.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::bucket::{Bucket, Slot};
use super::errors::{StoreError, StoreResult};
use super::store::CommitId;

const MAGIC: &[u8; 8] = b"RDBCKPT1";

const SLOT_VALUE: u8 = 0;
const SLOT_BUCKET: u8 = 1;

/// Writes `root` at `commit_id` to `path`.
pub(crate) fn write_checkpoint(path: &Path, commit_id: CommitId, root: &Bucket) -> StoreResult<()> {
    let tmp_path = path.with_extension("ckpt.tmp");

    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&commit_id.raw().to_le_bytes())?;

        for (name, slot) in root.slots() {
            let mut body = Vec::new();
            write_bytes(&mut body, name);
            write_slot(&mut body, slot);

            writer.write_all(&(body.len() as u32).to_le_bytes())?;
            writer.write_all(&body)?;
            writer.write_all(&crc32fast::hash(&body).to_le_bytes())?;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    if let Some(dir) = path.parent() {
        fsync_dir(dir)?;
    }
    Ok(())
}

/// Reads a checkpoint back into a root bucket.
pub(crate) fn read_checkpoint(path: &Path) -> StoreResult<(CommitId, Bucket)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(StoreError::Corrupt("bad magic".into()));
    }

    let mut commit_raw = [0u8; 8];
    reader.read_exact(&mut commit_raw)?;
    let commit_id = CommitId::new(u64::from_le_bytes(commit_raw));

    let mut root = Bucket::new();
    loop {
        let body_len = match read_u32_or_eof(&mut reader)? {
            Some(len) => len as usize,
            None => break,
        };

        let mut body = vec![0u8; body_len];
        reader.read_exact(&mut body)?;

        let mut crc_raw = [0u8; 4];
        reader.read_exact(&mut crc_raw)?;
        if crc32fast::hash(&body) != u32::from_le_bytes(crc_raw) {
            return Err(StoreError::Corrupt("record checksum mismatch".into()));
        }

        let mut cursor = &body[..];
        let name = read_bytes(&mut cursor)?;
        let slot = read_slot(&mut cursor)?;
        if !cursor.is_empty() {
            return Err(StoreError::Corrupt("trailing bytes in record".into()));
        }

        match slot {
            Slot::Value(v) => root.put(name, v)?,
            Slot::Nested(b) => {
                *root.nested_mut(&name)? = (*b).clone();
            }
        }
    }

    Ok((commit_id, root))
}

fn write_slot(out: &mut Vec<u8>, slot: &Slot) {
    match slot {
        Slot::Value(v) => {
            out.push(SLOT_VALUE);
            write_bytes(out, v);
        }
        Slot::Nested(bucket) => {
            out.push(SLOT_BUCKET);
            out.extend_from_slice(&(bucket.len() as u32).to_le_bytes());
            for (key, child) in bucket.slots() {
                write_bytes(out, key);
                write_slot(out, child);
            }
        }
    }
}

fn read_slot(input: &mut &[u8]) -> StoreResult<Slot> {
    let kind = read_u8(input)?;
    match kind {
        SLOT_VALUE => {
            let value = read_bytes(input)?;
            Ok(Slot::Value(value.into()))
        }
        SLOT_BUCKET => {
            let count = read_u32(input)? as usize;
            let mut bucket = Bucket::new();
            for _ in 0..count {
                let key = read_bytes(input)?;
                match read_slot(input)? {
                    Slot::Value(v) => bucket.put(key, v)?,
                    Slot::Nested(b) => {
                        *bucket.nested_mut(&key)? = (*b).clone();
                    }
                }
            }
            Ok(Slot::Nested(bucket.into()))
        }
        other => Err(StoreError::Corrupt(format!("unknown slot kind {}", other))),
    }
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn read_bytes(input: &mut &[u8]) -> StoreResult<Vec<u8>> {
    let len = read_u32(input)? as usize;
    if input.len() < len {
        return Err(StoreError::Corrupt("truncated byte field".into()));
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head.to_vec())
}

fn read_u8(input: &mut &[u8]) -> StoreResult<u8> {
    match input.split_first() {
        Some((byte, tail)) => {
            *input = tail;
            Ok(*byte)
        }
        None => Err(StoreError::Corrupt("truncated slot kind".into())),
    }
}

fn read_u32(input: &mut &[u8]) -> StoreResult<u32> {
    if input.len() < 4 {
        return Err(StoreError::Corrupt("truncated length field".into()));
    }
    let (head, tail) = input.split_at(4);
    *input = tail;
    Ok(u32::from_le_bytes(head.try_into().expect("4-byte slice")))
}

/// `Ok(None)` at a clean record boundary, error on a torn prefix.
fn read_u32_or_eof<R: Read>(reader: &mut R) -> StoreResult<Option<u32>> {
    let mut raw = [0u8; 4];
    match reader.read_exact(&mut raw) {
        Ok(()) => Ok(Some(u32::from_le_bytes(raw))),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn fsync_dir(dir: &Path) -> StoreResult<()> {
    let handle = OpenOptions::new().read(true).open(dir)?;
    handle.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn populated_store() -> Store {
        let store = Store::new();
        store
            .update(|txn| {
                let items = txn.bucket_mut(b"items")?;
                items.put(b"k1".to_vec(), b"v1".to_vec())?;
                items.put(b"k2".to_vec(), vec![0u8, 255, 7])?;
                items
                    .nested_mut(b"child")?
                    .put(b"ck".to_vec(), b"cv".to_vec())?;
                txn.bucket_mut(b"heap")?.put(b"seq".to_vec(), b"9".to_vec())?;
                Ok::<_, StoreError>(())
            })
            .unwrap();
        store
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ckpt");

        let store = populated_store();
        let written_at = store.checkpoint(&path).unwrap();

        let reloaded = Store::load(&path).unwrap();
        let snapshot = reloaded.snapshot().unwrap();
        assert_eq!(snapshot.commit_id(), written_at);

        let items = snapshot.bucket(b"items").unwrap().unwrap();
        assert_eq!(items.get(b"k1"), Some(&b"v1"[..]));
        assert_eq!(items.get(b"k2"), Some(&[0u8, 255, 7][..]));
        let child = items.nested(b"child").unwrap().unwrap();
        assert_eq!(child.get(b"ck"), Some(&b"cv"[..]));

        let heap = snapshot.bucket(b"heap").unwrap().unwrap();
        assert_eq!(heap.get(b"seq"), Some(&b"9"[..]));
    }

    #[test]
    fn test_empty_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ckpt");

        Store::new().checkpoint(&path).unwrap();
        let reloaded = Store::load(&path).unwrap();
        assert_eq!(reloaded.snapshot().unwrap().commit_id(), CommitId::ZERO);
    }

    #[test]
    fn test_corrupt_record_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ckpt");

        populated_store().checkpoint(&path).unwrap();

        // Flip one byte past the header
        let mut bytes = fs::read(&path).unwrap();
        let idx = bytes.len() - 6;
        bytes[idx] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(Store::load(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ckpt");
        fs::write(&path, b"NOTACKPTxxxxxxxx").unwrap();

        assert!(matches!(Store::load(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_checkpoint_replaces_previous_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ckpt");

        let store = populated_store();
        store.checkpoint(&path).unwrap();
        store
            .update(|txn| txn.bucket_mut(b"items")?.put(b"k3".to_vec(), b"v3".to_vec()))
            .unwrap();
        store.checkpoint(&path).unwrap();

        let reloaded = Store::load(&path).unwrap();
        let snapshot = reloaded.snapshot().unwrap();
        let items = snapshot.bucket(b"items").unwrap().unwrap();
        assert_eq!(items.get(b"k3"), Some(&b"v3"[..]));
    }
}
