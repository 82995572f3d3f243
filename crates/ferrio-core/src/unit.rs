//! External unit binding.
//!
//! A unit number resolves through a global registry to a connection
//! wrapping a record-oriented device. The open/close lifecycle itself
//! belongs to an out-of-scope layer; this module only tracks what a
//! data transfer statement needs: direction compatibility, record
//! position, direct-access addressing, and which asynchronous
//! transfers are still unwaited.
//!
//! The registry maps unit numbers to shared connections. The reserved
//! unit -1 is "the processor default unit" (list-directed PRINT with
//! no explicit unit); the ABI layer binds it to the process streams.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::iostat::IoError;

/// READ(*) / WRITE(*) / PRINT with no explicit unit.
pub const DEFAULT_UNIT: i32 = -1;

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// Byte-level record access supplied by the unit-table layer.
pub trait Device: Send {
    /// Append bytes to the current (open) record.
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError>;
    /// Terminate the current record.
    fn end_record(&mut self) -> Result<(), IoError>;
    /// Read the next whole record; None at end of file.
    fn read_record(&mut self) -> Result<Option<Vec<u8>>, IoError>;
    /// Position to a 1-based record number (direct access).
    fn seek_record(&mut self, record: i64) -> Result<(), IoError>;
}

/// In-memory record file. Backs unit tests, the conformance harness,
/// and the direct-access path of the asynchronous tracker.
#[derive(Debug, Default)]
pub struct MemoryDevice {
    records: Vec<Vec<u8>>,
    pos: usize,
    current: Vec<u8>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device pre-loaded with records for input statements.
    pub fn with_records(records: Vec<Vec<u8>>) -> Self {
        Self {
            records,
            pos: 0,
            current: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }
}

impl Device for MemoryDevice {
    fn write(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.current.extend_from_slice(bytes);
        Ok(())
    }

    fn end_record(&mut self) -> Result<(), IoError> {
        if self.pos >= self.records.len() {
            self.records.resize(self.pos + 1, Vec::new());
        }
        self.records[self.pos] = std::mem::take(&mut self.current);
        self.pos += 1;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Option<Vec<u8>>, IoError> {
        if self.pos >= self.records.len() {
            return Ok(None);
        }
        let record = self.records[self.pos].clone();
        self.pos += 1;
        Ok(Some(record))
    }

    fn seek_record(&mut self, record: i64) -> Result<(), IoError> {
        if record < 1 {
            return Err(IoError::BadRecordNumber(record));
        }
        self.pos = (record - 1) as usize;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// One connected external unit.
pub struct Connection {
    device: Box<dyn Device>,
    readable: bool,
    writable: bool,
    direct: bool,
    /// Next record to transfer, 1-based.
    record: i64,
    /// Unwaited asynchronous transfers: (id, record number).
    pending_async: Vec<(i32, i64)>,
}

impl Connection {
    pub fn new(device: Box<dyn Device>, readable: bool, writable: bool, direct: bool) -> Self {
        Self {
            device,
            readable,
            writable,
            direct,
            record: 1,
            pending_async: Vec::new(),
        }
    }

    /// Sequential in-memory connection open for both directions.
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryDevice::new()), true, true, false)
    }

    /// Direct-access in-memory connection open for both directions.
    pub fn memory_direct() -> Self {
        Self::new(Box::new(MemoryDevice::new()), true, true, true)
    }

    /// Sequential in-memory connection pre-loaded for input.
    pub fn memory_with_records(records: Vec<Vec<u8>>) -> Self {
        Self::new(Box::new(MemoryDevice::with_records(records)), true, true, false)
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Current record number, 1-based.
    pub fn record(&self) -> i64 {
        self.record
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), IoError> {
        self.device.write(bytes)
    }

    pub fn end_record(&mut self) -> Result<(), IoError> {
        self.device.end_record()?;
        self.record += 1;
        Ok(())
    }

    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>, IoError> {
        let record = self.device.read_record()?;
        if record.is_some() {
            self.record += 1;
        }
        Ok(record)
    }

    pub fn seek_record(&mut self, record: i64) -> Result<(), IoError> {
        if !self.direct {
            return Err(IoError::BadRecordNumber(record));
        }
        self.device.seek_record(record)?;
        self.record = record;
        Ok(())
    }

    /// Records of the in-memory device, for result inspection.
    pub fn memory_records(&mut self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        self.device.seek_record(1).ok();
        while let Ok(Some(r)) = self.device.read_record() {
            out.push(r);
        }
        out
    }

    // -----------------------------------------------------------------------
    // Asynchronous bookkeeping
    // -----------------------------------------------------------------------

    pub fn note_async(&mut self, id: i32, record: i64) {
        self.pending_async.push((id, record));
    }

    pub fn clear_async(&mut self, id: i32) {
        self.pending_async.retain(|(p, _)| *p != id);
    }

    pub fn has_pending_async(&self) -> bool {
        !self.pending_async.is_empty()
    }

    pub fn record_has_pending_async(&self, record: i64) -> bool {
        self.pending_async.iter().any(|(_, r)| *r == record)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub type SharedConnection = Arc<Mutex<Connection>>;

/// Global unit number → connection table.
pub struct UnitRegistry {
    units: Mutex<HashMap<i32, SharedConnection>>,
}

impl UnitRegistry {
    fn new() -> Self {
        Self {
            units: Mutex::new(HashMap::new()),
        }
    }

    /// Install (or replace) the connection for a unit.
    pub fn connect(&self, unit: i32, connection: Connection) -> SharedConnection {
        let shared = Arc::new(Mutex::new(connection));
        self.units.lock().insert(unit, Arc::clone(&shared));
        shared
    }

    /// Look up a connection; absent units are not implicitly opened.
    pub fn lookup(&self, unit: i32) -> Option<SharedConnection> {
        self.units.lock().get(&unit).map(Arc::clone)
    }

    /// Look up a connection, installing `make()` if absent.
    pub fn ensure(&self, unit: i32, make: impl FnOnce() -> Connection) -> SharedConnection {
        let mut units = self.units.lock();
        Arc::clone(
            units
                .entry(unit)
                .or_insert_with(|| Arc::new(Mutex::new(make()))),
        )
    }

    pub fn disconnect(&self, unit: i32) {
        self.units.lock().remove(&unit);
    }
}

/// The process-wide registry.
pub fn registry() -> &'static UnitRegistry {
    static REGISTRY: OnceLock<UnitRegistry> = OnceLock::new();
    REGISTRY.get_or_init(UnitRegistry::new)
}

/// Resolve a unit for a statement with the given needs.
pub fn resolve(unit: i32, need_write: bool, need_read: bool) -> Result<SharedConnection, IoError> {
    let conn = registry()
        .lookup(unit)
        .ok_or(IoError::UnitNotConnected(unit))?;
    {
        let c = conn.lock();
        if (need_write && !c.is_writable()) || (need_read && !c.is_readable()) {
            return Err(IoError::DirectionMismatch);
        }
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_device_round_trip() {
        let mut d = MemoryDevice::new();
        d.write(b"hello").unwrap();
        d.end_record().unwrap();
        d.write(b"world").unwrap();
        d.end_record().unwrap();
        d.seek_record(1).unwrap();
        assert_eq!(d.read_record().unwrap().unwrap(), b"hello");
        assert_eq!(d.read_record().unwrap().unwrap(), b"world");
        assert_eq!(d.read_record().unwrap(), None);
    }

    #[test]
    fn test_memory_device_direct_write_sparse() {
        let mut d = MemoryDevice::new();
        d.seek_record(3).unwrap();
        d.write(b"third").unwrap();
        d.end_record().unwrap();
        assert_eq!(d.records().len(), 3);
        assert_eq!(d.records()[2], b"third");
        assert!(d.records()[0].is_empty());
    }

    #[test]
    fn test_seek_rejects_nonpositive_record() {
        let mut d = MemoryDevice::new();
        assert!(matches!(
            d.seek_record(0),
            Err(IoError::BadRecordNumber(0))
        ));
    }

    #[test]
    fn test_connection_tracks_record_number() {
        let mut c = Connection::memory();
        assert_eq!(c.record(), 1);
        c.write(b"a").unwrap();
        c.end_record().unwrap();
        assert_eq!(c.record(), 2);
    }

    #[test]
    fn test_connection_seek_requires_direct() {
        let mut c = Connection::memory();
        assert!(c.seek_record(2).is_err());
        let mut d = Connection::memory_direct();
        assert!(d.seek_record(2).is_ok());
    }

    #[test]
    fn test_async_bookkeeping() {
        let mut c = Connection::memory_direct();
        c.note_async(1, 5);
        c.note_async(2, 6);
        assert!(c.has_pending_async());
        assert!(c.record_has_pending_async(5));
        assert!(!c.record_has_pending_async(7));
        c.clear_async(1);
        assert!(!c.record_has_pending_async(5));
        c.clear_async(2);
        assert!(!c.has_pending_async());
    }

    #[test]
    fn test_registry_lookup_and_resolve() {
        let reg = registry();
        reg.connect(900, Connection::memory());
        assert!(reg.lookup(900).is_some());
        assert!(resolve(900, true, false).is_ok());
        assert!(matches!(
            resolve(901, true, false),
            Err(IoError::UnitNotConnected(901))
        ));
        reg.disconnect(900);
        assert!(reg.lookup(900).is_none());
    }
}
