use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Byte length of an [`ObjectId`].
pub const OBJECT_ID_LEN: usize = 12;

/// Time-ordered identifier minted for every ledger record.
///
/// Layout (big-endian):
///
/// | bytes  | content                                        |
/// |--------|------------------------------------------------|
/// | 0..4   | Unix seconds at generation time                |
/// | 4..7   | FNV-1a hash of the host's hardware addresses   |
/// | 7..9   | OS process id, truncated to 16 bits            |
/// | 9..12  | per-process counter, low 24 bits               |
///
/// Byte-wise ordering equals numeric ordering, so "greater id" means
/// "minted later" within one generator and, clock skew aside, across hosts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// Create an `ObjectId` from its raw bytes.
    pub const fn from_raw(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// The null object ID (all zeros).
    pub const fn null() -> Self {
        Self([0u8; OBJECT_ID_LEN])
    }

    /// Returns `true` if this is the null object ID.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; OBJECT_ID_LEN]
    }

    /// The raw 12 bytes.
    pub fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Lowercase hex encoding (24 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 24-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(TypeError::InvalidLength {
                expected: OBJECT_ID_LEN * 2,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; OBJECT_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Seconds since the Unix epoch encoded in the first four bytes.
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Generation time, second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(i64::from(self.timestamp_secs()), 0)
            .single()
            .unwrap_or_default()
    }

    /// The five machine + process bytes.
    pub fn machine_bytes(&self) -> [u8; 5] {
        let mut out = [0u8; 5];
        out.copy_from_slice(&self.0[4..9]);
        out
    }

    /// The 24-bit counter component.
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.0[9], self.0[10], self.0[11]])
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; OBJECT_ID_LEN]> for ObjectId {
    fn from(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// The machine + process fan-out bytes shared by every id a process mints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineIdentity {
    mac_hash: [u8; 3],
    pid: u16,
}

impl MachineIdentity {
    /// Build an identity from explicit parts.
    pub const fn from_parts(mac_hash: [u8; 3], pid: u16) -> Self {
        Self { mac_hash, pid }
    }

    /// Derive the identity of the running process.
    ///
    /// Hardware addresses of every interface are concatenated in interface
    /// name order and hashed. Fails if the host exposes no interface at all;
    /// callers treat that as a startup precondition.
    pub fn detect() -> Result<Self, TypeError> {
        let networks = sysinfo::Networks::new_with_refreshed_list();
        if networks.list().is_empty() {
            return Err(TypeError::NoNetworkInterface);
        }

        let mut interfaces: Vec<_> = networks.list().iter().collect();
        interfaces.sort_by(|a, b| a.0.cmp(b.0));

        let mut addresses = Vec::with_capacity(interfaces.len() * 6);
        for (_, data) in interfaces {
            let mac = data.mac_address();
            if !mac.is_unspecified() {
                addresses.extend_from_slice(&mac.0);
            }
        }

        Ok(Self {
            mac_hash: truncate_u24(fnv1a32(&addresses)),
            pid: std::process::id() as u16,
        })
    }

    /// The 5 bytes written at offset 4 of every id.
    pub fn to_bytes(&self) -> [u8; 5] {
        let pid = self.pid.to_be_bytes();
        [self.mac_hash[0], self.mac_hash[1], self.mac_hash[2], pid[0], pid[1]]
    }
}

/// Mints [`ObjectId`]s for one process.
///
/// The counter is seeded from the OS entropy source and advanced with a
/// single atomic add, so concurrent callers never observe the same value
/// until the 24-bit space wraps.
pub struct ObjectIdGenerator {
    machine: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Create a generator for an explicit identity.
    pub fn new(identity: MachineIdentity) -> Self {
        Self::with_seed(identity, rand::rngs::OsRng.next_u32())
    }

    /// Create a generator with a fixed counter seed.
    pub fn with_seed(identity: MachineIdentity, seed: u32) -> Self {
        Self {
            machine: identity.to_bytes(),
            counter: AtomicU32::new(seed),
        }
    }

    /// Create a generator for the running process.
    pub fn detect() -> Result<Self, TypeError> {
        Ok(Self::new(MachineIdentity::detect()?))
    }

    /// Mint an id stamped with the current time.
    pub fn generate(&self) -> ObjectId {
        let secs = Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        self.generate_at(secs)
    }

    /// Mint an id stamped with an explicit Unix timestamp.
    pub fn generate_at(&self, unix_secs: u32) -> ObjectId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let mut b = [0u8; OBJECT_ID_LEN];
        b[0..4].copy_from_slice(&unix_secs.to_be_bytes());
        b[4..9].copy_from_slice(&self.machine);
        b[9..12].copy_from_slice(&truncate_u24(count));
        ObjectId(b)
    }
}

impl fmt::Debug for ObjectIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectIdGenerator")
            .field("machine", &hex::encode(self.machine))
            .finish()
    }
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut h = OFFSET_BASIS;
    for &b in bytes {
        h ^= u32::from(b);
        h = h.wrapping_mul(PRIME);
    }
    h
}

fn truncate_u24(v: u32) -> [u8; 3] {
    let b = v.to_be_bytes();
    [b[1], b[2], b[3]]
}
