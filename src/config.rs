use std::time::Duration;

use crate::oid::Oid;

/// HOST-RESOURCES-MIB `hrStorageDescr`.
pub const HR_STORAGE_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 3];
/// UCD-SNMP-MIB `dskPath`.
pub const DSK_PATH: &[u32] = &[1, 3, 6, 1, 4, 1, 2021, 9, 1, 2];

pub const DEFAULT_COMMUNITY: &str = "public";
pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WARNING: &str = "~:80";
pub const DEFAULT_CRITICAL: &str = "~:90";
pub const DEFAULT_MOUNT: &str = "/";

/// Where a check finds its rows: the name column that is walked, and the sibling columns read
/// for the matched row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Column holding mount points or device names.
    pub names: Oid,
    /// Segments to drop from `names` before appending a column number.
    pub trim: usize,
}

impl TableLayout {
    /// `hrStorageTable`: column 5 is `hrStorageSize`, column 6 `hrStorageUsed`.
    pub fn host_resources() -> TableLayout {
        TableLayout {
            names: Oid::from(HR_STORAGE_DESCR),
            trim: 1,
        }
    }

    /// UCD `dskTable`: column 9 is `dskPercent`, column 10 `dskPercentNode`.
    pub fn ucd_disk() -> TableLayout {
        TableLayout {
            names: Oid::from(DSK_PATH),
            trim: 1,
        }
    }
}

pub const HR_STORAGE_SIZE_COLUMN: &str = "5";
pub const HR_STORAGE_USED_COLUMN: &str = "6";
pub const DSK_PERCENT_COLUMN: &str = "9";
pub const DSK_PERCENT_NODE_COLUMN: &str = "10";

/// What one invocation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Used share of a `hrStorageTable` entry, computed from its size and used columns.
    Usage,
    /// `dskPercent` of a UCD disk entry.
    Disk,
    /// `dskPercentNode` of a UCD disk entry.
    Inodes,
}

impl CheckKind {
    pub fn layout(&self) -> TableLayout {
        match self {
            CheckKind::Usage => TableLayout::host_resources(),
            CheckKind::Disk | CheckKind::Inodes => TableLayout::ucd_disk(),
        }
    }
}

/// Everything one invocation needs, built once from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub host: String,
    pub port: u16,
    pub community: String,
    /// Bounds every single request, walk steps included.
    pub timeout: Duration,
    pub kind: CheckKind,
    pub mount: String,
    pub warning: String,
    pub critical: String,
    pub perf_data: bool,
}

impl CheckConfig {
    pub fn new(host: &str, kind: CheckKind) -> CheckConfig {
        CheckConfig {
            host: host.to_owned(),
            port: DEFAULT_PORT,
            community: DEFAULT_COMMUNITY.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            kind,
            mount: DEFAULT_MOUNT.to_owned(),
            warning: DEFAULT_WARNING.to_owned(),
            critical: DEFAULT_CRITICAL.to_owned(),
            perf_data: false,
        }
    }

    /// `host:port`, bracketing bare IPv6 addresses.
    pub fn agent_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
