//! Subnet address-space allocation
//!
//! Pure functions: the result is re-derived from the provider's current
//! subnet list on every call and never cached.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// IPv4 address block `base/prefix_len`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Block {
    pub base: Ipv4Addr,
    pub prefix_len: u8,
}

impl Ipv4Block {
    pub fn new(base: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(CloudError::InvalidArgument(format!(
                "prefix length /{} is out of range",
                prefix_len
            )));
        }
        Ok(Self { base, prefix_len })
    }

    /// Number of addresses in the block.
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    fn mask(&self) -> u32 {
        if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        }
    }

    pub fn is_aligned(&self) -> bool {
        u32::from(self.base) & !self.mask() == 0
    }

    fn first(&self) -> u64 {
        u64::from(u32::from(self.base) & self.mask())
    }

    fn last(&self) -> u64 {
        self.first() + self.size() - 1
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains(&self, other: &Ipv4Block) -> bool {
        other.prefix_len >= self.prefix_len
            && u64::from(u32::from(other.base)) >= self.first()
            && u64::from(u32::from(other.base)) + other.size() - 1 <= self.last()
    }
}

impl std::fmt::Display for Ipv4Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

impl FromStr for Ipv4Block {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CloudError::InvalidArgument(format!("invalid CIDR: {}", s)))?;
        let base = addr
            .parse::<Ipv4Addr>()
            .map_err(|_| CloudError::InvalidArgument(format!("invalid CIDR address: {}", s)))?;
        let prefix_len = prefix
            .parse::<u8>()
            .map_err(|_| CloudError::InvalidArgument(format!("invalid CIDR prefix: {}", s)))?;
        Self::new(base, prefix_len)
    }
}

/// Every `prefix_len` block inside `parent` whose base is not already taken,
/// in increasing address order.
///
/// Provider blocks are issued on fixed boundaries, so exclusion compares base
/// addresses exactly. An empty result means the space is exhausted.
pub fn allocatable_blocks(
    parent: &Ipv4Block,
    prefix_len: u8,
    existing: &[Ipv4Block],
) -> Result<Vec<Ipv4Block>> {
    if prefix_len < parent.prefix_len || prefix_len > 32 {
        return Err(CloudError::InvalidArgument(format!(
            "block size /{} does not fit in {}",
            prefix_len, parent
        )));
    }

    let step = 1u64 << (32 - u32::from(prefix_len));
    let mut blocks = Vec::new();
    let mut cursor = parent.first();
    while cursor <= parent.last() {
        // cursor never exceeds u32::MAX inside the loop
        let base = Ipv4Addr::from(cursor as u32);
        if !existing.iter().any(|b| b.base == base) {
            blocks.push(Ipv4Block { base, prefix_len });
        }
        cursor += step;
    }
    Ok(blocks)
}

/// Reject a requested block that is outside the parent space, misaligned,
/// of the wrong size, or already allocated.
///
/// The message lists the currently creatable blocks.
pub fn validate_block(
    candidate: &Ipv4Block,
    parent: &Ipv4Block,
    prefix_len: u8,
    existing: &[Ipv4Block],
) -> Result<()> {
    let creatable = allocatable_blocks(parent, prefix_len, existing)?;
    let listing = || {
        let list: Vec<String> = creatable.iter().map(|b| b.to_string()).collect();
        if list.is_empty() {
            "none (address space exhausted)".to_string()
        } else {
            list.join(", ")
        }
    };

    let problem = if candidate.prefix_len != prefix_len {
        Some(format!("prefix must be /{}", prefix_len))
    } else if !parent.contains(candidate) {
        Some(format!("block is outside {}", parent))
    } else if !candidate.is_aligned() {
        Some(format!("base address is not aligned to /{}", prefix_len))
    } else {
        None
    };

    if let Some(problem) = problem {
        return Err(CloudError::InvalidArgument(format!(
            "invalid subnet CIDR {}: {}. creatable blocks: {}",
            candidate,
            problem,
            listing()
        )));
    }

    if existing.iter().any(|b| b.base == candidate.base) {
        return Err(CloudError::AlreadyExists(format!(
            "subnet CIDR {} is already allocated. creatable blocks: {}",
            candidate,
            listing()
        )));
    }
    Ok(())
}
