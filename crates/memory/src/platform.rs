//! Node-bound page allocation
//!
//! Thin platform layer over the kernel's NUMA interface. On Linux, buffers
//! are mapped anonymously and bound to their target node with `mbind(2)`;
//! page residency is queried with `move_pages(2)` in query mode. Non-Linux
//! targets behave as a single-node machine: node 0 is valid, binding is a
//! no-op, and residency queries are inconclusive.

use core::fmt;
use core::ptr::NonNull;

use crate::error::{AllocResult, MemoryError};

/// NUMA node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumaNode(pub usize);

impl fmt::Display for NumaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Smallest granularity the kernel binds at.
pub const PAGE_SIZE: usize = 4096;

// Memory policy constants from <numaif.h>. libc does not expose the MPOL_*
// set on every target, so they are defined here and passed to raw syscalls.
#[cfg(target_os = "linux")]
const MPOL_BIND: libc::c_int = 2;
#[cfg(target_os = "linux")]
const MPOL_MF_STRICT: libc::c_ulong = 1 << 0;
#[cfg(target_os = "linux")]
const MPOL_MF_MOVE: libc::c_ulong = 1 << 1;

/// Whether the kernel exposes NUMA topology on this host.
pub fn numa_available() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::path::Path::new("/sys/devices/system/node").is_dir()
    }

    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// Number of NUMA nodes on this host. Always at least 1.
pub fn node_count() -> usize {
    #[cfg(target_os = "linux")]
    {
        let mut count = 0;
        if let Ok(entries) = std::fs::read_dir("/sys/devices/system/node") {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if let Some(rest) = name.strip_prefix("node") {
                    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                        count += 1;
                    }
                }
            }
        }
        count.max(1)
    }

    #[cfg(not(target_os = "linux"))]
    {
        1
    }
}

/// An anonymous mapping owned 1:1 by its holder, unmapped exactly once on
/// drop. The mapped length is rounded up to whole pages.
pub(crate) struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
}

impl MappedRegion {
    pub(crate) fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Mapped length in bytes (page-rounded, >= the requested length).
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        #[cfg(target_os = "linux")]
        // SAFETY: ptr/len describe a mapping created by `map_on_node` that
        // nothing else unmaps; drop runs at most once.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast::<libc::c_void>(), self.len);
        }

        #[cfg(not(target_os = "linux"))]
        // SAFETY: allocation came from `std::alloc::alloc_zeroed` with the
        // identical layout reconstructed here.
        unsafe {
            let layout = std::alloc::Layout::from_size_align_unchecked(self.len, PAGE_SIZE);
            std::alloc::dealloc(self.ptr.as_ptr(), layout);
        }
    }
}

fn round_to_pages(len: usize) -> usize {
    let len = len.max(1);
    len.div_ceil(PAGE_SIZE) * PAGE_SIZE
}

/// Map `len` bytes of zeroed memory bound to `node`.
///
/// On a single-node host the binding step is vacuous and skipped; the caller
/// is expected to have validated `node` against [`node_count`] already.
pub(crate) fn map_on_node(len: usize, node: NumaNode) -> AllocResult<MappedRegion> {
    let map_len = round_to_pages(len);

    #[cfg(target_os = "linux")]
    {
        // SAFETY: anonymous private mapping with no address hint; the result
        // is checked against MAP_FAILED before use.
        let raw = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(MemoryError::System {
                message: format!(
                    "mmap of {map_len} bytes failed: {}",
                    std::io::Error::last_os_error()
                ),
            });
        }
        let ptr = NonNull::new(raw.cast::<u8>()).expect("mmap returned null");
        let region = MappedRegion { ptr, len: map_len };

        if node_count() > 1 {
            bind_region(&region, node)?;
        }

        Ok(region)
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = node;
        let layout = std::alloc::Layout::from_size_align(map_len, PAGE_SIZE)
            .map_err(|_| MemoryError::InvalidLayout { size: map_len, align: PAGE_SIZE })?;
        // SAFETY: layout has non-zero, page-rounded size.
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            return Err(MemoryError::System {
                message: format!("allocation of {map_len} bytes failed"),
            });
        };
        Ok(MappedRegion { ptr, len: map_len })
    }
}

/// Bind every page of `region` to `node` with a strict policy, moving any
/// already-faulted pages.
#[cfg(target_os = "linux")]
fn bind_region(region: &MappedRegion, node: NumaNode) -> AllocResult<()> {
    let mut nodemask: libc::c_ulong = 1 << node.0;
    // SAFETY: addr/len describe the live mapping; nodemask outlives the call;
    // maxnode covers the full width of the single-word mask.
    let rc = unsafe {
        libc::syscall(
            libc::SYS_mbind,
            region.as_ptr().as_ptr(),
            region.len(),
            MPOL_BIND,
            &raw mut nodemask,
            (core::mem::size_of::<libc::c_ulong>() * 8) as libc::c_ulong,
            MPOL_MF_STRICT | MPOL_MF_MOVE,
        )
    };
    if rc != 0 {
        return Err(MemoryError::System {
            message: format!(
                "mbind to {node} failed: {}",
                std::io::Error::last_os_error()
            ),
        });
    }
    Ok(())
}

/// Allocate one probe page on `node`, fault it in, and report which node the
/// kernel actually placed it on. `None` when the question cannot be answered
/// on this host.
pub fn probe_node_residency(node: NumaNode) -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let region = map_on_node(PAGE_SIZE, node).ok()?;
        // Force a physical page fault so the page has a residency to report.
        // SAFETY: the probe page is mapped read-write and exclusively owned.
        unsafe {
            region.as_ptr().as_ptr().write_volatile(1);
        }

        let mut pages = [region.as_ptr().as_ptr().cast::<libc::c_void>()];
        let mut status: [libc::c_int; 1] = [-1];
        // SAFETY: one page pointer, a null nodes array (query mode), and a
        // status slot of matching length, all valid for the call's duration.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_move_pages,
                0 as libc::pid_t,
                1 as libc::c_ulong,
                pages.as_mut_ptr(),
                core::ptr::null::<libc::c_int>(),
                status.as_mut_ptr(),
                0 as libc::c_int,
            )
        };
        drop(region);

        if rc == 0 && status[0] >= 0 {
            Some(status[0] as usize)
        } else {
            None
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = node;
        None
    }
}
