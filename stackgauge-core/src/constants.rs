//! Shared constants for the stackgauge analysis engine.

/// Stackgauge version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bits per byte, used when converting frame sizes to byte totals.
pub const BYTE_BITS: u64 = 8;

/// Default per-thread stateless private memory budget in bytes.
pub const DEFAULT_STATELESS_PRIVATE_MEM_BYTES: u64 = 8192;

/// Default alignment for the finalized per-kernel stack amount, in bytes.
pub const DEFAULT_STACK_ALIGN_BYTES: u64 = 8;
