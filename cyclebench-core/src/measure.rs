//! Cycle Clock
//!
//! Serialized reads of the hardware reference-cycle counter (`LFENCE; RDTSC`
//! on x86_64, `ISB; CNTVCT_EL0` on AArch64) plus a coarse millisecond wall
//! clock used only to bracket whole runs.

use std::sync::OnceLock;
use std::time::Instant;

// ─── Process anchor ──────────────────────────────────────────────────────────

struct Anchor {
    instant: Instant,
    unix_ms: i64,
}

static ANCHOR: OnceLock<Anchor> = OnceLock::new();

fn anchor() -> &'static Anchor {
    ANCHOR.get_or_init(|| Anchor {
        instant: Instant::now(),
        unix_ms: chrono::Utc::now().timestamp_millis(),
    })
}

// ─── Inline cycle counter helpers ────────────────────────────────────────────

/// Read the reference cycle counter.
///
/// The leading `LFENCE` waits for every earlier instruction to retire so the
/// measured section cannot leak past the read; the trailing one keeps later
/// instructions from starting before the counter is sampled.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_cycles() -> u64 {
    let lo: u32;
    let hi: u32;
    // SAFETY: LFENCE and RDTSC exist on every x86_64 CPU and only read the
    // timestamp counter.
    unsafe {
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "lfence",
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags),
        );
    }
    (u64::from(hi) << 32) | u64::from(lo)
}

/// Read the virtual counter on AArch64 (fixed frequency, comparable to the TSC).
#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn read_cycles() -> u64 {
    let cnt: u64;
    // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
    // ISB flushes the pipeline so the read is not speculated early.
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cnt,
            options(nostack, nomem),
        );
    }
    cnt
}

/// No hardware counter: nanoseconds since the process anchor.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline(always)]
pub fn read_cycles() -> u64 {
    anchor().instant.elapsed().as_nanos() as u64
}

/// Whether [`read_cycles`] reads a real hardware counter.
///
/// When `false`, readings are monotonic nanoseconds instead of cycles.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

/// Calendar time in milliseconds since the Unix epoch.
///
/// Sampled from the system clock once per process and advanced with a
/// monotonic clock afterwards, so two readings never go backwards.
pub fn wall_clock_millis() -> i64 {
    let anchor = anchor();
    let elapsed = i64::try_from(anchor.instant.elapsed().as_millis()).unwrap_or(i64::MAX);
    anchor.unix_ms.saturating_add(elapsed)
}

// ─── CycleSource ─────────────────────────────────────────────────────────────

/// Anything that can produce cycle-counter readings.
///
/// The benchmark handle samples through this trait so that measurement logic
/// can be driven by scripted readings as well as the hardware counter.
pub trait CycleSource {
    /// Take one reading.
    fn read(&mut self) -> u64;
}

/// The hardware counter behind [`read_cycles`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareClock;

impl CycleSource for HardwareClock {
    #[inline(always)]
    fn read(&mut self) -> u64 {
        read_cycles()
    }
}

impl<F> CycleSource for F
where
    F: FnMut() -> u64,
{
    #[inline(always)]
    fn read(&mut self) -> u64 {
        self()
    }
}

// ─── CPU affinity ────────────────────────────────────────────────────────────

/// Pin the current thread to a single core.
///
/// Keeps every reading of a run on one core's counter, avoiding cross-core skew.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    let max = libc::CPU_SETSIZE as usize;
    if cpu >= max {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("cpu {cpu} is outside the affinity mask (max {max})"),
        ));
    }

    // SAFETY: cpu_set_t is a plain bitmask, so all-zero is the empty set.
    let mut mask: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    // SAFETY: `cpu` is below CPU_SETSIZE, and pid 0 targets the calling thread.
    let rc = unsafe {
        libc::CPU_SET(cpu, &mut mask);
        libc::sched_setaffinity(0, std::mem::size_of_val(&mask), &mask)
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    tracing::trace!(cpu, "thread affinity set");
    Ok(())
}

/// Pinning is not supported here; always succeeds.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cycle_counter_monotonic() {
        let a = read_cycles();
        let b = read_cycles();
        assert!(b >= a, "cycle counter should not go backwards on one thread");
    }

    #[test]
    fn test_cycle_counter_advances() {
        let a = read_cycles();
        std::thread::sleep(Duration::from_millis(2));
        let b = read_cycles();
        assert!(b > a);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pin_out_of_range_cpu_is_rejected() {
        let err = pin_to_cpu(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_wall_clock_millis() {
        let start = wall_clock_millis();
        std::thread::sleep(Duration::from_millis(10));
        let end = wall_clock_millis();

        assert!(end >= start + 5);
        // Plausible calendar time (after 2020-01-01)
        assert!(start > 1_577_836_800_000);
    }

    #[test]
    fn test_closure_source() {
        let mut next = 10u64;
        let mut source = move || {
            next += 5;
            next
        };
        assert_eq!(CycleSource::read(&mut source), 15);
        assert_eq!(CycleSource::read(&mut source), 20);
    }
}
