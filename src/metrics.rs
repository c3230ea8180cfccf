/// Monotonic run counters, reported periodically and once more at shutdown.
/// Never persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub cycles: u64,
    pub alerts: u64,
    pub fetch_failures: u64,
}
