#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcConfig {
    pub grace_hours: u32,
    pub batch_size: u32,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            grace_hours: 24,
            batch_size: 200,
        }
    }
}

impl GcConfig {
    pub fn clamped(grace_hours: Option<u32>, batch_size: Option<u32>) -> Self {
        Self {
            grace_hours: grace_hours.unwrap_or(24).min(8760),
            batch_size: batch_size.unwrap_or(200).clamp(1, 5000),
        }
    }
}
