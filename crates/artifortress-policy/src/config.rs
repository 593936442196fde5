use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    pub evaluation_timeout: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout: Duration::from_millis(250),
        }
    }
}
