/// Log tags identifying the originating module
///
/// Each tag maps to a `--debug-<key>` command-line flag for per-module debug
/// output.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Session,
    Risk,
    Positions,
    Scheduler,
    News,
    Calendar,
    Platform,
    Health,
    Notify,
    State,
    Config,
}

impl LogTag {
    /// Key used for `--debug-<key>` flag matching
    pub fn to_debug_key(&self) -> String {
        self.to_plain_string().to_lowercase()
    }

    /// Plain uppercase string for file output (no color codes)
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Session => "SESSION",
            LogTag::Risk => "RISK",
            LogTag::Positions => "POSITIONS",
            LogTag::Scheduler => "SCHEDULER",
            LogTag::News => "NEWS",
            LogTag::Calendar => "CALENDAR",
            LogTag::Platform => "PLATFORM",
            LogTag::Health => "HEALTH",
            LogTag::Notify => "NOTIFY",
            LogTag::State => "STATE",
            LogTag::Config => "CONFIG",
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
