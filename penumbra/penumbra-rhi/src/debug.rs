//! Driver/validation messages surfaced by a device.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

impl DebugSource {
    pub fn name(self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::WindowSystem => "Window System",
            Self::ShaderCompiler => "Shader Compiler",
            Self::ThirdParty => "Third Party",
            Self::Application => "Application",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugType {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Marker,
    Other,
}

impl DebugType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::DeprecatedBehavior => "Deprecated Behaviour",
            Self::UndefinedBehavior => "Undefined Behaviour",
            Self::Portability => "Portability",
            Self::Performance => "Performance",
            Self::Marker => "Marker",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DebugSeverity {
    High,
    Medium,
    Low,
    Notification,
}

impl DebugSeverity {
    pub fn name(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub kind: DebugType,
    pub severity: DebugSeverity,
    pub message: String,
}
