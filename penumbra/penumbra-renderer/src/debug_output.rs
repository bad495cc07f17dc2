//! Routes device debug messages to `log`. Notifications are dropped.

use penumbra_rhi::{DebugMessage, DebugSeverity, GpuDevice};

pub fn log_level(severity: DebugSeverity) -> Option<log::Level> {
    match severity {
        DebugSeverity::High => Some(log::Level::Error),
        DebugSeverity::Medium => Some(log::Level::Warn),
        DebugSeverity::Low => Some(log::Level::Info),
        DebugSeverity::Notification => None,
    }
}

pub fn format_message(message: &DebugMessage) -> String {
    format!(
        "[{}] {} ({} severity): {}",
        message.source.name(),
        message.kind.name(),
        message.severity.name(),
        message.message
    )
}

/// Log everything the device queued since the last call; returns how many messages were logged.
pub fn drain(device: &mut dyn GpuDevice) -> usize {
    let mut logged = 0;
    for message in device.drain_debug_messages() {
        if let Some(level) = log_level(message.severity) {
            log::log!(target: "penumbra::gpu", level, "{}", format_message(&message));
            logged += 1;
        }
    }
    logged
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::headless::RecordingDevice;
    use penumbra_rhi::{DebugSource, DebugType};

    fn message(severity: DebugSeverity) -> DebugMessage {
        DebugMessage {
            source: DebugSource::ShaderCompiler,
            kind: DebugType::Performance,
            severity,
            message: "slow path".into(),
        }
    }

    #[test]
    fn notifications_are_dropped() {
        let mut device = RecordingDevice::new();
        device.push_debug_message(message(DebugSeverity::Notification));
        device.push_debug_message(message(DebugSeverity::High));
        device.push_debug_message(message(DebugSeverity::Low));
        assert_eq!(drain(&mut device), 2);
        assert_eq!(drain(&mut device), 0);
    }

    #[test]
    fn message_names_source_type_and_severity() {
        let text = format_message(&message(DebugSeverity::Medium));
        assert_eq!(text, "[Shader Compiler] Performance (medium severity): slow path");
        assert_eq!(log_level(DebugSeverity::Medium), Some(log::Level::Warn));
    }
}
