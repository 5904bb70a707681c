/// Format a byte count with the largest unit whose threshold the value meets,
/// always with one decimal place: 1536 -> "1.5 KB", 0 -> "0.0 bytes".
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} bytes", bytes as f64)
    }
}

/// Render a per-core usage vector for speech, 1-indexed for display.
pub fn format_cpu_cores(per_core: &[f32]) -> String {
    per_core
        .iter()
        .enumerate()
        .map(|(i, usage)| format!("Core {}: {usage:.1}%", i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}
