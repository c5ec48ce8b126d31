use crate::types::ProbeResult;
use crate::utils::escape_label_value;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

pub const POD_API_ACCESS: &str = "k8s_pod_api_access";
pub const ACCESS_HEARTBEAT: &str = "k8s_api_access_heartbeat";
pub const KUBERNETES_HEART_BEAT: &str = "kubernetes_heart_beat";

/// Lines written at the top of the file before any probe result.
pub fn header_lines<Tz: TimeZone>(now: &DateTime<Tz>) -> Vec<String>
where
    Tz::Offset: std::fmt::Display,
{
    vec![
        format!("# {}", now.to_rfc3339_opts(SecondsFormat::Secs, false)),
        format!("{} {}", KUBERNETES_HEART_BEAT, now.timestamp()),
        format!(
            "# HELP {} Whether the pod's service account can access the Kubernetes API (1) or not (0).",
            POD_API_ACCESS
        ),
        format!("# TYPE {} gauge", POD_API_ACCESS),
    ]
}

pub fn render_probe(result: &ProbeResult) -> String {
    format!(
        "{}{{namespace=\"{}\", pod=\"{}\"}} {}",
        POD_API_ACCESS,
        escape_label_value(&result.namespace),
        escape_label_value(&result.pod),
        u8::from(result.accessible)
    )
}

pub fn render_heartbeat(at: &DateTime<Utc>) -> String {
    format!("{} {}", ACCESS_HEARTBEAT, at.timestamp())
}
