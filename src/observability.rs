use std::net::SocketAddr;

use crate::command::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "vaxd_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "vaxd_command_duration_seconds";

/// Counter: failed login attempts.
pub const AUTH_FAILURES_TOTAL: &str = "vaxd_auth_failures_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "vaxd_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "vaxd_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "vaxd_connections_rejected_total";

/// Gauge: appointments currently booked.
pub const APPOINTMENTS_ACTIVE: &str = "vaxd_appointments_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "vaxd_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "vaxd_wal_flush_batch_size";

/// Counter: WAL compactions completed.
pub const WAL_COMPACTIONS_TOTAL: &str = "vaxd_wal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::CreatePatient { .. } => "create_patient",
        Command::CreateCaregiver { .. } => "create_caregiver",
        Command::LoginPatient { .. } => "login_patient",
        Command::LoginCaregiver { .. } => "login_caregiver",
        Command::SearchSchedule { .. } => "search_caregiver_schedule",
        Command::Reserve { .. } => "reserve",
        Command::UploadAvailability { .. } => "upload_availability",
        Command::Cancel { .. } => "cancel",
        Command::AddDoses { .. } => "add_doses",
        Command::ShowAppointments => "show_appointments",
        Command::Logout => "logout",
        Command::Quit => "quit",
    }
}
