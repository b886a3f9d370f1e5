use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;
use sysinfo::System;

use crate::{constants::START_TIME, AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: &'static str,
    store: &'static str,
    cache_entries: usize,
    memory_usage: String,
}

fn process_memory() -> String {
    let mut sys = System::new();
    let Ok(pid) = sysinfo::get_current_pid() else {
        return "Unknown".to_string();
    };
    sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map_or_else(
        || "Unknown".to_string(),
        |p| format!("{:.2} MB", p.memory() as f64 / 1024.0 / 1024.0),
    )
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now = Utc::now();
    let uptime = now.signed_duration_since(*START_TIME).num_seconds().max(0) as u64;

    let store = match state.store.ping().await {
        Ok(()) => "OK",
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            "Unavailable"
        }
    };

    let response = HealthCheckResponse {
        status: if store == "OK" { "healthy" } else { "degraded" },
        uptime: format_duration(Duration::from_secs(uptime)).to_string(),
        timestamp: now.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        store,
        cache_entries: state.cache.len(),
        memory_usage: process_memory(),
    };

    HttpResponse::Ok().json(response)
}
