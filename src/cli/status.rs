//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了健康检查命令的实现。

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::service::{HealthReport, TodoService};
use crate::utils::redaction::redact_connection_string;
use anyhow::Result;
use secrecy::ExposeSecret;

pub async fn execute(config: &Config, args: &StatusArgs) -> Result<()> {
    println!("=== oxtodo Status ===\n");

    let service = match TodoService::from_config(config).await {
        Ok(service) => service,
        Err(e) => {
            println!("Store:   ❌ UNAVAILABLE ({})", e);
            return Ok(());
        }
    };

    let report = service.health().await;
    print_report(&report, service.cache_backend_name());

    if args.verbose {
        println!();
        println!(
            "Store URL:   {}",
            redact_connection_string(config.store.url.expose_secret())
        );
        println!("Cache mode:  {:?}", config.cache.mode);
        println!(
            "Cache URL:   {}",
            redact_connection_string(config.cache.connection_string.expose_secret())
        );
        println!("Record TTL:  {}s", config.cache.ttl_secs);
    }

    Ok(())
}

fn print_report(report: &HealthReport, cache_backend: &str) {
    let store = if report.store {
        "✅ HEALTHY"
    } else {
        "❌ UNAVAILABLE"
    };
    let cache = if report.cache {
        "✅ HEALTHY"
    } else {
        "⚠️ DEGRADED"
    };
    println!("Store:   {}", store);
    println!("Cache:   {} ({})", cache, cache_backend);
}
