//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了记录引擎的日志与链路追踪初始化。

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::trace::TracerProvider as SdkTracerProvider;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// 初始化日志与 OpenTelemetry 链路追踪
///
/// 应在进程启动时调用一次。`filter` 使用 `EnvFilter` 语法（如 `"info,oxtodo=debug"`），
/// 无法解析时退回 `info`。
///
/// # 返回值
///
/// 已经存在全局 subscriber 时返回 false，不会覆盖它
pub fn init_tracing(service_name: &str, filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    // 未配置导出器时 provider 只生成 span 上下文，不会发送数据
    let provider = SdkTracerProvider::builder().build();
    global::set_tracer_provider(provider.clone());
    let tracer = provider.tracer(service_name.to_string());

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .is_ok()
}

/// 关闭全局 tracer provider
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}
