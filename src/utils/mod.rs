//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 工具模块

pub mod redaction;
