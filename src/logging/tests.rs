// hotmod: Hot-Reloading Mod Host
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogFormat, LogLevel};

#[test]
fn test_log_level_range() {
    assert_eq!(LogLevel::from_u8(0), Some(LogLevel::SILENT));
    assert_eq!(LogLevel::from_u8(6), Some(LogLevel::DUMP));
    assert_eq!(LogLevel::from_u8(7), None);
    assert!(LogLevel::new(9).is_err());
    assert_eq!(u8::from(LogLevel::WARN), 2);
}

#[test]
fn test_filter_strings() {
    let filters: Vec<_> = (0..=6)
        .filter_map(LogLevel::from_u8)
        .map(LogLevel::to_filter_string)
        .collect();
    insta::assert_debug_snapshot!(filters, @r#"
    [
        "off",
        "error,hotmod=error",
        "warn,hotmod=warn",
        "warn,hotmod=info",
        "warn,hotmod=debug",
        "warn,hotmod=trace",
        "trace",
    ]
    "#);
}

#[test]
fn test_tracing_level_mapping() {
    assert!(LogLevel::SILENT.to_tracing_level().is_none());
    assert_eq!(
        LogLevel::DUMP.to_tracing_level(),
        Some(tracing::Level::TRACE)
    );
}

#[test]
fn test_log_config_builder() {
    let config = LogConfig::builder()
        .with_console_level(LogLevel::WARN)
        .with_log_file("out/hotmod.log".to_string())
        .with_file_format(LogFormat::Json)
        .build();

    assert_eq!(config.console_level(), LogLevel::WARN);
    assert_eq!(config.file_level(), LogLevel::DEBUG);
    assert_eq!(config.log_file(), Some("out/hotmod.log"));
    assert_eq!(config.file_format(), LogFormat::Json);
    assert!(!config.show_target());
}

#[test]
fn test_log_level_serde() {
    let level: LogLevel = serde_json::from_str("4").unwrap();
    assert_eq!(level, LogLevel::DEBUG);
    assert!(serde_json::from_str::<LogLevel>("12").is_err());
    assert_eq!(serde_json::to_string(&LogLevel::ERROR).unwrap(), "1");
}

#[test]
fn test_console_filter_mutes_progress_target() {
    let shown = LogConfig::builder().with_console_level(LogLevel::INFO).build();
    assert!(shown.console_progress());
    assert_eq!(
        shown.console_filter_string(),
        LogLevel::INFO.to_filter_string()
    );

    let muted = LogConfig::builder()
        .with_console_level(LogLevel::INFO)
        .with_console_progress(false)
        .build();
    assert_eq!(
        muted.console_filter_string(),
        format!("{},hotmod::progress=off", LogLevel::INFO.to_filter_string())
    );

    let silent = LogConfig::builder()
        .with_console_level(LogLevel::SILENT)
        .with_console_progress(false)
        .build();
    assert_eq!(silent.console_filter_string(), "off");
}
