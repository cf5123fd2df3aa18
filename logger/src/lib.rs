// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

/// Filter directives for the logger, in `env_logger` syntax. Eg `AMLDS_LOG=debug`
/// or `AMLDS_LOG=info,amlds_credential=trace`.
pub const LOG_LEVEL_ENV_VAR: &str = "AMLDS_LOG";

pub fn try_init() -> Result<(), log::SetLoggerError> {
    builder().parse_env(LOG_LEVEL_ENV_VAR).try_init()
}

fn builder() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    builder
        .format(|fmt, record| {
            use std::io::Write;

            let timestamp = fmt.timestamp();

            if record.level() >= log::Level::Debug {
                writeln!(
                    fmt,
                    "<{}>{} [{}] - [{}] {}",
                    to_syslog_level(record.level()),
                    timestamp,
                    level_tag(record.level()),
                    record.target(),
                    record.args()
                )
            } else {
                writeln!(
                    fmt,
                    "<{}>{} [{}] - {}",
                    to_syslog_level(record.level()),
                    timestamp,
                    level_tag(record.level()),
                    record.args()
                )
            }
        })
        .filter_level(log::LevelFilter::Info);

    builder
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRCE",
        log::Level::Debug => "DBUG",
        log::Level::Info => "INFO",
        log::Level::Warn => "WARN",
        log::Level::Error => "ERR!",
    }
}

fn to_syslog_level(level: log::Level) -> i8 {
    match level {
        log::Level::Error => 3,
        log::Level::Warn => 4,
        log::Level::Info => 6,
        log::Level::Debug | log::Level::Trace => 7,
    }
}
