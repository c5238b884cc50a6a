//! Helper functions registered on every script engine.
//!
//! Timestamps reach scripts as epoch milliseconds, so the time helpers all
//! speak milliseconds.

use chrono::{DateTime, Utc};
use rhai::{Dynamic, Engine, INT};
use std::fmt::Write;

/// Registers all helper functions in the Rhai engine.
pub fn register_builtin_functions(engine: &mut Engine) {
    register_time_functions(engine);
    register_parsing_functions(engine);
    register_null_functions(engine);
}

fn register_time_functions(engine: &mut Engine) {
    engine.register_fn("now_ms", || Utc::now().timestamp_millis());

    // RFC 3339, or () when out of range
    engine.register_fn("format_ts", |millis: INT| -> Dynamic {
        DateTime::from_timestamp_millis(millis)
            .map(|ts| Dynamic::from(ts.to_rfc3339()))
            .unwrap_or(Dynamic::UNIT)
    });

    // strftime-style pattern; an invalid pattern yields ()
    engine.register_fn("format_ts", |millis: INT, pattern: &str| -> Dynamic {
        let Some(ts) = DateTime::from_timestamp_millis(millis) else {
            return Dynamic::UNIT;
        };
        let mut out = String::new();
        match write!(out, "{}", ts.format(pattern)) {
            Ok(()) => Dynamic::from(out),
            Err(_) => Dynamic::UNIT,
        }
    });

    engine.register_fn("parse_ts", |s: &str| -> Dynamic {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| Dynamic::from(ts.timestamp_millis()))
            .unwrap_or(Dynamic::UNIT)
    });
}

fn register_parsing_functions(engine: &mut Engine) {
    engine.register_fn("parse_int", |s: &str| -> Dynamic {
        s.trim().parse::<INT>().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });

    engine.register_fn("parse_float", |s: &str| -> Dynamic {
        s.trim().parse::<f64>().map(Dynamic::from).unwrap_or(Dynamic::UNIT)
    });

    engine.register_fn("parse_bool", |s: &str| -> Dynamic {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Dynamic::from(true),
            "false" | "0" | "no" | "off" => Dynamic::from(false),
            _ => Dynamic::UNIT,
        }
    });
}

fn register_null_functions(engine: &mut Engine) {
    engine.register_fn("is_null", |value: Dynamic| value.is_unit());

    // First argument unless it is ()
    engine.register_fn("coalesce", |value: Dynamic, fallback: Dynamic| {
        if value.is_unit() {
            fallback
        } else {
            value
        }
    });
}
