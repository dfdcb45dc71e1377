use std::time::Duration;

use crate::log::LogLevel;

const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 10;
const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 250;
const DEFAULT_NAVBAR_SCROLLED_OFFSET: f64 = 50.0;
const DEFAULT_NEAR_TOP_OFFSET: f64 = 100.0;
const DEFAULT_OBSERVER_THRESHOLD: f64 = 0.1;
const DEFAULT_ROOT_MARGIN_TOP_PERCENT: f64 = 10.0;
const DEFAULT_ROOT_MARGIN_BOTTOM_PERCENT: f64 = 60.0;
const DEFAULT_REVEAL_THRESHOLD: f64 = 0.1;
const DEFAULT_MOBILE_BREAKPOINT: f64 = 768.0;
const DEFAULT_SUBMIT_DELAY_MS: u64 = 2_000;
const DEFAULT_INITIAL_HASH_DELAY_MS: u64 = 100;
const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

const SCROLL_DEBOUNCE_MS_BOUNDS: (u64, u64) = (1, 1_000);
const RESIZE_DEBOUNCE_MS_BOUNDS: (u64, u64) = (1, 5_000);
const NAVBAR_SCROLLED_OFFSET_BOUNDS: (f64, f64) = (0.0, 1_000.0);
const NEAR_TOP_OFFSET_BOUNDS: (f64, f64) = (0.0, 2_000.0);
const THRESHOLD_BOUNDS: (f64, f64) = (0.0, 1.0);
const ROOT_MARGIN_PERCENT_BOUNDS: (f64, f64) = (0.0, 100.0);
const MOBILE_BREAKPOINT_BOUNDS: (f64, f64) = (320.0, 4_096.0);
const SUBMIT_DELAY_MS_BOUNDS: (u64, u64) = (0, 30_000);
const INITIAL_HASH_DELAY_MS_BOUNDS: (u64, u64) = (0, 5_000);

/// In the browser the overrides come from `data-*` attributes on the
/// `<html>` element, e.g. `data-scroll-debounce-ms="16"`.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub scroll_debounce: Duration,
    pub resize_debounce: Duration,
    pub navbar_scrolled_offset: f64,
    pub near_top_offset: f64,
    pub observer_threshold: f64,
    pub root_margin_top_percent: f64,
    pub root_margin_bottom_percent: f64,
    pub reveal_threshold: f64,
    pub mobile_breakpoint: f64,
    pub submit_delay: Duration,
    pub initial_hash_delay: Duration,
    pub log_level: LogLevel,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            scroll_debounce: Duration::from_millis(DEFAULT_SCROLL_DEBOUNCE_MS),
            resize_debounce: Duration::from_millis(DEFAULT_RESIZE_DEBOUNCE_MS),
            navbar_scrolled_offset: DEFAULT_NAVBAR_SCROLLED_OFFSET,
            near_top_offset: DEFAULT_NEAR_TOP_OFFSET,
            observer_threshold: DEFAULT_OBSERVER_THRESHOLD,
            root_margin_top_percent: DEFAULT_ROOT_MARGIN_TOP_PERCENT,
            root_margin_bottom_percent: DEFAULT_ROOT_MARGIN_BOTTOM_PERCENT,
            reveal_threshold: DEFAULT_REVEAL_THRESHOLD,
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            submit_delay: Duration::from_millis(DEFAULT_SUBMIT_DELAY_MS),
            initial_hash_delay: Duration::from_millis(DEFAULT_INITIAL_HASH_DELAY_MS),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl SiteConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let scroll_debounce_ms = parse_u64_with_bounds(
            &lookup,
            "scroll-debounce-ms",
            DEFAULT_SCROLL_DEBOUNCE_MS,
            SCROLL_DEBOUNCE_MS_BOUNDS,
        );
        let resize_debounce_ms = parse_u64_with_bounds(
            &lookup,
            "resize-debounce-ms",
            DEFAULT_RESIZE_DEBOUNCE_MS,
            RESIZE_DEBOUNCE_MS_BOUNDS,
        );
        let navbar_scrolled_offset = parse_f64_with_bounds(
            &lookup,
            "navbar-scrolled-offset",
            DEFAULT_NAVBAR_SCROLLED_OFFSET,
            NAVBAR_SCROLLED_OFFSET_BOUNDS,
        );
        let near_top_offset = parse_f64_with_bounds(
            &lookup,
            "near-top-offset",
            DEFAULT_NEAR_TOP_OFFSET,
            NEAR_TOP_OFFSET_BOUNDS,
        );
        let observer_threshold = parse_f64_with_bounds(
            &lookup,
            "observer-threshold",
            DEFAULT_OBSERVER_THRESHOLD,
            THRESHOLD_BOUNDS,
        );
        let root_margin_top_percent = parse_f64_with_bounds(
            &lookup,
            "root-margin-top",
            DEFAULT_ROOT_MARGIN_TOP_PERCENT,
            ROOT_MARGIN_PERCENT_BOUNDS,
        );
        let root_margin_bottom_percent = parse_f64_with_bounds(
            &lookup,
            "root-margin-bottom",
            DEFAULT_ROOT_MARGIN_BOTTOM_PERCENT,
            ROOT_MARGIN_PERCENT_BOUNDS,
        );
        let reveal_threshold = parse_f64_with_bounds(
            &lookup,
            "reveal-threshold",
            DEFAULT_REVEAL_THRESHOLD,
            THRESHOLD_BOUNDS,
        );
        let mobile_breakpoint = parse_f64_with_bounds(
            &lookup,
            "mobile-breakpoint",
            DEFAULT_MOBILE_BREAKPOINT,
            MOBILE_BREAKPOINT_BOUNDS,
        );
        let submit_delay_ms = parse_u64_with_bounds(
            &lookup,
            "submit-delay-ms",
            DEFAULT_SUBMIT_DELAY_MS,
            SUBMIT_DELAY_MS_BOUNDS,
        );
        let initial_hash_delay_ms = parse_u64_with_bounds(
            &lookup,
            "initial-hash-delay-ms",
            DEFAULT_INITIAL_HASH_DELAY_MS,
            INITIAL_HASH_DELAY_MS_BOUNDS,
        );
        let log_level = parse_non_empty_string(&lookup, "log-level")
            .and_then(|value| LogLevel::from_str(&value))
            .unwrap_or(DEFAULT_LOG_LEVEL);

        Self {
            scroll_debounce: Duration::from_millis(scroll_debounce_ms),
            resize_debounce: Duration::from_millis(resize_debounce_ms),
            navbar_scrolled_offset,
            near_top_offset,
            observer_threshold,
            root_margin_top_percent,
            root_margin_bottom_percent,
            reveal_threshold,
            mobile_breakpoint,
            submit_delay: Duration::from_millis(submit_delay_ms),
            initial_hash_delay: Duration::from_millis(initial_hash_delay_ms),
            log_level,
        }
    }
}

fn parse_non_empty_string<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64_with_bounds<F>(lookup: &F, key: &str, default: u64, bounds: (u64, u64)) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    parse_non_empty_string(lookup, key)
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}

fn parse_f64_with_bounds<F>(lookup: &F, key: &str, default: f64, bounds: (f64, f64)) -> f64
where
    F: Fn(&str) -> Option<String>,
{
    parse_non_empty_string(lookup, key)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && (bounds.0..=bounds.1).contains(value))
        .unwrap_or(default)
}
