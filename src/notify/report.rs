//! Plain-text and HTML rendering of a scan.

use chrono::{DateTime, Utc};

use crate::models::OptionContract;
use crate::scanner::ScanResult;

pub const REPORT_TITLE: &str = "Option Pro – Ranked Ideas";

/// Rows shown in the debug dump of every candidate
pub const MAX_DEBUG_ROWS: usize = 50;

/// One-line summary of a contract
pub fn fmt_contract(c: &OptionContract) -> String {
    let g = &c.greeks;
    let mut line = format!(
        "{} {} {} {} | mid {:.2} | Δ {:.2} Γ {:.3} Θd {:.2} V {:.2}",
        c.symbol(),
        c.quote.expiry.format("%Y-%m-%d"),
        c.option_type(),
        c.quote.strike,
        c.mid,
        g.delta,
        g.gamma,
        g.theta_day,
        g.vega
    );

    if let (Some(change), Some(roi)) = (c.exp_change, c.exp_roi) {
        line.push_str(&format!(" | expΔ ${:.2} | ROI {:.2}%", change, roi));
    }
    if let Some(target) = c.target_price {
        line.push_str(&format!(" | tgt {:.2}", target));
    }
    if let Some(profit) = c.estimated_profit() {
        line.push_str(&format!(" | est ${:.0}/contract", profit));
    }
    line.push_str(&format!(" | P(ITM) {:.0}%", c.prob_itm * 100.0));
    line
}

fn block(out: &mut Vec<String>, title: &str, rows: &[OptionContract]) {
    out.push(format!("{}:", title));
    if rows.is_empty() {
        out.push("None".to_string());
    } else {
        out.extend(rows.iter().map(|r| format!("- {}", fmt_contract(r))));
    }
    out.push(String::new());
}

/// Text body of the report email
pub fn build_email(result: &ScanResult, now: DateTime<Utc>) -> String {
    let meta = &result.meta;
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        String::new(),
        now.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        String::new(),
        format!(
            "horizon={}m, DTE<= {}, strikes_around={}",
            meta.horizon_min, meta.max_dte_days, meta.strikes_around
        ),
        String::new(),
    ];

    block(&mut lines, "Tier 1 (High Conviction)", &result.tier1);
    block(&mut lines, "Tier 2 (Moderate)", &result.tier2);
    block(&mut lines, "Watchlist (Top Fallback)", &result.watch);

    if !result.all.is_empty() {
        lines.push("All candidates (debug):".to_string());
        lines.extend(
            result
                .all
                .iter()
                .take(MAX_DEBUG_ROWS)
                .map(|r| format!("- {}", fmt_contract(r))),
        );
        if result.all.len() > MAX_DEBUG_ROWS {
            lines.push(format!("... and {} more", result.all.len() - MAX_DEBUG_ROWS));
        }
        lines.push(String::new());
    }

    if !result.logs.is_empty() {
        lines.push("Debug".to_string());
        lines.push(String::new());
        lines.extend(result.logs.iter().cloned());
    }

    lines.join("\n")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Monospace HTML rendering of a text body
pub fn build_html(body: &str) -> String {
    format!(
        "<pre style=\"font-family: ui-monospace, SFMono-Regular, Menlo, monospace;\">{}</pre>",
        escape_html(body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OptionType;
    use crate::options::fixtures::contract;
    use crate::options::{FilterConfig, ScoreConfig};
    use crate::scanner::ScanMeta;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 9, 15, 0, 0).unwrap()
    }

    fn result(all: Vec<OptionContract>, logs: Vec<String>) -> ScanResult {
        ScanResult {
            tier1: all.iter().take(1).cloned().collect(),
            tier2: Vec::new(),
            watch: Vec::new(),
            all,
            logs,
            meta: ScanMeta {
                run_id: Uuid::nil(),
                timestamp: now(),
                horizon_min: 120,
                max_dte_days: 14,
                strikes_around: 6,
                universe: vec!["SPY".to_string()],
                filter: FilterConfig::default(),
                score: ScoreConfig::default(),
            },
        }
    }

    #[test]
    fn test_fmt_contract() {
        let mut c = contract("SPY", OptionType::Call, 500.0, 2.0, 2.1);
        assert_eq!(
            fmt_contract(&c),
            "SPY 2025-07-18 CALL 500 | mid 2.05 | Δ 0.50 Γ 0.020 Θd -0.05 V 0.10 | P(ITM) 50%"
        );

        c.exp_change = Some(0.15);
        c.exp_roi = Some(7.317);
        c.target_price = Some(2.20);
        assert!(fmt_contract(&c)
            .ends_with("| expΔ $0.15 | ROI 7.32% | tgt 2.20 | est $15/contract | P(ITM) 50%"));

        c.exp_change = Some(-0.304);
        assert!(fmt_contract(&c).contains("| est $-30/contract |"));
    }

    #[test]
    fn test_build_email_sections() {
        let c = contract("SPY", OptionType::Put, 495.5, 1.0, 1.1);
        let body = build_email(
            &result(vec![c], vec!["[SPY] Forecast: ok".to_string()]),
            now(),
        );

        assert!(body.starts_with("Option Pro – Ranked Ideas\n\n2025-07-09 15:00:00 UTC"));
        assert!(body.contains("horizon=120m, DTE<= 14, strikes_around=6"));
        assert!(body.contains("Tier 1 (High Conviction):\n- SPY 2025-07-18 PUT 495.5"));
        assert!(body.contains("Tier 2 (Moderate):\nNone"));
        assert!(body.contains("Watchlist (Top Fallback):\nNone"));
        assert!(body.contains("All candidates (debug):"));
        assert!(body.ends_with("Debug\n\n[SPY] Forecast: ok"));
    }

    #[test]
    fn test_empty_scan_has_no_debug_dump() {
        let body = build_email(&result(Vec::new(), Vec::new()), now());
        assert!(!body.contains("All candidates"));
        assert!(!body.contains("Debug"));
    }

    #[test]
    fn test_debug_dump_is_capped() {
        let all = (0..60)
            .map(|i| contract("AMD", OptionType::Call, 100.0 + i as f64, 1.0, 1.1))
            .collect();
        let body = build_email(&result(all, Vec::new()), now());
        assert!(body.contains("... and 10 more"));
    }

    #[test]
    fn test_build_html_escapes() {
        let html = build_html("a < b & c");
        assert!(html.starts_with("<pre"));
        assert!(html.contains("a &lt; b &amp; c"));
        assert!(html.ends_with("</pre>"));
    }
}
