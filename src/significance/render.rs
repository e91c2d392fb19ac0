//! Plain text renderings of a [`SignificanceReport`].

use crate::{
    series::DailySeries,
    stats::{SignificanceLevel, Z_95},
};

use super::{GroupStats, SignificanceReport};

const RULE_WIDTH: usize = 70;

/// Rounds to a whole number and groups the digits, `1234567.8` becomes `1,234,568`.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn format_optional(value: Option<f64>) -> String {
    value
        .map(format_thousands)
        .unwrap_or_else(|| "n/a".to_string())
}

fn significance_line(p_value: f64) -> String {
    let level = SignificanceLevel::from_p(p_value);
    match level {
        SignificanceLevel::HighlySignificant => "Result: *** HIGHLY SIGNIFICANT (p < 0.001) ***",
        SignificanceLevel::VerySignificant => "Result: ** VERY SIGNIFICANT (p < 0.01) **",
        SignificanceLevel::Significant => "Result: * SIGNIFICANT (p < 0.05) *",
        SignificanceLevel::NotSignificant => "Result: NOT SIGNIFICANT (p >= 0.05)",
    }
    .to_string()
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(RULE_WIDTH));
}

fn group_lines(lines: &mut Vec<String>, label: &str, group: Option<&GroupStats>) {
    match group {
        Some(group) => {
            lines.push(format!("{label} samples: {} days", group.n));
            lines.push(format!("  Mean: {}", format_thousands(group.mean)));
            lines.push(format!("  Median: {}", format_thousands(group.median)));
            lines.push(format!("  Std Dev: {}", format_optional(group.std_dev)));
            lines.push(format!("  Min: {}", format_thousands(group.min)));
            lines.push(format!("  Max: {}", format_thousands(group.max)));
        }
        None => lines.push(format!("{label} samples: none")),
    }
}

fn not_computable(lines: &mut Vec<String>, report: &SignificanceReport, step: &str) {
    let reason = report
        .skipped
        .iter()
        .find(|skipped| skipped.name == step)
        .map(|skipped| skipped.reason.as_str())
        .unwrap_or("not computed");
    lines.push(format!("Not computable: {reason}"));
}

/// The full sectioned report printed to the console.
pub fn console_report(report: &SignificanceReport) -> String {
    let heavy_rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        heavy_rule.clone(),
        "STATISTICAL SIGNIFICANCE TESTING - WEEKEND EFFECT".to_string(),
        heavy_rule.clone(),
        format!(
            "Data period: {} to {} ({} days)",
            report.first_date, report.last_date, report.day_count
        ),
    ];

    section(&mut lines, "1. DESCRIPTIVE STATISTICS:");
    group_lines(&mut lines, "Weekday", report.weekday.as_ref());
    lines.push(String::new());
    group_lines(&mut lines, "Weekend", report.weekend.as_ref());
    match (report.difference, report.percent_difference) {
        (Some(difference), Some(percent)) => lines.push(format!(
            "\nDifference: {} ({percent:.2}%)",
            format_thousands(difference)
        )),
        (Some(difference), None) => {
            lines.push(format!("\nDifference: {}", format_thousands(difference)))
        }
        _ => lines.push("\nDifference: n/a".to_string()),
    }

    section(&mut lines, "2. NORMALITY TESTS (Shapiro-Wilk):");
    for (label, normality, step) in [
        ("Weekday", &report.normality_weekday, "shapiro_wilk_weekday"),
        ("Weekend", &report.normality_weekend, "shapiro_wilk_weekend"),
    ] {
        match normality {
            Some(normality) if normality.looks_normal() => lines.push(format!(
                "{label} p-value: {:.4} -> data looks normally distributed",
                normality.p_value
            )),
            Some(normality) => lines.push(format!(
                "{label} p-value: {:.4} -> data may not be normally distributed",
                normality.p_value
            )),
            None => {
                lines.push(format!("{label}:"));
                not_computable(&mut lines, report, step);
            }
        }
    }

    section(&mut lines, "3. INDEPENDENT SAMPLES T-TEST (Parametric):");
    match &report.t_test {
        Some(t_test) => {
            lines.push(format!("t-statistic: {:.4}", t_test.t));
            lines.push(format!("p-value: {:.6}", t_test.p_value));
            lines.push(significance_line(t_test.p_value));
        }
        None => not_computable(&mut lines, report, "t_test"),
    }

    section(&mut lines, "4. MANN-WHITNEY U TEST (Non-parametric):");
    match &report.mann_whitney {
        Some(mann_whitney) => {
            lines.push(format!("U-statistic: {:.4}", mann_whitney.u));
            lines.push(format!("p-value: {:.6}", mann_whitney.p_value));
            lines.push(significance_line(mann_whitney.p_value));
        }
        None => not_computable(&mut lines, report, "mann_whitney_u"),
    }

    section(&mut lines, "5. EFFECT SIZE (Cohen's d):");
    match &report.effect_size {
        Some(effect_size) => {
            lines.push(format!("Cohen's d: {:.4}", effect_size.d));
            lines.push(format!(
                "Interpretation: {} effect size",
                effect_size.band.to_string().to_uppercase()
            ));
        }
        None => not_computable(&mut lines, report, "cohens_d"),
    }

    section(&mut lines, "6. 95% CONFIDENCE INTERVAL FOR DIFFERENCE:");
    match &report.confidence_interval {
        Some(interval) => {
            lines.push(format!(
                "Difference: {}",
                format_thousands(interval.difference)
            ));
            lines.push(format!(
                "95% CI: [{}, {}] (difference +- {Z_95} x standard error)",
                format_thousands(interval.lower),
                format_thousands(interval.upper)
            ));
        }
        None => not_computable(&mut lines, report, "confidence_interval"),
    }

    section(&mut lines, "7. ONE-WAY ANOVA (All Days of Week):");
    match &report.anova {
        Some(anova) => {
            lines.push(format!("F-statistic: {:.4}", anova.result.f));
            lines.push(format!("p-value: {:.6}", anova.result.p_value));
            lines.push(significance_line(anova.result.p_value));
            if !anova.excluded_days.is_empty() {
                lines.push(format!(
                    "Excluded days without data: {}",
                    anova.excluded_days.join(", ")
                ));
            }
        }
        None => not_computable(&mut lines, report, "anova_day_of_week"),
    }

    if !report.skipped.is_empty() {
        section(&mut lines, "SKIPPED STEPS:");
        for skipped in &report.skipped {
            lines.push(format!("- {}: {}", skipped.name, skipped.reason));
        }
    }

    lines.push(String::new());
    lines.push(heavy_rule.clone());
    lines.push("CONCLUSION:".to_string());
    lines.push(heavy_rule.clone());
    lines.push(report.verdict.clone());
    lines.push(heavy_rule);

    lines.join("\n") + "\n"
}

/// Weekday against weekend means and the per day of week table, printed right after fetching.
pub fn series_overview(series: &DailySeries) -> String {
    let rule = "=".repeat(50);
    let summary = series.weekend_summary();
    let difference = match (summary.difference, summary.percent_difference) {
        (Some(difference), Some(percent)) => {
            format!("{} ({percent:.2}%)", format_thousands(difference))
        }
        (difference, _) => format_optional(difference),
    };

    let mut lines = vec![
        rule.clone(),
        "WEEKEND vs WEEKDAY ANALYSIS".to_string(),
        rule.clone(),
        format!(
            "Average weekday transactions: {}",
            format_optional(summary.weekday_mean)
        ),
        format!(
            "Average weekend transactions: {}",
            format_optional(summary.weekend_mean)
        ),
        format!("Difference: {difference}"),
        rule.clone(),
        String::new(),
        rule.clone(),
        "DAY OF WEEK ANALYSIS".to_string(),
        rule.clone(),
        format!("{:<10} {:>14} {:>14} {:>6}", "day", "mean", "std", "count"),
    ];

    for day in series.day_of_week_summary() {
        lines.push(format!(
            "{:<10} {:>14} {:>14} {:>6}",
            day.day_name,
            format_thousands(day.mean),
            format_optional(day.std_dev),
            day.count
        ));
    }
    lines.push(rule);

    lines.join("\n") + "\n"
}

fn p_value_or_na(p_value: Option<f64>) -> String {
    p_value
        .map(|p_value| format!("{p_value:.6}"))
        .unwrap_or_else(|| "n/a".to_string())
}

/// The compact results summary written next to the data.
pub fn summary_text(report: &SignificanceReport) -> String {
    let effect = report
        .effect_size
        .map(|effect| format!("{:.4} ({} effect)", effect.d, effect.band))
        .unwrap_or_else(|| "n/a".to_string());
    let conclusion = if report.is_significant {
        "STATISTICALLY SIGNIFICANT"
    } else {
        "NOT statistically significant"
    };

    format!(
        "STATISTICAL ANALYSIS RESULTS - ETHEREUM WEEKEND EFFECT
{rule}

Data Period: {first} to {last}
Total Days: {days}

DESCRIPTIVE STATISTICS:
- Weekday mean: {weekday_mean} transactions
- Weekend mean: {weekend_mean} transactions
- Difference: {difference} transactions

STATISTICAL TESTS:
- T-test p-value: {t_p}
- Mann-Whitney U p-value: {u_p}
- ANOVA p-value: {anova_p}

EFFECT SIZE:
- Cohen's d: {effect}

CONCLUSION:
The weekend effect is {conclusion}.
{verdict}
",
        rule = "=".repeat(RULE_WIDTH),
        first = report.first_date,
        last = report.last_date,
        days = report.day_count,
        weekday_mean = format_optional(report.weekday.as_ref().map(|group| group.mean)),
        weekend_mean = format_optional(report.weekend.as_ref().map(|group| group.mean)),
        difference = format_optional(report.difference),
        t_p = p_value_or_na(report.t_test.map(|t_test| t_test.p_value)),
        u_p = p_value_or_na(report.mann_whitney.map(|mann_whitney| mann_whitney.p_value)),
        anova_p = p_value_or_na(report.anova.as_ref().map(|anova| anova.result.p_value)),
        verdict = report.verdict,
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use crate::{
        series::{build, DayRecord},
        significance::analyze,
    };

    use super::*;

    fn report_for(counts: &[u64]) -> SignificanceReport {
        let start: NaiveDate = "2025-01-06".parse().unwrap();
        let series = build(counts.iter().enumerate().map(|(offset, tx_count)| DayRecord {
            date: start + Duration::days(offset as i64),
            tx_count: Some(*tx_count),
        }))
        .unwrap();
        analyze(&series).unwrap()
    }

    #[test]
    fn format_thousands_test() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1_234_567.8), "1,234,568");
        assert_eq!(format_thousands(-45_000.0), "-45,000");
        assert_eq!(format_thousands(-0.2), "0");
    }

    #[test]
    fn console_report_sections_test() {
        let report = report_for(&[
            1_200_000, 1_210_000, 1_190_000, 1_205_000, 1_195_000, 980_000, 990_000, 1_201_000,
            1_211_000, 1_191_000, 1_206_000, 1_196_000, 981_000, 991_000,
        ]);
        let text = console_report(&report);

        assert!(text.contains("1. DESCRIPTIVE STATISTICS:"));
        assert!(text.contains("Weekday samples: 10 days"));
        assert!(text.contains("Weekend samples: 4 days"));
        assert!(text.contains("  Mean: 1,200,500"));
        assert!(text.contains("7. ONE-WAY ANOVA (All Days of Week):"));
        assert!(text.contains("Result: *** HIGHLY SIGNIFICANT (p < 0.001) ***"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(RULE_WIDTH))));
    }

    #[test]
    fn console_report_shows_skipped_steps_test() {
        let report = report_for(&[100, 110, 120, 130, 140]);
        let text = console_report(&report);

        assert!(text.contains("Weekend samples: none"));
        assert!(text.contains("SKIPPED STEPS:"));
        assert!(text.contains("- t_test: needs at least 2 observations, got 0"));
        assert!(text.contains("not statistically significant"));
    }

    #[test]
    fn series_overview_test() {
        let start: NaiveDate = "2025-01-03".parse().unwrap();
        let series = build([100_000u64, 60_000, 80_000, 120_000].iter().enumerate().map(
            |(offset, tx_count)| DayRecord {
                date: start + Duration::days(offset as i64),
                tx_count: Some(*tx_count),
            },
        ))
        .unwrap();

        let text = series_overview(&series);

        assert!(text.contains("Average weekday transactions: 110,000"));
        assert!(text.contains("Average weekend transactions: 70,000"));
        assert!(text.contains("Difference: -40,000 (-36.36%)"));
        assert!(text.contains(&format!(
            "{:<10} {:>14} {:>14} {:>6}",
            "Monday", "120,000", "n/a", 1
        )));
        assert!(!text.contains("Tuesday"));
    }

    #[test]
    fn summary_text_test() {
        let report = report_for(&[1000, 1010, 990, 1005, 995, 500, 510]);
        let text = summary_text(&report);

        assert!(text.contains("Data Period: 2025-01-06 to 2025-01-12"));
        assert!(text.contains("Total Days: 7"));
        assert!(text.contains("- Weekday mean: 1,000 transactions"));
        assert!(text.contains("- Weekend mean: 505 transactions"));
        assert!(text.contains("- Mann-Whitney U p-value: 0.095238"));
        assert!(text.contains("The weekend effect is NOT statistically significant."));
    }
}
