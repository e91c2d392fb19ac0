//! Significance Engine. Runs the whole battery of tests over a [`DailySeries`] and collects
//! whatever could be computed into a [`SignificanceReport`].
pub mod render;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{
    series::{DailySeries, EmptyInputError, DAY_NAMES},
    stats::{
        cohens_d, describe, mann_whitney_u, mean_difference_ci, one_way_anova, shapiro_wilk,
        t_test_independent, AnovaResult, ConfidenceInterval, Descriptive, EffectSize,
        MannWhitneyU, ShapiroWilk, SignificanceLevel, StatsError, TTest, ALPHA,
    },
};

/// One statistical test, with the field names reporting tools depend on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub statistic: f64,
    pub p_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_upper: Option<f64>,
}

impl TestResult {
    fn new(name: &str, statistic: f64, p_value: f64) -> Self {
        Self {
            name: name.to_string(),
            statistic,
            p_value,
            effect_size: None,
            ci_lower: None,
            ci_upper: None,
        }
    }
}

/// A step that could not be computed. Reported next to the results, never as a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedStep {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl From<Descriptive> for GroupStats {
    fn from(descriptive: Descriptive) -> Self {
        Self {
            n: descriptive.n,
            mean: descriptive.mean,
            median: descriptive.median,
            std_dev: descriptive.std_dev.ok(),
            min: descriptive.min,
            max: descriptive.max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekAnova {
    #[serde(flatten)]
    pub result: AnovaResult,
    /// Days that had observations and went into the test.
    pub included_days: Vec<&'static str>,
    pub excluded_days: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificanceReport {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub day_count: usize,
    pub weekday: Option<GroupStats>,
    pub weekend: Option<GroupStats>,
    /// Weekday mean minus weekend mean.
    pub difference: Option<f64>,
    /// Difference as a percentage of the weekend mean.
    pub percent_difference: Option<f64>,
    pub normality_weekday: Option<ShapiroWilk>,
    pub normality_weekend: Option<ShapiroWilk>,
    pub t_test: Option<TTest>,
    pub mann_whitney: Option<MannWhitneyU>,
    pub effect_size: Option<EffectSize>,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub anova: Option<DayOfWeekAnova>,
    pub tests: Vec<TestResult>,
    pub skipped: Vec<SkippedStep>,
    pub is_significant: bool,
    pub verdict: String,
}

/// Both tests have to agree. A test that could not run counts as not significant.
pub fn is_significant(t_test_p: Option<f64>, mann_whitney_p: Option<f64>) -> bool {
    matches!(
        (t_test_p, mann_whitney_p),
        (Some(t_p), Some(u_p)) if t_p < ALPHA && u_p < ALPHA
    )
}

fn verdict(
    significant: bool,
    t_test: Option<&TTest>,
    mann_whitney: Option<&MannWhitneyU>,
    effect_size: Option<&EffectSize>,
) -> String {
    let threshold = t_test
        .zip(mann_whitney)
        .map(|(t_test, mann_whitney)| t_test.p_value.max(mann_whitney.p_value))
        .and_then(|p_value| SignificanceLevel::from_p(p_value).threshold());

    match (significant, t_test, threshold) {
        (true, Some(t_test), Some(threshold)) => {
            let direction = if t_test.t > 0.0 { "more" } else { "fewer" };
            let effect = effect_size
                .map(|effect| format!(", {} effect (Cohen's d = {:.2})", effect.band, effect.d))
                .unwrap_or_default();
            format!(
                "The weekend effect is statistically significant: weekdays have {direction} transactions than weekends (p < {threshold}){effect}."
            )
        }
        _ => "The weekend effect is not statistically significant, the observed difference could be due to chance.".to_string(),
    }
}

#[derive(Default)]
struct Steps {
    tests: Vec<TestResult>,
    skipped: Vec<SkippedStep>,
}

impl Steps {
    fn run<T>(&mut self, name: &str, result: Result<T, StatsError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(step = name, %err, "statistic not computable, skipping");
                self.skip(name, err.to_string());
                None
            }
        }
    }

    fn skip(&mut self, name: &str, reason: String) {
        self.skipped.push(SkippedStep {
            name: name.to_string(),
            reason,
        });
    }
}

#[instrument(skip_all, fields(days = series.len()))]
pub fn analyze(series: &DailySeries) -> Result<SignificanceReport, EmptyInputError> {
    if series.is_empty() {
        return Err(EmptyInputError);
    }

    let weekday_counts = series.weekday_counts();
    let weekend_counts = series.weekend_counts();
    debug!(
        weekday_days = weekday_counts.len(),
        weekend_days = weekend_counts.len(),
        "partitioned series"
    );

    let mut steps = Steps::default();

    let weekday: Option<GroupStats> = steps
        .run("descriptive_weekday", describe(&weekday_counts))
        .map(Into::into);
    let weekend: Option<GroupStats> = steps
        .run("descriptive_weekend", describe(&weekend_counts))
        .map(Into::into);
    for (name, group) in [("std_dev_weekday", &weekday), ("std_dev_weekend", &weekend)] {
        if let Some(group) = group.as_ref().filter(|group| group.std_dev.is_none()) {
            let err = StatsError::InsufficientSample {
                required: 2,
                actual: group.n,
            };
            steps.skip(name, err.to_string());
        }
    }

    let difference = weekday
        .as_ref()
        .zip(weekend.as_ref())
        .map(|(weekday, weekend)| weekday.mean - weekend.mean);
    let percent_difference = difference
        .zip(weekend.as_ref())
        .filter(|(_, weekend)| weekend.mean != 0.0)
        .map(|(difference, weekend)| difference / weekend.mean * 100.0);

    let normality_weekday = steps.run("shapiro_wilk_weekday", shapiro_wilk(&weekday_counts));
    let normality_weekend = steps.run("shapiro_wilk_weekend", shapiro_wilk(&weekend_counts));
    for (name, normality) in [
        ("shapiro_wilk_weekday", &normality_weekday),
        ("shapiro_wilk_weekend", &normality_weekend),
    ] {
        if let Some(normality) = normality {
            steps
                .tests
                .push(TestResult::new(name, normality.w, normality.p_value));
        }
    }

    let t_test = steps.run("t_test", t_test_independent(&weekday_counts, &weekend_counts));
    let mann_whitney = steps.run(
        "mann_whitney_u",
        mann_whitney_u(&weekday_counts, &weekend_counts),
    );

    let effect_size = steps.run("cohens_d", cohens_d(&weekday_counts, &weekend_counts));
    let confidence_interval = steps.run(
        "confidence_interval",
        mean_difference_ci(&weekday_counts, &weekend_counts),
    );

    if let Some(t_test) = &t_test {
        steps.tests.push(TestResult {
            effect_size: effect_size.map(|effect| effect.d),
            ci_lower: confidence_interval.map(|interval| interval.lower),
            ci_upper: confidence_interval.map(|interval| interval.upper),
            ..TestResult::new("t_test", t_test.t, t_test.p_value)
        });
    }
    if let Some(mann_whitney) = &mann_whitney {
        steps.tests.push(TestResult::new(
            "mann_whitney_u",
            mann_whitney.u,
            mann_whitney.p_value,
        ));
    }

    let anova = day_of_week_anova(series, &mut steps);
    if let Some(anova) = &anova {
        steps.tests.push(TestResult::new(
            "anova_day_of_week",
            anova.result.f,
            anova.result.p_value,
        ));
    }

    let significant = is_significant(
        t_test.map(|t_test| t_test.p_value),
        mann_whitney.map(|mann_whitney| mann_whitney.p_value),
    );
    let verdict = verdict(
        significant,
        t_test.as_ref(),
        mann_whitney.as_ref(),
        effect_size.as_ref(),
    );

    Ok(SignificanceReport {
        first_date: series.first_date(),
        last_date: series.last_date(),
        day_count: series.len(),
        weekday,
        weekend,
        difference,
        percent_difference,
        normality_weekday,
        normality_weekend,
        t_test,
        mann_whitney,
        effect_size,
        confidence_interval,
        anova,
        tests: steps.tests,
        skipped: steps.skipped,
        is_significant: significant,
        verdict,
    })
}

fn day_of_week_anova(series: &DailySeries, steps: &mut Steps) -> Option<DayOfWeekAnova> {
    let groups = series.day_of_week_groups();

    let mut included_days = Vec::new();
    let mut excluded_days = Vec::new();
    let mut present: Vec<&[f64]> = Vec::new();
    for (day_name, group) in DAY_NAMES.iter().zip(groups.iter()) {
        if group.is_empty() {
            excluded_days.push(*day_name);
        } else {
            included_days.push(*day_name);
            present.push(group);
        }
    }

    if !excluded_days.is_empty() {
        steps.skip(
            "anova_empty_days",
            format!("no observations on {}", excluded_days.join(", ")),
        );
    }

    steps
        .run("anova_day_of_week", one_way_anova(&present))
        .map(|result| DayOfWeekAnova {
            result,
            included_days,
            excluded_days,
        })
}
