//! Property tests for scoring, metrics and the normalizer

use critique::config::{ReviewConfig, ScoreWeights};
use critique::metrics::MetricAggregator;
use critique::models::{Finding, Language, MetricCategory, Metrics, Severity, Submission};
use critique::normalizer::{SourceFile, StructuralStats};
use critique::run_review;
use critique::scoring::ScoreComposer;
use proptest::prelude::*;

fn metrics_strategy() -> impl Strategy<Value = Metrics> {
    (0u8..=100, 0u8..=100, 0u8..=100, 0u8..=100, 0u8..=100).prop_map(
        |(accuracy, readability, performance, best_practices, security)| Metrics {
            accuracy,
            readability,
            performance,
            best_practices,
            security,
        },
    )
}

fn weights_strategy() -> impl Strategy<Value = ScoreWeights> {
    (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(
        |(accuracy, readability, performance, best_practices, security)| ScoreWeights {
            accuracy,
            readability,
            performance,
            best_practices,
            security,
        },
    )
}

fn category_strategy() -> impl Strategy<Value = MetricCategory> {
    prop_oneof![
        Just(MetricCategory::Accuracy),
        Just(MetricCategory::Readability),
        Just(MetricCategory::Performance),
        Just(MetricCategory::BestPractices),
        Just(MetricCategory::Security),
    ]
}

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Error),
        Just(Severity::Warning),
        Just(Severity::Suggestion),
    ]
}

fn findings_strategy() -> impl Strategy<Value = Vec<Finding>> {
    prop::collection::vec((severity_strategy(), category_strategy(), 1u32..50), 0..20).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (severity, category, line))| {
                    Finding::new(format!("rule-{}", i), severity, line, "m", category)
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn score_stays_between_weakest_and_strongest_metric(
        metrics in metrics_strategy(),
        mut weights in weights_strategy(),
    ) {
        prop_assume!(weights.sum() > 0.01);
        weights.normalize();
        let score = ScoreComposer::new(weights).score(&metrics);
        let lo = metrics.iter().map(|(_, v)| v).min().unwrap_or(0);
        let hi = metrics.iter().map(|(_, v)| v).max().unwrap_or(100);
        prop_assert!(score <= 100);
        prop_assert!(score >= lo && score <= hi, "score {} outside [{}, {}]", score, lo, hi);
    }

    #[test]
    fn score_is_rounded_weighted_sum(metrics in metrics_strategy()) {
        let weights = ScoreWeights::default();
        let expected: f64 = metrics.iter().map(|(c, v)| weights.get(c) * v as f64).sum();
        let score = ScoreComposer::new(weights).score(&metrics);
        prop_assert_eq!(score, expected.round() as u8);
    }

    #[test]
    fn another_error_never_raises_accuracy(
        findings in findings_strategy(),
        category in category_strategy(),
        line in 1u32..50,
    ) {
        let aggregator = MetricAggregator::default();
        let stats = StructuralStats::default();
        let before = aggregator.aggregate(&findings, &stats);

        let mut more = findings.clone();
        more.push(Finding::new("extra-error", Severity::Error, line, "m", category));
        let after = aggregator.aggregate(&more, &stats);

        prop_assert!(after.accuracy <= before.accuracy);
        for ((_, a), (_, b)) in after.iter().zip(before.iter()) {
            prop_assert!(a <= b);
        }
    }

    #[test]
    fn line_count_ignores_terminator_style(
        lines in prop::collection::vec("[a-z =(){}]{0,12}", 0..20),
        crlf in any::<bool>(),
    ) {
        let sep = if crlf { "\r\n" } else { "\n" };
        let text: String = lines.iter().map(|l| format!("{}{}", l, sep)).collect();
        let lf: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        let a = SourceFile::new(&text, Language::Python);
        let b = SourceFile::new(&lf, Language::Python);
        prop_assert_eq!(a.line_count(), lines.len());
        prop_assert_eq!(a.line_count(), b.line_count());
        prop_assert_eq!(a.stats(), b.stats());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn identical_submissions_give_identical_results(
        lines in prop::collection::vec(
            prop_oneof![
                Just("def f(a, b):".to_string()),
                Just("    if a:".to_string()),
                Just("        r = b  ".to_string()),
                Just("\tx = 1".to_string()),
                Just("    return r".to_string()),
                Just("out = []".to_string()),
                Just("for i in range(3):".to_string()),
                Just("    out.append(i)".to_string()),
                Just("# TODO: tidy".to_string()),
                "[a-z]{1,6} = [0-9]{1,3}",
            ],
            0..12,
        ),
    ) {
        let code = lines.join("\n");
        let submission = Submission::new(code.clone(), Language::Python);
        let config = ReviewConfig::default();
        let first = run_review(&submission, &config).unwrap();
        let second = run_review(&submission, &config).unwrap();

        prop_assert_eq!(&first.result, &second.result);
        prop_assert!(first.result.score <= 100);
        let line_count = first.stats.structure.line_count as u32;
        prop_assert!(first.result.findings.iter().all(|f| f.line >= 1 && f.line <= line_count));
    }
}
