use comfy_table::{Cell, Table};

use crate::diagnostics::{SignCheck, SubsetResult, Vif};
use crate::evaluation::Evaluation;
use crate::models::{Coefficient, CvPoint, ModelSummary};
use crate::pipeline::{AnalysisReport, ModelOutcome};

fn num(v: f64) -> String {
    if v.is_infinite() {
        "inf".to_string()
    } else if v.is_nan() {
        "-".to_string()
    } else if v != 0.0 && (v.abs() < 1e-3 || v.abs() >= 1e5) {
        format!("{:.3e}", v)
    } else {
        format!("{:.4}", v)
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(num).unwrap_or_else(|| "-".to_string())
}

fn p_value(v: Option<f64>) -> String {
    match v {
        Some(p) if p < 2e-16 => "<2e-16".to_string(),
        Some(p) => num(p),
        None => "-".to_string(),
    }
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// The whole report as plain text.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut lines = vec![
        "Heating load analysis".to_string(),
        format!(
            "{} observations ({} dropped at load), seed {}: {} train / {} test",
            report.observations,
            report.dropped_rows,
            report.partition.seed(),
            report.partition.train().len(),
            report.partition.test().len()
        ),
        "\nModel comparison (test set, model scale)".to_string(),
        comparison_table(&report.models).to_string(),
    ];

    for outcome in &report.models {
        match outcome {
            ModelOutcome::Evaluated { formula, evaluation } => {
                lines.push(format!("\n== {} ==\n{}", evaluation.info.name, formula));
                lines.extend(summary_lines(evaluation));
            }
            ModelOutcome::Rejected { name, formula, reason } => {
                lines.push(format!("\n== {name} ==\n{formula}\nrejected: {reason}"));
            }
        }
    }

    lines.push("\nVariance inflation (ols_full design, train rows)".to_string());
    lines.push(vif_table(&report.vif).to_string());

    lines.push("\nBest subsets (hl, train rows)".to_string());
    lines.push(subsets_table(&report.best_subsets).to_string());

    if !report.sign_checks.is_empty() {
        lines.push("\nSurface-area direction vs ols_full coefficient (test rows)".to_string());
        lines.push(sign_table(&report.sign_checks).to_string());
    }
    join_lines(lines)
}

/// One evaluation with its summary, for single-preset runs.
pub fn render_evaluation(formula: &str, evaluation: &Evaluation) -> String {
    let mut lines = vec![
        evaluation.info.to_string(),
        formula.to_string(),
        format!(
            "train {} / test {}: mse {}, correlation {}",
            evaluation.n_train,
            evaluation.n_test,
            num(evaluation.mse),
            num(evaluation.correlation)
        ),
    ];
    lines.extend(summary_lines(evaluation));
    join_lines(lines)
}

fn comparison_table(models: &[ModelOutcome]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Model", "Method", "Target", "MSE", "Correlation", "RMSE (original)", "Status"]);
    for outcome in models {
        match outcome {
            ModelOutcome::Evaluated { evaluation, .. } => {
                table.add_row(vec![
                    Cell::new(&evaluation.info.name),
                    Cell::new(&evaluation.info.method),
                    Cell::new(&evaluation.info.target),
                    Cell::new(num(evaluation.mse)),
                    Cell::new(num(evaluation.correlation)),
                    Cell::new(opt(evaluation.original_metrics.get_metric("rmse"))),
                    Cell::new("ok"),
                ]);
            }
            ModelOutcome::Rejected { name, .. } => {
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("rejected"),
                ]);
            }
        }
    }
    table
}

fn summary_lines(evaluation: &Evaluation) -> Vec<String> {
    let mut lines = Vec::new();
    match &evaluation.summary {
        ModelSummary::Linear(s) => {
            lines.push(coefficient_table(&s.coefficients, true).to_string());
            lines.push(format!(
                "Residual standard error {} on {} df; R² {}, adjusted R² {}",
                num(s.residual_std_error),
                s.df_residual,
                num(s.r_squared),
                num(s.adj_r_squared)
            ));
            lines.push(format!(
                "F statistic {} on {} and {} df, p-value {}",
                num(s.f_statistic),
                s.coefficients.len().saturating_sub(1),
                s.df_residual,
                p_value(Some(s.f_p_value))
            ));
        }
        ModelSummary::Penalized(s) => {
            lines.push(format!("{} alpha {}", s.method, num(s.alpha)));
            lines.push(coefficient_table(&s.coefficients, false).to_string());
            if !s.dropped.is_empty() {
                lines.push(format!("dropped: {}", s.dropped.join(", ")));
            }
            if !s.cv.is_empty() {
                lines.push(cv_line(&s.cv, "alpha"));
            }
        }
        ModelSummary::Tree(s) => {
            lines.push(format!("depth {}", s.depth));
            if !s.cv.is_empty() {
                lines.push(cv_line(&s.cv, "depth"));
            }
        }
        ModelSummary::Forest(s) => {
            lines.push(format!(
                "{} trees, {} candidate predictors per split",
                s.n_trees, s.features_per_split
            ));
        }
    }
    lines
}

fn coefficient_table(coefficients: &[Coefficient], inference: bool) -> Table {
    let mut table = Table::new();
    if inference {
        table.set_header(vec!["Term", "Estimate", "Std. error", "t", "p"]);
    } else {
        table.set_header(vec!["Term", "Estimate"]);
    }
    for c in coefficients {
        let mut row = vec![Cell::new(&c.name), Cell::new(num(c.estimate))];
        if inference {
            row.push(Cell::new(opt(c.std_error)));
            row.push(Cell::new(opt(c.t_value)));
            row.push(Cell::new(p_value(c.p_value)));
        }
        table.add_row(row);
    }
    table
}

fn cv_line(curve: &[CvPoint], param: &str) -> String {
    match curve.iter().min_by(|a, b| a.mean_error.total_cmp(&b.mean_error)) {
        Some(best) => format!(
            "CV over {} {} values: minimum error {} ± {} at {} {}",
            curve.len(),
            param,
            num(best.mean_error),
            num(best.std_error),
            param,
            num(best.param)
        ),
        None => String::new(),
    }
}

fn vif_table(vif: &[Vif]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Column", "VIF", "R²"]);
    for v in vif {
        table.add_row(vec![Cell::new(&v.column), Cell::new(num(v.vif)), Cell::new(num(v.r_squared))]);
    }
    table
}

fn subsets_table(subsets: &[SubsetResult]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Size", "Terms", "RSS", "R²", "Adj. R²", "Cp", "BIC"]);
    for s in subsets {
        table.add_row(vec![
            Cell::new(s.size),
            Cell::new(s.terms.join(" + ")),
            Cell::new(num(s.rss)),
            Cell::new(num(s.r_squared)),
            Cell::new(num(s.adj_r_squared)),
            Cell::new(num(s.cp)),
            Cell::new(num(s.bic)),
        ]);
    }
    table
}

fn sign_table(checks: &[SignCheck]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Model", "Mean change", "Up", "Down", "Flat", "Reference coef.", "Verdict"]);
    for c in checks {
        table.add_row(vec![
            Cell::new(&c.model),
            Cell::new(num(c.effect.mean_change)),
            Cell::new(c.effect.increases),
            Cell::new(c.effect.decreases),
            Cell::new(c.effect.unchanged),
            Cell::new(num(c.reference_coefficient)),
            Cell::new(if c.contradiction { "CONTRADICTS" } else { "agrees" }),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loading::{Attribute, Dataset, Observation, Partition};
    use crate::evaluation::Evaluator;
    use crate::models::INTERCEPT;
    use crate::pipeline::ModelSpec;

    fn ols_evaluation() -> Evaluation {
        let observations = (0..24)
            .map(|i| {
                let wa = 245.0 + 24.5 * (i % 6) as f64;
                let ga = [0.0, 0.1, 0.25, 0.4][i % 4];
                let hl = 5.0 + 0.05 * wa + 20.0 * ga + 0.3 * ((i * 7) % 5) as f64;
                Observation::new([0.9, 514.5, wa, 110.25, 7.0, 2.0, ga, 1.0, hl, hl + 2.0])
            })
            .collect();
        let ds = Dataset::new(observations, 0).unwrap();
        let partition = Partition::split(ds.len(), 0.75, 1).unwrap();
        let spec = ModelSpec::builder()
            .numeric_terms([Attribute::WallArea, Attribute::GlazingArea])
            .build()
            .unwrap();
        Evaluator::evaluate(&ds, &partition, &spec).unwrap()
    }

    #[test]
    fn linear_evaluation_lists_fit_statistics() {
        let eval = ols_evaluation();
        let text = render_evaluation("hl ~ wa + ga", &eval);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines.contains(&"hl ~ wa + ga"));
        assert!(text.contains(INTERCEPT));
        assert!(text.contains(&format!("mse {}", num(eval.mse))));
        assert!(lines.iter().any(|l| l.starts_with("Residual standard error") && l.contains("R²")));
        assert!(lines.iter().any(|l| l.starts_with("F statistic")));
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(num(0.5), "0.5000");
        assert_eq!(num(f64::INFINITY), "inf");
        assert_eq!(num(0.0), "0.0000");
        assert_eq!(num(1.5e-5), "1.500e-5");
        assert_eq!(p_value(Some(1e-20)), "<2e-16");
        assert_eq!(opt(None), "-");
    }

    #[test]
    fn coefficient_table_lists_terms() {
        let table = coefficient_table(
            &[Coefficient::point("(Intercept)", 1.0), Coefficient::point("sa", -0.25)],
            false,
        );
        let text = table.to_string();
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("-0.2500"));
    }
}
