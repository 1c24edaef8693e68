//! Human-readable listings printed by the command line.

use std::fmt::Write;

use polish_engine::{Maturity, RuleCatalog, Schedule};

use crate::pipeline::UnitReport;

/// Every production rule of `catalog` (and drafts when `all`), then the
/// bundles.
pub fn rule_table(catalog: &RuleCatalog, all: bool) -> String {
    let mut out = String::new();
    for entry in catalog.entries() {
        let rule = &entry.descriptor;
        if rule.is_draft() && !all {
            continue;
        }
        let maturity = match rule.maturity {
            Maturity::Draft => ", draft",
            Maturity::Production => "",
        };
        writeln!(out, "{} (level {}+{maturity})", rule.id, rule.min_level)
            .expect("fmt::Write to String never fails");
        if !rule.description.is_empty() {
            writeln!(out, "    {}", rule.description).expect("fmt::Write to String never fails");
        }
        let mut field = |label: &str, values: Vec<String>| {
            if !values.is_empty() {
                writeln!(out, "    {label}: {}", values.join(", "))
                    .expect("fmt::Write to String never fails");
            }
        };
        field("tags", rule.tags.iter().map(ToString::to_string).collect());
        field(
            "refs",
            rule.external_refs.iter().map(ToString::to_string).collect(),
        );
        field("aliases", rule.aliases.iter().map(ToString::to_string).collect());
    }

    let mut bundles: Vec<_> = catalog.bundles().collect();
    if bundles.is_empty() {
        return out;
    }
    bundles.sort_by_key(|bundle| bundle.id);
    out.push_str("\nbundles:\n");
    for bundle in bundles {
        writeln!(
            out,
            "  {} ({} rules): {}",
            bundle.id,
            bundle.members.len(),
            bundle.description
        )
        .expect("fmt::Write to String never fails");
    }
    out
}

/// The schedule in execution order, followed by its lints.
pub fn schedule_listing(schedule: &Schedule<'_>) -> String {
    let mut out = String::new();
    for (index, id) in schedule.ids().iter().enumerate() {
        writeln!(out, "{:>3}. {id}", index + 1).expect("fmt::Write to String never fails");
    }
    for lint in schedule.lints() {
        writeln!(out, "warning: {lint}").expect("fmt::Write to String never fails");
    }
    out
}

/// Rewrites per rule and any problems for one unit.
pub fn unit_summary(report: &UnitReport) -> String {
    let outcome = &report.outcome;
    let mut out = String::new();
    let state = if outcome.converged {
        "converged"
    } else {
        "not converged"
    };
    writeln!(
        out,
        "{}: {} rewrite(s) in {} pass(es), {state}",
        report.unit.path, outcome.rewrites, outcome.passes
    )
    .expect("fmt::Write to String never fails");
    for (rule, count) in report.diagnostics.applied_by_rule() {
        writeln!(out, "  {rule}: {count}").expect("fmt::Write to String never fails");
    }
    for problem in report.diagnostics.problems() {
        writeln!(out, "  {problem}").expect("fmt::Write to String never fails");
    }
    out
}
