//! Rendering of a [`StateReport`] for terminals and machine consumers.

use outbreak_core::config::GameConfig;
use outbreak_core::model::city::CityId;
use outbreak_core::model::stack::StackWarning;
use outbreak_core::replay::ReplayWarning;
use outbreak_core::risk::StateReport;
use std::fmt::Write;

/// Formats a probability the way players read it: tenths of a percent
/// above one percent, a single significant digit below, blank at zero.
pub fn percent(value: f64) -> String {
    if value > 0.01 {
        format!("{:.1}%", value * 100.0)
    } else if value > 0.0 {
        format!("{:.2}%", value * 100.0)
    } else {
        String::new()
    }
}

fn risk_list(risks: &[f64]) -> String {
    let rendered: Vec<String> = risks
        .iter()
        .map(|&risk| {
            let cell = percent(risk);
            if cell.is_empty() { "-".to_string() } else { cell }
        })
        .collect();
    rendered.join(" / ")
}

/// A warning with the city id swapped out for its name.
fn describe_warning(config: &GameConfig, warning: &ReplayWarning) -> String {
    let name = |id: CityId| config.city(id).name.clone();
    let body = match warning.warning {
        StackWarning::ImpossibleEpidemic { city, stratum } => format!(
            "epidemic on {} is not possible from stratum {stratum}, check records",
            name(city)
        ),
        StackWarning::ExileShortfall {
            city,
            requested,
            removed,
        } => format!(
            "could only exile {removed} of {requested} {} cards, check records",
            name(city)
        ),
        StackWarning::ForecastMissing { city } => {
            format!("forecasted {} is not in the draw pile, check records", name(city))
        }
        StackWarning::InfectedTooEarly { city } => {
            format!("{} was infected too early, check records", name(city))
        }
        StackWarning::DeckExhausted => {
            "draw pile exhausted with infections still recorded".to_string()
        }
    };
    format!("turn {}: {body}", warning.turn_num)
}

pub fn render_text(report: &StateReport, config: &GameConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "game {} - turn {}", report.game_id, report.turn_num);
    let _ = writeln!(
        out,
        "deck: {} cards left, infection rate {}",
        report.deck_size, report.infection_rate
    );
    let _ = writeln!(
        out,
        "epidemics: {} seen, next-two-draws expectation {:.3}, at most {} cards away",
        report.epidemics_seen, report.epidemic_risk, report.epidemic_countdown
    );
    let _ = writeln!(out);

    let name_width = report
        .cities
        .iter()
        .map(|city| city.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let _ = writeln!(
        out,
        "{:name_width$}  {:6}  {:>9}  {:20}  {:20}",
        "city", "color", "epidemic", "infection risk", "post-epidemic risk"
    );
    for city in &report.cities {
        let epi = percent(city.epi_risk);
        let inf = risk_list(&city.inf_risk);
        let epi_inf = risk_list(&city.epi_inf_risk);
        if epi.is_empty() && city.inf_risk.iter().all(|&p| p == 0.0) {
            continue;
        }
        let _ = writeln!(
            out,
            "{:name_width$}  {:6}  {:>9}  {:20}  {:20}",
            city.name,
            city.color.as_str(),
            epi,
            inf,
            epi_inf
        );
    }

    if !report.wildcard_risk.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "wildcard: {}  (post-epidemic: {})",
            risk_list(&report.wildcard_risk),
            risk_list(&report.epi_wildcard_risk)
        );
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out);
        for warning in &report.warnings {
            let _ = writeln!(out, "warning: {}", describe_warning(config, warning));
        }
    }

    out
}

pub fn render_json(report: &StateReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
