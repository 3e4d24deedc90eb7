use std::fmt::Write as _;

use weather_pipeline_core::{CityAverage, Observation, Report};

const MISSING: &str = "-";

pub fn print_report(report: &Report) {
    print!("{}", render_report(report));
}

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("\nAverage temperatures (all time):\n");
    out.push_str(&render_averages(&report.averages));
    out.push_str("\nLatest record per city:\n");
    out.push_str(&render_latest(&report.latest));

    out
}

fn render_averages(rows: &[CityAverage]) -> String {
    let body = rows
        .iter()
        .map(|r| vec![r.city.clone(), float(r.avg_temp), r.samples.to_string()])
        .collect::<Vec<_>>();

    render_table(&["city", "avg_temp", "samples"], &body)
}

fn render_latest(rows: &[Observation]) -> String {
    let body = rows
        .iter()
        .map(|o| {
            vec![
                o.city.clone(),
                float(o.temperature),
                opt(o.humidity),
                o.weather.clone().unwrap_or_else(|| MISSING.to_string()),
                float(o.wind_speed),
                o.timestamp_text(),
            ]
        })
        .collect::<Vec<_>>();

    render_table(
        &["city", "temperature", "humidity", "weather", "wind_speed", "timestamp"],
        &body,
    )
}

/// Floats always keep a decimal point, so 30.0 prints as `30.0`, not `30`.
fn float(value: Option<f64>) -> String {
    value.map(|v| format!("{v:?}")).unwrap_or_else(|| MISSING.to_string())
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.to_string())
}

/// Left-aligned columns padded to the widest cell, with a leading row index.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let index_width = rows.len().saturating_sub(1).to_string().len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();

    let _ = write!(out, "{:index_width$}", "");
    for (header, width) in headers.iter().zip(&widths) {
        let _ = write!(out, "  {header:<width$}");
    }
    out.push('\n');

    if rows.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }

    for (i, row) in rows.iter().enumerate() {
        let _ = write!(out, "{i:>index_width$}");
        for (cell, width) in row.iter().zip(&widths) {
            let _ = write!(out, "  {cell:<width$}");
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_pipeline_core::model::parse_timestamp;

    fn sample_report() -> Report {
        Report {
            averages: vec![
                CityAverage { city: "Colombo".into(), avg_temp: Some(30.0), samples: 2 },
                CityAverage { city: "Atlantis".into(), avg_temp: None, samples: 1 },
            ],
            latest: vec![Observation {
                city: "New York".into(),
                temperature: Some(20.3),
                humidity: Some(65),
                weather: Some("clear sky".into()),
                wind_speed: None,
                timestamp: parse_timestamp("2024-05-01 12:00:00").unwrap(),
            }],
        }
    }

    #[test]
    fn report_has_both_sections() {
        let text = render_report(&sample_report());

        assert!(text.contains("Average temperatures (all time):"));
        assert!(text.contains("Latest record per city:"));
        assert!(text.contains("2024-05-01 12:00:00"));
        assert!(text.contains("clear sky"));
    }

    #[test]
    fn columns_are_aligned() {
        let text = render_averages(&sample_report().averages);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "   city      avg_temp  samples");
        assert_eq!(lines[1], "0  Colombo   30.0      2      ");
        assert_eq!(lines[2], "1  Atlantis  -         1      ");
    }

    #[test]
    fn whole_number_floats_keep_a_decimal() {
        let text = render_averages(&[CityAverage {
            city: "Colombo".into(),
            avg_temp: Some(30.0),
            samples: 1,
        }]);
        assert!(text.contains("30.0"));

        let mut obs = sample_report().latest.remove(0);
        obs.temperature = Some(22.0);
        obs.wind_speed = Some(6.0);
        let text = render_latest(&[obs]);

        assert!(text.contains("22.0"));
        assert!(text.contains("6.0"));
        assert!(text.contains("65 "));
    }

    #[test]
    fn rounded_means_print_as_stored() {
        assert_eq!(float(Some(15.67)), "15.67");
        assert_eq!(float(Some(20.3)), "20.3");
        assert_eq!(float(None), "-");
    }

    #[test]
    fn empty_table_says_so() {
        let text = render_latest(&[]);
        assert!(text.ends_with("(no rows)\n"));
    }
}
