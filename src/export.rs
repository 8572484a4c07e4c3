use std::io::Write;

use serde::Serialize;

use crate::analysis::AnomalyReport;
use crate::data::transform::normalize;
use crate::error::Result;
use crate::session::ScoredRow;

#[derive(Serialize)]
struct CsvRecord<'a> {
    timestamp: &'a str,
    value: f64,
    is_anomaly: bool,
    feedback: String,
}

const CSV_HEADER: [&str; 4] = ["timestamp", "value", "is_anomaly", "feedback"];

/// Write rows as CSV with header `timestamp,value,is_anomaly,feedback`.
/// Points without feedback get `none`. The header is written even when
/// there are no rows.
pub fn write_csv<W: Write>(writer: W, rows: &[ScoredRow<'_>]) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(CSV_HEADER)?;
    for row in rows {
        out.serialize(CsvRecord {
            timestamp: row.timestamp.unwrap_or(""),
            value: row.value,
            is_anomaly: row.is_anomaly,
            feedback: row
                .feedback
                .map_or_else(|| "none".to_string(), |f| f.to_string()),
        })?;
    }
    out.flush()?;
    Ok(())
}

/// Replace each row's value with its min-max scaled value in `[0, 1]`.
pub fn normalize_values(rows: &mut [ScoredRow<'_>]) {
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    for (row, scaled) in rows.iter_mut().zip(normalize(&values)) {
        row.value = scaled;
    }
}

/// Pretty-printed JSON of a report, newline terminated.
pub fn write_report_json<W: Write>(mut writer: W, report: &AnomalyReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Feedback;

    #[test]
    fn csv_has_header_and_defaults_feedback() {
        let rows = vec![
            ScoredRow {
                timestamp: Some("2024-01-01"),
                value: 1.5,
                is_anomaly: false,
                feedback: None,
            },
            ScoredRow {
                timestamp: None,
                value: 99.0,
                is_anomaly: true,
                feedback: Some(Feedback::Negative),
            },
        ];
        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "timestamp,value,is_anomaly,feedback\n\
             2024-01-01,1.5,false,none\n\
             ,99.0,true,negative\n"
        );
    }

    #[test]
    fn empty_rows_write_only_the_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(buf, b"timestamp,value,is_anomaly,feedback\n");
    }

    #[test]
    fn normalized_export_keeps_flags() {
        let mut rows: Vec<ScoredRow<'_>> = [(2.0, false), (4.0, false), (6.0, true)]
            .iter()
            .map(|&(value, is_anomaly)| ScoredRow {
                timestamp: None,
                value,
                is_anomaly,
                feedback: None,
            })
            .collect();
        normalize_values(&mut rows);
        let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
        assert!(rows[2].is_anomaly);
    }

    #[test]
    fn report_json_round_trips() {
        let report = crate::analysis::detect(&[1.0, 2.0, 3.0, 4.0, 100.0], 1.5);
        let mut buf = Vec::new();
        write_report_json(&mut buf, &report).unwrap();
        let parsed: AnomalyReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, report);
    }
}
