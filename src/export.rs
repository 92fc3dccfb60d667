use std::io::Write;

use crate::data::AggregateDto;
use crate::error::TranslateResult;

pub const LABEL_COLUMN: &str = "label";

/// Write the series as CSV: one row per series, one column per plot name.
///
/// Columns follow the first series' plot order. Completion makes every series
/// carry the same names, so rows line up; a missing plot is written as an empty cell.
pub fn write_csv<W: Write>(dto: &AggregateDto, writer: W) -> TranslateResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let columns: Vec<&str> = dto
        .data
        .first()
        .map(|series| series.plot_names().collect())
        .unwrap_or_default();

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push(LABEL_COLUMN);
    header.extend(columns.iter().copied());
    wtr.write_record(&header)?;

    for series in &dto.data {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(series.label.clone());
        for column in &columns {
            record.push(
                series
                    .plot_value(column)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(dto: &AggregateDto) -> TranslateResult<String> {
    let mut buf = Vec::new();
    write_csv(dto, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
