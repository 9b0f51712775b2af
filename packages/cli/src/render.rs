//! Plain-text tables for terminal output.

use std::io::{self, Write};

use pdx_crime_analytics_models::{
    DashboardSummary, FilterChoices, HeatmapMatrix, HourCount, MonthCount, NeighborhoodCount,
    OffenseCount, RecordTotal,
};

const BAR_WIDTH: u64 = 40;

fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = usize::try_from(count * BAR_WIDTH / max).unwrap_or_default();
    "#".repeat(len)
}

fn heading(out: &mut dyn Write, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.len()))
}

pub fn neighborhoods(out: &mut dyn Write, rows: &[NeighborhoodCount]) -> io::Result<()> {
    writeln!(out, "{:<40} {:>8}", "NEIGHBORHOOD", "REPORTS")?;
    writeln!(out, "{}", "-".repeat(49))?;
    for row in rows {
        writeln!(out, "{:<40} {:>8}", row.neighborhood, row.count)?;
    }
    Ok(())
}

pub fn offenses(out: &mut dyn Write, rows: &[OffenseCount]) -> io::Result<()> {
    writeln!(out, "{:<4} {:<40} {:>8}", "#", "OFFENSE", "REPORTS")?;
    writeln!(out, "{}", "-".repeat(54))?;
    for (i, row) in rows.iter().enumerate() {
        writeln!(out, "{:<4} {:<40} {:>8}", i + 1, row.offense_type, row.count)?;
    }
    Ok(())
}

pub fn record_total(out: &mut dyn Write, total: &RecordTotal) -> io::Result<()> {
    writeln!(out, "Records: {}", total.total)?;
    writeln!(out, "Neighborhood average: {:.1}", total.average)?;
    writeln!(out, "Versus average: {:+.1}%", total.percent_delta)
}

pub fn rank(out: &mut dyn Write, rank: Option<usize>, out_of: usize) -> io::Result<()> {
    match rank {
        Some(rank) => writeln!(out, "Rank: {rank} of {out_of}"),
        None => writeln!(out, "Rank: n/a"),
    }
}

pub fn average_per_day(out: &mut dyn Write, average: Option<f64>) -> io::Result<()> {
    match average {
        Some(average) => writeln!(out, "Average per day: {average:.2}"),
        None => writeln!(out, "Average per day: n/a"),
    }
}

pub fn hours(out: &mut dyn Write, rows: &[HourCount]) -> io::Result<()> {
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "{:02}:00 {:>8} {}",
            row.hour,
            row.count,
            bar(row.count, max)
        )?;
    }
    Ok(())
}

pub fn months(out: &mut dyn Write, rows: &[MonthCount]) -> io::Result<()> {
    let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "{:<10} {:>8} {}",
            row.month,
            row.count,
            bar(row.count, max)
        )?;
    }
    Ok(())
}

/// Offense names are too long for column headers, so columns are
/// numbered and listed in a legend underneath.
pub fn heatmap(out: &mut dyn Write, matrix: &HeatmapMatrix) -> io::Result<()> {
    write!(out, "{:<30}", "")?;
    for col in 1..=matrix.offense_types.len() {
        write!(out, " {:>6}", format!("[{col}]"))?;
    }
    writeln!(out)?;

    for (name, row) in matrix.neighborhoods.iter().zip(&matrix.cells) {
        write!(out, "{name:<30}")?;
        for cell in row {
            write!(out, " {cell:>6}")?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    for (i, offense) in matrix.offense_types.iter().enumerate() {
        writeln!(out, "[{}] {offense}", i + 1)?;
    }
    Ok(())
}

pub fn filters(out: &mut dyn Write, choices: &FilterChoices) -> io::Result<()> {
    writeln!(out, "Neighborhoods ({}):", choices.neighborhoods.len())?;
    for name in &choices.neighborhoods {
        writeln!(out, "  {name}")?;
    }
    writeln!(out, "Offense types ({}):", choices.offense_types.len())?;
    for name in &choices.offense_types {
        writeln!(out, "  {name}")?;
    }
    writeln!(out, "Crime against:")?;
    for category in &choices.crime_against {
        writeln!(out, "  {category}")?;
    }
    Ok(())
}

pub fn summary(out: &mut dyn Write, summary: &DashboardSummary) -> io::Result<()> {
    let selected = summary.filter.neighborhood().unwrap_or("All neighborhoods");
    writeln!(out, "{selected}")?;
    match &summary.record_total {
        Some(total) => record_total(out, total)?,
        None => writeln!(out, "Records: 0")?,
    }
    rank(out, summary.rank, summary.neighborhoods.len())?;
    average_per_day(out, summary.average_per_day)?;

    heading(out, "Top offenses")?;
    offenses(out, &summary.top_offenses)?;
    heading(out, "Hour of day")?;
    hours(out, &summary.hours)?;
    heading(out, "Busiest months")?;
    months(out, &summary.months)?;
    heading(out, "Neighborhood heatmap")?;
    heatmap(out, &summary.heatmap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce(&mut dyn Write) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn record_total_shows_signed_delta() {
        let text = render(|out| {
            record_total(
                out,
                &RecordTotal {
                    total: 3,
                    average: 2.0,
                    percent_delta: 50.0,
                },
            )
        });
        assert!(text.contains("Records: 3"));
        assert!(text.contains("+50.0%"));
    }

    #[test]
    fn missing_values_print_na() {
        assert_eq!(render(|out| rank(out, None, 5)), "Rank: n/a\n");
        assert_eq!(
            render(|out| average_per_day(out, None)),
            "Average per day: n/a\n"
        );
        assert_eq!(render(|out| rank(out, Some(2), 5)), "Rank: 2 of 5\n");
    }

    #[test]
    fn hour_bars_scale_to_busiest_hour() {
        let rows = [
            HourCount { hour: 0, count: 10 },
            HourCount { hour: 1, count: 5 },
            HourCount { hour: 2, count: 0 },
        ];
        let text = render(|out| hours(out, &rows));
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("00:00"));
        assert_eq!(lines[0].matches('#').count(), 40);
        assert_eq!(lines[1].matches('#').count(), 20);
        assert_eq!(lines[2].matches('#').count(), 0);
    }

    #[test]
    fn heatmap_has_legend() {
        let matrix = HeatmapMatrix {
            neighborhoods: vec!["Pearl".to_string()],
            offense_types: vec!["Theft".to_string(), "Assault".to_string()],
            cells: vec![vec![7, 0]],
        };
        let text = render(|out| heatmap(out, &matrix));

        assert!(text.contains("[1] Theft"));
        assert!(text.contains("[2] Assault"));
        assert!(text.lines().any(|l| l.starts_with("Pearl") && l.ends_with(" 0")));
    }
}
