//! Report Printer
//! Plain-text tables for every analysis step, written to any `io::Write`.

use crate::data::ColumnSummary;
use crate::stats::{GroupStats, RankedTable, WelchTest};
use std::io::{self, Write};

/// One game in a "top games" listing.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub name: String,
    pub platform: String,
    pub year: Option<i64>,
    pub total_sales: f64,
}

/// Game count and leading platforms of one lapso.
#[derive(Debug, Clone)]
pub struct LapsoSummary {
    pub label: String,
    pub games: usize,
    pub top_platforms: RankedTable,
}

pub struct Report<W: Write> {
    out: W,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "== {} ==", title)
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn overview(
        &mut self,
        raw_rows: usize,
        columns: &[ColumnSummary],
        clean_rows: usize,
    ) -> io::Result<()> {
        writeln!(
            self.out,
            "{} rows loaded, {} kept after cleaning ({} dropped)",
            raw_rows,
            clean_rows,
            raw_rows.saturating_sub(clean_rows)
        )?;
        writeln!(self.out, "{:<18} {:<10} {:>8}", "column", "dtype", "missing")?;
        for c in columns {
            writeln!(self.out, "{:<18} {:<10} {:>8}", c.name, c.dtype, c.missing)?;
        }
        Ok(())
    }

    pub fn ranked(&mut self, title: &str, table: &RankedTable) -> io::Result<()> {
        writeln!(self.out, "{}:", title)?;
        if table.is_empty() {
            return writeln!(self.out, "  (no data)");
        }
        write!(self.out, "{}", table)
    }

    pub fn games(&mut self, title: &str, games: &[GameRow]) -> io::Result<()> {
        writeln!(self.out, "{}:", title)?;
        if games.is_empty() {
            return writeln!(self.out, "  (no games)");
        }
        let width = games.iter().map(|g| g.name.len()).max().unwrap_or(4).max(4);
        writeln!(
            self.out,
            "{:<width$} {:<8} {:>6} {:>11}",
            "name", "platform", "year", "total_sales"
        )?;
        for g in games {
            let year = g.year.map(|y| y.to_string()).unwrap_or_else(|| "-".into());
            writeln!(
                self.out,
                "{:<width$} {:<8} {:>6} {:>11.2}",
                g.name, g.platform, year, g.total_sales
            )?;
        }
        Ok(())
    }

    pub fn lapsos(&mut self, summaries: &[LapsoSummary]) -> io::Result<()> {
        writeln!(self.out, "Games released per lapso:")?;
        for s in summaries {
            writeln!(self.out, "  {}: {} games", s.label, s.games)?;
        }
        for s in summaries {
            writeln!(self.out)?;
            self.ranked(&format!("Lapso {} top platforms", s.label), &s.top_platforms)?;
        }
        Ok(())
    }

    pub fn distribution(&mut self, stats: &[GroupStats]) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<8} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "group", "count", "mean", "median", "std", "p05", "p95"
        )?;
        for s in stats {
            writeln!(
                self.out,
                "{:<8} {:>6} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
                s.group_name, s.count, s.mean, s.median, s.std, s.p05, s.p95
            )?;
        }
        Ok(())
    }

    pub fn correlation(&mut self, label: &str, value: Option<f64>) -> io::Result<()> {
        match value {
            Some(r) => writeln!(self.out, "Correlation {}: {:.2}", label, r),
            None => writeln!(self.out, "Correlation {}: n/a", label),
        }
    }

    pub fn welch(
        &mut self,
        title: &str,
        left: &str,
        right: &str,
        result: Option<&WelchTest>,
    ) -> io::Result<()> {
        writeln!(self.out, "Hypothesis: {}", title)?;
        let Some(test) = result else {
            return writeln!(self.out, "  not enough scored games to test");
        };
        writeln!(self.out, "  Mean {}: {:.2}", left, test.mean_a)?;
        writeln!(self.out, "  Mean {}: {:.2}", right, test.mean_b)?;
        writeln!(self.out, "  t statistic: {:.2}", test.t_statistic)?;
        writeln!(self.out, "  degrees of freedom: {:.1}", test.degrees_of_freedom)?;
        writeln!(self.out, "  p-value: {:.4}", test.p_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SalesAggregator;
    use polars::prelude::*;

    fn render(f: impl FnOnce(&mut Report<Vec<u8>>) -> io::Result<()>) -> String {
        let mut report = Report::new(Vec::new());
        f(&mut report).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    fn platforms() -> RankedTable {
        let df = df!(
            "platform" => ["X360", "PS4", "Wii"],
            "na_sales" => [140.0, 108.0, 152.0]
        )
        .unwrap();
        SalesAggregator::top_k(&df, "platform", &["na_sales"], 2, true).unwrap()
    }

    #[test]
    fn prints_games_with_missing_year() {
        let text = render(|r| {
            r.games(
                "Top games",
                &[GameRow {
                    name: "Wii Sports".into(),
                    platform: "Wii".into(),
                    year: None,
                    total_sales: 82.54,
                }],
            )
        });
        assert!(text.contains("Wii Sports"));
        assert!(text.contains("82.54"));
        assert!(text.lines().nth(2).unwrap().contains(" - "));
    }

    #[test]
    fn prints_ranked_table() {
        let text = render(|r| r.ranked("Top 5 NA", &platforms()));
        assert!(text.starts_with("Top 5 NA:"));
        assert!(text.contains("X360"));
        assert!(!text.contains("PS4"));
        // 152 of 400
        assert!(text.contains("38.00%"));
    }

    #[test]
    fn prints_lapso_counts() {
        let text = render(|r| {
            r.lapsos(&[LapsoSummary {
                label: "2010-2016".into(),
                games: 5277,
                top_platforms: platforms(),
            }])
        });
        assert!(text.contains("2010-2016: 5277 games"));
        assert!(text.contains("Lapso 2010-2016 top platforms:"));
    }

    #[test]
    fn prints_welch_result_or_placeholder() {
        let test = WelchTest {
            mean_a: 6.52,
            mean_b: 6.27,
            t_statistic: 1.45,
            degrees_of_freedom: 300.0,
            p_value: 0.14759,
        };
        let text = render(|r| r.welch("Xbox One vs PC", "XOne", "PC", Some(&test)));
        assert!(text.contains("Mean XOne: 6.52"));
        assert!(text.contains("p-value: 0.1476"));

        let text = render(|r| r.welch("Xbox One vs PC", "XOne", "PC", None));
        assert!(text.contains("not enough"));
    }

    #[test]
    fn prints_correlation() {
        assert!(render(|r| r.correlation("PS4", Some(0.4065))).contains("0.41"));
        assert!(render(|r| r.correlation("PS4", None)).contains("n/a"));
    }
}
