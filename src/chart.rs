//! SVG charts of scores and statistics.

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::Error;
use crate::role::Role;
use crate::score::ScoreMap;
use crate::store::Statistics;

const COLORS: [&str; 9] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE",
];

/// Writes chart files. Charts without an explicit path land in `chart_dir`.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    chart_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(chart_dir: impl Into<PathBuf>) -> Self {
        Self {
            chart_dir: chart_dir.into(),
        }
    }

    /// Pie chart of the non-zero scores. An all-zero map is `Error::EmptyInput` and
    /// nothing is written.
    pub fn pie_chart(
        &self,
        scores: &ScoreMap,
        display_name: &str,
        path: Option<&Path>,
    ) -> Result<PathBuf, Error> {
        let slices = scores.non_zero();
        if slices.is_empty() {
            return Err(Error::EmptyInput);
        }
        let total = f64::from(scores.total());

        let (cx, cy, radius): (f64, f64, f64) = (260.0, 290.0, 200.0);
        let mut svg = open_svg(900, 560);
        svg.push_str(&format!(
            "<text x=\"450\" y=\"40\" text-anchor=\"middle\" font-size=\"22\" font-weight=\"bold\">Belbin Team Roles</text>\n\
             <text x=\"450\" y=\"68\" text-anchor=\"middle\" font-size=\"16\">{}</text>\n",
            escape(display_name)
        ));

        if let [(role, _)] = slices.as_slice() {
            svg.push_str(&format!(
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{radius}\" fill=\"{}\" stroke=\"white\" stroke-width=\"2\"/>\n",
                color(*role)
            ));
        } else {
            // start at twelve o'clock, go clockwise
            let mut angle = -PI / 2.0;
            for (role, score) in &slices {
                let sweep = 2.0 * PI * f64::from(*score) / total;
                let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
                let end = angle + sweep;
                let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
                let large = u8::from(sweep > PI);
                svg.push_str(&format!(
                    "<path d=\"M {cx} {cy} L {x1:.2} {y1:.2} A {radius} {radius} 0 {large} 1 {x2:.2} {y2:.2} Z\" \
                     fill=\"{}\" stroke=\"white\" stroke-width=\"2\"/>\n",
                    color(*role)
                ));
                angle = end;
            }
        }

        svg.push_str("<text x=\"520\" y=\"110\" font-size=\"15\" font-weight=\"bold\">Team roles:</text>\n");
        for (row, (role, score)) in slices.iter().enumerate() {
            let y = 140 + row * 30;
            let share = 100.0 * f64::from(*score) / total;
            svg.push_str(&format!(
                "<rect x=\"520\" y=\"{}\" width=\"18\" height=\"18\" fill=\"{}\"/>\n\
                 <text x=\"546\" y=\"{}\" font-size=\"14\">{}: {} points ({:.1}%)</text>\n",
                y - 14,
                color(*role),
                y,
                role.name(),
                score,
                share
            ));
        }
        svg.push_str("</svg>\n");

        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.auto_path(&format!("belbin_chart_{}", safe_name(display_name)))?,
        };
        write_chart(&target, &svg)?;
        Ok(target)
    }

    /// Grouped bars, one series per entry. Empty input is `Error::EmptyInput`.
    pub fn comparison_chart(
        &self,
        entries: &[(String, ScoreMap)],
        path: Option<&Path>,
    ) -> Result<PathBuf, Error> {
        if entries.is_empty() {
            return Err(Error::EmptyInput);
        }
        let max = entries
            .iter()
            .flat_map(|(_, scores)| scores.iter().map(|(_, score)| score))
            .max()
            .unwrap_or(0)
            .max(1);

        let (left, top, plot_height, group_width): (f64, f64, f64, f64) =
            (60.0, 80.0, 360.0, 100.0);
        let width = left as usize + Role::ALL.len() * group_width as usize + 200;
        let bar_width = 80.0 / entries.len() as f64;
        let baseline = top + plot_height;

        let mut svg = open_svg(width, 560);
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"40\" text-anchor=\"middle\" font-size=\"22\" font-weight=\"bold\">Belbin results comparison</text>\n\
             <line x1=\"{left}\" y1=\"{baseline}\" x2=\"{}\" y2=\"{baseline}\" stroke=\"black\"/>\n",
            width / 2,
            left + Role::ALL.len() as f64 * group_width
        ));

        for (group, role) in Role::ALL.into_iter().enumerate() {
            let group_x = left + group as f64 * group_width;
            for (series, (_, scores)) in entries.iter().enumerate() {
                let score = scores.get(role);
                let height = plot_height * f64::from(score) / f64::from(max);
                svg.push_str(&format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" fill-opacity=\"0.8\"/>\n",
                    group_x + 10.0 + series as f64 * bar_width,
                    baseline - height,
                    bar_width,
                    height,
                    COLORS[series % COLORS.len()]
                ));
            }
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"11\" text-anchor=\"end\" transform=\"rotate(-35 {:.2} {:.2})\">{}</text>\n",
                group_x + 50.0,
                baseline + 18.0,
                group_x + 50.0,
                baseline + 18.0,
                role.name()
            ));
        }

        let legend_x = left + Role::ALL.len() as f64 * group_width + 20.0;
        for (series, (name, _)) in entries.iter().enumerate() {
            let y = top + 20.0 + series as f64 * 26.0;
            svg.push_str(&format!(
                "<rect x=\"{legend_x}\" y=\"{:.2}\" width=\"16\" height=\"16\" fill=\"{}\"/>\n\
                 <text x=\"{:.2}\" y=\"{y:.2}\" font-size=\"13\">{}</text>\n",
                y - 13.0,
                COLORS[series % COLORS.len()],
                legend_x + 22.0,
                escape(name)
            ));
        }
        svg.push_str("</svg>\n");

        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.auto_path("belbin_comparison")?,
        };
        write_chart(&target, &svg)?;
        Ok(target)
    }

    /// Horizontal bars of how often each role came out on top.
    pub fn statistics_chart(
        &self,
        statistics: &Statistics,
        path: Option<&Path>,
    ) -> Result<PathBuf, Error> {
        if statistics.popular_roles.is_empty() {
            return Err(Error::EmptyInput);
        }
        let max = statistics
            .popular_roles
            .iter()
            .map(|(_, count)| *count)
            .max()
            .unwrap_or(1)
            .max(1);

        let (left, top, bar_length): (f64, f64, f64) = (200.0, 100.0, 500.0);
        let height = 140 + statistics.popular_roles.len() * 40;
        let mut svg = open_svg(820, height);
        svg.push_str(&format!(
            "<text x=\"410\" y=\"40\" text-anchor=\"middle\" font-size=\"20\" font-weight=\"bold\">Team role popularity</text>\n\
             <text x=\"410\" y=\"66\" text-anchor=\"middle\" font-size=\"14\">Total tests: {}, unique users: {}</text>\n",
            statistics.total_tests, statistics.unique_users
        ));
        for (row, (role, count)) in statistics.popular_roles.iter().enumerate() {
            let y = top + row as f64 * 40.0;
            let length = bar_length * *count as f64 / max as f64;
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"13\" text-anchor=\"end\">{}</text>\n\
                 <rect x=\"{left}\" y=\"{y:.2}\" width=\"{length:.2}\" height=\"26\" fill=\"#4ECDC4\" fill-opacity=\"0.8\"/>\n\
                 <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"13\" font-weight=\"bold\">{}</text>\n",
                left - 10.0,
                y + 18.0,
                role.name(),
                left + length + 6.0,
                y + 18.0,
                count
            ));
        }
        svg.push_str("</svg>\n");

        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.auto_path("belbin_statistics")?,
        };
        write_chart(&target, &svg)?;
        Ok(target)
    }

    fn auto_path(&self, stem: &str) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.chart_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        Ok(self.chart_dir.join(format!("{stem}_{timestamp}.svg")))
    }
}

fn open_svg(width: usize, height: usize) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\" font-family=\"DejaVu Sans, Arial, sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n"
    )
}

fn write_chart(path: &Path, svg: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, svg)?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

fn color(role: Role) -> &'static str {
    let index = Role::ALL
        .iter()
        .position(|candidate| *candidate == role)
        .unwrap_or(0);
    COLORS[index % COLORS.len()]
}

/// Keeps letters, digits, spaces, `-` and `_`.
fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
