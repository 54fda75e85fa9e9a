//! Report assembly and formatting
//!
//! [`AnalysisReport`] carries every analysis section. It is printed as text
//! with [`AnalysisReport::render`] and optionally exported as JSON.

use crate::classifier::Classification;
use crate::correlation::{CorrelationReport, Driver};
use crate::demographics::DemographicSummary;
use crate::genres::GenreFrequency;
use crate::insights::{ExecutiveSummary, Outliers, StatisticalInsights};
use crate::recommend::Recommendations;
use crate::sanitize::MetricSummary;
use crate::trend::{TrendEntry, TrendRanking};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "────────────────────────────────────────────────────────────────────────────────";

/// Run metadata
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Generation timestamp (RFC 3339)
    pub timestamp: String,
    pub version: String,
    pub input: PathBuf,
    /// Trends listed in the text report
    pub top_n: usize,
    pub min_support: usize,
    pub tag_match: String,
}

impl SessionInfo {
    pub fn new(input: PathBuf, top_n: usize, min_support: usize, tag_match: String) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            input,
            top_n,
            min_support,
            tag_match,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub loaded: usize,
    pub kept: usize,
    pub dropped: usize,
    pub score: MetricSummary,
    pub members: MetricSummary,
    pub genre_features: usize,
    pub demographic_features: usize,
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session: SessionInfo,
    pub dataset: DatasetOverview,
    pub classification: Classification,
    pub trends: TrendRanking,
    pub correlation: CorrelationReport,
    pub demographics: Vec<DemographicSummary>,
    pub genres: Vec<GenreFrequency>,
    pub recommendations: Recommendations,
    pub insights: StatisticalInsights,
    pub summary: ExecutiveSummary,
}

impl AnalysisReport {
    /// Write the report as pretty-printed JSON
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> mtk_common::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Write the human-readable report
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.render_overview(out)?;
        self.render_classification(out)?;
        self.render_trends(out)?;
        self.render_correlation(out)?;
        self.render_demographics(out)?;
        self.render_genres(out)?;
        self.render_recommendations(out)?;
        self.render_insights(out)?;
        self.render_summary(out)
    }

    fn render_overview<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let d = &self.dataset;
        header(out, "DATASET OVERVIEW")?;
        writeln!(out, "Input: {}", self.session.input.display())?;
        writeln!(out, "Generated: {}", self.session.timestamp)?;
        writeln!(
            out,
            "Records: {} loaded, {} kept, {} dropped (missing score or members)",
            d.loaded, d.kept, d.dropped
        )?;
        writeln!(
            out,
            "Score:   mean {:.2}, median {:.2}, range {:.2} - {:.2}",
            d.score.mean, d.score.median, d.score.min, d.score.max
        )?;
        writeln!(
            out,
            "Members: mean {:.0}, median {:.0}, range {:.0} - {:.0}",
            d.members.mean, d.members.median, d.members.min, d.members.max
        )?;
        writeln!(
            out,
            "Features: {} genre indicators, {} demographic indicators",
            d.genre_features, d.demographic_features
        )
    }

    fn render_classification<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let c = &self.classification;
        let q = &c.quartiles;
        header(out, "QUALITY VS POPULARITY")?;
        writeln!(
            out,
            "Thresholds: score p25 {:.2} / p75 {:.2}, members p25 {:.0} / p75 {:.0}",
            q.score_p25, q.score_p75, q.members_p25, q.members_p75
        )?;
        writeln!(out)?;
        for share in &c.distribution {
            writeln!(
                out,
                "  {:<20} {:>7} ({:5.1}%)",
                share.category.label(),
                share.count,
                share.percent
            )?;
        }
        writeln!(out)?;
        for profile in &c.profiles {
            writeln!(
                out,
                "  {}: avg score {:.2}, avg members {:.0}",
                profile.category, profile.avg_score, profile.avg_members
            )?;
            if !profile.top_titles.is_empty() {
                writeln!(out, "    e.g. {}", profile.top_titles.join(", "))?;
            }
        }
        Ok(())
    }

    fn render_trends<W: Write>(&self, out: &mut W) -> io::Result<()> {
        header(out, "GENRE TREND STRENGTH")?;
        writeln!(
            out,
            "{} tags ranked (min support {}, {} match), {} below support",
            self.trends.entries.len(),
            self.session.min_support,
            self.session.tag_match,
            self.trends.below_support
        )?;
        writeln!(
            out,
            "  {:>3}  {:<28} {:>8} {:>6} {:>7} {:>12} {:>10}",
            "#", "Tag", "Strength", "Count", "Score", "Members", "Volatility"
        )?;
        for (i, entry) in self.trends.top(self.session.top_n).iter().enumerate() {
            let a = &entry.aggregate;
            writeln!(
                out,
                "  {:>3}. {:<28} {:>8.3} {:>6} {:>7.2} {:>12.0} {:>10.3}",
                i + 1,
                entry.tag,
                a.trend_strength,
                a.count,
                a.avg_score,
                a.avg_members,
                a.volatility
            )?;
        }
        if !self.trends.undefined.is_empty() {
            writeln!(
                out,
                "Not ranked (zero average members): {}",
                self.trends.undefined.join(", ")
            )?;
        }
        Ok(())
    }

    fn render_correlation<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let c = &self.correlation;
        header(out, "CORRELATION ANALYSIS")?;
        drivers(out, "Quality drivers (correlation with score)", &c.quality_drivers)?;
        drivers(out, "Score killers", &c.score_killers)?;
        drivers(
            out,
            "Popularity drivers (correlation with members)",
            &c.popularity_drivers,
        )?;
        drivers(out, "Popularity detractors", &c.popularity_detractors)
    }

    fn render_demographics<W: Write>(&self, out: &mut W) -> io::Result<()> {
        header(out, "DEMOGRAPHICS")?;
        writeln!(
            out,
            "  {:<15} {:>6} {:>6} {:>6} {:>6} {:>12} {:>12}",
            "Demographic", "Count", "Mean", "Median", "Std", "Members", "Std members"
        )?;
        for d in &self.demographics {
            writeln!(
                out,
                "  {:<15} {:>6} {:>6.2} {:>6.2} {:>6} {:>12.0} {:>12}",
                d.demographic,
                d.count,
                d.mean_score,
                d.median_score,
                opt(d.std_score, 2),
                d.mean_members,
                opt(d.std_members, 0)
            )?;
        }
        Ok(())
    }

    fn render_genres<W: Write>(&self, out: &mut W) -> io::Result<()> {
        header(out, "GENRE FREQUENCY")?;
        for (i, g) in self.genres.iter().enumerate() {
            writeln!(
                out,
                "  {:>3}. {:<28} {:>7} titles, avg score {}",
                i + 1,
                g.genre,
                g.count,
                opt(g.avg_score, 2)
            )?;
        }
        Ok(())
    }

    fn render_recommendations<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let r = &self.recommendations;
        header(out, "RECOMMENDATIONS")?;

        writeln!(out, "High priority:")?;
        for (i, e) in r.high_priority.iter().enumerate() {
            writeln!(
                out,
                "  {}. {:<25} (trend {:.3}) target score {:.1}+, expected reach {:.0}+ members",
                i + 1,
                e.tag,
                e.aggregate.trend_strength,
                e.aggregate.avg_score,
                e.aggregate.avg_members
            )?;
        }
        entries(out, "Niche opportunities:", &r.niche)?;
        entries(out, "Saturated markets:", &r.saturated)?;

        writeln!(out, "Combinations:")?;
        for (i, pair) in r.combinations.iter().enumerate() {
            writeln!(
                out,
                "  {}. {} + {} ({} titles)",
                i + 1,
                pair.first,
                pair.second,
                pair.count
            )?;
        }
        Ok(())
    }

    fn render_insights<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = &self.insights;
        header(out, "STATISTICAL INSIGHTS")?;
        writeln!(
            out,
            "Score/members correlation: {}{}",
            opt(s.score_members_r, 4),
            s.connection
                .map(|c| format!(" (quality and popularity are {})", c.describe()))
                .unwrap_or_default()
        )?;
        writeln!(
            out,
            "Score skewness: {}{}",
            opt(s.score_skewness, 4),
            s.shape
                .map(|shape| format!(" ({})", shape.describe()))
                .unwrap_or_default()
        )?;
        outliers(out, "Exceptional quality", "score", 2, &s.exceptional_quality)?;
        outliers(out, "Viral popularity", "members", 0, &s.viral_popularity)
    }

    fn render_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let s = &self.summary;
        header(out, "EXECUTIVE SUMMARY")?;
        writeln!(out, "Total analyzed: {} ({} dropped)", s.total_records, s.dropped_records)?;
        writeln!(out, "Average score: {:.2}/10", s.avg_score)?;
        writeln!(out, "Average popularity: {:.0} members", s.avg_members)?;
        writeln!(out, "Score range: {:.2} - {:.2}", s.score_range.0, s.score_range.1)?;
        writeln!(
            out,
            "Popularity range: {:.0} - {:.0} members",
            s.members_range.0, s.members_range.1
        )?;
        writeln!(out, "Unique genres: {}", s.unique_genres)?;
        writeln!(
            out,
            "Most common genre: {}",
            s.most_common_genre.as_deref().unwrap_or("n/a")
        )?;
        writeln!(out, "Demographics: {}", s.demographics)?;
        writeln!(
            out,
            "Highest average quality: {}",
            s.best_demographic.as_deref().unwrap_or("n/a")
        )?;
        writeln!(out, "{}", RULE)
    }
}

fn header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", THIN_RULE)
}

fn drivers<W: Write>(out: &mut W, title: &str, list: &[Driver]) -> io::Result<()> {
    writeln!(out, "{}:", title)?;
    if list.is_empty() {
        return writeln!(out, "  n/a");
    }
    for d in list {
        writeln!(
            out,
            "  {:<30} {:>7.4}  {}",
            d.feature,
            d.r,
            d.strength.label()
        )?;
    }
    Ok(())
}

fn entries<W: Write>(out: &mut W, title: &str, list: &[TrendEntry]) -> io::Result<()> {
    writeln!(out, "{}", title)?;
    for (i, e) in list.iter().enumerate() {
        writeln!(
            out,
            "  {}. {:<25} (count {}, avg score {:.2})",
            i + 1,
            e.tag,
            e.aggregate.count,
            e.aggregate.avg_score
        )?;
    }
    Ok(())
}

fn outliers<W: Write>(
    out: &mut W,
    title: &str,
    metric: &str,
    precision: usize,
    o: &Outliers,
) -> io::Result<()> {
    writeln!(
        out,
        "{} ({} >= {:.*}): {} ({:.1}%)",
        title, metric, precision, o.threshold, o.count, o.percent
    )?;
    if !o.examples.is_empty() {
        writeln!(out, "  e.g. {}", o.examples.join(", "))?;
    }
    Ok(())
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "n/a".to_string())
}
