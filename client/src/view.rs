use std::fmt::Display;

use pizzeria::{
    results::Results,
    stats::{describe_correlation, StatsReport, WipCorrelations},
    GameMode, Millis, Session, CATALOG,
};

// 75 -> "1:15"
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// 75.4 -> "1m 15s"
pub fn format_duration(seconds: f64) -> String {
    if seconds <= 0.0 {
        return "0s".into();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let rest = (seconds % 60.0).round() as u64;
    if minutes > 0 {
        format!("{}m {}s", minutes, rest)
    } else {
        format!("{}s", rest)
    }
}

/// Positive means multitask was faster.
pub fn format_percentage(percentage: f64, overall: bool) -> String {
    if percentage == 0.0 {
        return "No comparison available".into();
    }
    let who = if percentage > 0.0 { "Multitask" } else { "Singletask" };
    let scope = if overall { "overall" } else { "per pizza" };
    format!("{} is {:.1}% faster {}", who, percentage.abs(), scope)
}

pub fn render_menu() -> String {
    let names: Vec<&str> = CATALOG.iter().map(|i| i.name()).collect();
    format!("Ingredients: {}", names.join(", "))
}

/// The open orders as the player sees them at `now`.
pub struct OrderBoard<'a> {
    session: &'a Session,
    now: Millis,
}

impl<'a> OrderBoard<'a> {
    pub fn new(session: &'a Session, now: Millis) -> Self {
        Self { session, now }
    }
}

impl<'a> Display for OrderBoard<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (session, now) = (self.session, self.now);
        let store = session.store();
        let mut open = store.open_orders().peekable();
        if open.peek().is_none() {
            return write!(f, "No open orders.");
        }
        let mut first = true;
        for order in open {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let needs: Vec<String> = order
                .required
                .iter()
                .map(|i| {
                    if order.has_added(*i) {
                        format!("{} ✓", i)
                    } else {
                        i.to_string()
                    }
                })
                .collect();
            write!(
                f,
                "Order #{} ⏱️ {} {:>3}% | {}",
                order.id,
                format_clock(order.elapsed_secs(now)),
                order.progress_percent(),
                needs.join(", ")
            )?;
            let mut tags = Vec::new();
            if store.selected() == Some(order.id) {
                tags.push("selected");
            }
            if session.is_locked(order.id, now) {
                tags.push("locked");
            }
            if !tags.is_empty() {
                write!(f, " ({})", tags.join(", "))?;
            }
        }
        if session.mode() == GameMode::Wip {
            write!(f, "\nWIP: {}", store.wip())?;
        }
        Ok(())
    }
}

pub struct ResultsCard<'a>(pub &'a Results);

impl<'a> Display for ResultsCard<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let results = self.0;
        writeln!(f, "All orders completed!")?;
        writeln!(f, "Total time: {}", format_clock(results.total_time))?;
        for t in results.order_times.iter() {
            writeln!(f, "  Order #{}: {}", t.id, format_clock(t.seconds))?;
        }
        write!(f, "Average time per pizza: {}", format_clock(results.average_time))?;
        if let Some(wip) = results.average_wip {
            write!(f, "\nAverage WIP: {:.2}", wip)?;
        }
        Ok(())
    }
}

/// Per-mode averages and the multitask/singletask comparison.
pub struct Overview<'a>(pub &'a StatsReport);

impl<'a> Display for Overview<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.0;
        for (name, stats) in [
            ("Multitask", &report.multitask),
            ("Singletask", &report.singletask),
            ("WIP", &report.wip),
        ] {
            write!(
                f,
                "{}: {} games, avg total {}, avg per pizza {}",
                name,
                stats.count,
                format_duration(stats.avg_total_time),
                format_duration(stats.avg_average_time)
            )?;
            if let Some(wip) = stats.avg_wip {
                write!(f, ", avg WIP {:.2}", wip)?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "{}",
            format_percentage(report.comparison.total_time_percentage, true)
        )?;
        write!(
            f,
            "{}",
            format_percentage(report.comparison.average_time_percentage, false)
        )
    }
}

struct Correlation<'a>(&'a str, Option<f64>);

impl<'a> Display for Correlation<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.1 {
            Some(r) => write!(f, "{}: {:.3} ({})", self.0, r, describe_correlation(r)),
            None => write!(f, "{}: undefined (no variation yet)", self.0),
        }
    }
}

/// WIP games table followed by the correlations.
pub struct WipAnalysis<'a>(pub &'a StatsReport);

impl<'a> Display for WipAnalysis<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let games = &self.0.individual_games.wip;
        if games.is_empty() {
            return write!(f, "No WIP games recorded yet.");
        }
        writeln!(f, "{:>8} {:>14} {:>10}", "WIP", "Per pizza", "Total")?;
        for g in games.iter() {
            writeln!(
                f,
                "{:>8.2} {:>14} {:>10}",
                g.average_wip,
                format_duration(g.average_time_per_pizza),
                format_duration(g.total_time)
            )?;
        }
        match WipCorrelations::from_games(games) {
            Some(c) => {
                writeln!(f, "{}", Correlation("WIP vs time per pizza", c.wip_vs_avg_time))?;
                write!(f, "{}", Correlation("WIP vs total time", c.wip_vs_total_time))
            }
            None => write!(
                f,
                "Insufficient data: play at least 2 WIP games to see correlations."
            ),
        }
    }
}

pub fn render_orders(session: &Session, now: Millis) -> String {
    OrderBoard::new(session, now).to_string()
}

pub fn render_results(results: &Results) -> String {
    ResultsCard(results).to_string()
}

pub fn render_stats(report: &StatsReport) -> String {
    Overview(report).to_string()
}

pub fn render_analysis(report: &StatsReport) -> String {
    WipAnalysis(report).to_string()
}
