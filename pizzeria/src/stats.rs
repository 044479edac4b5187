use serde_derive::{Deserialize, Serialize};

use crate::{mode::GameMode, results::round2};

/// Body of `POST /game-results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRunSubmission {
    pub total_time: f64,
    pub average_time: f64,
    pub game_type: GameMode,
    #[serde(rename = "averageWIP", default, skip_serializing_if = "Option::is_none")]
    pub average_wip: Option<f64>,
}

/// A stored run. Never changes once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRun {
    pub document_id: String,
    pub total_time: f64,
    pub average_time: f64,
    pub game_type: GameMode,
    #[serde(rename = "averageWIP", default, skip_serializing_if = "Option::is_none")]
    pub average_wip: Option<f64>,
    // unix millis
    pub timestamp: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub success: bool,
    pub document_id: String,
    pub message: String,
    pub data: GameRun,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeStats {
    pub count: u64,
    pub avg_total_time: f64,
    pub avg_average_time: f64,
    #[serde(rename = "avgWIP", default, skip_serializing_if = "Option::is_none")]
    pub avg_wip: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub total_time_percentage: f64,
    pub average_time_percentage: f64,
}

/// One point of the WIP analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WipGame {
    #[serde(rename = "averageWIP")]
    pub average_wip: f64,
    pub average_time_per_pizza: f64,
    pub total_time: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndividualGames {
    pub wip: Vec<WipGame>,
}

/// Body of `GET /game-results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub multitask: ModeStats,
    pub singletask: ModeStats,
    pub wip: ModeStats,
    pub comparison: Comparison,
    #[serde(default)]
    pub individual_games: IndividualGames,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

impl ModeStats {
    pub fn from_runs(runs: &[GameRun], mode: GameMode) -> Self {
        let runs: Vec<&GameRun> = runs.iter().filter(|r| r.game_type == mode).collect();
        let avg_wip = if mode.samples_wip() {
            Some(round2(mean(runs.iter().filter_map(|r| r.average_wip))))
        } else {
            None
        };
        Self {
            count: runs.len() as u64,
            avg_total_time: round2(mean(runs.iter().map(|r| r.total_time))),
            avg_average_time: round2(mean(runs.iter().map(|r| r.average_time))),
            avg_wip,
        }
    }
}

/// How much faster multitask is than singletask, in percent of the
/// singletask time. Negative when singletask is faster.
pub fn percentage_faster(singletask: f64, multitask: f64) -> f64 {
    if singletask == 0.0 || multitask == 0.0 {
        return 0.0;
    }
    round2((singletask - multitask) / singletask * 100.0)
}

impl Comparison {
    pub fn between(singletask: &ModeStats, multitask: &ModeStats) -> Self {
        Self {
            total_time_percentage: percentage_faster(
                singletask.avg_total_time,
                multitask.avg_total_time,
            ),
            average_time_percentage: percentage_faster(
                singletask.avg_average_time,
                multitask.avg_average_time,
            ),
        }
    }
}

impl StatsReport {
    pub fn from_runs(runs: &[GameRun]) -> Self {
        let multitask = ModeStats::from_runs(runs, GameMode::Multitask);
        let singletask = ModeStats::from_runs(runs, GameMode::Singletask);
        let wip = ModeStats::from_runs(runs, GameMode::Wip);
        let comparison = Comparison::between(&singletask, &multitask);

        let mut wip_games: Vec<WipGame> = runs
            .iter()
            .filter(|r| r.game_type == GameMode::Wip)
            .filter_map(|r| {
                r.average_wip.map(|average_wip| WipGame {
                    average_wip,
                    average_time_per_pizza: r.average_time,
                    total_time: r.total_time,
                    created_at: r.created_at.clone(),
                })
            })
            .collect();
        wip_games.sort_by(|a, b| a.average_wip.total_cmp(&b.average_wip));

        Self {
            multitask,
            singletask,
            wip,
            comparison,
            individual_games: IndividualGames { wip: wip_games },
        }
    }
}

/// Pearson correlation coefficient of two paired series.
///
/// `None` when it is undefined: fewer than 2 pairs, series of different
/// lengths, or a series without any variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let is_flat = |s: &[f64]| s.iter().all(|v| *v == s[0]);
    if is_flat(x) || is_flat(y) {
        return None;
    }
    let n = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x.iter().map(|a| a * a).sum();
    let sum_yy: f64 = y.iter().map(|b| b * b).sum();

    let r = (n * sum_xy - sum_x * sum_y)
        / ((n * sum_xx - sum_x * sum_x) * (n * sum_yy - sum_y * sum_y)).sqrt();
    r.is_finite().then(|| r)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn of(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude > 0.5 {
            Strength::Strong
        } else if magnitude > 0.3 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }
}

pub fn describe_correlation(r: f64) -> &'static str {
    match (Strength::of(r), r > 0.0) {
        (Strength::Strong, true) => "Strong positive correlation",
        (Strength::Strong, false) => "Strong negative correlation",
        (Strength::Moderate, true) => "Moderate positive correlation",
        (Strength::Moderate, false) => "Moderate negative correlation",
        (Strength::Weak, _) => "Weak correlation",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WipCorrelations {
    pub wip_vs_avg_time: Option<f64>,
    pub wip_vs_total_time: Option<f64>,
}

impl WipCorrelations {
    /// `None` means there is not enough data yet.
    pub fn from_games(games: &[WipGame]) -> Option<Self> {
        if games.len() < 2 {
            return None;
        }
        let wip: Vec<f64> = games.iter().map(|g| g.average_wip).collect();
        let avg: Vec<f64> = games.iter().map(|g| g.average_time_per_pizza).collect();
        let total: Vec<f64> = games.iter().map(|g| g.total_time).collect();
        Some(Self {
            wip_vs_avg_time: pearson(&wip, &avg),
            wip_vs_total_time: pearson(&wip, &total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(game_type: GameMode, total_time: f64, average_time: f64, wip: Option<f64>) -> GameRun {
        GameRun {
            document_id: format!("{}-{}", game_type, total_time),
            total_time,
            average_time,
            game_type,
            average_wip: wip,
            timestamp: 0,
            created_at: "2025-06-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn test_percentage_sign() {
        assert_eq!(percentage_faster(100.0, 80.0), 20.0);
        assert_eq!(percentage_faster(80.0, 100.0), -25.0);
        assert_eq!(percentage_faster(0.0, 80.0), 0.0);
        assert_eq!(percentage_faster(80.0, 0.0), 0.0);
        assert_eq!(percentage_faster(3.0, 2.0), 33.33);
    }

    #[test]
    fn test_report_from_runs() {
        let runs = vec![
            run(GameMode::Singletask, 90.0, 20.0, None),
            run(GameMode::Singletask, 110.0, 30.0, None),
            run(GameMode::Multitask, 80.0, 30.0, None),
            run(GameMode::Wip, 60.0, 15.0, Some(2.5)),
            run(GameMode::Wip, 70.0, 18.0, Some(1.5)),
        ];
        let report = StatsReport::from_runs(&runs);
        assert_eq!(report.singletask.count, 2);
        assert_eq!(report.singletask.avg_total_time, 100.0);
        assert_eq!(report.singletask.avg_average_time, 25.0);
        assert_eq!(report.singletask.avg_wip, None);
        assert_eq!(report.multitask.count, 1);
        assert_eq!(report.wip.avg_wip, Some(2.0));
        assert_eq!(report.comparison.total_time_percentage, 20.0);
        assert_eq!(report.comparison.average_time_percentage, -20.0);

        let wip_points: Vec<f64> = report
            .individual_games
            .wip
            .iter()
            .map(|g| g.average_wip)
            .collect();
        assert_eq!(wip_points, vec![1.5, 2.5]);
    }

    #[test]
    fn test_empty_report_is_zero() {
        let report = StatsReport::from_runs(&[]);
        assert_eq!(report.multitask, ModeStats::default());
        assert_eq!(report.wip.count, 0);
        assert_eq!(report.wip.avg_wip, Some(0.0));
        assert_eq!(report.comparison, Comparison::default());
    }

    #[test]
    fn test_report_json_shape() {
        let report = StatsReport::from_runs(&[run(GameMode::Wip, 60.0, 15.0, Some(2.0))]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["wip"]["avgWIP"], 2.0);
        assert_eq!(json["wip"]["avgTotalTime"], 60.0);
        assert!(json["multitask"].get("avgWIP").is_none());
        assert_eq!(json["comparison"]["totalTimePercentage"], 0.0);
        assert_eq!(json["individualGames"]["wip"][0]["averageTimePerPizza"], 15.0);
    }

    #[test]
    fn test_submission_json_names() {
        let submission: GameRunSubmission = serde_json::from_str(
            r#"{"totalTime": 12, "averageTime": 4.5, "gameType": "wip", "averageWIP": 1.25}"#,
        )
        .unwrap();
        assert_eq!(submission.game_type, GameMode::Wip);
        assert_eq!(submission.average_wip, Some(1.25));
        let back = serde_json::to_value(&submission).unwrap();
        assert_eq!(back["averageWIP"], 1.25);
    }

    #[test]
    fn test_pearson_linear() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-9);
        let inverse: Vec<f64> = x.iter().map(|v| 10.0 - v).collect();
        assert!((pearson(&x, &inverse).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_undefined() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[2.0]), None);
        assert_eq!(pearson(&[], &[]), None);
    }

    #[test]
    fn test_describe_correlation() {
        assert_eq!(describe_correlation(0.8), "Strong positive correlation");
        assert_eq!(describe_correlation(-0.4), "Moderate negative correlation");
        assert_eq!(describe_correlation(0.1), "Weak correlation");
        assert_eq!(describe_correlation(0.5), "Moderate positive correlation");
    }

    #[test]
    fn test_correlations_need_two_games() {
        let game = |wip: f64, avg: f64, total: f64| WipGame {
            average_wip: wip,
            average_time_per_pizza: avg,
            total_time: total,
            created_at: String::new(),
        };
        assert_eq!(WipCorrelations::from_games(&[game(1.0, 10.0, 50.0)]), None);
        let c = WipCorrelations::from_games(&[game(1.0, 10.0, 50.0), game(2.0, 20.0, 50.0)])
            .unwrap();
        assert!((c.wip_vs_avg_time.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(c.wip_vs_total_time, None);
    }
}
