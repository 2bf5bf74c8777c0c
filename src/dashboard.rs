//! Dashboard widgets.
//!
//! Every value here is a fixed literal. Nothing is computed from the
//! indexed datasets.

use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: &'static str,
    pub delta: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Share {
    pub label: &'static str,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gauge {
    pub label: &'static str,
    pub percent: u8,
    pub verdict: &'static str,
}

/// Snapshot served by `GET /api/dashboard` and printed by `foundry chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub title: &'static str,
    pub metrics: [Metric; 4],
    pub industry_distribution: [Share; 4],
    pub top_cities: [Share; 4],
    pub success_probability: Gauge,
}

pub const DASHBOARD: Dashboard = Dashboard {
    title: "Intelligence & Analytics Dashboard",
    metrics: [
        Metric {
            label: "Total Startups",
            value: "3,876",
            delta: "+12%",
        },
        Metric {
            label: "Success Rate",
            value: "67.8%",
            delta: "📈",
        },
        Metric {
            label: "Avg Funding",
            value: "$2.4M",
            delta: "High",
        },
        Metric {
            label: "Active VCs",
            value: "142",
            delta: "Steady",
        },
    ],
    industry_distribution: [
        Share {
            label: "AI/ML",
            value: 28,
        },
        Share {
            label: "Health",
            value: 22,
        },
        Share {
            label: "Fintech",
            value: 18,
        },
        Share {
            label: "EdTech",
            value: 15,
        },
    ],
    top_cities: [
        Share {
            label: "Bangalore",
            value: 420,
        },
        Share {
            label: "Delhi",
            value: 389,
        },
        Share {
            label: "Mumbai",
            value: 312,
        },
        Share {
            label: "Chennai",
            value: 276,
        },
    ],
    success_probability: Gauge {
        label: "Success Probability",
        percent: 72,
        verdict: "Good Opportunity",
    },
};

impl Dashboard {
    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 {}", self.title);
        for m in &self.metrics {
            let _ = writeln!(out, "  {:<16} {:>8}  {}", m.label, m.value, m.delta);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "  Industry Distribution");
        let max = self
            .industry_distribution
            .iter()
            .map(|s| s.value)
            .max()
            .unwrap_or(1)
            .max(1);
        for s in &self.industry_distribution {
            let bar = "█".repeat((s.value * 20 / max) as usize);
            let _ = writeln!(out, "    {:<8} {:<20} {}", s.label, bar, s.value);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "  Top Cities");
        for s in &self.top_cities {
            let _ = writeln!(out, "    {:<10} {:>5}", s.label, s.value);
        }

        let _ = writeln!(out);
        let g = &self.success_probability;
        let _ = writeln!(out, "  {}: {}% ({})", g.label, g.percent, g.verdict);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(DASHBOARD).unwrap();
        assert_eq!(json["metrics"][0]["value"], "3,876");
        assert_eq!(json["metrics"][0]["delta"], "+12%");
        assert_eq!(json["metrics"][3]["label"], "Active VCs");
        assert_eq!(json["industry_distribution"][1]["label"], "Health");
        assert_eq!(json["industry_distribution"][1]["value"], 22);
        assert_eq!(json["top_cities"][0]["value"], 420);
        assert_eq!(json["success_probability"]["percent"], 72);
        assert_eq!(json["success_probability"]["verdict"], "Good Opportunity");
    }

    #[test]
    fn test_render_text() {
        let text = DASHBOARD.render_text();
        assert!(text.contains("Total Startups"));
        assert!(text.contains("$2.4M"));
        assert!(text.contains("Chennai"));
        assert!(text.contains("Success Probability: 72% (Good Opportunity)"));
    }
}
