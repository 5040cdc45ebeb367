//! Chart-need classification over the raw question text. Keyword and
//! pattern driven, case-insensitive; a single hit is sufficient.

use std::sync::LazyLock;

use regex::RegexSet;

const CHART_KEYWORDS: &[&str] = &[
    "chart",
    "graph",
    "plot",
    "visualization",
    "visualize",
    "show",
    "display",
    "trend",
    "distribution",
    "comparison",
    "compare",
    "analyze",
    "analysis",
    "breakdown",
    "summary",
    "overview",
    "dashboard",
    "report",
    "statistics",
    "stats",
    "percentage",
    "ratio",
    "top",
    "bottom",
    "highest",
    "lowest",
    "average",
    "total",
    "sum",
    "count",
    "group by",
    "order by",
];

static QUESTION_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // aggregation phrasing
        r"\b(count|sum|avg|average|max|min|total)\b",
        r"\bgroup\s+by\b",
        r"\border\s+by\b",
        r"\btop\s+\d+\b",
        r"\bbottom\s+\d+\b",
        // how-many phrasing
        r"\bhow\s+many\b",
        r"\bhow\s+much\b",
        r"\bwhat\s+is\s+the\s+(count|number|total)\b",
        r"\bcount\s+of\b",
        r"\bnumber\s+of\b",
        // grouping phrasing
        r"\bper\s+\w+\b",
        r"\bby\s+\w+\b",
        r"\beach\s+\w+\b",
        r"\bevery\s+\w+\b",
        // comparative phrasing
        r"\bwhich\s+\w+\s+(has|have)\s+(more|most|less|least)\b",
        r"\bcompare\b",
        r"\bdifference\s+between\b",
    ])
    .unwrap()
});

/// Does the question imply a desire for visual output?
pub fn chart_needed(question: &str) -> bool {
    let q = question.to_lowercase();
    if CHART_KEYWORDS.iter().any(|kw| q.contains(kw)) {
        return true;
    }
    QUESTION_PATTERNS.is_match(&q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_questions_need_charts() {
        assert!(chart_needed("Show total sales by region"));
        assert!(chart_needed("how many orders were placed last month"));
        assert!(chart_needed("average fee per section"));
        assert!(chart_needed("top 5 products"));
    }

    #[test]
    fn comparative_questions_need_charts() {
        assert!(chart_needed("Which department has more employees?"));
        assert!(chart_needed("difference between 2023 and 2024 revenue"));
    }

    #[test]
    fn plain_listing_does_not() {
        assert!(!chart_needed("List all employees"));
        assert!(!chart_needed("name and email of the newest user"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(chart_needed("SHOW TOTAL SALES BY REGION"));
        assert!(chart_needed("GROUP BY status"));
    }
}
