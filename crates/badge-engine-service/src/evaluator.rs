//! 资格评估
//!
//! 纯函数：只依赖参数，不做任何 I/O，可并发、重复调用

use crate::models::{Badge, ContributorStatistics, CriteriaType};

/// 取徽章判定所用的指标值
///
/// prs 取已合并 PR 数，commits 取提交数；其余指标尚无法计算，取 0
pub fn actual_value(stats: &ContributorStatistics, badge: &Badge) -> i64 {
    metric_value(stats, badge.criteria_type)
}

/// 统计数据是否满足徽章阈值
///
/// issues / reviews / stars / forks 恒为 false
pub fn is_eligible(stats: &ContributorStatistics, badge: &Badge) -> bool {
    if !badge.criteria_type.is_evaluable() {
        return false;
    }
    actual_value(stats, badge) >= i64::from(badge.criteria_value)
}

pub(crate) fn metric_value(stats: &ContributorStatistics, criteria_type: CriteriaType) -> i64 {
    match criteria_type {
        CriteriaType::Prs => stats.merged_prs,
        CriteriaType::Commits => stats.total_commits,
        CriteriaType::Issues | CriteriaType::Reviews | CriteriaType::Stars | CriteriaType::Forks => {
            0
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn badge(id: i64, criteria_type: CriteriaType, criteria_value: i32) -> Badge {
        Badge {
            id,
            repository_id: 1,
            name: format!("badge-{id}"),
            description: None,
            icon: None,
            criteria_type,
            criteria_value,
            active: true,
            is_default: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stats(merged_prs: i64, total_commits: i64) -> ContributorStatistics {
        ContributorStatistics {
            total_prs: merged_prs,
            merged_prs,
            total_commits,
            ..Default::default()
        }
    }

    #[test]
    fn test_prs_threshold_boundary() {
        for threshold in [1, 5, 20] {
            let b = badge(1, CriteriaType::Prs, threshold);
            let below = stats(i64::from(threshold) - 1, 0);
            let at = stats(i64::from(threshold), 0);

            assert!(!is_eligible(&below, &b), "threshold {threshold} - 1");
            assert!(is_eligible(&at, &b), "threshold {threshold}");
        }
    }

    #[test]
    fn test_commits_use_total_commits() {
        let b = badge(1, CriteriaType::Commits, 50);
        assert!(!is_eligible(&stats(100, 49), &b));
        assert!(is_eligible(&stats(0, 50), &b));
        assert_eq!(actual_value(&stats(0, 73), &b), 73);
    }

    #[test]
    fn test_prs_ignore_unmerged() {
        let b = badge(1, CriteriaType::Prs, 1);
        let open_only = ContributorStatistics {
            total_prs: 3,
            merged_prs: 0,
            ..Default::default()
        };
        assert!(!is_eligible(&open_only, &b));
    }

    #[test]
    fn test_inert_criteria_never_eligible() {
        let big = stats(1_000, 1_000);
        for criteria in [
            CriteriaType::Issues,
            CriteriaType::Reviews,
            CriteriaType::Stars,
            CriteriaType::Forks,
        ] {
            let b = badge(1, criteria, 1);
            assert!(!is_eligible(&big, &b));
            assert_eq!(actual_value(&big, &b), 0);
        }
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let b = badge(1, CriteriaType::Prs, 5);
        let s = stats(5, 10);
        let first = (is_eligible(&s, &b), actual_value(&s, &b));
        let second = (is_eligible(&s, &b), actual_value(&s, &b));
        assert_eq!(first, second);
    }
}
