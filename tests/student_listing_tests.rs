//! Integration tests for the filtered, sorted, paginated student listing

mod common;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use student_records::db::list_students;
use student_records::query::STUDENT_CATALOG;
use student_records::{
    Config, Database, PageRequest, SortDirection, SortSpec, Student, StudentError, StudentFilter,
    StudentListItem,
};

use common::{bare_db, date, expected_avg, seed_roster, test_db};

const ALL: PageRequest = PageRequest { page: 1, count: 100 };

fn matches_filter(student: &Student, filter: &StudentFilter) -> bool {
    let name_ok = filter.fullname.as_ref().is_none_or(|needle| {
        student
            .fullname
            .to_lowercase()
            .contains(&needle.to_lowercase())
    });
    let from_ok = filter.sat_score_from.is_none_or(|v| student.sat_score >= v);
    let to_ok = filter.sat_score_to.is_none_or(|v| student.sat_score <= v);
    let born_from_ok = filter.birthdate_from.is_none_or(|d| student.birthdate >= d);
    let born_to_ok = filter.birthdate_to.is_none_or(|d| student.birthdate <= d);
    name_ok && from_ok && to_ok && born_from_ok && born_to_ok
}

/// Filter with the fields selected by `mask` taken from `template`
fn masked(template: &StudentFilter, mask: u8) -> StudentFilter {
    StudentFilter {
        fullname: (mask & 1 != 0).then(|| template.fullname.clone()).flatten(),
        sat_score_from: (mask & 2 != 0).then_some(template.sat_score_from).flatten(),
        sat_score_to: (mask & 4 != 0).then_some(template.sat_score_to).flatten(),
        birthdate_from: (mask & 8 != 0).then_some(template.birthdate_from).flatten(),
        birthdate_to: (mask & 16 != 0).then_some(template.birthdate_to).flatten(),
    }
}

fn compare_by(alias: &str, a: &StudentListItem, b: &StudentListItem) -> Ordering {
    match alias {
        "id" => a.id.cmp(&b.id),
        "created_at" => a.created_at.cmp(&b.created_at),
        "fullname" => a.fullname.cmp(&b.fullname),
        "sat_score" => a.sat_score.cmp(&b.sat_score),
        "graduation_score" => a.graduation_score.total_cmp(&b.graduation_score),
        "phone" => a.phone.cmp(&b.phone),
        "email" => a.email.cmp(&b.email),
        "picture" => a.picture.cmp(&b.picture),
        "avg_score" => a
            .avg_score
            .partial_cmp(&b.avg_score)
            .expect("averages are finite"),
        other => panic!("no comparator for {}", other),
    }
}

#[tokio::test]
async fn test_every_filter_combination_matches_direct_evaluation() {
    let db = test_db().await;
    let roster = seed_roster(&db).await;
    let repo = db.students();

    let templates = [
        StudentFilter {
            fullname: Some("smith".to_string()),
            sat_score_from: Some(1400),
            sat_score_to: Some(1600),
            birthdate_from: Some(date("2003-12-09")),
            birthdate_to: Some(date("2005-06-30")),
        },
        StudentFilter {
            fullname: Some("A".to_string()),
            sat_score_from: Some(1000),
            sat_score_to: Some(1500),
            birthdate_from: Some(date("2004-03-01")),
            birthdate_to: Some(date("2004-03-01")),
        },
    ];

    for template in &templates {
        for mask in 0u8..32 {
            let filter = masked(template, mask);
            let expected: BTreeSet<i64> = roster
                .iter()
                .filter(|s| matches_filter(s, &filter))
                .map(|s| s.id)
                .collect();

            let page = repo
                .list(&filter, &SortSpec::asc("id"), ALL)
                .await
                .unwrap();
            let actual: BTreeSet<i64> = page.items.iter().map(|s| s.id).collect();

            assert_eq!(actual, expected, "filter {:?}", filter);
            assert_eq!(page.total, expected.len() as i64, "filter {:?}", filter);
        }
    }
}

#[tokio::test]
async fn test_no_filters_and_full_page_returns_everything() {
    let db = test_db().await;
    let roster = seed_roster(&db).await;
    let total = roster.len() as u32;

    let page = db
        .students()
        .list(
            &StudentFilter::default(),
            &SortSpec::asc("id"),
            PageRequest::new(1, total),
        )
        .await
        .unwrap();

    assert_eq!(page.total, total as i64);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, 1);
    assert_eq!(page.count, total);
    assert!(!page.has_next_page());
    assert_eq!(
        page.items.iter().map(|s| s.id).collect::<Vec<_>>(),
        roster.iter().map(|s| s.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_page_beyond_last_is_empty_with_total_intact() {
    let db = test_db().await;
    seed_roster(&db).await;

    let page = db
        .students()
        .list(
            &StudentFilter::default(),
            &SortSpec::asc("fullname"),
            PageRequest::new(4, 5),
        )
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 12);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.page, 4);
}

#[tokio::test]
async fn test_huge_page_number_and_size_give_empty_page() {
    let db = test_db().await;
    seed_roster(&db).await;

    let page = db
        .students()
        .list(
            &StudentFilter::default(),
            &SortSpec::asc("id"),
            PageRequest::new(u32::MAX, u32::MAX),
        )
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 12);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, u32::MAX);
}

#[tokio::test]
async fn test_configured_page_size_fills_missing_count() {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        default_page_size: 5,
        ..Default::default()
    };
    let db = Database::from_config(&config).await.unwrap();
    db.ensure_schema().await.unwrap();
    seed_roster(&db).await;
    let repo = db.students();

    let request = repo.page_request(Some(3), None);
    assert_eq!(request, PageRequest::new(3, 5));
    assert_eq!(repo.page_request(None, Some(2)), PageRequest::new(1, 2));

    let page = repo
        .list(&StudentFilter::default(), &SortSpec::asc("id"), request)
        .await
        .unwrap();
    assert_eq!(page.count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_pages_partition_the_result_set() {
    let db = test_db().await;
    let roster = seed_roster(&db).await;
    let repo = db.students();
    let sort = SortSpec::desc("sat_score");

    let mut seen = Vec::new();
    for page_number in 1..=3 {
        let page = repo
            .list(&StudentFilter::default(), &sort, PageRequest::new(page_number, 5))
            .await
            .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), if page_number < 3 { 5 } else { 2 });
        seen.extend(page.items.into_iter().map(|s| s.id));
    }

    let unique: BTreeSet<i64> = seen.iter().copied().collect();
    assert_eq!(unique.len(), roster.len());
    assert_eq!(seen.len(), roster.len());
}

#[tokio::test]
async fn test_zero_page_size_is_rejected_before_any_query() {
    // No tables: any query that reached the store would fail with a storage error
    let db = bare_db().await;
    let mut uow = db.begin().await.unwrap();

    let err = list_students(
        &mut uow,
        &StudentFilter::default(),
        &SortSpec::asc("id"),
        PageRequest::new(1, 0),
    )
    .await
    .unwrap_err();
    assert_matches!(err, StudentError::InvalidPageSize { count: 0 });

    let err = list_students(
        &mut uow,
        &StudentFilter::default(),
        &SortSpec::asc("id"),
        PageRequest::new(1, 10),
    )
    .await
    .unwrap_err();
    assert_matches!(err, StudentError::Storage(_));
}

#[tokio::test]
async fn test_zero_page_number_is_rejected() {
    let db = test_db().await;
    let err = db
        .students()
        .list(&StudentFilter::default(), &SortSpec::asc("id"), PageRequest::new(0, 10))
        .await
        .unwrap_err();
    assert_matches!(err, StudentError::InvalidPageNumber { page: 0 });
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn test_unknown_sort_field_is_rejected() {
    let db = test_db().await;
    seed_roster(&db).await;

    for field in ["birthdate", "s.sat_score", "sat_score DESC", ""] {
        let err = db
            .students()
            .list(&StudentFilter::default(), &SortSpec::asc(field), ALL)
            .await
            .unwrap_err();
        assert_matches!(err, StudentError::InvalidSortField { field: f } if f == field.trim());
    }
}

#[tokio::test]
async fn test_sorting_by_each_alias_in_both_directions() {
    let db = test_db().await;
    seed_roster(&db).await;
    let repo = db.students();

    for field in STUDENT_CATALOG {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            // Aliases resolve case-insensitively
            let sort = SortSpec::new(field.alias.to_uppercase(), direction);
            let page = repo.list(&StudentFilter::default(), &sort, ALL).await.unwrap();
            assert_eq!(page.items.len(), 12);

            for pair in page.items.windows(2) {
                let ordering = compare_by(field.alias, &pair[0], &pair[1]);
                let wrong = match direction {
                    SortDirection::Asc => Ordering::Greater,
                    SortDirection::Desc => Ordering::Less,
                };
                assert_ne!(
                    ordering, wrong,
                    "{} {:?}: {} then {}",
                    field.alias, direction, pair[0].id, pair[1].id
                );
                if ordering == Ordering::Equal {
                    assert!(pair[0].id < pair[1].id, "ties break on id");
                }
            }
        }
    }
}

#[tokio::test]
async fn test_unrecognized_direction_sorts_ascending() {
    let db = test_db().await;
    seed_roster(&db).await;

    let page = db
        .students()
        .list(
            &StudentFilter::default(),
            &SortSpec::from_params("sat_score", Some("sideways")),
            ALL,
        )
        .await
        .unwrap();
    let scores: Vec<i64> = page.items.iter().map(|s| s.sat_score).collect();
    let mut sorted = scores.clone();
    sorted.sort();
    assert_eq!(scores, sorted);
}

#[tokio::test]
async fn test_score_bounds_are_inclusive() {
    let db = test_db().await;
    seed_roster(&db).await;

    let filter = StudentFilter {
        sat_score_from: Some(1400),
        sat_score_to: Some(1600),
        ..Default::default()
    };
    let page = db
        .students()
        .list(&filter, &SortSpec::asc("sat_score"), ALL)
        .await
        .unwrap();

    let scores: Vec<i64> = page.items.iter().map(|s| s.sat_score).collect();
    assert_eq!(scores, vec![1400, 1400, 1500, 1550, 1600, 1600]);
}

#[tokio::test]
async fn test_birthdate_bounds_are_inclusive() {
    let db = test_db().await;
    seed_roster(&db).await;

    let filter = StudentFilter {
        birthdate_from: Some(date("2004-03-01")),
        birthdate_to: Some(date("2004-03-01")),
        ..Default::default()
    };
    let page = db
        .students()
        .list(&filter, &SortSpec::asc("fullname"), ALL)
        .await
        .unwrap();

    let names: Vec<&str> = page.items.iter().map(|s| s.fullname.as_str()).collect();
    assert_eq!(names, vec!["Ann Smith", "dave o'neil"]);
}

#[tokio::test]
async fn test_inverted_range_yields_no_rows() {
    let db = test_db().await;
    seed_roster(&db).await;

    let filter = StudentFilter {
        sat_score_from: Some(1600),
        sat_score_to: Some(1400),
        ..Default::default()
    };
    let page = db
        .students()
        .list(&filter, &SortSpec::asc("id"), ALL)
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 0);
}

#[tokio::test]
async fn test_name_filter_is_case_insensitive_substring() {
    let db = test_db().await;
    seed_roster(&db).await;

    let filter = StudentFilter {
        fullname: Some("SMITH".to_string()),
        ..Default::default()
    };
    let page = db
        .students()
        .list(&filter, &SortSpec::asc("fullname"), ALL)
        .await
        .unwrap();

    let names: Vec<&str> = page.items.iter().map(|s| s.fullname.as_str()).collect();
    assert_eq!(
        names,
        vec!["Ann Smith", "Carla SMITHERS", "Hank Smith", "Liam Smithson"]
    );
}

#[tokio::test]
async fn test_name_filter_treats_wildcards_literally() {
    let db = test_db().await;
    seed_roster(&db).await;
    let repo = db.students();

    let literal = StudentFilter {
        fullname: Some("100%_r".to_string()),
        ..Default::default()
    };
    let page = repo.list(&literal, &SortSpec::asc("id"), ALL).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].fullname, "Frank 100%_Real");

    let wildcard_only = StudentFilter {
        fullname: Some("%".to_string()),
        ..Default::default()
    };
    let page = repo
        .list(&wildcard_only, &SortSpec::asc("id"), ALL)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_name_filter_folds_ascii_case_only() {
    let db = test_db().await;
    let repo = db.students();
    repo.create(common::fields("JOSÉ Núñez", "jose@x.com", 1300, "2004-04-04"))
        .await
        .unwrap();

    let name_filter = |needle: &str| StudentFilter {
        fullname: Some(needle.to_string()),
        ..Default::default()
    };

    // ASCII letters fold, so mixed-case ASCII still matches
    let page = repo
        .list(&name_filter("jOSÉ"), &SortSpec::asc("id"), ALL)
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    // SQLite lower() leaves non-ASCII letters alone
    let page = repo
        .list(&name_filter("josé"), &SortSpec::asc("id"), ALL)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn test_avg_score_is_mean_of_grades() {
    let db = test_db().await;
    seed_roster(&db).await;

    let page = db
        .students()
        .list(&StudentFilter::default(), &SortSpec::desc("avg_score"), ALL)
        .await
        .unwrap();

    for item in &page.items {
        match (item.avg_score, expected_avg(&item.fullname)) {
            (Some(actual), Some(expected)) => {
                assert!((actual - expected).abs() < 1e-9, "{}", item.fullname)
            }
            (actual, expected) => assert_eq!(actual, expected, "{}", item.fullname),
        }
    }

    // Eve Adams: (100 + 60 + 95) / 3 = 85, Ann Smith: 85, Grace Hopper: 88
    assert_eq!(page.items[0].fullname, "Grace Hopper");
    assert!(page.items.last().unwrap().avg_score.is_none());
}
