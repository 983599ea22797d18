mod common;

use common::{question, seed_crowded_subtopic, seed_history, Seeder};
use rusqlite::{params, Connection};
use serde_json::json;
use std::time::Duration;
use syllabus_core::db::open_db_in_memory;
use syllabus_core::{
    CatalogError, CatalogService, MicroUnitId, MissingResource, SqliteContentRepository,
};

#[test]
fn list_subjects_returns_distinct_published_subjects_sorted() {
    let conn = open_db_in_memory().unwrap();
    let seed = Seeder::new(&conn);
    seed.syllabus("Polity", "Prelims", "GS2", false);
    seed.syllabus("History", "Prelims", "GS1", true);
    seed.syllabus("Geography", "Mains", "GS1", true);
    seed.syllabus("History", "Mains", "GS1", true);

    let repo = SqliteContentRepository::try_new(&conn).unwrap();
    let service = CatalogService::new(repo);

    assert_eq!(
        service.list_subjects().unwrap(),
        vec!["Geography".to_string(), "History".to_string()]
    );
}

#[test]
fn list_subjects_is_empty_for_empty_store() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(service.list_subjects().unwrap().is_empty());
}

#[test]
fn list_syllabus_returns_published_rows_in_storage_order() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let rows = service.list_syllabus("History").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].stage, "Prelims");
    assert_eq!(rows[1].stage, "Mains");
    assert!(rows
        .iter()
        .all(|row| row.paper == "GS1" && row.exam == "UPSC Civil Services Examination"));
}

#[test]
fn list_syllabus_keeps_stored_exam_label() {
    let conn = open_db_in_memory().unwrap();
    Seeder::new(&conn).syllabus_with_exam("Economics", "State PSC");
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let rows = service.list_syllabus("Economics").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].exam, "State PSC");
}

#[test]
fn list_syllabus_for_unknown_subject_is_empty_not_error() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(service.list_syllabus("Astronomy").unwrap().is_empty());
}

#[test]
fn list_subtopics_includes_unfinalized_subtopics_with_note_flags() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let subtopics = service.list_subtopics("History").unwrap();
    let summary: Vec<(&str, bool)> = subtopics
        .iter()
        .map(|item| (item.name.as_str(), item.has_notes))
        .collect();
    assert_eq!(
        summary,
        vec![("Ancient India", true), ("Medieval India", true)]
    );
}

#[test]
fn list_subtopics_reports_false_without_any_noted_unit() {
    let conn = open_db_in_memory().unwrap();
    let seed = Seeder::new(&conn);
    let culture = seed.subtopic("History", "Art and Culture", true);
    seed.micro_unit(culture, "History", "Temple Architecture", 1, true);
    seed.subtopic("History", "Modern India", true);

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());
    let subtopics = service.list_subtopics("History").unwrap();

    assert_eq!(subtopics.len(), 2);
    assert!(subtopics.iter().all(|item| !item.has_notes));
}

#[test]
fn unfinalized_noted_unit_counts_for_has_notes_but_is_not_listed() {
    let conn = open_db_in_memory().unwrap();
    let seed = Seeder::new(&conn);
    let economy = seed.subtopic("Economy", "Banking", true);
    let policy = seed.micro_unit(economy, "Economy", "Monetary Policy", 1, false);
    seed.note(policy, "The repo rate anchors short-term lending.");

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let subtopics = service.list_subtopics("Economy").unwrap();
    assert_eq!(subtopics.len(), 1);
    assert_eq!(subtopics[0].name, "Banking");
    assert!(subtopics[0].has_notes);

    assert!(service
        .list_micro_units("Economy", "Banking")
        .unwrap()
        .is_empty());
}

#[test]
fn list_subtopics_for_unknown_subject_is_empty() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(service.list_subtopics("Astronomy").unwrap().is_empty());
}

#[test]
fn list_micro_units_orders_by_order_and_flags_notes() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let units = service.list_micro_units("History", "Ancient India").unwrap();
    assert_eq!(units.len(), 2);

    assert_eq!(units[0].id, catalog.guptas);
    assert_eq!(units[0].name, "Guptas");
    assert_eq!(units[0].order, 1);
    assert!(units[0].has_notes);

    assert_eq!(units[1].id, catalog.mauryas);
    assert_eq!(units[1].name, "Mauryas");
    assert_eq!(units[1].order, 2);
    assert!(!units[1].has_notes);
}

#[test]
fn list_micro_units_rejects_unfinalized_subtopic() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let err = service
        .list_micro_units("History", "Medieval India")
        .unwrap_err();
    match err {
        CatalogError::NotFound(MissingResource::SubTopic { subject, name }) => {
            assert_eq!(subject, "History");
            assert_eq!(name, "Medieval India");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_micro_units_rejects_subtopic_from_other_subject() {
    let conn = open_db_in_memory().unwrap();
    seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let err = service
        .list_micro_units("Geography", "Ancient India")
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[test]
fn list_micro_units_skips_unfinalized_units() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    Seeder::new(&conn).micro_unit(catalog.ancient_india, "History", "Satavahanas", 3, false);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let names: Vec<String> = service
        .list_micro_units("History", "Ancient India")
        .unwrap()
        .into_iter()
        .map(|unit| unit.name)
        .collect();
    assert_eq!(names, vec!["Guptas".to_string(), "Mauryas".to_string()]);
}

#[test]
fn list_micro_units_breaks_order_ties_by_storage_order() {
    let conn = open_db_in_memory().unwrap();
    let seed = Seeder::new(&conn);
    let polity = seed.subtopic("Polity", "Constitution", true);
    let preamble = seed.micro_unit(polity, "Polity", "Preamble", 1, true);
    let rights = seed.micro_unit(polity, "Polity", "Fundamental Rights", 1, true);
    let duties = seed.micro_unit(polity, "Polity", "Fundamental Duties", 0, true);

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());
    let ids: Vec<MicroUnitId> = service
        .list_micro_units("Polity", "Constitution")
        .unwrap()
        .into_iter()
        .map(|unit| unit.id)
        .collect();
    assert_eq!(ids, vec![duties, preamble, rights]);
}

#[test]
fn list_micro_units_with_no_published_units_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let seed = Seeder::new(&conn);
    let economy = seed.subtopic("Economy", "Banking", true);
    seed.micro_unit(economy, "Economy", "Monetary Policy", 1, false);

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());
    assert!(service
        .list_micro_units("Economy", "Banking")
        .unwrap()
        .is_empty());
}

#[test]
fn listings_use_constant_store_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let seed = Seeder::new(&conn);
    for order in 3..40 {
        let unit = seed.micro_unit(
            catalog.ancient_india,
            "History",
            &format!("Unit {order}"),
            order,
            true,
        );
        if order % 2 == 0 {
            seed.note(unit, "filler note");
        }
    }

    let repo = SqliteContentRepository::try_new(&conn).unwrap();
    let service = CatalogService::new(&repo);

    let units = service.list_micro_units("History", "Ancient India").unwrap();
    assert_eq!(units.len(), 39);
    assert_eq!(repo.round_trips(), 3);

    service.list_subtopics("History").unwrap();
    assert_eq!(repo.round_trips(), 6);
}

#[test]
fn empty_listing_skips_membership_query() {
    let conn = open_db_in_memory().unwrap();
    Seeder::new(&conn).subtopic("Economy", "Banking", true);

    let repo = SqliteContentRepository::try_new(&conn).unwrap();
    let service = CatalogService::new(&repo);

    assert!(service.list_micro_units("Economy", "Banking").unwrap().is_empty());
    assert_eq!(repo.round_trips(), 2);
}

#[test]
fn fetch_note_returns_content_with_canonical_id() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let padded = format!("  {}  ", catalog.guptas.to_string().to_uppercase());
    let note = service.fetch_note(&padded).unwrap();

    assert_eq!(note.micro_unit_id, catalog.guptas);
    assert_eq!(note.content, "The Gupta period is often called a golden age.");
    assert_eq!(
        serde_json::to_value(&note).unwrap()["micro_unit_id"],
        json!(catalog.guptas.to_string())
    );
}

#[test]
fn fetch_note_ignores_publication_flags() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    // Delhi Sultanate sits under an unfinalized subtopic.
    let note = service.fetch_note_by_id(catalog.delhi_sultanate).unwrap();
    assert!(note.content.contains("five dynasties"));
}

#[test]
fn fetch_note_distinguishes_missing_unit_from_missing_note() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let unknown = MicroUnitId::new();
    assert!(matches!(
        service.fetch_note_by_id(unknown).unwrap_err(),
        CatalogError::NotFound(MissingResource::MicroUnit(id)) if id == unknown
    ));
    assert!(matches!(
        service.fetch_note_by_id(catalog.mauryas).unwrap_err(),
        CatalogError::NotFound(MissingResource::Note(id)) if id == catalog.mauryas
    ));
}

#[test]
fn fetch_note_with_dangling_unit_reference_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let orphan = MicroUnitId::new();
    Seeder::new(&conn).note(orphan, "Orphaned note text.");
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.fetch_note_by_id(orphan).unwrap_err(),
        CatalogError::NotFound(MissingResource::MicroUnit(_))
    ));
}

#[test]
fn malformed_identifier_is_rejected_before_any_store_call() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteContentRepository::try_new(&conn).unwrap();
    let service = CatalogService::new(&repo);

    let err = service.fetch_note("not-a-uuid").unwrap_err();
    assert_eq!(err.code(), "malformed_input");
    assert!(matches!(
        service.fetch_mcqs("").unwrap_err(),
        CatalogError::MalformedInput(_)
    ));
    assert_eq!(repo.round_trips(), 0);
}

#[test]
fn fetch_mcqs_returns_questions_in_stored_order() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let questions = json!([
        question(2, "Who issued the Allahabad pillar inscription?", "B"),
        question(1, "Who founded the Gupta empire?", "A"),
    ]);
    Seeder::new(&conn).mcq_set(catalog.guptas, &questions, 2);

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());
    let set = service.fetch_mcqs(&catalog.guptas.to_string()).unwrap();

    assert_eq!(set.mcq_count, 2);
    let numbers: Vec<i64> = set.mcqs.iter().map(|q| q.question_number).collect();
    assert_eq!(numbers, vec![2, 1]);
    let labels: Vec<&str> = set.mcqs[0]
        .options
        .iter()
        .map(|option| option.option.as_str())
        .collect();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
    assert_eq!(set.mcqs[0].correct_answer, "B");
}

#[test]
fn fetch_mcqs_without_set_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.fetch_mcqs_by_id(catalog.mauryas).unwrap_err(),
        CatalogError::NotFound(MissingResource::McqSet(_))
    ));
    assert!(matches!(
        service.fetch_mcqs_by_id(MicroUnitId::new()).unwrap_err(),
        CatalogError::NotFound(MissingResource::MicroUnit(_))
    ));
}

#[test]
fn fetch_mcqs_reports_count_mismatch_as_inconsistent() {
    let conn = open_db_in_memory().unwrap();
    let catalog = seed_history(&conn);
    let questions = json!([question(1, "Who founded the Gupta empire?", "A")]);
    Seeder::new(&conn).mcq_set(catalog.guptas, &questions, 3);

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());
    let err = service.fetch_mcqs_by_id(catalog.guptas).unwrap_err();

    assert_eq!(err.code(), "inconsistent_data");
    assert!(err.to_string().contains("mcq_count 3"));
}

#[test]
fn invalid_stored_identifier_is_inconsistent_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO subtopics (uuid, name, subject, finalized)
         VALUES ('not-a-uuid', 'Ancient India', 'History', 1);",
        [],
    )
    .unwrap();
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.list_subtopics("History").unwrap_err(),
        CatalogError::InconsistentData(_)
    ));
}

#[test]
fn uppercase_stored_ids_fail_loudly_instead_of_hiding_content() {
    let conn = open_db_in_memory().unwrap();
    let subtopic = "AAAAAAAA-AAAA-4AAA-8AAA-AAAAAAAAAAAA";
    let unit = "BBBBBBBB-BBBB-4BBB-8BBB-BBBBBBBBBBBB";

    let rejected = conn.execute(
        "INSERT INTO subtopics (uuid, name, subject, finalized)
         VALUES (?1, 'Ancient India', 'History', 1);",
        params![subtopic],
    );
    assert!(rejected.is_err());

    // An external writer that bypasses the schema checks.
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO subtopics (uuid, name, subject, finalized)
         VALUES (?1, 'Ancient India', 'History', 1);",
        params![subtopic],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO micro_units (uuid, name, subject, subtopic_uuid, sort_order, finalized)
         VALUES (?1, 'Guptas', 'History', ?2, 1, 1);",
        params![unit, subtopic],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO micro_unit_notes (uuid, micro_unit_uuid, content)
         VALUES (?1, ?2, 'The Gupta period is often called a golden age.');",
        params![uuid::Uuid::new_v4().to_string(), unit],
    )
    .unwrap();

    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    let subtopics_err = service.list_subtopics("History").unwrap_err();
    assert_eq!(subtopics_err.code(), "inconsistent_data");
    assert!(subtopics_err.to_string().contains("non-canonical uuid"));

    let units_err = service
        .list_micro_units("History", "Ancient India")
        .unwrap_err();
    assert_eq!(units_err.code(), "inconsistent_data");
}

#[test]
fn non_canonical_embedded_subtopic_reference_is_inconsistent_data() {
    let conn = open_db_in_memory().unwrap();
    let reference = uuid::Uuid::new_v4().to_string().to_uppercase();
    conn.execute(
        "INSERT INTO syllabus (uuid, stage, paper, subject, subtopics, v1, v2, v3, v4)
         VALUES (?1, 'Prelims', 'GS1', 'History', ?2, 1, 1, 1, 1);",
        params![
            uuid::Uuid::new_v4().to_string(),
            json!([reference]).to_string()
        ],
    )
    .unwrap();
    let service = CatalogService::new(SqliteContentRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.list_syllabus("History").unwrap_err(),
        CatalogError::InconsistentData(_)
    ));
}

#[test]
fn query_past_its_deadline_is_store_unavailable() {
    let conn = open_db_in_memory().unwrap();
    seed_crowded_subtopic(&conn, 1_500);
    let repo = SqliteContentRepository::try_new(&conn)
        .unwrap()
        .with_query_timeout(Duration::ZERO);
    let service = CatalogService::new(repo);

    let err = service.list_micro_units("Economy", "Banking").unwrap_err();
    assert!(matches!(err, CatalogError::StoreUnavailable(_)));
    assert!(err.is_unavailable());
}

#[test]
fn query_within_its_deadline_completes() {
    let conn = open_db_in_memory().unwrap();
    seed_crowded_subtopic(&conn, 1_500);
    let repo = SqliteContentRepository::try_new(&conn)
        .unwrap()
        .with_query_timeout(Duration::from_secs(60));
    let service = CatalogService::new(repo);

    assert_eq!(
        service.list_micro_units("Economy", "Banking").unwrap().len(),
        1_500
    );
}

#[test]
fn repository_requires_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = CatalogError::from(SqliteContentRepository::try_new(&conn).err().unwrap());
    assert_eq!(err.code(), "store_unavailable");
}
