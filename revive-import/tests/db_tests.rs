//! Database file initialization tests

use revive_import::db::{init_database_pool, list_leads, SqliteLeadStore};
use revive_import::models::{CandidateRecord, LeadFields, LeadInsert};
use revive_import::services::LeadStore;

fn lead(email: &str) -> LeadInsert {
    let record = CandidateRecord::new(
        2,
        LeadFields {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: email.into(),
            ..Default::default()
        },
    );
    LeadInsert::from_record(&record, "user-1")
}

#[tokio::test]
async fn test_database_created_in_missing_folder() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("revive.db");

    let pool = init_database_pool(&db_path).await.unwrap();

    assert!(db_path.exists());
    assert!(list_leads(&pool, "user-1", None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_leads_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("revive.db");

    let pool = init_database_pool(&db_path).await.unwrap();
    SqliteLeadStore::new(pool.clone())
        .insert_leads(&[lead("grace@example.com")])
        .await
        .unwrap();
    pool.close().await;

    // Schema init is idempotent
    let reopened = init_database_pool(&db_path).await.unwrap();
    let leads = list_leads(&reopened, "user-1", None, 10).await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email, "grace@example.com");
}
