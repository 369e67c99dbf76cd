use projinvite_core::db::open_db;
use projinvite_core::{
    Assignment, InviteRepository, ProjectId, RepoError, SqliteInviteRepository, StoreFault,
};

fn pid(value: &str) -> ProjectId {
    ProjectId::new(value).unwrap()
}

fn seeded_repo(project_ids: &[&str]) -> SqliteInviteRepository {
    let repo = SqliteInviteRepository::open_in_memory().unwrap();
    repo.with_connection(|conn| {
        for id in project_ids {
            conn.execute("INSERT INTO projects (id) VALUES (?1);", [id])
                .unwrap();
        }
    });
    repo
}

#[test]
fn loads_projects_in_insertion_order() {
    let repo = seeded_repo(&["P3", "P1", "P2"]);

    let ids: Vec<String> = repo
        .load_projects()
        .unwrap()
        .into_iter()
        .map(|project| project.id.to_string())
        .collect();
    assert_eq!(ids, vec!["P3", "P1", "P2"]);
}

#[test]
fn integer_project_ids_are_read_as_text() {
    let repo = SqliteInviteRepository::open_in_memory().unwrap();
    repo.with_connection(|conn| {
        conn.execute("INSERT INTO projects (id) VALUES (?1);", [1042_i64])
            .unwrap();
    });

    let projects = repo.load_projects().unwrap();
    assert_eq!(projects[0].id, pid("1042"));
}

#[test]
fn append_then_load_returns_the_new_assignment() {
    let repo = seeded_repo(&["P1", "P2"]);

    repo.append_assignment("a@x.com", &pid("P1")).unwrap();
    repo.append_assignment("b@x.com", &pid("P2")).unwrap();

    let rows = repo.load_assignments().unwrap();
    assert_eq!(
        rows,
        vec![
            Assignment::new("a@x.com", pid("P1")),
            Assignment::new("b@x.com", pid("P2")),
        ]
    );
}

#[test]
fn null_project_column_loads_as_unassigned() {
    let repo = seeded_repo(&["P1"]);
    repo.with_connection(|conn| {
        conn.execute_batch(
            "INSERT INTO assignments (email, project_id) VALUES ('a@x.com', NULL);",
        )
        .unwrap();
    });

    let rows = repo.load_assignments().unwrap();
    assert_eq!(rows, vec![Assignment::unassigned("a@x.com")]);
}

#[test]
fn duplicate_project_append_is_a_write_error_and_keeps_existing_rows() {
    let repo = seeded_repo(&["P1"]);
    repo.append_assignment("a@x.com", &pid("P1")).unwrap();

    let err = repo.append_assignment("b@x.com", &pid("P1")).unwrap_err();
    assert!(matches!(err, RepoError::Write(StoreFault::Db(_))));

    let rows = repo.load_assignments().unwrap();
    assert_eq!(rows, vec![Assignment::new("a@x.com", pid("P1"))]);
}

#[test]
fn dropped_session_rolls_back_and_releases_the_lock() {
    let repo = seeded_repo(&["P1"]);
    {
        let mut session = repo.begin().unwrap();
        assert_eq!(session.load_projects().unwrap().len(), 1);
    }

    // A second session would fail with "cannot start a transaction within a
    // transaction" if the first one leaked.
    let mut session = repo.begin().unwrap();
    session.append_assignment("a@x.com", &pid("P1")).unwrap();
    drop(session);
    assert_eq!(repo.load_assignments().unwrap().len(), 1);
}

#[test]
fn second_connection_waits_for_the_write_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("invites.sqlite3");
    open_db(&path)
        .unwrap()
        .execute("INSERT INTO projects (id) VALUES ('P1');", [])
        .unwrap();

    let first = SqliteInviteRepository::open(&path).unwrap();
    let second = SqliteInviteRepository::open(&path).unwrap();

    let mut held = first.begin().unwrap();
    std::thread::scope(|scope| {
        let waiter = scope.spawn(|| second.load_assignments().map(|rows| rows.len()));
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert!(!waiter.is_finished());

        held.append_assignment("a@x.com", &pid("P1")).unwrap();
        drop(held);
        assert_eq!(waiter.join().unwrap().unwrap(), 1);
    });
}

#[test]
fn invalid_project_rows_are_reported_as_unavailable() {
    let repo = SqliteInviteRepository::open_in_memory().unwrap();
    repo.with_connection(|conn| {
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO projects (id) VALUES ('   ');",
        )
        .unwrap();
    });

    let err = repo.load_projects().unwrap_err();
    assert!(matches!(err, RepoError::Unavailable(StoreFault::InvalidData(_))));
}
