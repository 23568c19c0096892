use notecanvas_core::db::open_db_in_memory;
use notecanvas_core::{
    CreateNoteInput, NoteService, NoteServiceError, NoteValidationError, SqliteNoteRepository,
    UpdateNoteInput, UpdateNotePositionInput,
};
use rusqlite::Connection;

fn with_service<T>(f: impl FnOnce(&NoteService<SqliteNoteRepository<'_>>) -> T) -> T {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let service = NoteService::new(repo);
    f(&service)
}

fn note_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_applies_defaults_and_trims() {
    with_service(|service| {
        let note = service
            .create_note(CreateNoteInput {
                title: "  Groceries  ".to_string(),
                content: Some("  milk  ".to_string()),
                ..CreateNoteInput::default()
            })
            .unwrap();

        assert_eq!(note.id, 1);
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "milk");
        assert_eq!((note.position_x, note.position_y), (0, 0));
        assert_eq!((note.width, note.height), (300, 200));
        assert_eq!(note.created_at, note.updated_at);
    });
}

#[test]
fn create_keeps_supplied_geometry() {
    with_service(|service| {
        let note = service
            .create_note(CreateNoteInput {
                title: "Placed".to_string(),
                position_x: Some(420),
                position_y: Some(64),
                width: Some(180),
                height: Some(90),
                ..CreateNoteInput::default()
            })
            .unwrap();

        assert_eq!((note.position_x, note.position_y), (420, 64));
        assert_eq!((note.width, note.height), (180, 90));
        assert_eq!(note.content, "");
    });
}

#[test]
fn create_rejects_blank_title_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = service
        .create_note(CreateNoteInput::titled("   "))
        .unwrap_err();
    assert!(matches!(
        err,
        NoteServiceError::Validation(NoteValidationError::EmptyTitle)
    ));
    assert_eq!(note_count(&conn), 0);
}

#[test]
fn created_ids_are_unique_and_never_reused() {
    with_service(|service| {
        let first = service.create_note(CreateNoteInput::titled("one")).unwrap();
        let second = service.create_note(CreateNoteInput::titled("two")).unwrap();
        assert_ne!(first.id, second.id);

        service.delete_note(second.id).unwrap();
        let third = service.create_note(CreateNoteInput::titled("three")).unwrap();
        assert!(third.id > second.id);
    });
}

#[test]
fn list_orders_by_most_recent_update_then_newest_id() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let a = service.create_note(CreateNoteInput::titled("A")).unwrap();
    let b = service.create_note(CreateNoteInput::titled("B")).unwrap();
    let c = service.create_note(CreateNoteInput::titled("C")).unwrap();

    // b and c share a timestamp; a is older than both.
    conn.execute_batch(&format!(
        "UPDATE notes SET created_at = 1000, updated_at = 1000 WHERE id = {};
         UPDATE notes SET created_at = 1000, updated_at = 2000 WHERE id IN ({}, {});",
        a.id, b.id, c.id
    ))
    .unwrap();
    let ids: Vec<_> = service
        .list_notes()
        .unwrap()
        .into_iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(ids, vec![c.id, b.id, a.id]);

    let touched = service
        .update_note(UpdateNoteInput {
            id: a.id,
            content: Some("touched".to_string()),
            ..UpdateNoteInput::default()
        })
        .unwrap();
    assert!(touched.updated_at > 2000);
    assert_eq!(service.list_notes().unwrap()[0].id, a.id);
}

#[test]
fn list_on_empty_store_is_empty() {
    with_service(|service| {
        assert!(service.list_notes().unwrap().is_empty());
    });
}

#[test]
fn update_changes_only_supplied_fields() {
    with_service(|service| {
        let created = service
            .create_note(CreateNoteInput {
                title: "Original".to_string(),
                content: Some("body".to_string()),
                position_x: Some(10),
                position_y: Some(20),
                ..CreateNoteInput::default()
            })
            .unwrap();

        let updated = service
            .update_note(UpdateNoteInput {
                id: created.id,
                title: Some(" Renamed ".to_string()),
                ..UpdateNoteInput::default()
            })
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.content, "body");
        assert_eq!((updated.position_x, updated.position_y), (10, 20));
        assert_eq!((updated.width, updated.height), (300, 200));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    });
}

#[test]
fn consecutive_updates_strictly_advance_updated_at() {
    with_service(|service| {
        let created = service.create_note(CreateNoteInput::titled("tick")).unwrap();
        let mut last = created.updated_at;
        for _ in 0..5 {
            let next = service
                .update_note(UpdateNoteInput {
                    id: created.id,
                    ..UpdateNoteInput::default()
                })
                .unwrap();
            assert!(next.updated_at > last);
            last = next.updated_at;
        }
    });
}

#[test]
fn update_rejects_blank_title_and_keeps_row() {
    with_service(|service| {
        let created = service.create_note(CreateNoteInput::titled("Keep")).unwrap();
        let err = service
            .update_note(UpdateNoteInput {
                id: created.id,
                title: Some(" ".to_string()),
                content: Some("lost".to_string()),
                ..UpdateNoteInput::default()
            })
            .unwrap_err();
        assert!(matches!(err, NoteServiceError::Validation(_)));

        let stored = service.list_notes().unwrap();
        assert_eq!(stored, vec![created]);
    });
}

#[test]
fn update_missing_note_reports_not_found_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());

    let err = service
        .update_note(UpdateNoteInput {
            id: 42,
            title: Some("ghost".to_string()),
            ..UpdateNoteInput::default()
        })
        .unwrap_err();
    assert!(matches!(err, NoteServiceError::NoteNotFound(42)));
    assert_eq!(err.to_string(), "note with id 42 not found");
    assert_eq!(note_count(&conn), 0);
}

#[test]
fn update_position_moves_and_optionally_resizes() {
    with_service(|service| {
        let created = service.create_note(CreateNoteInput::titled("drag")).unwrap();

        let moved = service
            .update_note_position(UpdateNotePositionInput {
                id: created.id,
                position_x: 250,
                position_y: 200,
                width: None,
                height: None,
            })
            .unwrap();
        assert_eq!((moved.position_x, moved.position_y), (250, 200));
        assert_eq!((moved.width, moved.height), (300, 200));
        assert_eq!(moved.title, "drag");
        assert!(moved.updated_at > created.updated_at);

        let resized = service
            .update_note_position(UpdateNotePositionInput {
                id: created.id,
                position_x: 0,
                position_y: 0,
                width: Some(120),
                height: None,
            })
            .unwrap();
        assert_eq!((resized.width, resized.height), (120, 200));
    });
}

#[test]
fn update_position_on_missing_note_is_not_found() {
    with_service(|service| {
        let created = service.create_note(CreateNoteInput::titled("stay")).unwrap();
        let missing = created.id + 100;

        let err = service
            .update_note_position(UpdateNotePositionInput {
                id: missing,
                position_x: 1,
                position_y: 1,
                width: Some(10),
                height: Some(10),
            })
            .unwrap_err();
        assert!(matches!(err, NoteServiceError::NoteNotFound(id) if id == missing));
        assert_eq!(service.list_notes().unwrap(), vec![created]);
    });
}

#[test]
fn delete_is_idempotent() {
    with_service(|service| {
        service.delete_note(999).unwrap();

        let created = service.create_note(CreateNoteInput::titled("bye")).unwrap();
        service.delete_note(created.id).unwrap();
        service.delete_note(created.id).unwrap();
        assert!(service.list_notes().unwrap().is_empty());
    });
}

#[test]
fn first_note_round_trip_scenario() {
    with_service(|service| {
        let created = service.create_note(CreateNoteInput::titled("First")).unwrap();
        assert_eq!(created.id, 1);

        service
            .update_note_position(UpdateNotePositionInput {
                id: 1,
                position_x: 100,
                position_y: 50,
                width: None,
                height: None,
            })
            .unwrap();
        let listed = service.list_notes().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!((listed[0].position_x, listed[0].position_y), (100, 50));

        service.delete_note(1).unwrap();
        assert!(service.list_notes().unwrap().is_empty());
    });
}

#[test]
fn notes_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    let created = {
        let conn = notecanvas_core::open_db(&path).unwrap();
        let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
        service.create_note(CreateNoteInput::titled("persist")).unwrap()
    };

    let conn = notecanvas_core::open_db(&path).unwrap();
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    assert_eq!(service.list_notes().unwrap(), vec![created]);
}
