use birthday_core::db::open_db_in_memory;
use birthday_core::{
    AlertSeverity, Clock, FixedClock, PersonId, PersonStore, PersonValidationError,
    ReminderSession, SortOrder, SqliteStorage, StoreError, SubmitOutcome,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::sync::Arc;

const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQ";

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 10)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn session(conn: &Connection) -> ReminderSession<SqliteStorage<'_>> {
    let store = PersonStore::load(SqliteStorage::new(conn)).unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
    ReminderSession::new(store, clock)
}

fn fill(session: &mut ReminderSession<SqliteStorage<'_>>, name: &str, birth: Option<NaiveDate>) {
    session.set_name(name);
    session.set_image(IMAGE);
    session.set_date(birth).unwrap();
}

#[test]
fn submit_complete_draft_adds_person_with_success_alert() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "Ada", date(1990, 12, 10));

    let outcome = session.submit().unwrap();

    assert!(matches!(outcome, SubmitOutcome::Created(_)));
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.alert().severity, Some(AlertSeverity::Success));
    assert_eq!(session.alert().message, "person added to list");
    assert!(session.draft().is_empty());
}

#[test]
fn submit_incomplete_draft_shows_error_and_keeps_draft() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    session.set_name("Ada");
    session.set_date(date(1990, 12, 10)).unwrap();

    let outcome = session.submit().unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(PersonValidationError::MissingImage)
    );
    assert!(session.store().is_empty());
    assert!(session.alert().is_error());
    assert_eq!(session.alert().message, "please enter details");
    assert_eq!(session.draft().name, "Ada");
}

#[test]
fn clearing_image_makes_draft_incomplete() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "Ada", date(1990, 12, 10));

    session.clear_image();
    let outcome = session.submit().unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(PersonValidationError::MissingImage)
    );
    assert!(session.draft().image.is_empty());
    assert!(session.store().is_empty());
}

#[test]
fn names_are_stored_as_typed() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "  Ada Lovelace ", date(1990, 12, 10));

    let SubmitOutcome::Created(id) = session.submit().unwrap() else {
        panic!("expected a new record");
    };

    assert_eq!(session.store().get(&id).unwrap().name, "  Ada Lovelace ");

    fill(&mut session, "   ", date(1990, 12, 10));
    assert_eq!(
        session.submit().unwrap(),
        SubmitOutcome::Rejected(PersonValidationError::MissingName)
    );
}

#[test]
fn future_dates_are_rejected_by_draft() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);

    session.set_date(date(2024, 3, 10)).unwrap();
    let err = session.set_date(date(2024, 3, 11)).unwrap_err();

    assert_eq!(err.today, now().date());
    assert_eq!(session.draft().date, date(2024, 3, 10));
}

#[test]
fn edit_flow_updates_targeted_record() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "Ada", date(1990, 12, 10));
    let SubmitOutcome::Created(ada) = session.submit().unwrap() else {
        panic!("expected created outcome");
    };
    fill(&mut session, "Bob", date(1985, 1, 1));
    session.submit().unwrap();

    assert!(session.begin_edit(&ada));
    assert_eq!(session.editing(), Some(&ada));
    assert_eq!(session.draft().name, "Ada");
    session.set_name("Ada Lovelace");

    let outcome = session.submit().unwrap();

    assert_eq!(outcome, SubmitOutcome::Updated(ada.clone()));
    assert_eq!(session.store().len(), 2);
    assert_eq!(session.store().get(&ada).unwrap().name, "Ada Lovelace");
    assert_eq!(session.alert().message, "details changed");
    assert!(session.editing().is_none());
}

#[test]
fn begin_edit_unknown_id_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);

    assert!(!session.begin_edit(&PersonId::from("ghost")));
    assert!(session.editing().is_none());
}

#[test]
fn removing_edited_record_leaves_edit_mode() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "Ada", date(1990, 12, 10));
    let SubmitOutcome::Created(ada) = session.submit().unwrap() else {
        panic!("expected created outcome");
    };

    assert!(session.begin_edit(&ada));
    session.remove(&ada).unwrap();

    assert!(session.editing().is_none());
    assert!(session.draft().is_empty());

    fill(&mut session, "Ada", date(1990, 12, 10));
    let outcome = session.submit().unwrap();
    assert!(matches!(outcome, SubmitOutcome::Created(id) if id != ada));
}

#[test]
fn remove_and_clear_show_alerts() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "Ada", date(1990, 12, 10));
    let SubmitOutcome::Created(ada) = session.submit().unwrap() else {
        panic!("expected created outcome");
    };
    fill(&mut session, "Bob", date(1985, 1, 1));
    session.submit().unwrap();

    session.dismiss_alert();
    assert!(!session.remove(&PersonId::from("ghost")).unwrap());
    assert!(!session.alert().visible);

    assert!(session.remove(&ada).unwrap());
    assert_eq!(session.alert().message, "person removed");
    assert_eq!(session.store().len(), 1);

    session.clear().unwrap();
    assert_eq!(session.alert().message, "everything cleared");
    assert!(session.store().is_empty());
}

#[test]
fn list_view_sorts_and_attaches_countdowns_when_toggled() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    fill(&mut session, "carol", date(1990, 1, 1));
    session.submit().unwrap();
    fill(&mut session, "Ada", date(1992, 3, 10));
    session.submit().unwrap();
    fill(&mut session, "bob", date(1988, 3, 12));
    session.submit().unwrap();

    let view = session.list_view(SortOrder::Insertion);
    assert_eq!(view.heading.as_deref(), Some("3 birthdays in the list"));
    assert_eq!(view.today_count, 1);
    assert!(view.rows.iter().all(|row| row.countdown.is_none()));

    let names = |order| {
        session
            .list_view(order)
            .rows
            .into_iter()
            .map(|row| row.person.name)
            .collect::<Vec<_>>()
    };
    assert_eq!(names(SortOrder::Name), ["Ada", "bob", "carol"]);
    assert_eq!(names(SortOrder::Upcoming), ["Ada", "bob", "carol"]);

    assert!(session.toggle_countdowns());
    let view = session.list_view(SortOrder::Insertion);
    let carol = view.rows[0].countdown.unwrap();
    assert_eq!((carol.days, carol.hours), (297, 0));
    assert!(view.rows[1].countdown.unwrap().is_birthday_today);
    assert_eq!(view.rows[2].countdown.unwrap().days, 2);
}

#[test]
fn empty_list_hides_heading() {
    let conn = open_db_in_memory().unwrap();
    let session = session(&conn);

    let view = session.list_view(SortOrder::Insertion);

    assert_eq!(view.heading, None);
    assert!(view.rows.is_empty());
}

#[test]
fn storage_failure_surfaces_as_error() {
    let conn = open_db_in_memory().unwrap();
    let mut session = session(&conn);
    conn.execute_batch("DROP TABLE kv_store;").unwrap();
    fill(&mut session, "Ada", date(1990, 12, 10));

    let err = session.submit().unwrap_err();

    assert!(matches!(err, StoreError::Storage(_)));
    assert!(session.store().is_empty());
    assert_eq!(session.draft().name, "Ada");
}
