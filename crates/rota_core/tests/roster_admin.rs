use rota_core::db::open_db_in_memory;
use rota_core::repo::roster_repo::RosterRepoError;
use rota_core::{
    Chore, Participant, RosterRepository, RosterService, RosterServiceError, SqliteRosterRepository,
};
use uuid::Uuid;

#[test]
fn participant_create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();

    let participant = Participant::new("alex").unwrap();
    let id = repo.create_participant(&participant).unwrap();

    let loaded = repo.get_participant(id).unwrap().unwrap();
    assert_eq!(loaded.uuid, participant.uuid);
    assert_eq!(loaded.display_name, "alex");
    assert!(!loaded.on_vacation);
    assert_eq!(loaded.vacation_returned_at, None);
}

#[test]
fn participant_names_are_trimmed_and_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    service.add_participant("  alex  ").unwrap();
    let err = service.add_participant("alex").unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::DuplicateParticipantName(name)) if name == "alex"
    ));
}

#[test]
fn blank_participant_name_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let err = service.add_participant("   ").unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::Participant(_))
    ));
}

#[test]
fn rename_participant_rejects_a_taken_name_but_allows_own() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let alex = service.add_participant("alex").unwrap();
    service.add_participant("blake").unwrap();

    let err = service.rename_participant(alex.uuid, "blake").unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::DuplicateParticipantName(_))
    ));

    // Renaming to the current name is not a collision with oneself.
    service.rename_participant(alex.uuid, "alex").unwrap();
    service.rename_participant(alex.uuid, "alexis").unwrap();
    let listed = service.list_participants().unwrap();
    assert!(listed.iter().any(|p| p.display_name == "alexis"));
}

#[test]
fn remove_participant_drops_their_load_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let alex = service.add_participant("alex").unwrap();
    conn.execute(
        "INSERT INTO load_records (participant_uuid, cumulative_difficulty)
         VALUES (?1, 7.0);",
        [alex.uuid.to_string()],
    )
    .unwrap();

    service.remove_participant(alex.uuid).unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM load_records;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn removing_an_unknown_participant_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let missing = Uuid::from_u128(0xdead);
    let err = service.remove_participant(missing).unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::ParticipantNotFound(id)) if id == missing
    ));
}

#[test]
fn chore_create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();

    let chore = Chore::new("dishes", 4).unwrap().with_frequency(2).unwrap();
    let id = repo.create_chore(&chore).unwrap();

    let loaded = repo.get_chore(id).unwrap().unwrap();
    assert_eq!(loaded.name, "dishes");
    assert_eq!(loaded.difficulty, 4);
    assert_eq!(loaded.frequency, 2);
}

#[test]
fn chore_difficulty_is_bounded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    assert!(service.add_chore("too easy", 0).is_err());
    assert!(service.add_chore("too hard", 6).is_err());

    let chore = service.add_chore("dishes", 1).unwrap();
    let err = service.set_difficulty(chore.uuid, 9).unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::Chore(_))
    ));
    // The stored value is untouched by the rejected update.
    let loaded = service.list_chores().unwrap();
    assert_eq!(loaded[0].difficulty, 1);
}

#[test]
fn chore_frequency_zero_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let chore = service.add_chore("bins", 2).unwrap();
    let err = service.set_frequency(chore.uuid, 0).unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::Chore(_))
    ));

    service.set_frequency(chore.uuid, 4).unwrap();
    assert_eq!(service.list_chores().unwrap()[0].frequency, 4);
}

#[test]
fn chore_names_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    service.add_chore("dishes", 3).unwrap();
    let err = service.add_chore(" dishes ", 2).unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::DuplicateChoreName(name)) if name == "dishes"
    ));
}

#[test]
fn rosters_list_in_name_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    service.add_participant("casey").unwrap();
    service.add_participant("alex").unwrap();
    service.add_participant("blake").unwrap();
    service.add_chore("vacuum", 3).unwrap();
    service.add_chore("dishes", 5).unwrap();

    let names: Vec<String> = service
        .list_participants()
        .unwrap()
        .into_iter()
        .map(|p| p.display_name)
        .collect();
    assert_eq!(names, ["alex", "blake", "casey"]);

    let chores: Vec<String> = service
        .list_chores()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(chores, ["dishes", "vacuum"]);
}

#[test]
fn remove_chore_deletes_it_from_the_roster() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let mut service = RosterService::new(repo);

    let chore = service.add_chore("dishes", 3).unwrap();
    service.remove_chore(chore.uuid).unwrap();
    assert!(service.list_chores().unwrap().is_empty());

    let err = service.remove_chore(chore.uuid).unwrap_err();
    assert!(matches!(
        err,
        RosterServiceError::Repo(RosterRepoError::ChoreNotFound(id)) if id == chore.uuid
    ));
}
