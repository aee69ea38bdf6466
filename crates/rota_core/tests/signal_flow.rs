use rota_core::db::open_db_in_memory;
use rota_core::{
    AssignmentStatus, ChoreOutcome, EngineError, Participant, RosterService, RotationService,
    RotationServiceError, RotationStateRepository, SignalEffect, SqliteRosterRepository,
    SqliteRotationStateRepository, WeeklyRota,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    members: Vec<Participant>,
    dishes: rota_core::Chore,
    vacuum: rota_core::Chore,
}

/// Two members, two chores, one generated cycle.
fn seed(conn: &Connection) -> Fixture {
    let mut roster = RosterService::new(SqliteRosterRepository::try_new(conn).unwrap());
    let members = vec![
        roster.add_participant("alex").unwrap(),
        roster.add_participant("blake").unwrap(),
    ];
    let dishes = roster.add_chore("dishes", 5).unwrap();
    let vacuum = roster.add_chore("vacuum", 3).unwrap();
    Fixture {
        members,
        dishes,
        vacuum,
    }
}

fn rotation(conn: &Connection) -> RotationService<SqliteRotationStateRepository<'_>> {
    RotationService::new(SqliteRotationStateRepository::try_new(conn).unwrap())
}

fn assignee(rota: &WeeklyRota, chore_uuid: Uuid) -> Uuid {
    rota.assignment(chore_uuid).unwrap().participant_uuid
}

#[test]
fn completion_marks_the_assignment_and_persists_the_credit() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.dishes.uuid);

    let effect = service
        .signal(fixture.dishes.uuid, doer, ChoreOutcome::Completed)
        .unwrap();
    assert_eq!(
        effect,
        SignalEffect::Completed {
            chore_uuid: fixture.dishes.uuid,
            credited: doer,
        }
    );

    // Reads go through a fresh repository: the mutation is in the database,
    // not just in memory.
    let inspect = SqliteRotationStateRepository::try_new(&conn).unwrap();
    let stored = inspect.active_rota().unwrap().unwrap();
    assert_eq!(
        stored.assignment(fixture.dishes.uuid).unwrap().status,
        AssignmentStatus::Completed
    );
    let record = inspect
        .load_records()
        .unwrap()
        .into_iter()
        .find(|record| record.participant_uuid == doer)
        .unwrap();
    assert_eq!(record.cumulative_difficulty, 5.0);
    assert_eq!(record.completions, 1);
}

#[test]
fn helper_completion_credits_the_helper() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.dishes.uuid);
    let helper = fixture
        .members
        .iter()
        .map(|member| member.uuid)
        .find(|uuid| *uuid != doer)
        .unwrap();

    let effect = service
        .signal(fixture.dishes.uuid, helper, ChoreOutcome::Completed)
        .unwrap();
    assert_eq!(
        effect,
        SignalEffect::Completed {
            chore_uuid: fixture.dishes.uuid,
            credited: helper,
        }
    );

    let snapshot = service.load_snapshot().unwrap();
    let load = |uuid| {
        snapshot
            .iter()
            .find(|record| record.participant_uuid == uuid)
            .unwrap()
            .cumulative_difficulty
    };
    assert_eq!(load(helper), 5.0);
    assert_eq!(load(doer), 0.0);
}

#[test]
fn skip_reassigns_to_the_other_member() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let skipper = assignee(&rota, fixture.vacuum.uuid);
    let taker = assignee(&rota, fixture.dishes.uuid);
    assert_ne!(skipper, taker);

    let effect = service
        .signal(fixture.vacuum.uuid, skipper, ChoreOutcome::Skipped)
        .unwrap();
    assert_eq!(
        effect,
        SignalEffect::Reassigned {
            chore_uuid: fixture.vacuum.uuid,
            from: skipper,
            to: taker,
        }
    );

    let inspect = SqliteRotationStateRepository::try_new(&conn).unwrap();
    let stored = inspect.active_rota().unwrap().unwrap();
    let moved = stored.assignment(fixture.vacuum.uuid).unwrap();
    assert_eq!(moved.participant_uuid, taker);
    assert_eq!(moved.status, AssignmentStatus::Pending);

    let snapshot = service.load_snapshot().unwrap();
    let record = |uuid| {
        snapshot
            .iter()
            .find(|record| record.participant_uuid == uuid)
            .unwrap()
    };
    assert_eq!(record(skipper).skips, 1);
    assert_eq!(record(taker).reassignments, 1);
}

#[test]
fn only_the_assignee_may_skip() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.vacuum.uuid);
    let other = fixture
        .members
        .iter()
        .map(|member| member.uuid)
        .find(|uuid| *uuid != doer)
        .unwrap();

    let err = service
        .signal(fixture.vacuum.uuid, other, ChoreOutcome::Skipped)
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::Engine(EngineError::NotCurrentAssignee { chore_uuid, actor })
            if chore_uuid == fixture.vacuum.uuid && actor == other
    ));
}

#[test]
fn signals_require_an_active_rota() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);

    let err = service
        .signal(
            fixture.dishes.uuid,
            fixture.members[0].uuid,
            ChoreOutcome::Completed,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::Engine(EngineError::NoActiveRota)
    ));
}

#[test]
fn resolved_assignments_reject_further_signals() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.dishes.uuid);

    service
        .signal(fixture.dishes.uuid, doer, ChoreOutcome::Completed)
        .unwrap();
    let err = service
        .signal(fixture.dishes.uuid, doer, ChoreOutcome::Completed)
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::Engine(EngineError::AssignmentNotPending(id))
            if id == fixture.dishes.uuid
    ));
}

#[test]
fn manual_reassignment_hands_over_and_persists() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.dishes.uuid);
    let other = fixture
        .members
        .iter()
        .map(|member| member.uuid)
        .find(|uuid| *uuid != doer)
        .unwrap();

    service.reassign_manual(fixture.dishes.uuid, other).unwrap();

    let stored = service.active_rota().unwrap().unwrap();
    let moved = stored.assignment(fixture.dishes.uuid).unwrap();
    assert_eq!(moved.participant_uuid, other);
    assert_eq!(moved.status, AssignmentStatus::Pending);
}

#[test]
fn manual_reassignment_rejects_vacationers_and_strangers() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    service.run_cycle(0).unwrap();

    let stranger = Uuid::from_u128(0xdead);
    let err = service
        .reassign_manual(fixture.dishes.uuid, stranger)
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::Engine(EngineError::UnknownParticipant(id)) if id == stranger
    ));

    let away = fixture.members[0].uuid;
    service.set_vacation(away, true, 0).unwrap();
    let err = service
        .reassign_manual(fixture.dishes.uuid, away)
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::AssigneeOnVacation(id) if id == away
    ));
}

#[test]
fn manual_reassignment_rejects_completed_assignments() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    let doer = assignee(&rota, fixture.dishes.uuid);
    let other = fixture
        .members
        .iter()
        .map(|member| member.uuid)
        .find(|uuid| *uuid != doer)
        .unwrap();

    service
        .signal(fixture.dishes.uuid, doer, ChoreOutcome::Completed)
        .unwrap();
    let err = service
        .reassign_manual(fixture.dishes.uuid, other)
        .unwrap_err();
    assert!(matches!(
        err,
        RotationServiceError::Engine(EngineError::AssignmentNotPending(id))
            if id == fixture.dishes.uuid
    ));
}

#[test]
fn pending_assignments_shrink_as_signals_land() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let mut service = rotation(&conn);
    let rota = service.run_cycle(0).unwrap();
    assert_eq!(service.pending_assignments().unwrap().len(), 2);

    let doer = assignee(&rota, fixture.dishes.uuid);
    service
        .signal(fixture.dishes.uuid, doer, ChoreOutcome::Completed)
        .unwrap();

    let pending = service.pending_assignments().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].chore_uuid, fixture.vacuum.uuid);
}
