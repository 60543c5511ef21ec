//! Scenarios of the [`Trip`] lifecycle run against the in-memory database.

use common::{Clock, DateTime, TimeZone};
use service::{
    command::{
        self, create_trip, delete_company, delete_trip, mark_trip_returned,
        set_account_active, update_trip, CreateAccount, CreateCompany,
        CreateTrip, DeleteCompany, DeleteTrip, MarkTripReturned,
        SetAccountActive, SetCompanyActive, TransitionTrips, UpdateTrip,
    },
    domain::{
        account::{self, Role},
        company,
        trip::{self, Status},
        Trip,
    },
    infra::Memory,
    query::{self, DailySummary, ListTrips},
    read::trip::list,
    Classify as _, Command as _, Config, ErrorKind, Service,
};

/// Creates a new [`Service`] over the provided [`Memory`] with its clock
/// frozen at the provided RFC 3339 moment.
fn service_at(db: &Memory, at: &str) -> Service<Memory> {
    let now = DateTime::from_rfc3339(at).unwrap();
    Service::without_tasks(
        Config {
            clock: Clock::new(TimeZone::UTC).frozen_at(now),
            ..Config::default()
        },
        db.clone(),
    )
}

async fn traveller(svc: &Service<Memory>, name: &str) -> account::Id {
    svc.execute(CreateAccount {
        username: account::Username::new(name).unwrap(),
        role: Role::Staff,
    })
    .await
    .unwrap()
    .id
}

fn new_trip(
    traveller_id: account::Id,
    name: &str,
    departs_on: &str,
    returns_on: &str,
) -> CreateTrip {
    CreateTrip {
        traveller_id,
        company_id: None,
        name: trip::Name::new(name).unwrap(),
        email: trip::Email::new("traveller@example.com").unwrap(),
        notes: None,
        departs_on: departs_on.parse().unwrap(),
        returns_on: returns_on.parse().unwrap(),
        by: traveller_id,
    }
}

async fn create(
    svc: &Service<Memory>,
    by: account::Id,
    name: &str,
    departs_on: &str,
    returns_on: &str,
) -> Trip {
    svc.execute(new_trip(by, name, departs_on, returns_on))
        .await
        .unwrap()
}

async fn stored(svc: &Service<Memory>, id: trip::Id) -> Option<Trip> {
    svc.execute(query::trip::ById::by(id)).await.unwrap()
}

#[tokio::test]
async fn resolves_status_on_creation() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;

    let upcoming = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;
    let active = create(&svc, by, "Paris", "2025-03-01", "2025-03-05").await;
    let completed = create(&svc, by, "Rome", "2025-02-01", "2025-02-28").await;

    assert_eq!(upcoming.status, Status::Upcoming);
    assert_eq!(active.status, Status::Active);
    assert_eq!(completed.status, Status::Completed);
    assert_eq!(upcoming.version, trip::Version::INITIAL);
    assert_eq!(upcoming.modified_by, Some(by));
    assert_eq!(stored(&svc, upcoming.id).await, Some(upcoming));
}

#[tokio::test]
async fn rejects_inverted_dates() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;

    let err = svc
        .execute(new_trip(by, "Berlin", "2025-03-20", "2025-03-10"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_trip::ExecutionError::InvalidDates(..),
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let trip = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;
    let err = svc
        .execute(UpdateTrip {
            id: trip.id,
            version: trip.version,
            patch: update_trip::Patch {
                returns_on: Some("2025-03-09".parse().unwrap()),
                ..update_trip::Patch::default()
            },
            by,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(stored(&svc, trip.id).await, Some(trip));
}

#[tokio::test]
async fn rejects_unknown_references() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;

    let err = svc
        .execute(new_trip(account::Id::new(), "Berlin", "2025-03-10", "2025-03-20"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = svc
        .execute(CreateTrip {
            company_id: Some(company::Id::new()),
            ..new_trip(by, "Berlin", "2025-03-10", "2025-03-20")
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_trip::ExecutionError::CompanyNotExists(_),
    ));

    let acme = svc
        .execute(CreateCompany {
            name: company::Name::new("Acme").unwrap(),
        })
        .await
        .unwrap();
    let trip = svc
        .execute(CreateTrip {
            company_id: Some(acme.id),
            ..new_trip(by, "Berlin", "2025-03-10", "2025-03-20")
        })
        .await
        .unwrap();
    assert_eq!(trip.company_id, Some(acme.id));
}

#[tokio::test]
async fn rejects_occupied_names() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let jane = traveller(&svc, "jane").await;
    let found = svc.execute(query::account::ById::by(jane)).await.unwrap();
    assert_eq!(found.map(|a| a.username.to_string()), Some("jane".into()));

    let err = svc
        .execute(CreateAccount {
            username: account::Username::new("JANE").unwrap(),
            role: Role::Admin,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::create_account::ExecutionError::UsernameOccupied(_),
    ));

    let acme = svc
        .execute(CreateCompany {
            name: company::Name::new("Acme").unwrap(),
        })
        .await
        .unwrap();
    let name = company::Name::new("ACME").unwrap();
    let found = svc
        .execute(query::company::ByName::by(&name))
        .await
        .unwrap();
    assert_eq!(found.map(|c| c.id), Some(acme.id));

    let err = svc
        .execute(CreateCompany {
            name: company::Name::new("acme").unwrap(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        command::create_company::ExecutionError::NameOccupied(_),
    ));
}

#[tokio::test]
async fn stale_update_conflicts() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;

    let rename = |name: &str, version| UpdateTrip {
        id: trip.id,
        version,
        patch: update_trip::Patch {
            name: Some(trip::Name::new(name).unwrap()),
            ..update_trip::Patch::default()
        },
        by,
    };

    let updated = svc
        .execute(rename("Munich", trip::Version::INITIAL))
        .await
        .unwrap();
    assert_eq!(updated.version, trip::Version::INITIAL.next());
    assert_eq!(updated.name.to_string(), "Munich");

    let err = svc
        .execute(rename("Hamburg", trip::Version::INITIAL))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VersionConflict);
    match err.as_ref() {
        update_trip::ExecutionError::Conflict(current) => {
            assert!(current.version > trip::Version::INITIAL);
            assert_eq!(current.name.to_string(), "Munich");
        }
        e => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
async fn rejects_updates_of_unknown_versions() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;

    let rename = |id, version| UpdateTrip {
        id,
        version,
        patch: update_trip::Patch {
            name: Some(trip::Name::new("Munich").unwrap()),
            ..update_trip::Patch::default()
        },
        by,
    };

    let err = svc
        .execute(rename(trip::Id::new(), trip.version))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        update_trip::ExecutionError::TripNotExists(_),
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = svc
        .execute(rename(trip.id, trip.version.next()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        update_trip::ExecutionError::UnknownVersion(..),
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(stored(&svc, trip.id).await, Some(trip));
}

#[tokio::test]
async fn concurrent_updates_apply_once() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;

    let update = |notes: &str| UpdateTrip {
        id: trip.id,
        version: trip.version,
        patch: update_trip::Patch {
            notes: Some(trip::Notes::new(notes)),
            ..update_trip::Patch::default()
        },
        by,
    };

    let (a, b) =
        tokio::join!(svc.execute(update("aisle")), svc.execute(update("window")));
    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);

    let stored = stored(&svc, trip.id).await.unwrap();
    assert_eq!(stored.version, trip.version.next());
}

#[tokio::test]
async fn transitions_are_idempotent() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-02", "2025-03-04").await;
    assert_eq!(trip.status, Status::Upcoming);

    let svc = service_at(&db, "2025-03-02T00:30:00Z");
    let first = svc.execute(TransitionTrips).await.unwrap();
    assert_eq!(first.activated, 1);
    assert_eq!(first.completed, 0);
    let second = svc.execute(TransitionTrips).await.unwrap();
    assert_eq!(second.activated, 0);
    assert_eq!(second.completed, 0);

    let activated = stored(&svc, trip.id).await.unwrap();
    assert_eq!(activated.status, Status::Active);
    assert_eq!(activated.version, trip.version.next());
    assert_eq!(activated.modified_by, None);

    // Returning day itself is still a part of the trip.
    let svc = service_at(&db, "2025-03-04T23:00:00Z");
    let done = svc.execute(TransitionTrips).await.unwrap();
    assert_eq!(done.completed, 0);

    let svc = service_at(&db, "2025-03-05T00:00:00Z");
    let done = svc.execute(TransitionTrips).await.unwrap();
    assert_eq!(done.completed, 1);
    let completed = stored(&svc, trip.id).await.unwrap();
    assert_eq!(completed.status, Status::Completed);
}

#[tokio::test]
async fn transitions_catch_up_missed_days() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-02", "2025-03-04").await;
    let cancelled = create(&svc, by, "Paris", "2025-03-02", "2025-03-04").await;
    _ = svc
        .execute(UpdateTrip {
            id: cancelled.id,
            version: cancelled.version,
            patch: update_trip::Patch {
                status: Some(Status::Cancelled),
                ..update_trip::Patch::default()
            },
            by,
        })
        .await
        .unwrap();

    let svc = service_at(&db, "2025-03-10T09:00:00Z");
    let transitioned = svc.execute(TransitionTrips).await.unwrap();
    assert_eq!(transitioned.activated, 1);
    assert_eq!(transitioned.completed, 1);

    let trip = stored(&svc, trip.id).await.unwrap();
    assert_eq!(trip.status, Status::Completed);
    assert_eq!(trip.version, trip::Version::INITIAL.next().next());

    let cancelled = stored(&svc, cancelled.id).await.unwrap();
    assert_eq!(cancelled.status, Status::Cancelled);
}

#[tokio::test]
async fn marks_trip_returned() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-02-25", "2025-03-10").await;
    assert_eq!(trip.status, Status::Active);

    let err = svc
        .execute(MarkTripReturned {
            id: trip.id,
            returns_on: Some("2025-02-24".parse().unwrap()),
            by,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        mark_trip_returned::ExecutionError::ReturnBeforeDeparture(..),
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let returned = svc
        .execute(MarkTripReturned {
            id: trip.id,
            returns_on: None,
            by,
        })
        .await
        .unwrap();
    assert_eq!(returned.status, Status::Completed);
    assert_eq!(returned.dates.returns_on().to_string(), "2025-03-01");
    assert_eq!(returned.version, trip.version.next());
    assert_eq!(stored(&svc, trip.id).await, Some(returned));

    let err = svc
        .execute(MarkTripReturned {
            id: trip::Id::new(),
            returns_on: None,
            by,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn deletes_trip() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let trip = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;

    svc.execute(DeleteTrip { id: trip.id }).await.unwrap();
    assert_eq!(stored(&svc, trip.id).await, None);

    let err = svc.execute(DeleteTrip { id: trip.id }).await.unwrap_err();
    assert!(matches!(
        err.as_ref(),
        delete_trip::ExecutionError::TripNotExists(_),
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn lists_trips_by_kind() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let later = create(&svc, by, "Berlin", "2025-03-10", "2025-03-20").await;
    let sooner = create(&svc, by, "Paris", "2025-03-02", "2025-03-04").await;
    let past = create(&svc, by, "Rome", "2025-01-10", "2025-01-20").await;
    let older = create(&svc, by, "Oslo", "2025-01-01", "2025-01-05").await;

    let names = |views: Vec<service::read::trip::View>| {
        views
            .into_iter()
            .map(|v| v.trip.name.to_string())
            .collect::<Vec<_>>()
    };

    let current = svc
        .execute(ListTrips {
            kind: list::Kind::Current,
        })
        .await
        .unwrap();
    assert_eq!(names(current), ["Paris", "Berlin"]);

    let completed = svc
        .execute(ListTrips {
            kind: list::Kind::Completed,
        })
        .await
        .unwrap();
    assert_eq!(names(completed), ["Rome", "Oslo"]);

    let all = svc
        .execute(ListTrips {
            kind: list::Kind::All,
        })
        .await
        .unwrap();
    assert_eq!(names(all), ["Berlin", "Paris", "Rome", "Oslo"]);

    // Statuses are recomputed on read, without any transition run.
    let svc = service_at(&db, "2025-03-05T09:00:00Z");
    let current = svc
        .execute(ListTrips {
            kind: list::Kind::Current,
        })
        .await
        .unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].trip.id, later.id);
    assert_eq!(current[0].status, Status::Upcoming);

    let completed = svc
        .execute(ListTrips {
            kind: list::Kind::Completed,
        })
        .await
        .unwrap();
    assert_eq!(completed[0].trip.id, sooner.id);
    assert_eq!(completed[0].status, Status::Completed);
    assert_eq!(completed[0].trip.status, Status::Upcoming);
    assert_eq!(
        completed.iter().map(|v| v.trip.id).collect::<Vec<_>>(),
        [sooner.id, past.id, older.id],
    );
}

#[tokio::test]
async fn summarizes_the_day() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    _ = create(&svc, by, "Paris", "2025-03-01", "2025-03-05").await;
    _ = create(&svc, by, "Berlin", "2025-03-01", "2025-03-03").await;
    _ = create(&svc, by, "Rome", "2025-02-20", "2025-02-28").await;
    _ = create(&svc, by, "Oslo", "2025-02-10", "2025-02-27").await;
    _ = create(&svc, by, "Madrid", "2025-03-02", "2025-03-09").await;
    let cancelled = create(&svc, by, "Lisbon", "2025-03-01", "2025-03-02").await;
    _ = svc
        .execute(UpdateTrip {
            id: cancelled.id,
            version: cancelled.version,
            patch: update_trip::Patch {
                status: Some(Status::Cancelled),
                ..update_trip::Patch::default()
            },
            by,
        })
        .await
        .unwrap();

    let summary = svc.execute(DailySummary).await.unwrap();
    assert_eq!(summary.today.to_string(), "2025-03-01");
    assert_eq!(
        summary
            .starting
            .iter()
            .map(|v| v.trip.name.to_string())
            .collect::<Vec<_>>(),
        ["Berlin", "Paris"],
    );
    assert_eq!(
        summary
            .completed
            .iter()
            .map(|v| v.trip.name.to_string())
            .collect::<Vec<_>>(),
        ["Rome"],
    );
}

#[tokio::test]
async fn observes_today_in_configured_zone() {
    let db = Memory::new();
    let now = DateTime::from_rfc3339("2025-03-01T22:30:00Z").unwrap();
    let svc = Service::without_tasks(
        Config {
            clock: Clock::new("+03:00".parse().unwrap()).frozen_at(now),
            ..Config::default()
        },
        db.clone(),
    );
    let by = traveller(&svc, "jane").await;

    let trip = create(&svc, by, "Berlin", "2025-03-02", "2025-03-04").await;
    assert_eq!(trip.status, Status::Active);

    // 00:30 in Sydney under daylight saving, still the 9th in UTC.
    let now = DateTime::from_rfc3339("2025-01-09T13:30:00Z").unwrap();
    let svc = Service::without_tasks(
        Config {
            clock: Clock::new("Australia/Sydney".parse().unwrap())
                .frozen_at(now),
            ..Config::default()
        },
        db.clone(),
    );
    let trip = create(&svc, by, "Paris", "2025-01-10", "2025-01-12").await;
    assert_eq!(trip.status, Status::Active);
}

#[tokio::test]
async fn inactive_travellers_cannot_travel() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let jane = traveller(&svc, "jane").await;

    let account = svc
        .execute(SetAccountActive {
            id: jane,
            is_active: false,
        })
        .await
        .unwrap();
    assert!(!account.is_active);

    let err = svc
        .execute(new_trip(jane, "Berlin", "2025-03-10", "2025-03-20"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_trip::ExecutionError::TravellerInactive(_),
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    _ = svc
        .execute(SetAccountActive {
            id: jane,
            is_active: true,
        })
        .await
        .unwrap();
    _ = create(&svc, jane, "Berlin", "2025-03-10", "2025-03-20").await;

    let err = svc
        .execute(SetAccountActive {
            id: account::Id::new(),
            is_active: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        set_account_active::ExecutionError::AccountNotExists(_),
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn inactive_companies_take_no_new_trips() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let acme = svc
        .execute(CreateCompany {
            name: company::Name::new("Acme").unwrap(),
        })
        .await
        .unwrap();
    let trip = svc
        .execute(CreateTrip {
            company_id: Some(acme.id),
            ..new_trip(by, "Berlin", "2025-03-10", "2025-03-20")
        })
        .await
        .unwrap();

    let acme = svc
        .execute(SetCompanyActive {
            id: acme.id,
            is_active: false,
        })
        .await
        .unwrap();
    assert!(!acme.is_active);

    let err = svc
        .execute(CreateTrip {
            company_id: Some(acme.id),
            ..new_trip(by, "Paris", "2025-03-10", "2025-03-20")
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_trip::ExecutionError::CompanyInactive(_),
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Already grouped trips keep their company on other changes.
    let renamed = svc
        .execute(UpdateTrip {
            id: trip.id,
            version: trip.version,
            patch: update_trip::Patch {
                company_id: Some(Some(acme.id)),
                name: Some(trip::Name::new("Munich").unwrap()),
                ..update_trip::Patch::default()
            },
            by,
        })
        .await
        .unwrap();
    assert_eq!(renamed.company_id, Some(acme.id));
}

#[tokio::test]
async fn deleting_company_detaches_its_trips() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let by = traveller(&svc, "jane").await;
    let acme = svc
        .execute(CreateCompany {
            name: company::Name::new("Acme").unwrap(),
        })
        .await
        .unwrap();
    let grouped = svc
        .execute(CreateTrip {
            company_id: Some(acme.id),
            ..new_trip(by, "Berlin", "2025-03-10", "2025-03-20")
        })
        .await
        .unwrap();
    let single = create(&svc, by, "Paris", "2025-03-10", "2025-03-20").await;

    let detached = svc.execute(DeleteCompany { id: acme.id }).await.unwrap();
    assert_eq!(detached, 1);

    let found = svc
        .execute(query::company::ById::by(acme.id))
        .await
        .unwrap();
    assert!(found.is_none());

    let grouped_now = stored(&svc, grouped.id).await.unwrap();
    assert_eq!(grouped_now.company_id, None);
    assert_eq!(grouped_now.version, grouped.version.next());
    assert_eq!(stored(&svc, single.id).await, Some(single));

    // Edits made against the copy before the detachment conflict.
    let err = svc
        .execute(UpdateTrip {
            id: grouped.id,
            version: grouped.version,
            patch: update_trip::Patch::default(),
            by,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VersionConflict);

    let err = svc
        .execute(DeleteCompany { id: acme.id })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        delete_company::ExecutionError::CompanyNotExists(_),
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn lists_accounts_and_companies() {
    let db = Memory::new();
    let svc = service_at(&db, "2025-03-01T09:00:00Z");
    let jane = traveller(&svc, "jane").await;
    let svc = service_at(&db, "2025-03-01T10:00:00Z");
    let adam = traveller(&svc, "adam").await;
    for name in ["Globex", "Acme", "Initech"] {
        _ = svc
            .execute(CreateCompany {
                name: company::Name::new(name).unwrap(),
            })
            .await
            .unwrap();
    }

    let accounts = svc.execute(query::account::All::by(())).await.unwrap();
    assert_eq!(
        accounts.iter().map(|a| a.id).collect::<Vec<_>>(),
        [jane, adam],
    );

    let companies = svc.execute(query::company::All::by(())).await.unwrap();
    assert_eq!(
        companies
            .iter()
            .map(|c| c.name.to_string())
            .collect::<Vec<_>>(),
        ["Acme", "Globex", "Initech"],
    );
}
