use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use bugsnag_api::{ErrorRecord, ErrorSource, Organization, Project};
use bugsnag_common::{
    error::{ExporterError, Result},
    time::Clock,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};

pub fn record(events: u64, stages: &[&str]) -> ErrorRecord {
    ErrorRecord {
        events,
        release_stages: stages.iter().map(|stage| stage.to_string()).collect(),
    }
}

pub struct FixtureProject {
    pub project: Project,
    pub errors: Vec<ErrorRecord>,
}

pub struct FixtureOrganization {
    pub organization: Organization,
    pub projects: Vec<FixtureProject>,
}

/// In-memory organization tree that counts full traversals.
#[derive(Default)]
pub struct FixtureSource {
    organizations: Vec<FixtureOrganization>,
    traversals: AtomicUsize,
    fail_projects: AtomicBool,
    error_delay: Duration,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(
        mut self,
        organization: &str,
        project: &str,
        errors: Vec<ErrorRecord>,
    ) -> Self {
        let fixture = FixtureProject {
            project: Project {
                id: format!("{organization}/{project}"),
                name: project.to_string(),
            },
            errors,
        };

        match self
            .organizations
            .iter_mut()
            .find(|entry| entry.organization.id == organization)
        {
            Some(entry) => entry.projects.push(fixture),
            None => self.organizations.push(FixtureOrganization {
                organization: Organization {
                    id: organization.to_string(),
                    name: organization.to_string(),
                },
                projects: vec![fixture],
            }),
        }
        self
    }

    /// Makes error listings and injected failures wait `delay` before yielding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.error_delay = delay;
        self
    }

    pub fn traversals(&self) -> usize {
        self.traversals.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_projects.store(failing, Ordering::SeqCst);
    }
}

impl ErrorSource for FixtureSource {
    fn organizations(&self) -> BoxStream<'_, Result<Organization>> {
        self.traversals.fetch_add(1, Ordering::SeqCst);
        stream::iter(
            self.organizations
                .iter()
                .map(|entry| Ok(entry.organization.clone())),
        )
        .boxed()
    }

    fn projects(&self, organization: &Organization) -> BoxStream<'_, Result<Project>> {
        if self.fail_projects.load(Ordering::SeqCst) {
            let failure = Err(ExporterError::RemoteApi {
                status: 503,
                reason: "Service Unavailable".to_string(),
                body: "maintenance".to_string(),
            });
            return delayed(self.error_delay, vec![failure]);
        }

        let projects = self
            .organizations
            .iter()
            .filter(|entry| entry.organization.id == organization.id)
            .flat_map(|entry| entry.projects.iter())
            .map(|fixture| Ok(fixture.project.clone()))
            .collect::<Vec<Result<Project>>>();
        stream::iter(projects).boxed()
    }

    fn open_errors(&self, project: &Project) -> BoxStream<'_, Result<ErrorRecord>> {
        let errors = self
            .organizations
            .iter()
            .flat_map(|entry| entry.projects.iter())
            .filter(|fixture| fixture.project.id == project.id)
            .flat_map(|fixture| fixture.errors.iter().cloned())
            .map(Ok)
            .collect::<Vec<Result<ErrorRecord>>>();
        delayed(self.error_delay, errors)
    }
}

fn delayed<T: Send + 'static>(delay: Duration, items: Vec<T>) -> BoxStream<'static, T> {
    if delay.is_zero() {
        return stream::iter(items).boxed();
    }

    stream::once(async move {
        tokio::time::sleep(delay).await;
        stream::iter(items)
    })
    .flatten()
    .boxed()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, seconds: i64) {
        *self.now.lock().unwrap() += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
