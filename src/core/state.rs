use std::sync::Arc;

use crate::core::config::Settings;
use crate::repositories::Store;
use crate::services::courses::CourseService;
use crate::services::identity::IdentityService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    store: Arc<dyn Store>,
    identity: IdentityService,
    courses: CourseService,
}

impl AppState {
    pub(crate) fn new(settings: Settings, store: Arc<dyn Store>) -> Self {
        let identity = IdentityService::new(store.clone(), settings.security().clone());
        let courses = CourseService::new(store.clone());
        Self { inner: Arc::new(InnerState { settings, store, identity, courses }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub(crate) fn identity(&self) -> &IdentityService {
        &self.inner.identity
    }

    pub(crate) fn courses(&self) -> &CourseService {
        &self.inner.courses
    }
}
