use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, CityService, TripService, UserService};
use crate::model::{Credentials, ImageFile, Registration, Trip, TripId, User, UserId};
use crate::storage::SessionStore;

use super::action::{Action, AppEvent, ScreenState};
use super::error::AppError;
use super::screens::{
    DashboardState, HelpState, LoginState, RegisterState, TripDetailState, TripFormState,
    draw_dashboard, draw_help, draw_login, draw_register, draw_trip_detail, draw_trip_form,
};
use super::widgets::{Notification, draw_notification};

const LOGIN_SUCCESS: &str = "Welcome back!";
const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
const REGISTER_SUCCESS: &str = "Account created successfully!";
const REGISTER_FALLBACK: &str = "Registration failed. Please check your details and try again.";
const TRIPS_LOAD_FAILED: &str = "Failed to load your trips. Please try again.";
const TRIP_NOT_FOUND: &str = "Trip not found";
const TRIP_LOAD_FAILED: &str = "Failed to load trip details";
const TRIP_CREATED: &str = "Trip created successfully!";
const TRIP_UPDATED: &str = "Trip updated successfully!";
const TRIP_DELETED: &str = "Trip deleted successfully!";
const TRIP_DELETE_FAILED: &str = "Failed to delete trip. Please try again.";

/// How often the run loop wakes up to expire notifications.
const TICK: Duration = Duration::from_millis(250);

/// All screens the app can navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Sign in with email and password.
    Login,
    /// Create an account.
    Register,
    /// The logged-in user's trips.
    Dashboard,
    /// One trip in full.
    TripDetail,
    /// Add or edit a trip.
    TripForm,
    /// Show keybinding help.
    Help,
}

impl Screen {
    /// Screens that need a logged-in user.
    fn requires_session(self) -> bool {
        matches!(self, Self::Dashboard | Self::TripDetail | Self::TripForm)
    }
}

/// The remote services the app talks to.
#[derive(Clone)]
pub struct Services {
    pub trips: Arc<dyn TripService>,
    pub cities: Arc<dyn CityService>,
    pub users: Arc<dyn UserService>,
}

impl Services {
    /// Uses one backend for all three services.
    pub fn shared<S>(api: S) -> Self
    where
        S: TripService + CityService + UserService + 'static,
    {
        let api = Arc::new(api);
        Self {
            trips: api.clone(),
            cities: api.clone(),
            users: api,
        }
    }
}

/// Top-level application state.
///
/// Screens turn keys into [`Action`]s. The app applies them, starts remote
/// calls on spawned tasks and folds their [`AppEvent`]s back in on the UI
/// task.
pub struct App {
    screen: Screen,
    services: Services,
    session: SessionStore,
    user: Option<UserId>,
    events: UnboundedSender<AppEvent>,
    login: LoginState,
    register: RegisterState,
    dashboard: DashboardState,
    detail: TripDetailState,
    trip_form: TripFormState,
    help: HelpState,
    notification: Option<Notification>,
    search_task: Option<AbortHandle>,
    submit_task: Option<AbortHandle>,
    form_origin: Screen,
    should_quit: bool,
}

impl App {
    /// Creates the app and the receiver its background results arrive on.
    ///
    /// A remembered session starts on the dashboard, otherwise on login. An
    /// unreadable session file is logged and treated as logged out.
    pub fn new(services: Services, session: SessionStore) -> (Self, UnboundedReceiver<AppEvent>) {
        let user = match session.load() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, path = %session.path().display(), "ignoring unreadable session");
                None
            }
        };
        let (events, rx) = mpsc::unbounded_channel();
        let screen = if user.is_some() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        let app = Self {
            screen,
            services,
            session,
            user,
            events,
            login: LoginState::new(),
            register: RegisterState::new(),
            dashboard: DashboardState::new(),
            detail: TripDetailState::new(),
            trip_form: TripFormState::new(),
            help: HelpState::new(),
            notification: None,
            search_task: None,
            submit_task: None,
            form_origin: Screen::Dashboard,
            should_quit: false,
        };
        (app, rx)
    }

    /// Enters the initial screen, loading trips when a session was restored.
    pub fn start(&mut self) {
        self.navigate(self.screen);
    }

    /// Main event loop: draw, then wait for a key, a task result or a tick.
    #[cfg_attr(coverage_nightly, coverage(off))]
    #[mutants::skip]
    pub async fn run<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        mut events: UnboundedReceiver<AppEvent>,
    ) -> Result<(), AppError> {
        let mut keys = EventStream::new();
        let mut ticker = tokio::time::interval(TICK);
        self.start();
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            tokio::select! {
                next = keys.next() => match next {
                    Some(Ok(Event::Key(key))) => self.handle_key(key),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
                _ = ticker.tick() => self.tick(Instant::now()),
            }
        }
        Ok(())
    }

    #[cfg_attr(coverage_nightly, coverage(off))]
    #[mutants::skip]
    fn draw(&self, frame: &mut Frame) {
        let [main, toast] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
        match self.screen {
            Screen::Login => draw_login(&self.login, frame, main),
            Screen::Register => draw_register(&self.register, frame, main),
            Screen::Dashboard => draw_dashboard(&self.dashboard, frame, main),
            Screen::TripDetail => draw_trip_detail(&self.detail, frame, main),
            Screen::TripForm => draw_trip_form(&self.trip_form, frame, main),
            Screen::Help => draw_help(&self.help, frame, main),
        }
        draw_notification(self.notification.as_ref(), frame, toast);
    }

    /// Handles a key event: F1 opens help, everything else goes to the screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::F(1) && self.screen != Screen::Help {
            self.help.set_origin(self.screen);
            self.help.reset();
            self.screen = Screen::Help;
            return;
        }
        let action = match self.screen {
            Screen::Login => self.login.handle_key(key),
            Screen::Register => self.register.handle_key(key),
            Screen::Dashboard => self.dashboard.handle_key(key),
            Screen::TripDetail => self.detail.handle_key(key),
            Screen::TripForm => self.trip_form.handle_key(key),
            Screen::Help => self.help.handle_key(key),
        };
        self.apply(action);
    }

    /// Applies an action raised by a screen.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(screen) => self.navigate(screen),
            Action::Login(credentials) => self.login(credentials),
            Action::Register(registration) => self.register(registration),
            Action::Logout => self.logout(),
            Action::RefreshTrips => self.refresh_trips(),
            Action::OpenTrip(trip_id) => self.open_trip(trip_id),
            Action::NewTrip => self.open_form(None),
            Action::EditTrip(trip_id) => self.edit_trip(trip_id),
            Action::DeleteTrip(trip_id) => self.delete_trip(trip_id),
            Action::SearchCities(query) => {
                if let Some(task) = self.search_task.take() {
                    task.abort();
                }
                let cities = Arc::clone(&self.services.cities);
                self.search_task = Some(self.spawn(async move {
                    let result = cities.search(&query.text).await;
                    AppEvent::CitiesFound {
                        seq: query.seq,
                        result,
                    }
                }));
            }
            Action::LoadImage(path) => self.load_image(path),
            Action::SubmitTrip => self.submit_trip(),
            Action::CloseForm => self.close_form(),
            Action::Quit => self.should_quit = true,
        }
    }

    /// Folds the result of a background task into the app state.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoggedIn(Ok(user)) => self.signed_in(user, LOGIN_SUCCESS),
            AppEvent::LoggedIn(Err(e)) => {
                warn!(error = %e, "login failed");
                self.login.set_error(e.user_message(LOGIN_FALLBACK));
            }
            AppEvent::Registered(Ok(user)) => self.signed_in(user, REGISTER_SUCCESS),
            AppEvent::Registered(Err(e)) => {
                warn!(error = %e, "registration failed");
                self.register.set_error(e.user_message(REGISTER_FALLBACK));
            }
            AppEvent::TripsLoaded { user, result } => {
                if self.user.as_ref() != Some(&user) {
                    debug!(user = %user, "ignoring trips loaded for another session");
                    return;
                }
                self.dashboard.set_loading(false);
                match result {
                    Ok(trips) => {
                        debug!(count = trips.len(), "trips loaded");
                        self.dashboard.set_trips(trips);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load trips");
                        self.notify(Notification::error(TRIPS_LOAD_FAILED));
                    }
                }
            }
            AppEvent::TripLoaded { trip_id, result } => self.trip_loaded(trip_id, result),
            AppEvent::CityImage { trip_id, result } => {
                if self.detail.trip_id() != Some(trip_id) {
                    return;
                }
                match result {
                    Ok(url) => self.detail.set_default_image(url),
                    Err(e) => warn!(error = %e, trip_id, "city image lookup failed"),
                }
            }
            AppEvent::CitiesFound { seq, result } => {
                if self.form_is_open() {
                    self.trip_form
                        .form_mut()
                        .autocomplete_mut()
                        .apply(seq, result);
                }
            }
            AppEvent::ImageLoaded { generation, result } => {
                if self.form_is_open() && self.trip_form.form().generation() == generation {
                    self.trip_form.image_loaded(result);
                } else {
                    debug!(generation, "ignoring image read for a closed trip form");
                }
            }
            AppEvent::TripSaved { generation, result } => self.trip_saved(generation, result),
            AppEvent::TripDeleted { trip_id, result } => match result {
                Ok(()) => {
                    info!(trip_id, "trip deleted");
                    self.dashboard.remove(trip_id);
                    self.notify(Notification::success(TRIP_DELETED));
                    let viewing = self.detail.trip_id() == Some(trip_id);
                    if viewing && self.screen == Screen::TripDetail {
                        self.detail = TripDetailState::new();
                        self.screen = Screen::Dashboard;
                    }
                }
                Err(e) => {
                    warn!(error = %e, trip_id, "failed to delete trip");
                    self.notify(Notification::error(TRIP_DELETE_FAILED));
                }
            },
        }
    }

    /// Drops the notification once it has expired.
    pub fn tick(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notification = None;
        }
    }

    /// Returns the current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns `true` if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Returns the logged-in user, if any.
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dashboard(&self) -> &DashboardState {
        &self.dashboard
    }

    pub fn detail(&self) -> &TripDetailState {
        &self.detail
    }

    pub fn trip_form(&self) -> &TripFormState {
        &self.trip_form
    }

    pub fn login_state(&self) -> &LoginState {
        &self.login
    }

    pub fn register_state(&self) -> &RegisterState {
        &self.register
    }

    /// Runs `task` on the runtime and posts its event back to the UI task.
    fn spawn<F>(&self, task: F) -> AbortHandle
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            // The receiver is gone only while shutting down.
            let _ = events.send(task.await);
        })
        .abort_handle()
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Redirects screens the current session may not see.
    fn guard(&self, target: Screen) -> Screen {
        match target {
            _ if target.requires_session() && self.user.is_none() => Screen::Login,
            Screen::Login | Screen::Register if self.user.is_some() => Screen::Dashboard,
            _ => target,
        }
    }

    fn navigate(&mut self, target: Screen) {
        let target = self.guard(target);
        let from_help = self.screen == Screen::Help;
        self.screen = target;
        if target == Screen::Dashboard && !from_help {
            self.refresh_trips();
        }
    }

    fn form_is_open(&self) -> bool {
        self.screen == Screen::TripForm
            || (self.screen == Screen::Help && self.help.origin() == Screen::TripForm)
    }

    /// The logged-in user, or a redirect to login when there is none.
    fn require_user(&mut self) -> Option<UserId> {
        if self.user.is_none() {
            self.navigate(Screen::Login);
        }
        self.user.clone()
    }

    fn login(&mut self, credentials: Credentials) {
        debug!(email = %credentials.email, "logging in");
        let users = Arc::clone(&self.services.users);
        self.spawn(async move { AppEvent::LoggedIn(users.login(&credentials).await) });
    }

    fn register(&mut self, registration: Registration) {
        debug!(email = %registration.email, "registering");
        let users = Arc::clone(&self.services.users);
        self.spawn(async move { AppEvent::Registered(users.register(&registration).await) });
    }

    fn signed_in(&mut self, user: User, message: &str) {
        info!(user = %user.id, "signed in");
        if let Err(e) = self.session.save(&user.id) {
            warn!(error = %e, "failed to persist session");
        }
        self.user = Some(user.id);
        self.login.reset();
        self.register.reset();
        self.notify(Notification::success(message));
        self.navigate(Screen::Dashboard);
    }

    fn logout(&mut self) {
        info!("signing out");
        self.abort_form_tasks();
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "failed to clear session");
        }
        self.user = None;
        self.dashboard.clear();
        self.detail = TripDetailState::new();
        self.trip_form.close();
        self.navigate(Screen::Login);
    }

    fn refresh_trips(&mut self) {
        let Some(user) = self.require_user() else {
            return;
        };
        self.dashboard.set_loading(true);
        let trips = Arc::clone(&self.services.trips);
        self.spawn(async move {
            let result = trips.list(&user).await;
            AppEvent::TripsLoaded { user, result }
        });
    }

    fn open_trip(&mut self, trip_id: TripId) {
        let Some(user) = self.require_user() else {
            return;
        };
        self.detail.open(trip_id, self.dashboard.trip(trip_id).cloned());
        self.screen = Screen::TripDetail;
        let trips = Arc::clone(&self.services.trips);
        self.spawn(async move {
            let result = trips.get(&user, trip_id).await;
            AppEvent::TripLoaded { trip_id, result }
        });
    }

    fn trip_loaded(&mut self, trip_id: TripId, result: Result<Option<Trip>, ApiError>) {
        if self.detail.trip_id() != Some(trip_id) {
            return;
        }
        match result {
            Ok(Some(trip)) => {
                if let Some(city) = trip.city_name().map(str::to_string) {
                    let cities = Arc::clone(&self.services.cities);
                    self.spawn(async move {
                        let result = cities.image_for(&city).await;
                        AppEvent::CityImage { trip_id, result }
                    });
                }
                self.detail.set_trip(trip);
            }
            Ok(None) => {
                self.notify(Notification::error(TRIP_NOT_FOUND));
                self.detail = TripDetailState::new();
                if self.screen == Screen::TripDetail {
                    self.navigate(Screen::Dashboard);
                }
            }
            Err(e) => {
                warn!(error = %e, trip_id, "failed to load trip");
                self.notify(Notification::error(TRIP_LOAD_FAILED));
                if self.detail.trip().is_none() && self.screen == Screen::TripDetail {
                    self.navigate(Screen::Dashboard);
                }
            }
        }
    }

    fn edit_trip(&mut self, trip_id: TripId) {
        let trip = self
            .dashboard
            .trip(trip_id)
            .or_else(|| self.detail.trip().filter(|t| t.trip_id == trip_id))
            .cloned();
        match trip {
            Some(trip) => self.open_form(Some(&trip)),
            None => self.notify(Notification::error(TRIP_NOT_FOUND)),
        }
    }

    fn open_form(&mut self, existing: Option<&Trip>) {
        if self.require_user().is_none() {
            return;
        }
        self.form_origin = match self.screen {
            Screen::TripDetail => Screen::TripDetail,
            _ => Screen::Dashboard,
        };
        self.trip_form.open(existing);
        self.screen = Screen::TripForm;
    }

    fn close_form(&mut self) {
        self.abort_form_tasks();
        self.trip_form.close();
        self.screen = self.guard(self.form_origin);
    }

    fn abort_form_tasks(&mut self) {
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        if let Some(task) = self.submit_task.take() {
            debug!("abandoning in-flight trip submission");
            task.abort();
        }
    }

    fn delete_trip(&mut self, trip_id: TripId) {
        let Some(user) = self.require_user() else {
            return;
        };
        debug!(trip_id, "deleting trip");
        let trips = Arc::clone(&self.services.trips);
        self.spawn(async move {
            let result = trips.delete(&user, trip_id).await;
            AppEvent::TripDeleted { trip_id, result }
        });
    }

    fn load_image(&mut self, path: PathBuf) {
        debug!(path = %path.display(), "reading cover image");
        let generation = self.trip_form.form().generation();
        self.spawn(async move {
            let result = ImageFile::load(path).await;
            AppEvent::ImageLoaded { generation, result }
        });
    }

    fn submit_trip(&mut self) {
        let Some(user) = self.require_user() else {
            return;
        };
        let submission = match self.trip_form.form_mut().begin_submit(&user) {
            Ok(submission) => submission,
            Err(e) => {
                debug!(error = %e, "trip submission not started");
                return;
            }
        };
        let trips = Arc::clone(&self.services.trips);
        let generation = submission.generation;
        self.submit_task = Some(self.spawn(async move {
            let result = submission.send(&*trips).await;
            AppEvent::TripSaved { generation, result }
        }));
    }

    fn trip_saved(&mut self, generation: u64, result: Result<Trip, ApiError>) {
        let form = self.trip_form.form();
        if form.generation() != generation || !form.is_in_flight() {
            debug!(generation, "ignoring result for a closed trip form");
            return;
        }
        self.submit_task = None;
        let editing = self.trip_form.form().is_editing();
        let Ok(trip) = self.trip_form.form_mut().finish_submit(result) else {
            return;
        };
        info!(trip_id = trip.trip_id, editing, "trip saved");
        self.notify(Notification::success(if editing {
            TRIP_UPDATED
        } else {
            TRIP_CREATED
        }));
        if let Some(task) = self.search_task.take() {
            task.abort();
        }
        self.trip_form.close();
        match self.form_origin {
            Screen::TripDetail if self.detail.trip_id() == Some(trip.trip_id) => {
                self.detail.set_trip(trip);
                self.screen = Screen::TripDetail;
            }
            _ => self.navigate(Screen::Dashboard),
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventState, KeyModifiers};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::api::fake::{FakeCities, FakeTrips, FakeUsers};
    use crate::form::SearchState;
    use crate::model::TripStatus;
    use crate::tui::widgets::{NOTIFICATION_TTL, NotificationKind};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        }
    }

    fn trip(id: TripId, city: &str, status: &str) -> Trip {
        serde_json::from_value(json!({
            "tripId": id,
            "city": {"name": city},
            "startDate": "2024-06-01",
            "endDate": "2024-06-05",
            "status": status,
        }))
        .unwrap()
    }

    struct Harness {
        _dir: TempDir,
        session: SessionStore,
        trips: Arc<FakeTrips>,
        app: App,
        rx: UnboundedReceiver<AppEvent>,
    }

    impl Harness {
        fn build(trips: FakeTrips, cities: FakeCities, logged_in: bool) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let session = SessionStore::new(dir.path().join("session.json"));
            if logged_in {
                session.save(&UserId::new("7")).unwrap();
            }
            let trips = Arc::new(trips);
            let services = Services {
                trips: trips.clone(),
                cities: Arc::new(cities),
                users: Arc::new(FakeUsers::new("ada@example.com", "secret", "7")),
            };
            let (app, rx) = App::new(services, session.clone());
            Self {
                _dir: dir,
                session,
                trips,
                app,
                rx,
            }
        }

        fn logged_out() -> Self {
            Self::build(FakeTrips::new(), FakeCities::default(), false)
        }

        async fn logged_in(trips: Vec<Trip>) -> Self {
            Self::logged_in_with(FakeTrips::with_trips(trips), FakeCities::default()).await
        }

        async fn logged_in_with(trips: FakeTrips, cities: FakeCities) -> Self {
            let mut h = Self::build(trips, cities, true);
            h.app.start();
            h.pump().await;
            h
        }

        /// Applies every task result that arrives before the channel goes quiet.
        async fn pump(&mut self) {
            while let Ok(Some(event)) =
                tokio::time::timeout(Duration::from_millis(50), self.rx.recv()).await
            {
                self.app.handle_event(event);
            }
        }

        fn keys(&mut self, codes: &[KeyCode]) {
            for code in codes {
                self.app.handle_key(press(*code));
            }
        }

        fn type_str(&mut self, s: &str) {
            for ch in s.chars() {
                self.app.handle_key(press(KeyCode::Char(ch)));
            }
        }

        fn toast(&self) -> Option<(&str, NotificationKind)> {
            self.app
                .notification()
                .map(|n| (n.message.as_str(), n.kind))
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn starts_on_login_without_session() {
            let h = Harness::logged_out();
            assert_eq!(h.app.screen(), Screen::Login);
            assert!(h.app.user().is_none());
        }

        #[tokio::test]
        async fn restored_session_loads_dashboard() {
            let h = Harness::logged_in(vec![trip(1, "Paris", "TO_BE_VISITED")]).await;
            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.app.user(), Some(&UserId::new("7")));
            assert_eq!(h.app.dashboard().trips().len(), 1);
            assert!(!h.app.dashboard().is_loading());
        }

        #[test]
        fn corrupt_session_is_logged_out() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("session.json");
            std::fs::write(&path, "garbage").unwrap();
            let services = Services {
                trips: Arc::new(FakeTrips::new()),
                cities: Arc::new(FakeCities::default()),
                users: Arc::new(FakeUsers::new("a", "b", "c")),
            };
            let (app, _rx) = App::new(services, SessionStore::new(path));
            assert_eq!(app.screen(), Screen::Login);
        }

        #[test]
        fn guard_blocks_protected_screens() {
            let mut h = Harness::logged_out();
            for screen in [Screen::Dashboard, Screen::TripDetail, Screen::TripForm] {
                h.app.apply(Action::Navigate(screen));
                assert_eq!(h.app.screen(), Screen::Login, "{screen:?}");
            }
        }

        #[tokio::test]
        async fn guard_redirects_authenticated_user() {
            let mut h = Harness::logged_in(vec![]).await;
            h.app.apply(Action::Navigate(Screen::Register));
            assert_eq!(h.app.screen(), Screen::Dashboard);
        }

        #[test]
        fn f1_opens_help_and_returns() {
            let mut h = Harness::logged_out();
            h.app.handle_key(press(KeyCode::F(1)));
            assert_eq!(h.app.screen(), Screen::Help);
            h.app.handle_key(press(KeyCode::Esc));
            assert_eq!(h.app.screen(), Screen::Login);
        }

        #[test]
        fn release_events_are_ignored() {
            let mut h = Harness::logged_out();
            h.app.handle_key(release(KeyCode::Esc));
            assert!(!h.app.should_quit());
        }

        #[test]
        fn esc_on_login_quits() {
            let mut h = Harness::logged_out();
            h.app.handle_key(press(KeyCode::Esc));
            assert!(h.app.should_quit());
        }
    }

    mod auth {
        use super::*;

        #[tokio::test]
        async fn login_persists_session() {
            let mut h = Harness::logged_out();
            h.type_str("ada@example.com");
            h.keys(&[KeyCode::Tab]);
            h.type_str("secret");
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.session.load().unwrap(), Some(UserId::new("7")));
            assert_eq!(h.toast(), Some(("Welcome back!", NotificationKind::Success)));
            assert_eq!(h.trips.list_calls(), 1);
        }

        #[tokio::test]
        async fn bad_login_shows_server_message() {
            let mut h = Harness::logged_out();
            h.type_str("ada@example.com");
            h.keys(&[KeyCode::Tab]);
            h.type_str("wrong");
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Login);
            assert_eq!(h.app.login_state().error(), Some("Invalid email or password"));
            assert!(!h.app.login_state().is_busy());
        }

        #[tokio::test]
        async fn register_signs_in_new_user() {
            let mut h = Harness::logged_out();
            h.keys(&[KeyCode::F(2)]);
            assert_eq!(h.app.screen(), Screen::Register);
            h.type_str("Grace");
            h.keys(&[KeyCode::Tab]);
            h.type_str("grace@example.com");
            h.keys(&[KeyCode::Tab]);
            h.type_str("pw");
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.app.user(), Some(&UserId::new("new-user")));
            assert_eq!(
                h.toast(),
                Some(("Account created successfully!", NotificationKind::Success))
            );
        }

        #[tokio::test]
        async fn duplicate_registration_stays_put() {
            let mut h = Harness::logged_out();
            h.keys(&[KeyCode::F(2)]);
            h.type_str("Ada");
            h.keys(&[KeyCode::Tab]);
            h.type_str("ada@example.com");
            h.keys(&[KeyCode::Tab]);
            h.type_str("pw");
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Register);
            assert_eq!(h.app.register_state().error(), Some("Email already registered"));
        }

        #[tokio::test]
        async fn logout_clears_everything() {
            let mut h = Harness::logged_in(vec![trip(1, "Paris", "VISITED")]).await;
            h.keys(&[KeyCode::Char('L')]);
            assert_eq!(h.app.screen(), Screen::Login);
            assert!(h.app.user().is_none());
            assert!(h.app.dashboard().trips().is_empty());
            assert_eq!(h.session.load().unwrap(), None);
        }
    }

    mod dashboard {
        use super::*;

        #[tokio::test]
        async fn load_failure_notifies() {
            let mut h = Harness::logged_in_with(
                FakeTrips::failing(500, None),
                FakeCities::default(),
            )
            .await;
            assert_eq!(
                h.toast(),
                Some((
                    "Failed to load your trips. Please try again.",
                    NotificationKind::Error
                ))
            );
            assert!(!h.app.dashboard().is_loading());
            h.pump().await;
        }

        #[tokio::test]
        async fn delete_removes_trip() {
            let mut h = Harness::logged_in(vec![
                trip(1, "Paris", "VISITED"),
                trip(2, "Oslo", "TO_BE_VISITED"),
            ])
            .await;
            h.keys(&[KeyCode::Char('d'), KeyCode::Char('y')]);
            h.pump().await;

            assert_eq!(h.trips.deletes(), vec![1]);
            assert_eq!(h.app.dashboard().trips().len(), 1);
            assert_eq!(
                h.toast(),
                Some(("Trip deleted successfully!", NotificationKind::Success))
            );
        }

        #[tokio::test]
        async fn delete_failure_keeps_trip() {
            let mut h = Harness::logged_in(vec![trip(1, "Paris", "VISITED")]).await;
            h.trips.set_failure(Some((500, None)));
            h.keys(&[KeyCode::Char('d'), KeyCode::Char('y')]);
            h.pump().await;

            assert_eq!(h.app.dashboard().trips().len(), 1);
            assert_eq!(
                h.toast(),
                Some((
                    "Failed to delete trip. Please try again.",
                    NotificationKind::Error
                ))
            );
        }

        #[tokio::test]
        async fn refresh_reloads() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('r')]);
            h.pump().await;
            assert_eq!(h.trips.list_calls(), 2);
        }

        #[tokio::test]
        async fn list_for_another_user_is_ignored() {
            let mut h = Harness::logged_in(vec![]).await;
            h.app.handle_event(AppEvent::TripsLoaded {
                user: UserId::new("8"),
                result: Ok(vec![trip(1, "Paris", "VISITED")]),
            });
            assert!(h.app.dashboard().trips().is_empty());

            h.app.handle_event(AppEvent::TripsLoaded {
                user: UserId::new("7"),
                result: Ok(vec![trip(2, "Oslo", "VISITED")]),
            });
            assert_eq!(h.app.dashboard().trips().len(), 1);
        }

        #[tokio::test]
        async fn list_queued_before_logout_is_not_shown() {
            let mut h = Harness::logged_in(vec![trip(1, "Paris", "VISITED")]).await;
            h.keys(&[KeyCode::Char('r')]);
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            h.keys(&[KeyCode::Char('L')]);
            h.app.handle_event(AppEvent::LoggedIn(Ok(User {
                id: UserId::new("8"),
                name: None,
                email: None,
            })));
            h.trips.set_failure(Some((500, None)));
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert!(h.app.dashboard().trips().is_empty());
        }
    }

    mod detail {
        use super::*;

        #[tokio::test]
        async fn planned_trip_uses_city_image() {
            let mut h = Harness::logged_in_with(
                FakeTrips::with_trips(vec![trip(1, "Paris", "TO_BE_VISITED")]),
                FakeCities::default().with_image("Paris", "https://img.example/paris.jpg"),
            )
            .await;
            h.keys(&[KeyCode::Enter]);
            assert_eq!(h.app.screen(), Screen::TripDetail);
            h.pump().await;

            assert_eq!(
                h.app.detail().cover_image(),
                Some("https://img.example/paris.jpg")
            );
        }

        #[tokio::test]
        async fn image_lookup_failure_is_ignored() {
            let mut h = Harness::logged_in_with(
                FakeTrips::with_trips(vec![trip(1, "Paris", "TO_BE_VISITED")]),
                FakeCities::failing(),
            )
            .await;
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::TripDetail);
            assert!(h.app.detail().trip().is_some());
            assert_eq!(h.app.detail().cover_image(), None);
            assert!(h.app.notification().is_none());
        }

        #[tokio::test]
        async fn missing_trip_returns_to_dashboard() {
            let mut h = Harness::logged_in(vec![]).await;
            h.app.apply(Action::OpenTrip(99));
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.toast(), Some(("Trip not found", NotificationKind::Error)));
        }

        #[tokio::test]
        async fn delete_from_detail_goes_back() {
            let mut h = Harness::logged_in(vec![trip(1, "Paris", "VISITED")]).await;
            h.keys(&[KeyCode::Enter]);
            h.pump().await;
            h.keys(&[KeyCode::Char('d'), KeyCode::Char('y')]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert!(h.app.dashboard().trips().is_empty());
        }
    }

    mod trip_form {
        use super::*;

        fn fill_paris(h: &mut Harness) {
            h.type_str("Paris");
            h.keys(&[KeyCode::Esc, KeyCode::Tab]);
            h.type_str("2024-06-01");
            h.keys(&[KeyCode::Tab]);
            h.type_str("2024-06-05");
        }

        #[tokio::test]
        async fn create_trip_flow() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            assert_eq!(h.app.screen(), Screen::TripForm);
            fill_paris(&mut h);
            h.keys(&[KeyCode::Enter]);
            assert!(h.app.trip_form().form().is_in_flight());
            h.pump().await;

            let writes = h.trips.writes();
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].trip_id, None);
            assert_eq!(writes[0].payload.city.name, "Paris");
            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.app.dashboard().trips().len(), 1);
            assert_eq!(
                h.toast(),
                Some(("Trip created successfully!", NotificationKind::Success))
            );
        }

        #[tokio::test]
        async fn edit_from_detail_returns_to_detail() {
            let mut h = Harness::logged_in(vec![trip(4, "Rome", "VISITED")]).await;
            h.keys(&[KeyCode::Enter]);
            h.pump().await;
            h.keys(&[KeyCode::Char('e')]);
            assert_eq!(h.app.screen(), Screen::TripForm);
            assert!(h.app.trip_form().form().is_editing());
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.trips.writes()[0].trip_id, Some(4));
            assert_eq!(h.app.screen(), Screen::TripDetail);
            assert_eq!(
                h.toast(),
                Some(("Trip updated successfully!", NotificationKind::Success))
            );
        }

        #[tokio::test]
        async fn server_error_keeps_form_open() {
            let mut h = Harness::logged_in(vec![]).await;
            h.trips
                .set_failure(Some((400, Some("City not found".to_string()))));
            h.keys(&[KeyCode::Char('n')]);
            fill_paris(&mut h);
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::TripForm);
            assert_eq!(h.app.trip_form().form().error(), Some("City not found"));
            assert!(!h.app.trip_form().form().is_in_flight());
        }

        #[tokio::test]
        async fn invalid_form_does_not_submit() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n'), KeyCode::Enter]);
            h.pump().await;

            assert!(h.trips.writes().is_empty());
            assert_eq!(h.app.screen(), Screen::TripForm);
            assert!(h.app.trip_form().form().error().is_some());
        }

        #[tokio::test]
        async fn city_suggestions_arrive() {
            let mut h = Harness::logged_in_with(
                FakeTrips::new(),
                FakeCities::with_results(&[("Par", &["Paris", "Parma"])]),
            )
            .await;
            h.keys(&[KeyCode::Char('n')]);
            h.type_str("Par");
            h.pump().await;

            let autocomplete = h.app.trip_form().form().autocomplete();
            assert_eq!(autocomplete.state(), SearchState::Populated);
            assert_eq!(autocomplete.suggestions().len(), 2);

            h.keys(&[KeyCode::Down, KeyCode::Enter]);
            assert_eq!(h.app.trip_form().form().draft().city_name(), "Paris");
        }

        #[tokio::test]
        async fn cancel_returns_and_resets() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            h.type_str("Oslo");
            h.keys(&[KeyCode::Esc, KeyCode::Esc]);

            assert_eq!(h.app.screen(), Screen::Dashboard);
            assert_eq!(h.app.trip_form().form().draft().city_name(), "");
            h.pump().await;
            assert_eq!(
                h.app.trip_form().form().autocomplete().state(),
                SearchState::Idle
            );
        }

        #[tokio::test]
        async fn late_save_after_close_is_ignored() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            let generation = h.app.trip_form().form().generation();
            h.app.apply(Action::CloseForm);
            h.app.handle_event(AppEvent::TripSaved {
                generation,
                result: Ok(trip(9, "Oslo", "VISITED")),
            });
            assert!(h.app.notification().is_none());
            assert_eq!(h.app.screen(), Screen::Dashboard);
        }

        #[tokio::test]
        async fn save_from_closed_form_does_not_settle_the_next_one() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            fill_paris(&mut h);
            h.keys(&[KeyCode::Enter]);
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            h.app.apply(Action::CloseForm);

            h.keys(&[KeyCode::Char('n')]);
            h.type_str("Oslo");
            h.keys(&[KeyCode::Esc, KeyCode::Tab]);
            h.type_str("2024-07-01");
            h.keys(&[KeyCode::Tab]);
            h.type_str("2024-07-03");
            h.trips
                .set_failure(Some((400, Some("Oslo rejected".to_string()))));
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::TripForm);
            assert_eq!(h.app.trip_form().form().error(), Some("Oslo rejected"));
            assert_eq!(h.app.trip_form().form().draft().city_name(), "Oslo");
            assert!(h.app.notification().is_none());
        }

        #[tokio::test]
        async fn save_for_reopened_form_is_ignored_while_idle() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            let stale = h.app.trip_form().form().generation();
            h.app.apply(Action::CloseForm);
            h.keys(&[KeyCode::Char('n')]);
            fill_paris(&mut h);
            h.app.handle_event(AppEvent::TripSaved {
                generation: stale,
                result: Ok(trip(9, "Oslo", "VISITED")),
            });

            assert_eq!(h.app.screen(), Screen::TripForm);
            assert_eq!(h.app.trip_form().form().draft().city_name(), "Paris");
            assert!(h.app.dashboard().trips().is_empty());
        }

        #[tokio::test]
        async fn image_from_closed_form_is_not_attached_to_the_next() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cover.jpg");
            std::fs::write(&path, [0xff, 0xd8]).unwrap();

            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            h.app.apply(Action::LoadImage(path));
            h.app.apply(Action::CloseForm);
            h.keys(&[KeyCode::Char('n')]);
            h.pump().await;

            assert_eq!(h.app.screen(), Screen::TripForm);
            let draft = h.app.trip_form().form().draft();
            assert!(draft.pending_image().is_none());
            assert!(draft.preview().is_none());
        }

        #[tokio::test]
        async fn image_file_attaches_preview() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("cover.jpg");
            std::fs::write(&path, [0xff, 0xd8]).unwrap();

            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            h.app.apply(Action::LoadImage(path));
            h.pump().await;

            let draft = h.app.trip_form().form().draft();
            assert_eq!(draft.pending_image().map(|i| i.len()), Some(2));
            assert!(draft.preview().is_some_and(|p| p.is_local()));
        }

        #[tokio::test]
        async fn status_toggle_reaches_payload() {
            let mut h = Harness::logged_in(vec![]).await;
            h.keys(&[KeyCode::Char('n')]);
            fill_paris(&mut h);
            h.app.handle_key(KeyEvent {
                code: KeyCode::Char('s'),
                modifiers: KeyModifiers::ALT,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            });
            h.keys(&[KeyCode::Enter]);
            h.pump().await;

            assert_eq!(h.trips.writes()[0].payload.status, TripStatus::Visited);
        }
    }

    mod notifications {
        use super::*;

        #[test]
        fn tick_expires_toast() {
            let mut h = Harness::logged_out();
            h.app.notify(Notification::success("hi"));
            h.app.tick(Instant::now());
            assert!(h.app.notification().is_some());
            h.app.tick(Instant::now() + NOTIFICATION_TTL);
            assert!(h.app.notification().is_none());
        }
    }
}
