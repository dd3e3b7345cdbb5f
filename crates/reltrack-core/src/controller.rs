// Tracker state, the reducer that drives it, and a sequential driver
//
// `TrackerState::update` is pure: it takes a message and hands back the
// next state plus the effects to run. Whoever owns the state decides how to
// run effects - the TUI spawns them, `Controller` awaits them in order.
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::backend::{FetchPolicy, TrackerBackend};
use crate::models::{Repository, RepositoryDetails};
use crate::notifications::{
    Notice, ADD_FAILURE, ADD_SUCCESS, MARK_SEEN_FAILURE, MARK_SEEN_SUCCESS,
};
use crate::Error;

/// One in-flight-or-settled read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState<T> {
    pub loading: bool,
    pub data: T,
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    fn begin(&mut self) {
        self.loading = true;
    }

    fn settle(&mut self, result: Result<T, String>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
            }
            Err(e) => self.error = Some(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    pub selected_repo_name: Option<String>,
    pub search_term: String,
    pub is_adding: bool,
    pub repositories: QueryState<Vec<Repository>>,
    pub details: QueryState<Option<RepositoryDetails>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// First list load on startup
    Init,
    SearchChanged(String),
    AddRequested,
    AddFinished(Result<Repository, String>),
    SelectRequested(String),
    DetailsLoaded {
        name: String,
        result: Result<Option<RepositoryDetails>, String>,
    },
    /// Raw id as the UI holds it; parsed before anything goes on the wire
    MarkSeenRequested(String),
    MarkSeenFinished(Result<bool, String>),
    RefreshRequested,
    ListLoaded(Result<Vec<Repository>, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchList(FetchPolicy),
    FetchDetails(String),
    AddRepository(String),
    MarkReleaseAsSeen(i64),
    Notify(Notice),
}

impl TrackerState {
    pub fn update(mut self, message: Message) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();

        match message {
            Message::Init => {
                self.repositories.begin();
                effects.push(Effect::FetchList(FetchPolicy::CacheFirst));
            }
            Message::SearchChanged(term) => {
                self.search_term = term;
            }
            Message::AddRequested => {
                if self.search_term.trim().is_empty() || self.is_adding {
                    return (self, effects);
                }
                self.is_adding = true;
                // The raw term goes out as typed; the backend owns normalization
                effects.push(Effect::AddRepository(self.search_term.clone()));
            }
            Message::AddFinished(result) => {
                self.is_adding = false;
                self.search_term.clear();
                match result {
                    Ok(repo) => {
                        info!("Added {}", repo.name);
                        self.repositories.begin();
                        effects.push(Effect::FetchList(FetchPolicy::NetworkOnly));
                        effects.push(Effect::Notify(Notice::success(ADD_SUCCESS)));
                    }
                    Err(e) => {
                        debug!("Add failed: {}", e);
                        effects.push(Effect::Notify(Notice::error(ADD_FAILURE)));
                    }
                }
            }
            Message::SelectRequested(name) => {
                self.selected_repo_name = Some(name.clone());
                self.details.begin();
                effects.push(Effect::FetchDetails(name));
            }
            Message::DetailsLoaded { name, result } => {
                if self.selected_repo_name.as_deref() != Some(name.as_str()) {
                    debug!("Dropping details for {}, no longer selected", name);
                    return (self, effects);
                }
                self.details.settle(result);
            }
            Message::MarkSeenRequested(raw_id) => match parse_release_id(&raw_id) {
                Ok(release_id) => effects.push(Effect::MarkReleaseAsSeen(release_id)),
                Err(e) => {
                    error!("Error marking release as seen: {}", e);
                    effects.push(Effect::Notify(Notice::error(MARK_SEEN_FAILURE)));
                }
            },
            Message::MarkSeenFinished(result) => match result {
                Ok(_) => {
                    effects.push(Effect::Notify(Notice::success(MARK_SEEN_SUCCESS)));
                    self.repositories.begin();
                    effects.push(Effect::FetchList(FetchPolicy::NetworkOnly));
                }
                Err(e) => {
                    error!("Error marking release as seen: {}", e);
                    effects.push(Effect::Notify(Notice::error(MARK_SEEN_FAILURE)));
                }
            },
            Message::RefreshRequested => {
                self.repositories.begin();
                effects.push(Effect::FetchList(FetchPolicy::NetworkOnly));
            }
            Message::ListLoaded(result) => {
                if let Err(e) = &result {
                    error!("Error fetching repositories: {}", e);
                }
                self.repositories.settle(result);
            }
        }

        (self, effects)
    }

    /// Most recently added first, the order the UI shows
    pub fn repositories_newest_first(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.data.iter().rev()
    }

    pub fn is_selected(&self, repo: &Repository) -> bool {
        self.selected_repo_name.as_deref() == Some(repo.name.as_str())
    }
}

/// Release ids travel as strings in the UI but as `Int!` on the wire
pub fn parse_release_id(raw: &str) -> crate::Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidReleaseId(raw.to_string()))
}

/// Run one network effect and turn the outcome into the message that
/// completes it. `Notify` is not a network effect and yields nothing.
pub async fn run_effect<B>(backend: &B, effect: Effect) -> Option<Message>
where
    B: TrackerBackend + ?Sized,
{
    let message = match effect {
        Effect::FetchList(policy) => {
            Message::ListLoaded(backend.list_repositories(policy).await.map_err(describe))
        }
        Effect::FetchDetails(name) => {
            let result = backend.repository_details(&name).await.map_err(describe);
            Message::DetailsLoaded { name, result }
        }
        Effect::AddRepository(name) => {
            Message::AddFinished(backend.add_repository(&name).await.map_err(describe))
        }
        Effect::MarkReleaseAsSeen(release_id) => Message::MarkSeenFinished(
            backend
                .mark_release_as_seen(release_id)
                .await
                .map_err(describe),
        ),
        Effect::Notify(_) => return None,
    };

    Some(message)
}

fn describe(e: Error) -> String {
    debug!("{:?} failure: {}", e.kind(), e);
    e.to_string()
}

/// Drives the reducer to completion one message at a time
///
/// Every effect is awaited before the next message is processed, which is
/// what the one-shot CLI and the tests want.
pub struct Controller<B: TrackerBackend + ?Sized> {
    backend: Arc<B>,
    state: TrackerState,
    notices: Vec<Notice>,
}

impl<B: TrackerBackend + ?Sized> Controller<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: TrackerState::default(),
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn dispatch(&mut self, message: Message) {
        let mut pending = VecDeque::from([message]);

        while let Some(message) = pending.pop_front() {
            let (next, effects) = std::mem::take(&mut self.state).update(message);
            self.state = next;

            for effect in effects {
                if let Effect::Notify(notice) = effect {
                    self.notices.push(notice);
                } else if let Some(reply) = run_effect(self.backend.as_ref(), effect).await {
                    pending.push_back(reply);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockTrackerBackend;
    use crate::models::fixtures::{details, release, repo};
    use crate::notifications::NoticeLevel;
    use mockall::predicate::eq;
    use reltrack_api::GatewayError;

    fn backend_failure() -> Error {
        Error::Gateway(GatewayError::Http {
            status: 500,
            body: "resolver exploded".into(),
        })
    }

    fn controller(mock: MockTrackerBackend) -> Controller<MockTrackerBackend> {
        Controller::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_init_loads_list_cache_first() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_list_repositories()
            .with(eq(FetchPolicy::CacheFirst))
            .times(1)
            .returning(|_| Ok(vec![repo("1", "a/b", None), repo("2", "c/d", None)]));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::Init).await;

        let state = ctl.state();
        assert!(!state.repositories.loading);
        let names: Vec<_> = state.repositories_newest_first().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c/d", "a/b"]);
    }

    #[tokio::test]
    async fn test_add_with_blank_term_does_nothing() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_add_repository().times(0);
        mock.expect_list_repositories().times(0);

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SearchChanged("   \t".into())).await;
        let before = ctl.state().clone();

        ctl.dispatch(Message::AddRequested).await;

        assert_eq!(ctl.state(), &before);
        assert!(ctl.notices().is_empty());
    }

    #[tokio::test]
    async fn test_add_success_clears_search_and_refetches() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_add_repository()
            .withf(|name: &str| name == "tokio-rs/tokio")
            .times(1)
            .returning(|name| Ok(repo("7", name, Some(release("1.41.0", false)))));
        mock.expect_list_repositories()
            .with(eq(FetchPolicy::NetworkOnly))
            .times(1)
            .returning(|_| Ok(vec![repo("7", "tokio-rs/tokio", None)]));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SearchChanged("tokio-rs/tokio".into())).await;
        ctl.dispatch(Message::AddRequested).await;

        let state = ctl.state();
        assert_eq!(state.search_term, "");
        assert!(!state.is_adding);
        assert_eq!(state.repositories.data.len(), 1);
        assert_eq!(ctl.notices(), &[Notice::success("Repository added successfully!")]);
    }

    #[tokio::test]
    async fn test_add_sends_term_untrimmed() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_add_repository()
            .withf(|name: &str| name == "  serde-rs/serde ")
            .times(1)
            .returning(|_| Ok(repo("3", "serde-rs/serde", None)));
        mock.expect_list_repositories().returning(|_| Ok(Vec::new()));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SearchChanged("  serde-rs/serde ".into())).await;
        ctl.dispatch(Message::AddRequested).await;
    }

    #[tokio::test]
    async fn test_add_failure_clears_search_and_notifies_once() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_add_repository()
            .times(1)
            .returning(|_| Err(backend_failure()));
        mock.expect_list_repositories().times(0);

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SearchChanged("ghost/repo".into())).await;
        ctl.dispatch(Message::AddRequested).await;

        let state = ctl.state();
        assert_eq!(state.search_term, "");
        assert!(!state.is_adding);
        assert_eq!(
            ctl.notices(),
            &[Notice::error("Failed to add repository. Please try again.")]
        );
    }

    #[test]
    fn test_add_is_ignored_while_adding() {
        let state = TrackerState {
            search_term: "a/b".into(),
            is_adding: true,
            ..Default::default()
        };

        let (next, effects) = state.clone().update(Message::AddRequested);
        assert!(effects.is_empty());
        assert_eq!(next, state);
    }

    #[test]
    fn test_add_request_sets_busy_flag() {
        let state = TrackerState {
            search_term: "a/b".into(),
            ..Default::default()
        };

        let (next, effects) = state.update(Message::AddRequested);
        assert!(next.is_adding);
        assert_eq!(effects, vec![Effect::AddRepository("a/b".into())]);
    }

    #[tokio::test]
    async fn test_mark_seen_rejects_non_numeric_id() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_mark_release_as_seen().times(0);
        mock.expect_list_repositories().times(0);

        let mut ctl = controller(mock);
        ctl.dispatch(Message::MarkSeenRequested("abc".into())).await;

        assert_eq!(
            ctl.notices(),
            &[Notice::error("Failed to mark release as seen. Please try again.")]
        );
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl LogCapture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_invalid_release_id_is_logged_as_error() {
        let logs = LogCapture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();

        let (_, effects) = tracing::subscriber::with_default(subscriber, || {
            TrackerState::default().update(Message::MarkSeenRequested("abc".into()))
        });

        assert_eq!(effects, vec![Effect::Notify(Notice::error(MARK_SEEN_FAILURE))]);
        let output = logs.contents();
        assert!(output.contains("ERROR"), "log output: {}", output);
        assert!(output.contains("Error marking release as seen"));
        assert!(output.contains("Invalid release ID: \"abc\""));
    }

    #[tokio::test]
    async fn test_mark_seen_success() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_mark_release_as_seen()
            .with(eq(42))
            .times(1)
            .returning(|_| Ok(true));
        mock.expect_list_repositories()
            .with(eq(FetchPolicy::NetworkOnly))
            .times(1)
            .returning(|_| Ok(vec![repo("42", "a/b", Some(release("1.0.0", true)))]));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::MarkSeenRequested("42".into())).await;

        assert_eq!(ctl.notices().len(), 1);
        assert_eq!(ctl.notices()[0].level, NoticeLevel::Success);
        assert_eq!(ctl.notices()[0].message, "Release marked as seen successfully!");
        assert!(ctl.state().repositories.data[0].mark_seen_disabled());
    }

    #[tokio::test]
    async fn test_mark_seen_backend_failure() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_mark_release_as_seen()
            .times(1)
            .returning(|_| Err(backend_failure()));
        mock.expect_list_repositories().times(0);

        let mut ctl = controller(mock);
        ctl.dispatch(Message::MarkSeenRequested("7".into())).await;

        let notices = ctl.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert!(ctl.notices().is_empty());
    }

    #[tokio::test]
    async fn test_selecting_twice_fetches_twice() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_repository_details()
            .withf(|name: &str| name == "rust-lang/rust")
            .times(2)
            .returning(|name| Ok(Some(details(name))));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SelectRequested("rust-lang/rust".into())).await;
        ctl.dispatch(Message::SelectRequested("rust-lang/rust".into())).await;

        let state = ctl.state();
        assert_eq!(state.selected_repo_name.as_deref(), Some("rust-lang/rust"));
        assert_eq!(state.details.data.as_ref().unwrap().stars, 1200);
    }

    #[tokio::test]
    async fn test_list_failure_is_kept_inline() {
        let mut mock = MockTrackerBackend::new();
        mock.expect_list_repositories()
            .times(1)
            .returning(|_| Err(backend_failure()));

        let mut ctl = controller(mock);
        ctl.dispatch(Message::SearchChanged("half typed".into())).await;
        ctl.dispatch(Message::RefreshRequested).await;

        let state = ctl.state();
        assert!(!state.repositories.loading);
        assert!(state.repositories.error.is_some());
        assert_eq!(state.search_term, "half typed");
        assert!(ctl.notices().is_empty());
    }

    #[test]
    fn test_stale_details_are_dropped() {
        let state = TrackerState {
            selected_repo_name: Some("b/b".into()),
            ..Default::default()
        };

        let (next, _) = state.update(Message::DetailsLoaded {
            name: "a/a".into(),
            result: Ok(Some(details("a/a"))),
        });

        assert!(next.details.data.is_none());
    }

    #[test]
    fn test_detail_error_is_recorded() {
        let (state, effects) = TrackerState::default().update(Message::SelectRequested("a/a".into()));
        assert!(state.details.loading);
        assert_eq!(effects, vec![Effect::FetchDetails("a/a".into())]);

        let (state, _) = state.update(Message::DetailsLoaded {
            name: "a/a".into(),
            result: Err("timeout".into()),
        });
        assert!(!state.details.loading);
        assert_eq!(state.details.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_parse_release_id() {
        assert_eq!(parse_release_id("42").unwrap(), 42);
        assert_eq!(parse_release_id(" 7 ").unwrap(), 7);
        assert!(parse_release_id("").is_err());
        assert!(parse_release_id("4.2").is_err());
        assert!(matches!(
            parse_release_id("NaN"),
            Err(Error::InvalidReleaseId(_))
        ));
    }
}
