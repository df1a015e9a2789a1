//! UI-agnostic generator state
//!
//! `GeneratorView` holds the two form inputs, the last markup received and
//! the generation state. The state only changes through [`GeneratorView::begin`]
//! and [`GeneratorView::settle`], and every request is wrapped in a guard that
//! settles it on drop, so the busy flag cannot get stuck.

use std::future::Future;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::category::Category;
use crate::error::GenerateError;
use crate::openrouter::OpenRouterClient;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationState {
    #[default]
    Idle,
    InFlight,
    Completed(String),
    Failed(String),
}

/// Identifies one submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a request task reports back when it finishes.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub ticket: RequestTicket,
    pub result: Result<String, GenerateError>,
}

#[derive(Debug, Default)]
pub struct GeneratorView {
    idea: String,
    category: Category,
    result: String,
    state: GenerationState,
    pending: Vec<RequestTicket>,
    next_ticket: u64,
    last_error: Option<String>,
}

impl GeneratorView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn set_idea(&mut self, text: impl Into<String>) {
        self.idea = text.into();
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
    }

    /// Last markup received. Empty until the first success.
    pub fn result_text(&self) -> &str {
        &self.result
    }

    pub fn has_result(&self) -> bool {
        !self.result.is_empty()
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == GenerationState::InFlight
    }

    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Error from the most recently settled failure, cleared by the next submit.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mark a new request as outstanding. Overlapping requests are allowed.
    pub fn begin(&mut self) -> RequestTicket {
        self.next_ticket += 1;
        let ticket = RequestTicket(self.next_ticket);
        self.pending.push(ticket);
        self.state = GenerationState::InFlight;
        self.last_error = None;
        debug!("request {} started ({} outstanding)", ticket.0, self.pending.len());
        ticket
    }

    /// Record the outcome of `ticket`. Outcomes overwrite the result in the
    /// order they arrive. Returns false for a ticket that is not outstanding.
    pub fn settle(&mut self, ticket: RequestTicket, result: Result<String, GenerateError>) -> bool {
        let Some(pos) = self.pending.iter().position(|t| *t == ticket) else {
            warn!("ignoring outcome for unknown request {}", ticket.0);
            return false;
        };
        self.pending.remove(pos);

        let settled = match result {
            Ok(text) => {
                self.result = text;
                self.last_error = None;
                GenerationState::Completed(self.result.clone())
            }
            Err(err) => {
                warn!("request {} failed: {}", ticket.0, err);
                let reason = err.to_string();
                self.last_error = Some(reason.clone());
                GenerationState::Failed(reason)
            }
        };

        self.state = if self.pending.is_empty() {
            settled
        } else {
            GenerationState::InFlight
        };
        debug!("request {} settled ({} outstanding)", ticket.0, self.pending.len());
        true
    }

    /// Run one generation to completion against `client`, reading the idea
    /// and category at call time.
    pub async fn generate(&mut self, client: &OpenRouterClient) -> &GenerationState {
        let category = self.category;
        let idea = self.idea.clone();

        let busy = BusyScope::enter(self);
        let result = client.generate(category, &idea).await;
        busy.finish(result);

        &self.state
    }
}

/// Holds a view busy for the duration of one request and settles it as
/// `Aborted` if dropped before `finish`.
struct BusyScope<'a> {
    view: &'a mut GeneratorView,
    ticket: Option<RequestTicket>,
}

impl<'a> BusyScope<'a> {
    fn enter(view: &'a mut GeneratorView) -> Self {
        let ticket = view.begin();
        Self { view, ticket: Some(ticket) }
    }

    fn finish(mut self, result: Result<String, GenerateError>) {
        if let Some(ticket) = self.ticket.take() {
            self.view.settle(ticket, result);
        }
    }
}

impl Drop for BusyScope<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.view.settle(ticket, Err(GenerateError::Aborted));
        }
    }
}

/// Reports a ticket's outcome exactly once. If the owning task ends without
/// calling [`SettleGuard::settle`], the drop reports `Aborted`.
pub struct SettleGuard<F>
where
    F: FnOnce(GenerationOutcome),
{
    ticket: RequestTicket,
    report: Option<F>,
}

impl<F> SettleGuard<F>
where
    F: FnOnce(GenerationOutcome),
{
    pub fn new(ticket: RequestTicket, report: F) -> Self {
        Self { ticket, report: Some(report) }
    }

    pub fn settle(mut self, result: Result<String, GenerateError>) {
        if let Some(report) = self.report.take() {
            report(GenerationOutcome { ticket: self.ticket, result });
        }
    }
}

impl<F> Drop for SettleGuard<F>
where
    F: FnOnce(GenerationOutcome),
{
    fn drop(&mut self) {
        if let Some(report) = self.report.take() {
            report(GenerationOutcome {
                ticket: self.ticket,
                result: Err(GenerateError::Aborted),
            });
        }
    }
}

/// Spawn a background request for `ticket`. `report` is called exactly once
/// with the outcome, including when the task panics or is dropped.
pub fn spawn_generation<F>(
    client: OpenRouterClient,
    category: Category,
    idea: String,
    ticket: RequestTicket,
    report: F,
) -> JoinHandle<()>
where
    F: FnOnce(GenerationOutcome) + Send + 'static,
{
    spawn_reporting(ticket, report, async move { client.generate(category, &idea).await })
}

fn spawn_reporting<F, Fut>(ticket: RequestTicket, report: F, request: Fut) -> JoinHandle<()>
where
    F: FnOnce(GenerationOutcome) + Send + 'static,
    Fut: Future<Output = Result<String, GenerateError>> + Send + 'static,
{
    let guard = SettleGuard::new(ticket, report);
    tokio::spawn(async move {
        let result = request.await;
        guard.settle(result);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    fn malformed() -> GenerateError {
        GenerateError::MalformedResponse("missing field `choices`".to_string())
    }

    #[test]
    fn test_defaults() {
        let view = GeneratorView::new();
        assert_eq!(view.idea(), "");
        assert_eq!(view.category(), Category::AiSaas);
        assert_eq!(view.state(), &GenerationState::Idle);
        assert!(!view.is_busy());
        assert!(!view.has_result());
    }

    #[test]
    fn test_success_sets_result_and_clears_busy() {
        let mut view = GeneratorView::new();
        view.set_idea("Travel Planner");
        let ticket = view.begin();
        assert!(view.is_busy());

        assert!(view.settle(ticket, Ok("<div>X</div>".to_string())));
        assert_eq!(view.result_text(), "<div>X</div>");
        assert_eq!(view.state(), &GenerationState::Completed("<div>X</div>".to_string()));
        assert!(!view.is_busy());
        assert!(view.last_error().is_none());
    }

    #[test]
    fn test_failure_reaches_failed_and_keeps_previous_result() {
        let mut view = GeneratorView::new();
        let first = view.begin();
        view.settle(first, Ok("<p>old</p>".to_string()));

        let second = view.begin();
        view.settle(second, Err(malformed()));

        assert!(!view.is_busy());
        assert!(matches!(view.state(), GenerationState::Failed(reason) if reason.contains("choices")));
        assert!(view.last_error().is_some());
        assert_eq!(view.result_text(), "<p>old</p>");
    }

    #[test]
    fn test_overlapping_last_response_wins() {
        let mut view = GeneratorView::new();
        let a = view.begin();
        let b = view.begin();
        assert_eq!(view.outstanding(), 2);

        view.settle(a, Ok("A".to_string()));
        assert!(view.is_busy());
        assert_eq!(view.result_text(), "A");

        view.settle(b, Ok("B".to_string()));
        assert!(!view.is_busy());
        assert_eq!(view.result_text(), "B");
        assert_eq!(view.state(), &GenerationState::Completed("B".to_string()));
    }

    #[test]
    fn test_overlapping_uses_arrival_order_not_submit_order() {
        let mut view = GeneratorView::new();
        let a = view.begin();
        let b = view.begin();

        view.settle(b, Ok("B".to_string()));
        view.settle(a, Ok("A".to_string()));
        assert_eq!(view.result_text(), "A");
        assert!(!view.is_busy());
    }

    #[test]
    fn test_failure_while_another_is_outstanding_stays_busy() {
        let mut view = GeneratorView::new();
        let a = view.begin();
        let b = view.begin();

        view.settle(a, Err(malformed()));
        assert!(view.is_busy());
        assert!(view.last_error().is_some());

        view.settle(b, Ok("B".to_string()));
        assert_eq!(view.state(), &GenerationState::Completed("B".to_string()));
        assert!(view.last_error().is_none());
    }

    #[test]
    fn test_unknown_or_repeated_ticket_is_ignored() {
        let mut view = GeneratorView::new();
        let a = view.begin();
        assert!(view.settle(a, Ok("A".to_string())));
        assert!(!view.settle(a, Ok("again".to_string())));
        assert_eq!(view.result_text(), "A");
    }

    #[test]
    fn test_guard_reports_aborted_on_drop() {
        let mut view = GeneratorView::new();
        let ticket = view.begin();
        let seen: Arc<Mutex<Vec<GenerationOutcome>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let guard = SettleGuard::new(ticket, move |o| sink.lock().unwrap().push(o));
        drop(guard);

        let outcome = seen.lock().unwrap().pop().unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert!(matches!(outcome.result, Err(GenerateError::Aborted)));

        view.settle(outcome.ticket, outcome.result);
        assert!(!view.is_busy());
    }

    #[test]
    fn test_guard_reports_once() {
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let guard = SettleGuard::new(RequestTicket(7), move |_| *c.lock().unwrap() += 1);
        guard.settle(Ok("done".to_string()));
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_spawned_generation_always_reports() {
        let client = OpenRouterClient::new(Settings::default()).unwrap();
        let mut view = GeneratorView::new();
        let ticket = view.begin();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_generation(client, view.category(), String::new(), ticket, move |o| {
            let _ = tx.send(o);
        });
        handle.await.unwrap();

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(GenerateError::MissingApiKey)));
        view.settle(outcome.ticket, outcome.result);
        assert!(!view.is_busy());
        assert!(view.last_error().unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_panicking_request_still_reports_aborted() {
        let mut view = GeneratorView::new();
        let ticket = view.begin();

        let request = async {
            let body: Option<String> = None;
            Ok::<String, GenerateError>(body.expect("request task blew up"))
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_reporting(
            ticket,
            move |o| {
                let _ = tx.send(o);
            },
            request,
        );
        assert!(handle.await.unwrap_err().is_panic());

        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(GenerateError::Aborted)));
        assert!(view.settle(outcome.ticket, outcome.result));
        assert!(!view.is_busy());
        assert!(matches!(view.state(), GenerationState::Failed(_)));
    }

    #[tokio::test]
    async fn test_scoped_generate_clears_busy_on_error() {
        let client = OpenRouterClient::new(Settings::default()).unwrap();
        let mut view = GeneratorView::new();
        let state = view.generate(&client).await.clone();
        assert!(matches!(state, GenerationState::Failed(_)));
        assert!(!view.is_busy());
    }
}
