#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, Once};

use scout_core::Post;
use scout_engine::{
    BrowserDriver, DriverError, ElementHandle, LeadNotifier, Locator, NotifyError, RelayError,
    RelayHandle, RelayStore, ENTER_KEY,
};
use serde_json::Value;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scout_logging::initialize_for_tests);
}

#[derive(Debug, Clone)]
struct FakeElement {
    displayed: bool,
    id_attr: Option<String>,
}

#[derive(Default)]
struct State {
    url: String,
    redirects: HashMap<String, String>,
    elements: HashMap<String, FakeElement>,
    groups: HashMap<String, Vec<String>>,
    click_targets: HashMap<String, String>,
    typed: HashMap<String, String>,
    search_input: Option<String>,
    search_submit: Option<String>,
    active_query: Option<String>,
    pages: HashMap<String, VecDeque<String>>,
    default_page: String,
    height: i64,
    growing: bool,
    scripts: Vec<(String, Value)>,
    body_text: String,
    page_source_calls: usize,
    fail_page_source_from: Option<usize>,
    scrolls: usize,
    quit_calls: usize,
    fail_quit: bool,
    events: Vec<String>,
}

/// Scripted in-memory browser. Elements are keyed by the locator that finds
/// them; searches are submitted with Enter or a configured submit control and
/// select a queue of page sources by the query typed into the search input.
pub struct FakeBrowser {
    state: Mutex<State>,
}

fn key(locator: &Locator) -> String {
    locator.to_string()
}

impl FakeBrowser {
    pub fn new(start_url: &str) -> Self {
        Self {
            state: Mutex::new(State {
                url: start_url.to_string(),
                height: 1_000,
                growing: true,
                default_page: empty_feed(),
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn redirect(&self, target: &str, lands_on: &str) {
        self.lock()
            .redirects
            .insert(target.to_string(), lands_on.to_string());
    }

    pub fn add_element(&self, locator: &Locator) {
        self.lock().elements.insert(
            key(locator),
            FakeElement {
                displayed: true,
                id_attr: None,
            },
        );
    }

    pub fn add_hidden_element(&self, locator: &Locator) {
        self.lock().elements.insert(
            key(locator),
            FakeElement {
                displayed: false,
                id_attr: None,
            },
        );
    }

    /// Registers elements returned by `locate_all(locator)`, one per `id`.
    pub fn add_group(&self, locator: &Locator, ids: &[&str]) {
        let mut state = self.lock();
        let mut handles = Vec::new();
        for id in ids {
            let handle = format!("{}#{}", key(locator), id);
            state.elements.insert(
                handle.clone(),
                FakeElement {
                    displayed: true,
                    id_attr: Some(id.to_string()),
                },
            );
            handles.push(handle);
        }
        state.groups.insert(key(locator), handles);
    }

    pub fn on_click_go_to(&self, locator: &Locator, url: &str) {
        self.add_element(locator);
        self.lock().click_targets.insert(key(locator), url.to_string());
    }

    pub fn set_search_input(&self, locator: &Locator) {
        self.add_element(locator);
        self.lock().search_input = Some(key(locator));
    }

    pub fn set_search_submit(&self, locator: &Locator) {
        self.add_element(locator);
        self.lock().search_submit = Some(key(locator));
    }

    /// Page sources served, in order, after searching for `query`. The last
    /// one repeats once the queue is drained.
    pub fn push_pages(&self, query: &str, pages: Vec<String>) {
        self.lock()
            .pages
            .entry(query.to_string())
            .or_default()
            .extend(pages);
    }

    /// Serves `pages` without a search having been submitted.
    pub fn serve_pages(&self, pages: Vec<String>) {
        let mut state = self.lock();
        state.active_query = Some(String::new());
        state.pages.insert(String::new(), pages.into());
    }

    pub fn set_growing(&self, growing: bool) {
        self.lock().growing = growing;
    }

    pub fn respond_to_script(&self, needle: &str, value: Value) {
        self.lock().scripts.push((needle.to_string(), value));
    }

    pub fn set_body_text(&self, text: &str) {
        self.lock().body_text = text.to_string();
    }

    pub fn fail_page_source_from(&self, call: usize) {
        self.lock().fail_page_source_from = Some(call);
    }

    pub fn fail_quit(&self) {
        self.lock().fail_quit = true;
    }

    pub fn typed(&self, locator: &Locator) -> String {
        self.lock()
            .typed
            .get(&key(locator))
            .cloned()
            .unwrap_or_default()
    }

    pub fn typed_into(&self, element_id: &str) -> String {
        self.lock()
            .typed
            .get(element_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn current(&self) -> String {
        self.lock().url.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    pub fn page_source_calls(&self) -> usize {
        self.lock().page_source_calls
    }

    pub fn scrolls(&self) -> usize {
        self.lock().scrolls
    }

    pub fn quit_calls(&self) -> usize {
        self.lock().quit_calls
    }
}

impl State {
    fn submit_search(&mut self) {
        let Some(input) = &self.search_input else {
            return;
        };
        let query = self.typed.get(input).cloned().unwrap_or_default();
        self.events.push(format!("search:{query}"));
        self.active_query = Some(query);
    }

    fn element(&self, element: &ElementHandle) -> Result<&FakeElement, DriverError> {
        self.elements
            .get(&element.id)
            .ok_or_else(|| DriverError::Command {
                error: "stale element reference".to_string(),
                message: element.id.clone(),
            })
    }
}

#[async_trait::async_trait]
impl BrowserDriver for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.events.push(format!("navigate:{url}"));
        state.url = state
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.lock().url.clone())
    }

    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        let state = self.lock();
        let id = key(locator);
        Ok(state.elements.contains_key(&id).then(|| ElementHandle::new(id)))
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, DriverError> {
        let state = self.lock();
        Ok(state
            .groups
            .get(&key(locator))
            .map(|ids| ids.iter().map(ElementHandle::new).collect())
            .unwrap_or_default())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.element(element)?;
        state.events.push(format!("click:{}", element.id));
        if let Some(url) = state.click_targets.get(&element.id).cloned() {
            state.url = url;
        }
        if state.search_submit.as_deref() == Some(element.id.as_str()) {
            state.submit_search();
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.element(element)?;
        state.typed.insert(element.id.clone(), String::new());
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.element(element)?;
        if text == ENTER_KEY {
            state.events.push(format!("enter:{}", element.id));
            if state.search_input.as_deref() == Some(element.id.as_str()) {
                state.submit_search();
            }
            return Ok(());
        }
        state
            .typed
            .entry(element.id.clone())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let state = self.lock();
        let found = state.element(element)?;
        Ok(match name {
            "id" => found.id_attr.clone(),
            _ => None,
        })
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        Ok(self.lock().element(element)?.displayed)
    }

    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        let mut state = self.lock();
        if script.contains("scrollHeight") {
            return Ok(Value::from(state.height));
        }
        if script.contains("scrollBy") {
            let pixels = args.first().and_then(Value::as_i64).unwrap_or_default();
            state.scrolls += 1;
            state.events.push(format!("scroll:{pixels}"));
            if state.growing {
                state.height += pixels;
            }
            return Ok(Value::Null);
        }
        if script.contains("innerText") {
            return Ok(Value::from(state.body_text.clone()));
        }
        Ok(state
            .scripts
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null))
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        let mut state = self.lock();
        state.page_source_calls += 1;
        if state
            .fail_page_source_from
            .is_some_and(|from| state.page_source_calls >= from)
        {
            return Err(DriverError::Network("connection reset".to_string()));
        }
        let query = state.active_query.clone();
        let default_page = state.default_page.clone();
        let Some(queue) = query.and_then(|q| state.pages.get_mut(&q)) else {
            return Ok(default_page);
        };
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap_or(default_page))
        } else {
            Ok(queue.front().cloned().unwrap_or(default_page))
        }
    }

    async fn clear_session_state(&self) -> Result<(), DriverError> {
        self.lock().events.push("clear_cookies".to_string());
        Ok(())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.quit_calls += 1;
        state.events.push("quit".to_string());
        if state.fail_quit {
            return Err(DriverError::Network("browser gone".to_string()));
        }
        Ok(())
    }
}

/// Relay store whose reads are served from a script; the last entry repeats.
pub struct MemoryRelayStore {
    pub reads: Mutex<VecDeque<Result<String, String>>>,
    pub created: Mutex<Vec<String>>,
    pub read_calls: Mutex<usize>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_create: bool,
}

impl MemoryRelayStore {
    pub fn new(reads: Vec<Result<String, String>>) -> Self {
        Self {
            reads: Mutex::new(reads.into()),
            created: Mutex::new(Vec::new()),
            read_calls: Mutex::new(0),
            deleted: Mutex::new(Vec::new()),
            fail_create: false,
        }
    }

    pub fn always(content: &str) -> Self {
        Self::new(vec![Ok(content.to_string())])
    }

    pub fn reads(&self) -> usize {
        *self.read_calls.lock().unwrap()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RelayStore for MemoryRelayStore {
    async fn create(&self, content: &str) -> Result<RelayHandle, RelayError> {
        if self.fail_create {
            return Err(RelayError::Api {
                status: 401,
                message: "Bad credentials".to_string(),
            });
        }
        self.created.lock().unwrap().push(content.to_string());
        Ok(RelayHandle {
            id: "slot-1".to_string(),
            location: "https://relay.test/slot-1".to_string(),
        })
    }

    async fn read(&self, _handle: &RelayHandle) -> Result<String, RelayError> {
        *self.read_calls.lock().unwrap() += 1;
        let mut reads = self.reads.lock().unwrap();
        let next = if reads.len() > 1 {
            reads.pop_front()
        } else {
            reads.front().cloned()
        };
        match next {
            Some(Ok(content)) => Ok(content),
            Some(Err(message)) => Err(RelayError::Network(message)),
            None => Err(RelayError::MissingContent("slot-1".to_string())),
        }
    }

    async fn delete(&self, handle: &RelayHandle) -> Result<(), RelayError> {
        self.deleted.lock().unwrap().push(handle.id.clone());
        Ok(())
    }
}

/// Notifier that records calls and keeps posts whose text contains `keep`
/// (every post when `keep` is empty).
#[derive(Default)]
pub struct RecordingNotifier {
    pub keep: String,
    pub fail_notify: bool,
    pub notified: Mutex<Vec<String>>,
    pub filtered: Mutex<Vec<Vec<Post>>>,
    pub reported: Mutex<Vec<Vec<Post>>>,
}

impl RecordingNotifier {
    pub fn keeping(keep: &str) -> Self {
        Self {
            keep: keep.to_string(),
            ..Self::default()
        }
    }

    pub fn reported(&self) -> Vec<Vec<Post>> {
        self.reported.lock().unwrap().clone()
    }

    pub fn filtered(&self) -> Vec<Vec<Post>> {
        self.filtered.lock().unwrap().clone()
    }

    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LeadNotifier for RecordingNotifier {
    async fn filter_posts(&self, posts: &[Post]) -> Result<Vec<Post>, NotifyError> {
        self.filtered.lock().unwrap().push(posts.to_vec());
        Ok(posts
            .iter()
            .filter(|post| post.text.contains(&self.keep))
            .cloned()
            .collect())
    }

    async fn notify(&self, location: &str) -> Result<(), NotifyError> {
        if self.fail_notify {
            return Err(NotifyError::Api {
                status: 500,
                message: "mail server down".to_string(),
            });
        }
        self.notified.lock().unwrap().push(location.to_string());
        Ok(())
    }

    async fn report(&self, posts: &[Post]) -> Result<(), NotifyError> {
        self.reported.lock().unwrap().push(posts.to_vec());
        Ok(())
    }
}

/// One post container in the feed markup the default selectors expect.
pub fn post_card(author: &str, body: &str, href: &str) -> String {
    format!(
        r#"<div class="_7uk7474">
  <div data-block="22">
    <a data-block="17" href="{href}">open</a>
    <span data-testid="styled-text" style="--font: var(--detailTitle)">{author}</span>
    <span data-testid="styled-text">Encino · 2h ago</span>
    <div class="blocks-1avh7al">
      <span data-testid="styled-text">{author}</span>
      <span data-testid="styled-text">{body}</span>
      <span data-testid="styled-text">12</span>
    </div>
  </div>
</div>"#
    )
}

pub fn feed_page(cards: &[String]) -> String {
    format!(
        "<html><body><div id=\"main_content\">{}</div></body></html>",
        cards.join("\n")
    )
}

pub fn empty_feed() -> String {
    feed_page(&[])
}
