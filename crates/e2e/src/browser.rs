//! Chrome automation over the DevTools protocol
//!
//! `BrowserSession` owns the Chrome process and only hands out tabs.
//! `Tab` is one page per test. `Locator` describes how to find elements and
//! re-queries the DOM on every call, so it never holds stale node handles.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use niffler_common::config::DEFAULT_TIMEOUT;
use niffler_common::Settings;
use regex::Regex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};

/// Delay between checks of an awaited condition
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const IS_VISIBLE_JS: &str = "function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.visibility !== 'hidden' && style.display !== 'none'
        && rect.width > 0 && rect.height > 0;
}";

const IS_ENABLED_JS: &str = "function() {
    return !this.disabled && this.getAttribute('aria-disabled') !== 'true';
}";

const TEXT_CONTENT_JS: &str = "function() { return this.textContent; }";

const INPUT_VALUE_JS: &str = "function() { return this.value; }";

const SELECT_TEXT_JS: &str = "function() {
    this.focus();
    if (typeof this.select === 'function') {
        this.select();
    }
}";

// Goes through the native setter so React-controlled inputs see the change
const CLEAR_INPUT_JS: &str = "function() {
    this.focus();
    const proto = Object.getPrototypeOf(this);
    const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
    if (descriptor && descriptor.set) {
        descriptor.set.call(this, '');
    } else {
        this.value = '';
    }
    this.dispatchEvent(new Event('input', { bubbles: true }));
}";

/// Browser launch options
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Bound for every wait performed through tabs of this browser
    pub timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            viewport_width: 1280,
            viewport_height: 720,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BrowserOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            headless: settings.headless,
            chrome_executable: settings.chrome_executable.clone(),
            timeout: settings.timeout,
            ..Self::default()
        }
    }
}

/// Session-scoped browser; used only to spawn tabs
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
}

impl BrowserSession {
    /// Launch Chrome and start driving its DevTools connection
    pub async fn launch(options: BrowserOptions) -> E2eResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height)
            .request_timeout(options.timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(E2eError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| E2eError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler error: {}", e);
                }
            }
        });

        info!(
            "Browser launched ({})",
            if options.headless { "headless" } else { "headed" }
        );
        Ok(Self {
            browser,
            handler,
            timeout: options.timeout,
        })
    }

    /// Open a tab in its own browser context, so cookies and storage
    /// do not leak between tests
    pub async fn new_tab(&self) -> E2eResult<Tab> {
        let context = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.clone())
            .build()
            .map_err(E2eError::TabOpen)?;
        let page = self.browser.new_page(target).await?;
        Ok(Tab::new(page, context, self.timeout))
    }

    /// Close the tab and drop its browser context
    pub async fn close_tab(&self, tab: Tab) -> E2eResult<()> {
        let Tab { page, context, .. } = tab;
        page.close().await?;
        self.browser
            .execute(DisposeBrowserContextParams::new(context))
            .await?;
        Ok(())
    }

    pub async fn close(mut self) -> E2eResult<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }
}

/// State an element is awaited into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Visible,
    Hidden,
    Attached,
    Detached,
    Enabled,
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
            WaitState::Enabled => "enabled",
        };
        f.write_str(s)
    }
}

/// Poll `check` until it reports true or `timeout` elapses.
///
/// Errors from `check` count as "not yet"; the last one is kept for the
/// timeout message.
pub async fn poll_until<F, Fut>(what: &str, timeout: Duration, mut check: F) -> E2eResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
{
    let start = Instant::now();
    let mut last_error: Option<E2eError> = None;

    loop {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => last_error = Some(e),
        }
        if start.elapsed() >= timeout {
            break;
        }
        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
    }

    Err(E2eError::Timeout(match last_error {
        Some(e) => format!("{} within {:?} (last error: {})", what, timeout, e),
        None => format!("{} within {:?}", what, timeout),
    }))
}

/// One browser tab
#[derive(Clone)]
pub struct Tab {
    page: Page,
    context: BrowserContextId,
    timeout: Duration,
}

impl Tab {
    fn new(page: Page, context: BrowserContextId, timeout: Duration) -> Self {
        Self {
            page,
            context,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    pub async fn url(&self) -> E2eResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Does the current URL contain a match for `pattern`
    pub async fn url_matches(&self, pattern: &str) -> E2eResult<bool> {
        let re = Regex::new(pattern)?;
        Ok(re.is_match(&self.url().await?))
    }

    /// Block until the URL matches `pattern`; returns the matching URL
    pub async fn wait_for_url(&self, pattern: &str) -> E2eResult<String> {
        let re = Regex::new(pattern)?;
        let re = &re;
        let what = format!("URL matching /{}/", pattern);
        poll_until(&what, self.timeout, move || async move {
            Ok::<_, E2eError>(re.is_match(&self.url().await?))
        })
        .await?;
        let url = self.url().await?;
        debug!("Reached {}", url);
        Ok(url)
    }

    /// Press a key on whatever element has focus
    pub async fn press_key(&self, key: &str) -> E2eResult<()> {
        let target = match self.page.find_element(":focus").await {
            Ok(element) => element,
            Err(_) => self.page.find_element("body").await?,
        };
        debug!("Press {}", key);
        target.press_key(key).await?;
        Ok(())
    }

    pub fn locator(&self, css: &str) -> Locator {
        Locator {
            page: self.page.clone(),
            timeout: self.timeout,
            segments: vec![Segment::new(css)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TextFilter {
    /// Case-insensitive substring of the whitespace-normalised text
    Contains(String),
    /// Trimmed text equals the value
    Exact(String),
}

impl TextFilter {
    fn matches(&self, text: &str) -> bool {
        match self {
            TextFilter::Contains(needle) => {
                normalize_text(text).to_lowercase().contains(&normalize_text(needle).to_lowercase())
            }
            TextFilter::Exact(expected) => text.trim() == expected.trim(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Segment {
    css: String,
    text: Option<TextFilter>,
    nth: Option<usize>,
}

impl Segment {
    fn new(css: &str) -> Self {
        Self {
            css: css.to_string(),
            text: None,
            nth: None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css)?;
        match &self.text {
            Some(TextFilter::Contains(t)) => write!(f, ":has-text({:?})", t)?,
            Some(TextFilter::Exact(t)) => write!(f, ":text-is({:?})", t)?,
            None => {}
        }
        if let Some(n) = self.nth {
            write!(f, " >> nth={}", n)?;
        }
        Ok(())
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lazily resolved element query
#[derive(Clone)]
pub struct Locator {
    page: Page,
    timeout: Duration,
    segments: Vec<Segment>,
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" >> "))
    }
}

impl Locator {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Descendants of every match that match `css`
    pub fn locator(&self, css: &str) -> Locator {
        let mut next = self.clone();
        next.segments.push(Segment::new(css));
        next
    }

    /// Keep matches whose text contains `text`
    pub fn has_text(&self, text: &str) -> Locator {
        self.with_last(|s| s.text = Some(TextFilter::Contains(text.to_string())))
    }

    /// Keep matches whose trimmed text is exactly `text`
    pub fn text_is(&self, text: &str) -> Locator {
        self.with_last(|s| s.text = Some(TextFilter::Exact(text.to_string())))
    }

    pub fn nth(&self, index: usize) -> Locator {
        self.with_last(|s| s.nth = Some(index))
    }

    pub fn first(&self) -> Locator {
        self.nth(0)
    }

    fn with_last(&self, apply: impl FnOnce(&mut Segment)) -> Locator {
        let mut next = self.clone();
        if let Some(last) = next.segments.last_mut() {
            apply(last);
        }
        next
    }

    async fn resolve(&self) -> E2eResult<Vec<Element>> {
        let mut scope: Option<Vec<Element>> = None;

        for segment in &self.segments {
            let mut found = match &scope {
                None => self.page.find_elements(segment.css.as_str()).await?,
                Some(parents) => {
                    let mut children = Vec::new();
                    for parent in parents {
                        children.extend(parent.find_elements(segment.css.as_str()).await?);
                    }
                    children
                }
            };

            if let Some(filter) = &segment.text {
                let mut kept = Vec::with_capacity(found.len());
                for element in found {
                    if filter.matches(&text_of(&element).await?) {
                        kept.push(element);
                    }
                }
                found = kept;
            }

            if let Some(index) = segment.nth {
                found = found.into_iter().nth(index).into_iter().collect();
            }

            scope = Some(found);
        }

        Ok(scope.unwrap_or_default())
    }

    async fn first_element(&self) -> E2eResult<Element> {
        self.resolve()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| E2eError::ElementNotFound(self.to_string()))
    }

    /// Number of elements currently matching
    pub async fn count(&self) -> E2eResult<usize> {
        Ok(self.resolve().await?.len())
    }

    /// One indexed locator per current match
    pub async fn all(&self) -> E2eResult<Vec<Locator>> {
        let count = self.count().await?;
        Ok((0..count).map(|i| self.nth(i)).collect())
    }

    pub async fn exists(&self) -> E2eResult<bool> {
        Ok(self.count().await? > 0)
    }

    /// First match is rendered with a non-empty box; false when nothing matches
    pub async fn is_visible(&self) -> E2eResult<bool> {
        match self.first_element().await {
            Ok(element) => Ok(call_bool(&element, IS_VISIBLE_JS).await?),
            Err(E2eError::ElementNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn is_enabled(&self) -> E2eResult<bool> {
        let element = self.first_element().await?;
        call_bool(&element, IS_ENABLED_JS).await
    }

    /// Text content of the first match, once it is attached
    pub async fn text_content(&self) -> E2eResult<String> {
        self.wait_for(WaitState::Attached).await?;
        text_of(&self.first_element().await?).await
    }

    /// Current `value` of the first matching input
    pub async fn input_value(&self) -> E2eResult<String> {
        self.wait_for(WaitState::Attached).await?;
        Ok(call_js(&self.first_element().await?, INPUT_VALUE_JS)
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    /// Text content of every current match
    pub async fn all_text_contents(&self) -> E2eResult<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.resolve().await? {
            texts.push(text_of(&element).await?);
        }
        Ok(texts)
    }

    pub async fn wait_for(&self, state: WaitState) -> E2eResult<()> {
        let what = format!("{} to be {}", self, state);
        poll_until(&what, self.timeout, move || async move {
            match state {
                WaitState::Visible => self.is_visible().await,
                WaitState::Hidden => Ok(!self.is_visible().await?),
                WaitState::Attached => self.exists().await,
                WaitState::Detached => Ok(!self.exists().await?),
                WaitState::Enabled => self.is_enabled().await,
            }
        })
        .await
    }

    /// Wait until the number of matches satisfies `predicate`
    pub async fn wait_for_count<P>(&self, description: &str, predicate: P) -> E2eResult<usize>
    where
        P: Fn(usize) -> bool,
    {
        let predicate = &predicate;
        let what = format!("{} count {}", self, description);
        poll_until(&what, self.timeout, move || async move {
            Ok::<_, E2eError>(predicate(self.count().await?))
        })
        .await?;
        self.count().await
    }

    pub async fn click(&self) -> E2eResult<()> {
        self.wait_for(WaitState::Visible).await?;
        debug!("Click {}", self);
        self.first_element().await?.click().await?;
        Ok(())
    }

    /// Replace the input's value with `value`
    pub async fn fill(&self, value: &str) -> E2eResult<()> {
        self.wait_for(WaitState::Visible).await?;
        debug!("Fill {} with {:?}", self, value);
        let element = self.first_element().await?;
        element.call_js_fn(CLEAR_INPUT_JS, false).await?;
        if !value.is_empty() {
            element.type_str(value).await?;
        }
        Ok(())
    }

    /// Focus the input and select its whole content
    pub async fn select_text(&self) -> E2eResult<()> {
        self.wait_for(WaitState::Visible).await?;
        let element = self.first_element().await?;
        element.call_js_fn(SELECT_TEXT_JS, false).await?;
        Ok(())
    }

    /// Type into the element without clearing it first
    pub async fn type_text(&self, value: &str) -> E2eResult<()> {
        self.wait_for(WaitState::Visible).await?;
        debug!("Type {:?} into {}", value, self);
        let element = self.first_element().await?;
        element.focus().await?;
        element.type_str(value).await?;
        Ok(())
    }

    /// Focus the element and press a key, e.g. "Enter"
    pub async fn press(&self, key: &str) -> E2eResult<()> {
        self.wait_for(WaitState::Visible).await?;
        debug!("Press {} on {}", key, self);
        let element = self.first_element().await?;
        element.focus().await?;
        element.press_key(key).await?;
        Ok(())
    }
}

async fn call_js(element: &Element, function: &str) -> E2eResult<Value> {
    let returns = element.call_js_fn(function, false).await?;
    Ok(returns.result.value.unwrap_or(Value::Null))
}

async fn call_bool(element: &Element, function: &str) -> E2eResult<bool> {
    Ok(call_js(element, function).await?.as_bool().unwrap_or(false))
}

async fn text_of(element: &Element) -> E2eResult<String> {
    Ok(call_js(element, TEXT_CONTENT_JS)
        .await?
        .as_str()
        .unwrap_or_default()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_contains_filter_normalises_whitespace_and_case() {
        let filter = TextFilter::Contains("Log out".into());
        assert!(filter.matches("  Log\n   OUT  "));
        assert!(!filter.matches("Log in"));
    }

    #[test]
    fn test_exact_filter_trims_only() {
        let filter = TextFilter::Exact("alice".into());
        assert!(filter.matches(" alice\n"));
        assert!(!filter.matches("alice2"));
        assert!(!filter.matches("Alice"));
    }

    #[test]
    fn test_segment_display() {
        let mut segment = Segment::new("#requests tr");
        assert_eq!(segment.to_string(), "#requests tr");

        segment.text = Some(TextFilter::Contains("Accept".into()));
        segment.nth = Some(2);
        assert_eq!(segment.to_string(), "#requests tr:has-text(\"Accept\") >> nth=2");
    }

    #[test]
    fn test_default_options() {
        let options = BrowserOptions::default();
        assert!(options.headless);
        assert_eq!(options.timeout, Duration::from_secs(10));

        let settings = Settings {
            headless: false,
            timeout: Duration::from_secs(3),
            ..Settings::default()
        };
        let options = BrowserOptions::from_settings(&settings);
        assert!(!options.headless);
        assert_eq!(options.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_poll_until_succeeds_once_condition_holds() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        poll_until("third call", Duration::from_secs(2), move || async move {
            Ok(calls.fetch_add(1, Ordering::SeqCst) >= 2)
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_until_times_out_with_condition_name() {
        let err = poll_until("never", Duration::from_millis(250), || async { Ok(false) })
            .await
            .unwrap_err();
        match err {
            E2eError::Timeout(message) => assert!(message.starts_with("never within")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_until_reports_last_error() {
        let err = poll_until("flaky", Duration::from_millis(150), || async {
            Err(E2eError::ElementNotFound("#save".into()))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Element not found: #save"));
    }
}
