use std::time::Duration;

use js_sys::{Array, Promise};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    window, Document, Element, Event, EventTarget, HtmlElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, Node, ScrollBehavior, ScrollToOptions,
};

use crate::config::SiteConfig;
use crate::debounce::TimerBackend;
use crate::history::{fragment_from_href, hash_for, HistoryPort};
use crate::navigation::ScrollRequest;
use crate::observer::{ObserverOptions, VisibilityChange, VisibilityHandler, VisibilitySource};

pub fn document() -> Option<Document> {
    window()?.document()
}

pub fn read_site_config() -> SiteConfig {
    let root = document().and_then(|d| d.document_element());
    SiteConfig::from_lookup(|key| root.as_ref()?.get_attribute(&format!("data-{key}")))
}

pub fn scroll_offset() -> f64 {
    window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0)
}

pub fn viewport_size() -> (f64, f64) {
    let Some(win) = window() else {
        return (1280.0, 720.0);
    };

    let width = win
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1280.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0);

    (width, height)
}

pub fn html_element_by_id(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn navbar_height() -> f64 {
    html_element_by_id("navbar")
        .map(|navbar| f64::from(navbar.offset_height()))
        .unwrap_or(0.0)
}

pub fn measure(id: &str) -> Option<(f64, f64)> {
    let element = html_element_by_id(id)?;
    Some((f64::from(element.offset_top()), f64::from(element.offset_height())))
}

pub fn elements_matching(selector: &str) -> Vec<Element> {
    let Some(nodes) = document().and_then(|d| d.query_selector_all(selector).ok()) else {
        return Vec::new();
    };

    (0..nodes.length())
        .filter_map(|index| nodes.get(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn prefers_reduced_motion() -> bool {
    window()
        .and_then(|w| {
            w.match_media("(prefers-reduced-motion: reduce)")
                .ok()
                .flatten()
        })
        .map(|mq| mq.matches())
        .unwrap_or(false)
}

pub fn scroll_window_to(request: ScrollRequest) {
    let Some(win) = window() else {
        return;
    };

    let options = ScrollToOptions::new();
    options.set_top(request.top);
    options.set_behavior(if prefers_reduced_motion() {
        ScrollBehavior::Instant
    } else {
        ScrollBehavior::Smooth
    });
    win.scroll_to_with_scroll_to_options(&options);
}

pub fn current_hash() -> String {
    window()
        .and_then(|w| w.location().href().ok())
        .and_then(|href| fragment_from_href(&href))
        .map(|fragment| hash_for(&fragment))
        .unwrap_or_default()
}

pub fn set_body_overflow(value: &str) {
    if let Some(body) = document().and_then(|d| d.body()) {
        let _ = body.style().set_property("overflow", value);
    }
}

pub fn mark_body_loaded() {
    if let Some(body) = document().and_then(|d| d.body()) {
        let _ = body.class_list().add_1("loaded");
    }
}

pub fn alert(message: &str) {
    if let Some(win) = window() {
        let _ = win.alert_with_message(message);
    }
}

pub fn event_within(event: &Event, id: &str) -> bool {
    let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
        return false;
    };
    document()
        .and_then(|d| d.get_element_by_id(id))
        .map(|element| element.contains(Some(&target)))
        .unwrap_or(false)
}

pub async fn sleep(delay: Duration) {
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let promise = Promise::new(&mut |resolve, _reject| {
        match window() {
            Some(win) => {
                if win
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .is_err()
                {
                    let _ = resolve.call0(&JsValue::NULL);
                }
            }
            None => {
                let _ = resolve.call0(&JsValue::NULL);
            }
        }
    });
    let _ = JsFuture::from(promise).await;
}

#[derive(Clone, Copy, Default)]
pub struct BrowserTimers;

pub struct TimeoutHandle {
    id: i32,
    _callback: Closure<dyn FnMut()>,
}

impl TimerBackend for BrowserTimers {
    type Handle = TimeoutHandle;

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<TimeoutHandle> {
        let win = window()?;
        let callback = Closure::once(move || callback());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                millis,
            )
            .ok()?;

        Some(TimeoutHandle {
            id,
            _callback: callback,
        })
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        if let Some(win) = window() {
            win.clear_timeout_with_handle(handle.id);
        }
    }
}

pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new<F>(target: &EventTarget, event: &'static str, handler: F) -> Option<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .ok()?;

        Some(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

#[derive(Default)]
pub struct BrowserHistory;

impl HistoryPort for BrowserHistory {
    fn push_fragment(&mut self, id: &str) {
        let Some(history) = window().and_then(|w| w.history().ok()) else {
            return;
        };
        let _ = history.push_state_with_url(&JsValue::NULL, "", Some(&hash_for(id)));
    }
}

pub struct BrowserVisibilitySource {
    targets: Vec<Element>,
    options: ObserverOptions,
}

pub struct IntersectionSubscription {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

impl Drop for IntersectionSubscription {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl BrowserVisibilitySource {
    pub fn new(targets: Vec<Element>, options: ObserverOptions) -> Self {
        Self { targets, options }
    }
}

impl VisibilitySource for BrowserVisibilitySource {
    /// `None` when the platform has no `IntersectionObserver`.
    type Subscription = Option<IntersectionSubscription>;

    fn subscribe(&mut self, mut handler: VisibilityHandler) -> Option<IntersectionSubscription> {
        let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let batch: Vec<VisibilityChange> = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| {
                    VisibilityChange::new(
                        entry.target().id(),
                        entry.is_intersecting(),
                        entry.intersection_ratio(),
                    )
                })
                .collect();
            handler(&batch);
        });

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&self.options.root_margin.to_css());
        init.set_threshold(&JsValue::from_f64(self.options.threshold));

        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init).ok()?;
        for target in &self.targets {
            observer.observe(target);
        }

        Some(IntersectionSubscription {
            observer,
            _callback: callback,
        })
    }
}
