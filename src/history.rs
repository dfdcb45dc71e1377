use serde_json::json;
use url::Url;

use crate::log::{log_event, LogLevel};
use crate::navigation::{NavigationController, ScrollRequest};

pub fn fragment_from_hash(hash: &str) -> Option<&str> {
    let fragment = hash.strip_prefix('#').unwrap_or(hash);
    (!fragment.is_empty()).then_some(fragment)
}

pub fn fragment_from_href(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    url.fragment()
        .filter(|fragment| !fragment.is_empty())
        .map(ToString::to_string)
}

pub fn hash_for(id: &str) -> String {
    format!("#{id}")
}

pub trait HistoryPort {
    fn push_fragment(&mut self, id: &str);
}

pub struct HistorySync<H: HistoryPort> {
    history: H,
    log_level: LogLevel,
}

impl<H: HistoryPort> HistorySync<H> {
    pub fn new(history: H, log_level: LogLevel) -> Self {
        Self { history, log_level }
    }

    pub fn link_activated(
        &mut self,
        controller: &mut NavigationController,
        id: &str,
        navbar_height: f64,
    ) -> Option<ScrollRequest> {
        let request = controller.navigate(id, navbar_height)?;
        self.history.push_fragment(id);
        log_event(
            self.log_level,
            LogLevel::Info,
            "link_activated",
            json!({ "target": id, "scrollTop": request.top }),
        );
        Some(request)
    }

    pub fn pop_state(
        &mut self,
        controller: &mut NavigationController,
        hash: &str,
        navbar_height: f64,
    ) -> Option<ScrollRequest> {
        self.replay(controller, fragment_from_hash(hash), navbar_height, "pop_state")
    }

    /// First load. A missing fragment activates the top target without
    /// asking for a scroll, leaving any restored position alone.
    pub fn initial_load(
        &mut self,
        controller: &mut NavigationController,
        hash: &str,
        navbar_height: f64,
    ) -> Option<ScrollRequest> {
        let fragment = fragment_from_hash(hash);
        let request = self.replay(controller, fragment, navbar_height, "initial_load");
        fragment.and(request)
    }

    fn replay(
        &mut self,
        controller: &mut NavigationController,
        fragment: Option<&str>,
        navbar_height: f64,
        source: &str,
    ) -> Option<ScrollRequest> {
        let request = controller.on_location(fragment, navbar_height);
        log_event(
            self.log_level,
            LogLevel::Debug,
            "location_replayed",
            json!({
                "source": source,
                "fragment": fragment,
                "resolved": request.is_some(),
            }),
        );
        request
    }

    pub fn history(&self) -> &H {
        &self.history
    }
}
