use serde::Serialize;

use crate::config::SiteConfig;
use crate::observer::{Region, VisibilityChange};

pub const TOP_SECTION_ID: &str = "home";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActiveTarget {
    Top,
    Section(String),
}

impl ActiveTarget {
    pub fn from_id(id: &str) -> Self {
        if id == TOP_SECTION_ID {
            Self::Top
        } else {
            Self::Section(id.to_string())
        }
    }

    pub fn link_id(&self) -> &str {
        match self {
            Self::Top => TOP_SECTION_ID,
            Self::Section(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub id: String,
    pub top: f64,
    pub height: f64,
    pub ratio: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
            ratio: 0.0,
        }
    }

    pub fn region(&self) -> Region {
        Region::new(self.id.clone(), self.top, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub id: String,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    offset: f64,
}

impl ScrollState {
    pub fn new(offset: f64) -> Self {
        Self {
            offset: if offset.is_finite() { offset.max(0.0) } else { 0.0 },
        }
    }

    pub fn offset(self) -> f64 {
        self.offset
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct ActiveSectionResolver {
    near_top_offset: f64,
}

impl ActiveSectionResolver {
    pub fn new(near_top_offset: f64) -> Self {
        Self { near_top_offset }
    }

    /// Picks the intersecting entry with the largest ratio, then lets the
    /// near-top rule override it. Ties keep the first entry seen.
    pub fn resolve_batch(&self, batch: &[VisibilityChange], scroll: ScrollState) -> Option<ActiveTarget> {
        let mut resolved = None;
        let mut max_ratio = 0.0;

        for change in batch {
            if change.intersecting && change.ratio > max_ratio {
                max_ratio = change.ratio;
                resolved = Some(ActiveTarget::from_id(&change.id));
            }
        }

        self.resolve_tick(scroll).or(resolved)
    }

    pub fn resolve_tick(&self, scroll: ScrollState) -> Option<ActiveTarget> {
        (scroll.offset() < self.near_top_offset).then_some(ActiveTarget::Top)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationSink {
    links: Vec<NavLink>,
}

impl NavigationSink {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            links: ids
                .into_iter()
                .map(|id| NavLink {
                    id: id.into(),
                    active: false,
                })
                .collect(),
        }
    }

    /// Flags exactly the link matching `target_id` and returns how many
    /// flags changed. An unknown id leaves every link cleared.
    pub fn apply(&mut self, target_id: &str) -> usize {
        let mut changed = 0;
        for link in &mut self.links {
            let active = link.id == target_id;
            if link.active != active {
                link.active = active;
                changed += 1;
            }
        }
        changed
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.links.iter().any(|link| link.active && link.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.links.iter().filter(|link| link.active).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavigationController {
    resolver_offset: f64,
    navbar_scrolled_offset: f64,
    sections: Vec<Section>,
    sink: NavigationSink,
    active: ActiveTarget,
    scroll: ScrollState,
    navbar_scrolled: bool,
}

impl NavigationController {
    pub fn new(config: &SiteConfig, sections: Vec<Section>) -> Self {
        let sink = NavigationSink::new(sections.iter().map(|section| section.id.clone()));
        let mut controller = Self {
            resolver_offset: config.near_top_offset,
            navbar_scrolled_offset: config.navbar_scrolled_offset,
            sections,
            sink,
            active: ActiveTarget::Top,
            scroll: ScrollState::default(),
            navbar_scrolled: false,
        };
        controller.sink.apply(TOP_SECTION_ID);
        controller
    }

    pub fn active(&self) -> &ActiveTarget {
        &self.active
    }

    pub fn is_link_active(&self, id: &str) -> bool {
        self.sink.is_active(id)
    }

    pub fn navbar_scrolled(&self) -> bool {
        self.navbar_scrolled
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn set_geometry(&mut self, id: &str, top: f64, height: f64) {
        if let Some(section) = self.sections.iter_mut().find(|section| section.id == id) {
            section.top = top;
            section.height = height;
        }
    }

    pub fn regions(&self) -> Vec<Region> {
        self.sections.iter().map(Section::region).collect()
    }

    fn resolver(&self) -> ActiveSectionResolver {
        ActiveSectionResolver::new(self.resolver_offset)
    }

    pub fn on_visibility(&mut self, batch: &[VisibilityChange], scroll_offset: f64) -> bool {
        for change in batch {
            if let Some(section) = self.sections.iter_mut().find(|section| section.id == change.id) {
                section.ratio = if change.intersecting { change.ratio } else { 0.0 };
            }
        }

        self.scroll = ScrollState::new(scroll_offset);
        let resolved = self.resolver().resolve_batch(batch, self.scroll);
        resolved.map(|target| self.set_active(target)).unwrap_or(false)
    }

    pub fn on_scroll_leading(&mut self, scroll_offset: f64) -> bool {
        self.scroll = ScrollState::new(scroll_offset);
        self.update_navbar()
    }

    pub fn on_scroll_tick(&mut self, scroll_offset: f64) -> bool {
        self.scroll = ScrollState::new(scroll_offset);
        let navbar_changed = self.update_navbar();
        let target_changed = self
            .resolver()
            .resolve_tick(self.scroll)
            .map(|target| self.set_active(target))
            .unwrap_or(false);
        navbar_changed || target_changed
    }

    pub fn on_resize_tick(&mut self, scroll_offset: f64) -> bool {
        self.scroll = ScrollState::new(scroll_offset);
        self.resolver()
            .resolve_tick(self.scroll)
            .map(|target| self.set_active(target))
            .unwrap_or(false)
    }

    pub fn navigate(&mut self, id: &str, navbar_height: f64) -> Option<ScrollRequest> {
        let request = self.scroll_request(id, navbar_height)?;
        self.set_active(ActiveTarget::from_id(id));
        Some(request)
    }

    pub fn on_location(&mut self, fragment: Option<&str>, navbar_height: f64) -> Option<ScrollRequest> {
        match fragment {
            Some(id) => self.navigate(id, navbar_height),
            None => {
                self.set_active(ActiveTarget::Top);
                Some(ScrollRequest { top: 0.0 })
            }
        }
    }

    pub fn scroll_request(&self, id: &str, navbar_height: f64) -> Option<ScrollRequest> {
        let section = self.section(id)?;
        let top = if id == TOP_SECTION_ID {
            0.0
        } else {
            (section.top - navbar_height).max(0.0)
        };
        Some(ScrollRequest { top })
    }

    pub fn set_active(&mut self, target: ActiveTarget) -> bool {
        self.sink.apply(target.link_id());
        if self.active == target {
            return false;
        }
        self.active = target;
        true
    }

    fn update_navbar(&mut self) -> bool {
        let scrolled = self.scroll.offset() > self.navbar_scrolled_offset;
        let changed = scrolled != self.navbar_scrolled;
        self.navbar_scrolled = scrolled;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<Section> {
        vec![
            Section::new("home", 0.0, 800.0),
            Section::new("features", 800.0, 900.0),
            Section::new("pricing", 1_700.0, 700.0),
            Section::new("about", 2_400.0, 600.0),
            Section::new("contact", 3_000.0, 700.0),
        ]
    }

    fn controller() -> NavigationController {
        NavigationController::new(&SiteConfig::default(), sections())
    }

    fn assert_single_active(controller: &NavigationController, id: &str) {
        assert_eq!(controller.sink.active_count(), 1);
        assert!(controller.is_link_active(id), "{id} should be the active link");
    }

    #[test]
    fn starts_on_top_target() {
        let controller = controller();
        assert_eq!(controller.active(), &ActiveTarget::Top);
        assert_single_active(&controller, "home");
    }

    #[test]
    fn largest_ratio_wins() {
        let mut controller = controller();
        let batch = vec![
            VisibilityChange::new("features", true, 0.4),
            VisibilityChange::new("pricing", true, 0.7),
        ];

        assert!(controller.on_visibility(&batch, 1_500.0));
        assert_eq!(controller.active(), &ActiveTarget::Section("pricing".to_string()));
        assert_single_active(&controller, "pricing");
        assert_eq!(controller.section("features").map(|s| s.ratio), Some(0.4));
    }

    #[test]
    fn ties_keep_first_seen() {
        let resolver = ActiveSectionResolver::new(100.0);
        let batch = vec![
            VisibilityChange::new("about", true, 0.5),
            VisibilityChange::new("pricing", true, 0.5),
        ];

        let target = resolver.resolve_batch(&batch, ScrollState::new(2_000.0));
        assert_eq!(target, Some(ActiveTarget::Section("about".to_string())));
    }

    #[test]
    fn near_top_overrides_intersecting_section() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("pricing".to_string()));

        let batch = vec![VisibilityChange::new("about", true, 0.9)];
        controller.on_visibility(&batch, 50.0);

        assert_eq!(controller.active(), &ActiveTarget::Top);
        assert_single_active(&controller, "home");
    }

    #[test]
    fn batch_without_intersections_changes_nothing() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("about".to_string()));

        let batch = vec![
            VisibilityChange::new("pricing", false, 0.0),
            VisibilityChange::new("features", false, 0.05),
        ];

        assert!(!controller.on_visibility(&batch, 2_500.0));
        assert_single_active(&controller, "about");
    }

    #[test]
    fn applying_same_target_twice_is_a_noop() {
        let mut sink = NavigationSink::new(["home", "features", "pricing"]);
        assert_eq!(sink.apply("features"), 1);
        let snapshot = sink.clone();

        assert_eq!(sink.apply("features"), 0);
        assert_eq!(sink, snapshot);
    }

    #[test]
    fn unknown_target_clears_every_link() {
        let mut sink = NavigationSink::new(["home", "features", "pricing"]);
        sink.apply("home");

        sink.apply("careers");
        assert_eq!(sink.active_count(), 0);
    }

    #[test]
    fn scroll_tick_toggles_navbar_and_forces_top() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("features".to_string()));

        assert!(controller.on_scroll_tick(75.0));
        assert!(controller.navbar_scrolled());
        assert_eq!(controller.active(), &ActiveTarget::Top);

        assert!(controller.on_scroll_tick(10.0));
        assert!(!controller.navbar_scrolled());
        assert!(!controller.on_scroll_tick(20.0));
    }

    #[test]
    fn resize_tick_near_top_forces_top() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("features".to_string()));

        assert!(!controller.on_resize_tick(400.0));
        assert_single_active(&controller, "features");

        assert!(controller.on_resize_tick(40.0));
        assert_eq!(controller.active(), &ActiveTarget::Top);
        assert_single_active(&controller, "home");
        assert!(!controller.navbar_scrolled());
    }

    #[test]
    fn thresholds_are_exclusive() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("about".to_string()));

        let batch = vec![VisibilityChange::new("about", true, 0.6)];
        controller.on_visibility(&batch, 100.0);
        assert_eq!(controller.active(), &ActiveTarget::Section("about".to_string()));
        controller.on_visibility(&batch, 99.9);
        assert_eq!(controller.active(), &ActiveTarget::Top);

        controller.on_scroll_leading(50.0);
        assert!(!controller.navbar_scrolled());
        controller.on_scroll_leading(50.1);
        assert!(controller.navbar_scrolled());
    }

    #[test]
    fn leading_edge_only_touches_navbar() {
        let mut controller = controller();
        controller.set_active(ActiveTarget::Section("about".to_string()));

        assert!(controller.on_scroll_leading(60.0));
        assert!(controller.navbar_scrolled());
        assert_single_active(&controller, "about");
    }

    #[test]
    fn navigate_activates_and_offsets_by_navbar() {
        let mut controller = controller();

        let request = controller.navigate("pricing", 72.0);
        assert_eq!(request, Some(ScrollRequest { top: 1_628.0 }));
        assert_single_active(&controller, "pricing");

        let request = controller.navigate("home", 72.0);
        assert_eq!(request, Some(ScrollRequest { top: 0.0 }));
        assert_eq!(controller.active(), &ActiveTarget::Top);
    }

    #[test]
    fn navigate_to_unknown_section_is_ignored() {
        let mut controller = controller();
        controller.navigate("about", 0.0);

        assert_eq!(controller.navigate("careers", 0.0), None);
        assert_single_active(&controller, "about");
    }

    #[test]
    fn location_fragment_is_replayed() {
        let mut controller = controller();
        let request = controller.on_location(Some("pricing"), 0.0);

        assert_eq!(request, Some(ScrollRequest { top: 1_700.0 }));
        assert_eq!(controller.active(), &ActiveTarget::Section("pricing".to_string()));

        assert_eq!(controller.on_location(None, 0.0), Some(ScrollRequest { top: 0.0 }));
        assert_eq!(controller.active(), &ActiveTarget::Top);
    }

    #[test]
    fn geometry_updates_feed_scroll_requests() {
        let mut controller = controller();
        controller.set_geometry("contact", 3_400.0, 650.0);
        controller.set_geometry("missing", 1.0, 1.0);

        assert_eq!(controller.scroll_request("contact", 0.0), Some(ScrollRequest { top: 3_400.0 }));
        assert_eq!(controller.regions().len(), 5);
    }

    #[test]
    fn negative_or_nan_offsets_clamp_to_zero() {
        assert_eq!(ScrollState::new(-12.0).offset(), 0.0);
        assert_eq!(ScrollState::new(f64::NAN).offset(), 0.0);
    }
}
