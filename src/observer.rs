use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::config::SiteConfig;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VisibilityChange {
    pub id: String,
    pub intersecting: bool,
    pub ratio: f64,
}

impl VisibilityChange {
    pub fn new(id: impl Into<String>, intersecting: bool, ratio: f64) -> Self {
        Self {
            id: id.into(),
            intersecting,
            ratio: ratio.clamp(0.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    pub top_percent: f64,
    pub bottom_percent: f64,
}

impl RootMargin {
    pub const NONE: Self = Self {
        top_percent: 0.0,
        bottom_percent: 0.0,
    };

    pub fn to_css(self) -> String {
        if self == Self::NONE {
            return "0px".to_string();
        }

        format!("-{}% 0px -{}% 0px", self.top_percent, self.bottom_percent)
    }

    fn band(self, scroll_offset: f64, viewport_height: f64) -> (f64, f64) {
        let top = scroll_offset + viewport_height * self.top_percent / 100.0;
        let bottom = scroll_offset + viewport_height - viewport_height * self.bottom_percent / 100.0;
        (top, bottom.max(top))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverOptions {
    pub root_margin: RootMargin,
    pub threshold: f64,
}

impl ObserverOptions {
    pub fn navigation(config: &SiteConfig) -> Self {
        Self {
            root_margin: RootMargin {
                top_percent: config.root_margin_top_percent,
                bottom_percent: config.root_margin_bottom_percent,
            },
            threshold: config.observer_threshold,
        }
    }

    pub fn reveal(config: &SiteConfig) -> Self {
        Self {
            root_margin: RootMargin::NONE,
            threshold: config.reveal_threshold,
        }
    }
}

pub type VisibilityHandler = Box<dyn FnMut(&[VisibilityChange])>;

pub trait VisibilitySource {
    type Subscription;

    fn subscribe(&mut self, handler: VisibilityHandler) -> Self::Subscription;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl Region {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height: height.max(0.0),
        }
    }

    fn visible_ratio(&self, band: (f64, f64)) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }

        let overlap = (self.top + self.height).min(band.1) - self.top.max(band.0);
        (overlap / self.height).clamp(0.0, 1.0)
    }
}

type HandlerSlots = Rc<RefCell<Vec<(u64, VisibilityHandler)>>>;

pub struct GeometryObserver {
    options: ObserverOptions,
    regions: Vec<Region>,
    reported: HashMap<String, bool>,
    handlers: HandlerSlots,
    next_handler_id: u64,
}

pub struct GeometrySubscription {
    handlers: Weak<RefCell<Vec<(u64, VisibilityHandler)>>>,
    id: u64,
}

impl Drop for GeometrySubscription {
    fn drop(&mut self) {
        let Some(handlers) = self.handlers.upgrade() else {
            return;
        };
        // Dropped from inside a delivery; the slot stays until the next drop.
        let Ok(mut slots) = handlers.try_borrow_mut() else {
            return;
        };
        slots.retain(|(id, _)| *id != self.id);
    }
}

impl GeometryObserver {
    pub fn new(options: ObserverOptions, regions: Vec<Region>) -> Self {
        Self {
            options,
            regions,
            reported: HashMap::new(),
            handlers: Rc::new(RefCell::new(Vec::new())),
            next_handler_id: 0,
        }
    }

    pub fn set_regions(&mut self, regions: Vec<Region>) {
        self.reported.retain(|id, _| regions.iter().any(|region| &region.id == id));
        self.regions = regions;
    }

    pub fn sample(&mut self, scroll_offset: f64, viewport_height: f64) -> Vec<VisibilityChange> {
        let band = self
            .options
            .root_margin
            .band(scroll_offset.max(0.0), viewport_height.max(0.0));
        let threshold = self.options.threshold;
        let mut batch = Vec::new();

        for region in &self.regions {
            let ratio = region.visible_ratio(band);
            let intersecting = ratio > 0.0 && ratio >= threshold;

            if self.reported.get(&region.id) == Some(&intersecting) {
                continue;
            }

            self.reported.insert(region.id.clone(), intersecting);
            batch.push(VisibilityChange::new(region.id.clone(), intersecting, ratio));
        }

        if !batch.is_empty() {
            for (_, handler) in self.handlers.borrow_mut().iter_mut() {
                handler(&batch);
            }
        }

        batch
    }
}

impl VisibilitySource for GeometryObserver {
    type Subscription = GeometrySubscription;

    fn subscribe(&mut self, handler: VisibilityHandler) -> GeometrySubscription {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        self.handlers.borrow_mut().push((id, handler));

        GeometrySubscription {
            handlers: Rc::downgrade(&self.handlers),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_regions() -> Vec<Region> {
        vec![
            Region::new("home", 0.0, 800.0),
            Region::new("features", 800.0, 800.0),
            Region::new("pricing", 1_600.0, 800.0),
        ]
    }

    fn navigation_options() -> ObserverOptions {
        ObserverOptions::navigation(&SiteConfig::default())
    }

    #[test]
    fn root_margin_renders_css_shorthand() {
        assert_eq!(navigation_options().root_margin.to_css(), "-10% 0px -60% 0px");
        assert_eq!(RootMargin::NONE.to_css(), "0px");
    }

    #[test]
    fn first_sample_reports_every_region() {
        let mut observer = GeometryObserver::new(navigation_options(), page_regions());
        let batch = observer.sample(0.0, 1_000.0);

        assert_eq!(batch.len(), 3);
        assert!(batch[0].intersecting);
        assert!(!batch[1].intersecting);
        assert!(!batch[2].intersecting);
    }

    #[test]
    fn only_flipped_regions_are_reported_afterwards() {
        let mut observer = GeometryObserver::new(navigation_options(), page_regions());
        observer.sample(0.0, 1_000.0);

        assert!(observer.sample(10.0, 1_000.0).is_empty());

        // Band is [1_100, 1_400): home has left, features fills the band.
        let batch = observer.sample(1_000.0, 1_000.0);
        let ids: Vec<_> = batch.iter().map(|change| (change.id.as_str(), change.intersecting)).collect();
        assert_eq!(ids, vec![("home", false), ("features", true)]);
        assert!((batch[1].ratio - 300.0 / 800.0).abs() < 1e-9);
    }

    #[test]
    fn ratios_below_threshold_do_not_count_as_intersecting() {
        let options = ObserverOptions {
            root_margin: RootMargin::NONE,
            threshold: 0.5,
        };
        let mut observer = GeometryObserver::new(options, vec![Region::new("about", 900.0, 200.0)]);

        // 100 of 200 units visible is exactly the threshold.
        assert!(observer.sample(0.0, 1_000.0)[0].intersecting);
        // 50 of 200 units visible is below it.
        assert!(!observer.sample(0.0, 950.0)[0].intersecting);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let mut observer = GeometryObserver::new(navigation_options(), page_regions());
        let received = Rc::new(RefCell::new(Vec::new()));

        let sink = received.clone();
        let subscription = observer.subscribe(Box::new(move |batch| {
            sink.borrow_mut().push(batch.len());
        }));

        observer.sample(0.0, 1_000.0);
        drop(subscription);
        observer.sample(1_000.0, 1_000.0);

        assert_eq!(*received.borrow(), vec![3]);
    }

    #[test]
    fn subscription_outliving_its_observer_drops_cleanly() {
        let mut observer = GeometryObserver::new(navigation_options(), page_regions());
        let subscription = observer.subscribe(Box::new(|_| {}));
        let other = observer.subscribe(Box::new(|_| {}));

        drop(other);
        assert_eq!(observer.handlers.borrow().len(), 1);

        drop(observer);
        drop(subscription);
    }

    #[test]
    fn zero_height_regions_never_intersect() {
        let mut observer = GeometryObserver::new(
            navigation_options(),
            vec![Region::new("spacer", 100.0, 0.0)],
        );
        let batch = observer.sample(0.0, 1_000.0);
        assert_eq!(batch, vec![VisibilityChange::new("spacer", false, 0.0)]);
    }
}
