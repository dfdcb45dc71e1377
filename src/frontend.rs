use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, Event, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent};
use yew::prelude::*;

use crate::browser::{
    alert, current_hash, document, elements_matching, event_within, mark_body_loaded, measure,
    navbar_height, read_site_config, scroll_offset, scroll_window_to, set_body_overflow, sleep,
    viewport_size, BrowserHistory, BrowserTimers, BrowserVisibilitySource, EventListener,
    IntersectionSubscription,
};
use crate::config::SiteConfig;
use crate::contact::{submit, ContactForm, SubmitState};
use crate::debounce::{Debouncer, ScrollOrchestrator};
use crate::history::{hash_for, HistorySync};
use crate::log::{log_event, LogLevel};
use crate::menu::{ClickTarget, MobileMenu};
use crate::navigation::{NavigationController, Section};
use crate::observer::{
    GeometryObserver, GeometrySubscription, ObserverOptions, VisibilityChange, VisibilitySource,
};
use crate::reveal::{card_style, RevealTracker};

const SECTIONS: &[(&str, &str)] = &[
    ("home", "Home"),
    ("features", "Features"),
    ("pricing", "Pricing"),
    ("about", "About"),
    ("contact", "Contact"),
];

const NAVBAR_ID: &str = "navbar";
const NAV_MENU_ID: &str = "nav-menu";
const HAMBURGER_ID: &str = "hamburger";

struct Page {
    config: SiteConfig,
    nav: NavigationController,
    history: HistorySync<BrowserHistory>,
    menu: MobileMenu,
    reveal: RevealTracker,
}

impl Page {
    fn new(config: SiteConfig) -> Self {
        let sections = SECTIONS
            .iter()
            .map(|&(id, _)| Section::new(id, 0.0, 0.0))
            .collect();

        Self {
            nav: NavigationController::new(&config, sections),
            history: HistorySync::new(BrowserHistory, config.log_level),
            menu: MobileMenu::default(),
            reveal: RevealTracker::default(),
            config,
        }
    }

    fn measure_sections(&mut self) {
        for &(id, _) in SECTIONS {
            if let Some((top, height)) = measure(id) {
                self.nav.set_geometry(id, top, height);
            }
        }
    }

    fn apply_visibility(&mut self, batch: &[VisibilityChange], offset: f64) -> bool {
        log_event(
            self.config.log_level,
            LogLevel::Debug,
            "visibility_batch",
            json!({ "changes": batch, "scrollY": offset }),
        );

        let changed = self.nav.on_visibility(batch, offset);
        if changed {
            self.log_active_target();
        }
        changed
    }

    fn log_active_target(&self) {
        log_event(
            self.config.log_level,
            LogLevel::Info,
            "active_target_changed",
            json!({ "target": self.nav.active() }),
        );
    }

    fn close_menu(&mut self) -> bool {
        let closed = self.menu.close();
        if closed {
            set_body_overflow(self.menu.body_overflow());
        }
        closed
    }

    fn menu_toggled(&self) {
        set_body_overflow(self.menu.body_overflow());
        log_event(
            self.config.log_level,
            LogLevel::Debug,
            "menu_toggled",
            json!({ "open": self.menu.is_open() }),
        );
    }
}

struct PageBindings {
    _listeners: Vec<EventListener>,
    _orchestrator: Rc<RefCell<ScrollOrchestrator<BrowserTimers>>>,
    _section_observer: Option<IntersectionSubscription>,
    _reveal_observer: Option<IntersectionSubscription>,
    _fallback: Option<(Rc<RefCell<GeometryObserver>>, GeometrySubscription)>,
    _initial_hash: Debouncer<BrowserTimers>,
}

fn bind_page(page: Rc<RefCell<Page>>, rerender: UseForceUpdateHandle) -> Option<PageBindings> {
    let win = window()?;
    let doc = document()?;
    let config = page.borrow().config.clone();

    mark_body_loaded();
    page.borrow_mut().measure_sections();

    let section_elements = SECTIONS
        .iter()
        .filter_map(|&(id, _)| doc.get_element_by_id(id))
        .collect();
    let section_observer = {
        let page = page.clone();
        let rerender = rerender.clone();
        BrowserVisibilitySource::new(section_elements, ObserverOptions::navigation(&config)).subscribe(
            Box::new(move |batch| {
                if page.borrow_mut().apply_visibility(batch, scroll_offset()) {
                    rerender.force_update();
                }
            }),
        )
    };

    let fallback = if section_observer.is_none() {
        log_event(
            config.log_level,
            LogLevel::Info,
            "observer_fallback",
            json!({ "reason": "intersection_observer_unavailable" }),
        );
        let regions = page.borrow().nav.regions();
        let observer = Rc::new(RefCell::new(GeometryObserver::new(
            ObserverOptions::navigation(&config),
            regions,
        )));
        let subscription = {
            let page = page.clone();
            let rerender = rerender.clone();
            observer.borrow_mut().subscribe(Box::new(move |batch| {
                if page.borrow_mut().apply_visibility(batch, scroll_offset()) {
                    rerender.force_update();
                }
            }))
        };
        let (_, viewport_height) = viewport_size();
        observer.borrow_mut().sample(scroll_offset(), viewport_height);
        Some((observer, subscription))
    } else {
        None
    };

    let reveal_elements = elements_matching(".reveal");
    let reveal_ids: Vec<String> = reveal_elements.iter().map(|element| element.id()).collect();
    let reveal_observer = {
        let page = page.clone();
        let rerender = rerender.clone();
        BrowserVisibilitySource::new(reveal_elements, ObserverOptions::reveal(&config)).subscribe(
            Box::new(move |batch| {
                if !page.borrow_mut().reveal.observe(batch).is_empty() {
                    rerender.force_update();
                }
            }),
        )
    };
    if reveal_observer.is_none() {
        let everything: Vec<VisibilityChange> = reveal_ids
            .into_iter()
            .map(|id| VisibilityChange::new(id, true, 1.0))
            .collect();
        page.borrow_mut().reveal.observe(&everything);
    }

    let orchestrator = Rc::new(RefCell::new(ScrollOrchestrator::new(BrowserTimers, &config)));
    let fallback_observer = fallback.as_ref().map(|(observer, _)| observer.clone());
    let mut listeners = Vec::new();

    listeners.extend(EventListener::new(&win, "scroll", {
        let page = page.clone();
        let rerender = rerender.clone();
        let orchestrator = orchestrator.clone();
        let fallback_observer = fallback_observer.clone();
        move |_event: Event| {
            let leading = {
                let page = page.clone();
                let rerender = rerender.clone();
                move |offset: f64| {
                    if page.borrow_mut().nav.on_scroll_leading(offset) {
                        rerender.force_update();
                    }
                }
            };
            let trailing = {
                let page = page.clone();
                let rerender = rerender.clone();
                let fallback_observer = fallback_observer.clone();
                move |offset: f64| {
                    let changed = {
                        let mut page = page.borrow_mut();
                        let changed = page.nav.on_scroll_tick(offset);
                        if changed {
                            page.log_active_target();
                        }
                        changed
                    };
                    if let Some(observer) = fallback_observer.as_ref() {
                        let (_, viewport_height) = viewport_size();
                        observer.borrow_mut().sample(offset, viewport_height);
                    }
                    if changed {
                        rerender.force_update();
                    }
                }
            };
            orchestrator
                .borrow_mut()
                .on_scroll(scroll_offset(), leading, trailing);
        }
    }));

    listeners.extend(EventListener::new(&win, "resize", {
        let page = page.clone();
        let rerender = rerender.clone();
        let orchestrator = orchestrator.clone();
        let fallback_observer = fallback_observer.clone();
        move |_event: Event| {
            let (width, _) = viewport_size();
            let page = page.clone();
            let rerender = rerender.clone();
            let fallback_observer = fallback_observer.clone();
            orchestrator.borrow_mut().on_resize(width, move |width| {
                let regions = {
                    let mut page = page.borrow_mut();
                    let breakpoint = page.config.mobile_breakpoint;
                    if page.menu.on_resize(width, breakpoint) {
                        set_body_overflow(page.menu.body_overflow());
                    }
                    page.measure_sections();
                    if page.nav.on_resize_tick(scroll_offset()) {
                        page.log_active_target();
                    }
                    page.nav.regions()
                };
                if let Some(observer) = fallback_observer.as_ref() {
                    observer.borrow_mut().set_regions(regions);
                }
                rerender.force_update();
            });
        }
    }));

    listeners.extend(EventListener::new(&win, "popstate", {
        let page = page.clone();
        let rerender = rerender.clone();
        move |_event: Event| {
            let request = {
                let mut guard = page.borrow_mut();
                let page = &mut *guard;
                page.history.pop_state(&mut page.nav, &current_hash(), navbar_height())
            };
            if let Some(request) = request {
                scroll_window_to(request);
            }
            rerender.force_update();
        }
    }));

    listeners.extend(EventListener::new(&doc, "keydown", {
        let page = page.clone();
        let rerender = rerender.clone();
        move |event: Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let closed = {
                let mut page = page.borrow_mut();
                let closed = page.menu.on_document_key(&event.key());
                if closed {
                    page.menu_toggled();
                }
                closed
            };
            if closed {
                rerender.force_update();
            }
        }
    }));

    listeners.extend(EventListener::new(&doc, "click", {
        let page = page.clone();
        let rerender = rerender.clone();
        move |event: Event| {
            let target = if event_within(&event, NAV_MENU_ID) {
                ClickTarget::Menu
            } else if event_within(&event, HAMBURGER_ID) {
                ClickTarget::Hamburger
            } else {
                ClickTarget::Outside
            };
            let closed = {
                let mut page = page.borrow_mut();
                let closed = page.menu.on_document_click(target);
                if closed {
                    page.menu_toggled();
                }
                closed
            };
            if closed {
                rerender.force_update();
            }
        }
    }));

    let mut initial_hash = Debouncer::new(BrowserTimers, config.initial_hash_delay);
    let hash = current_hash();
    if hash.is_empty() {
        let mut guard = page.borrow_mut();
        let page = &mut *guard;
        page.history.initial_load(&mut page.nav, "", 0.0);
    } else {
        let page = page.clone();
        let rerender = rerender.clone();
        initial_hash.schedule(move || {
            let request = {
                let mut guard = page.borrow_mut();
                let page = &mut *guard;
                page.measure_sections();
                page.history.initial_load(&mut page.nav, &hash, navbar_height())
            };
            if let Some(request) = request {
                scroll_window_to(request);
            }
            rerender.force_update();
        });
    }

    let observer_mode = if fallback.is_some() {
        "geometry"
    } else {
        "intersection"
    };
    {
        let mut page = page.borrow_mut();
        page.nav.on_scroll_tick(scroll_offset());
        log_event(
            config.log_level,
            LogLevel::Info,
            "page_mounted",
            json!({
                "sections": SECTIONS.len(),
                "observer": observer_mode,
                "active": page.nav.active(),
            }),
        );
    }
    rerender.force_update();

    Some(PageBindings {
        _listeners: listeners,
        _orchestrator: orchestrator,
        _section_observer: section_observer,
        _reveal_observer: reveal_observer,
        _fallback: fallback,
        _initial_hash: initial_hash,
    })
}

#[derive(Properties, PartialEq)]
struct FeatureCardProps {
    title: AttrValue,
    body: AttrValue,
}

#[function_component(FeatureCard)]
fn feature_card(props: &FeatureCardProps) -> Html {
    let hovered = use_state(|| false);

    let onmouseenter = {
        let hovered = hovered.clone();
        Callback::from(move |_| hovered.set(true))
    };

    let onmouseleave = {
        let hovered = hovered.clone();
        Callback::from(move |_| hovered.set(false))
    };

    html! {
        <article
            class="card"
            style={card_style(*hovered)}
            onmouseenter={onmouseenter}
            onmouseleave={onmouseleave}
        >
            <h3>{props.title.clone()}</h3>
            <p>{props.body.clone()}</p>
        </article>
    }
}

#[derive(Properties, PartialEq)]
struct ContactSectionProps {
    submit_delay: Duration,
    log_level: LogLevel,
    reveal_style: AttrValue,
}

#[function_component(ContactSection)]
fn contact_section(props: &ContactSectionProps) -> Html {
    let submit_state = use_state(SubmitState::default);
    let form_ref = use_node_ref();
    let name_ref = use_node_ref();
    let email_ref = use_node_ref();
    let message_ref = use_node_ref();

    let onsubmit = {
        let submit_state = submit_state.clone();
        let form_ref = form_ref.clone();
        let name_ref = name_ref.clone();
        let email_ref = email_ref.clone();
        let message_ref = message_ref.clone();
        let submit_delay = props.submit_delay;
        let log_level = props.log_level;
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();

            let form = ContactForm {
                name: name_ref
                    .cast::<HtmlInputElement>()
                    .map(|input| input.value())
                    .unwrap_or_default(),
                email: email_ref
                    .cast::<HtmlInputElement>()
                    .map(|input| input.value())
                    .unwrap_or_default(),
                message: message_ref
                    .cast::<HtmlTextAreaElement>()
                    .map(|input| input.value())
                    .unwrap_or_default(),
            };

            if let Err(error) = form.validate() {
                log_event(
                    log_level,
                    LogLevel::Info,
                    "contact_rejected",
                    json!({ "reason": error.as_str() }),
                );
                alert(&error.to_string());
                return;
            }

            submit_state.set(SubmitState::Sending);
            let submit_state = submit_state.clone();
            let form_ref = form_ref.clone();
            spawn_local(async move {
                if let Ok(notice) = submit(&form, sleep(submit_delay)).await {
                    log_event(log_level, LogLevel::Info, "contact_submitted", json!({}));
                    alert(notice);
                    if let Some(form) = form_ref.cast::<HtmlFormElement>() {
                        form.reset();
                    }
                }
                submit_state.set(SubmitState::Idle);
            });
        })
    };

    html! {
        <div class="contact-form reveal" id="contact-form" style={props.reveal_style.clone()}>
            <form ref={form_ref} onsubmit={onsubmit} novalidate={true}>
                <label for="name">{"Name"}</label>
                <input id="name" name="name" type="text" ref={name_ref} />
                <label for="email">{"Email"}</label>
                <input id="email" name="email" type="email" ref={email_ref} />
                <label for="message">{"Message"}</label>
                <textarea id="message" name="message" rows="5" ref={message_ref} />
                <button type="submit" disabled={submit_state.disabled()}>
                    {submit_state.button_label()}
                </button>
            </form>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let page = use_mut_ref(|| Page::new(read_site_config()));
    let rerender = use_force_update();

    {
        let page = page.clone();
        let rerender = rerender.clone();
        use_effect_with((), move |_| {
            let bindings = bind_page(page, rerender);
            move || drop(bindings)
        });
    }

    let on_link = {
        let page = page.clone();
        let rerender = rerender.clone();
        Callback::from(move |(event, id): (MouseEvent, &'static str)| {
            event.prevent_default();
            let request = {
                let mut guard = page.borrow_mut();
                let page = &mut *guard;
                page.close_menu();
                page.history.link_activated(&mut page.nav, id, navbar_height())
            };
            if let Some(request) = request {
                scroll_window_to(request);
            }
            rerender.force_update();
        })
    };

    let on_hamburger_click = {
        let page = page.clone();
        let rerender = rerender.clone();
        Callback::from(move |_: MouseEvent| {
            {
                let mut page = page.borrow_mut();
                page.menu.toggle();
                page.menu_toggled();
            }
            rerender.force_update();
        })
    };

    let on_hamburger_key = {
        let page = page.clone();
        let rerender = rerender.clone();
        Callback::from(move |event: KeyboardEvent| {
            let toggled = {
                let mut page = page.borrow_mut();
                let toggled = page.menu.on_hamburger_key(&event.key());
                if toggled {
                    page.menu_toggled();
                }
                toggled
            };
            if toggled {
                event.prevent_default();
                rerender.force_update();
            }
        })
    };

    let state = page.borrow();
    let menu_open = state.menu.is_open();
    let reveal = |id: &str| AttrValue::from(state.reveal.style_for(id));

    html! {
        <>
            <nav id={NAVBAR_ID} class={classes!("navbar", state.nav.navbar_scrolled().then_some("scrolled"))}>
                <a class="nav-brand" href="#home">{"Beacon"}</a>
                <ul id={NAV_MENU_ID} class={classes!("nav-menu", menu_open.then_some("active"))}>
                    { for SECTIONS.iter().map(|&(id, label)| {
                        let onclick = {
                            let on_link = on_link.clone();
                            Callback::from(move |event: MouseEvent| on_link.emit((event, id)))
                        };
                        html! {
                            <li>
                                <a
                                    class={classes!("nav-link", state.nav.is_link_active(id).then_some("active"))}
                                    href={hash_for(id)}
                                    onclick={onclick}
                                >
                                    {label}
                                </a>
                            </li>
                        }
                    }) }
                </ul>
                <div
                    id={HAMBURGER_ID}
                    class={classes!("hamburger", menu_open.then_some("active"))}
                    role="button"
                    tabindex="0"
                    aria-label={state.menu.toggle_label()}
                    aria-expanded={menu_open.to_string()}
                    onclick={on_hamburger_click}
                    onkeydown={on_hamburger_key}
                >
                    <span class="bar"></span>
                    <span class="bar"></span>
                    <span class="bar"></span>
                </div>
            </nav>

            <main>
                <section id="home" class="section hero">
                    <div class="hero-content">
                        <h1 id="hero-title" class="reveal" style={reveal("hero-title")}>
                            {"Ship releases without the guesswork"}
                        </h1>
                        <p id="hero-copy" class="reveal" style={reveal("hero-copy")}>
                            {"Beacon watches every deploy, flags regressions early, and keeps your team in the loop."}
                        </p>
                    </div>
                </section>

                <section id="features" class="section">
                    <div class="section-content">
                        <h2 id="features-title" class="reveal" style={reveal("features-title")}>{"Features"}</h2>
                        <div id="features-grid" class="card-grid reveal" style={reveal("features-grid")}>
                            <FeatureCard title="Release health" body="Error rates and latency per deploy, side by side." />
                            <FeatureCard title="Smart rollbacks" body="One click back to the last healthy build." />
                            <FeatureCard title="Team digests" body="A morning summary of what changed overnight." />
                        </div>
                    </div>
                </section>

                <section id="pricing" class="section">
                    <div class="section-content">
                        <h2 id="pricing-title" class="reveal" style={reveal("pricing-title")}>{"Pricing"}</h2>
                        <div id="pricing-grid" class="card-grid reveal" style={reveal("pricing-grid")}>
                            <FeatureCard title="Starter" body="Free for up to three projects." />
                            <FeatureCard title="Team" body="$29 per month with unlimited projects." />
                            <FeatureCard title="Enterprise" body="SSO, audit logs and a dedicated contact." />
                        </div>
                    </div>
                </section>

                <section id="about" class="section">
                    <div class="section-content">
                        <h2 id="about-title" class="reveal" style={reveal("about-title")}>{"About"}</h2>
                        <p id="about-copy" class="reveal" style={reveal("about-copy")}>
                            {"We are a small team of operators who got tired of finding out about broken releases from customers."}
                        </p>
                    </div>
                </section>

                <section id="contact" class="section">
                    <div class="section-content">
                        <h2 id="contact-title" class="reveal" style={reveal("contact-title")}>{"Contact"}</h2>
                        <ContactSection
                            submit_delay={state.config.submit_delay}
                            log_level={state.config.log_level}
                            reveal_style={reveal("contact-form")}
                        />
                    </div>
                </section>
            </main>
        </>
    }
}

pub fn run() {
    yew::Renderer::<App>::with_root(
        window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("app"))
            .expect("missing #app mount point"),
    )
    .render();
}
